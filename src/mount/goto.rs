//! Execution of a planned GoTo against the hardware.

use tracing::{info, warn};

use crate::config::ApproachConfig;
use crate::error::Result;
use crate::motion::{plan_goto, Axis, AxisRates, EncoderPosition, GotoOutcome, GotoPlan, GotoState, SlewSpeed};
use crate::transform::{AstronomicalOracle, Clock};

use super::shared::Shared;
use super::transport::MountTransport;

/// Drives one GoTo through limit check, optional approach leg, final leg
/// and settling.
///
/// Every poll checks the abort generation the sequencer was created with.
pub(crate) struct GotoSequencer<'a, T, O, C> {
    shared: &'a Shared<T, O, C>,
    generation: u64,
}

impl<'a, T, O, C> GotoSequencer<'a, T, O, C>
where
    T: MountTransport,
    O: AstronomicalOracle + Sync,
    C: Clock + Sync,
{
    pub(crate) fn new(shared: &'a Shared<T, O, C>, generation: u64) -> Self {
        Self { shared, generation }
    }

    /// Run a GoTo to `target`. Any error after the limit check leaves the
    /// sequence in [`GotoState::Alert`].
    pub(crate) async fn run(
        &self,
        target: EncoderPosition,
        approach: &ApproachConfig,
        rates: Option<AxisRates>,
    ) -> Result<GotoOutcome> {
        self.shared.set_goto_state(GotoState::LimitCheck);
        let limits = self.shared.config().limits;
        if let Err(err) = limits.check_encoder(target.azm, target.alt) {
            warn!(azm = target.azm, alt = target.alt, "GoTo target outside slew limits");
            self.shared.set_goto_state(GotoState::Rejected);
            return Err(err.into());
        }

        self.shared.set_goto_state(GotoState::ApproachPlanning);
        let plan = plan_goto(target, approach, rates);

        match self.execute(&plan).await {
            Ok(()) => {
                self.shared.set_goto_state(GotoState::Done);
                info!(azm = target.azm, alt = target.alt, "GoTo complete");
                Ok(GotoOutcome {
                    plan,
                    state: GotoState::Done,
                })
            }
            Err(err) => {
                warn!(error = %err, "GoTo failed");
                self.shared.set_goto_state(GotoState::Alert);
                Err(err)
            }
        }
    }

    async fn execute(&self, plan: &GotoPlan) -> Result<()> {
        if let Some(approach) = plan.approach {
            self.shared.set_goto_state(GotoState::ApproachSlewing);
            self.slew_both(approach, SlewSpeed::Fast).await?;
            self.shared.set_goto_state(GotoState::ApproachSettling);
            self.settle_both().await?;
        }

        self.shared.set_goto_state(GotoState::FinalSlewing);
        self.slew_both(plan.target, plan.final_speed()).await?;
        self.shared.set_goto_state(GotoState::Settling);
        self.settle_both().await
    }

    /// Fire both axes, then gather both results.
    async fn slew_both(&self, position: EncoderPosition, speed: SlewSpeed) -> Result<()> {
        self.shared.check_generation(self.generation)?;
        let (azm, alt) = tokio::join!(
            self.shared.goto_axis(Axis::Azimuth, position.azm, speed),
            self.shared.goto_axis(Axis::Altitude, position.alt, speed),
        );
        azm.and(alt)
    }

    async fn settle_both(&self) -> Result<()> {
        let (azm, alt) = tokio::join!(
            self.shared.wait_for_slew(Axis::Azimuth, self.generation),
            self.shared.wait_for_slew(Axis::Altitude, self.generation),
        );
        azm.and(alt)
    }
}
