//! The mount facade.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::alignment::{vector_from_altaz, AlignmentPoint, AlignmentStatus, PointDisposition};
use crate::config::units::StepsPerSec;
use crate::config::{validate_config, ApproachConfig, ApproachMode, MountConfig, SlewLimits, TransformConfig};
use crate::error::Result;
use crate::motion::{
    AxesState, Axis, CoordSetMode, Direction, EncoderPosition, GotoOutcome, GotoState, GuideRate, OperationState,
    SlewRate, SlewSpeed, GUIDE_RATE_SCALE,
};
use crate::protocol::{AuxCommand, CommandCode};
use crate::transform::{AstronomicalOracle, Clock, EquatorialCoord, SiderealOracle, SystemClock, Target};

use super::builder::MountBuilder;
use super::goto::GotoSequencer;
use super::shared::Shared;
use super::tracking::TrackingSession;
use super::transport::MountTransport;

/// Result of an equatorial coordinate request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordSetOutcome {
    /// The mount slewed to the target and stopped.
    Slewed(GotoOutcome),
    /// The mount slewed to the target and is now tracking it.
    Tracking(GotoOutcome),
    /// The current position was synced to the target.
    Synced(PointDisposition),
}

/// Snapshot returned by [`Mount::poll_status`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MountStatus {
    /// Encoder values just read.
    pub position: EncoderPosition,
    /// Equatorial position of the encoders.
    pub equatorial: EquatorialCoord,
    /// Either axis reported it is still moving.
    pub slewing: bool,
    /// A tracking session is running.
    pub tracking: bool,
    /// The mount is parked.
    pub parked: bool,
    /// The position was outside the slew limits and both axes were stopped.
    pub limit_stop: bool,
    /// Stage of the last GoTo.
    pub goto_state: GotoState,
}

/// An alt-az mount on the AUX bus.
///
/// Owns the transport, the host-side axis state, the alignment model and at
/// most one tracking session. All methods take `&self` and may be called
/// from several tasks; bus traffic is serialized by the transport lock.
pub struct Mount<T, O = SiderealOracle, C = SystemClock> {
    shared: Arc<Shared<T, O, C>>,
    tracking: tokio::sync::Mutex<Option<TrackingSession>>,
}

impl<T: MountTransport> Mount<T, SiderealOracle, SystemClock> {
    /// Start building a mount around a transport.
    pub fn builder(transport: T) -> MountBuilder<T, SiderealOracle, SystemClock> {
        MountBuilder::new(transport)
    }
}

impl<T, O, C> Mount<T, O, C>
where
    T: MountTransport + 'static,
    O: AstronomicalOracle + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Create a mount from validated parts.
    pub(crate) fn from_parts(transport: T, oracle: O, clock: C, config: MountConfig) -> Self {
        Self {
            shared: Arc::new(Shared::new(transport, oracle, clock, config)),
            tracking: tokio::sync::Mutex::new(None),
        }
    }

    // --- state ---

    /// Current configuration.
    pub fn config(&self) -> MountConfig {
        self.shared.config()
    }

    /// Host-side view of both axes.
    pub fn axes(&self) -> AxesState {
        *self.shared.axes.lock()
    }

    /// Stage of the last GoTo.
    pub fn goto_state(&self) -> GotoState {
        *self.shared.goto_state.lock()
    }

    /// State of the last requested operation.
    pub fn operation_state(&self) -> OperationState {
        *self.shared.operation.lock()
    }

    /// True after a successful park until unpark.
    pub fn is_parked(&self) -> bool {
        self.shared.parked.load(Ordering::SeqCst)
    }

    /// True while a tracking session is running.
    pub async fn is_tracking(&self) -> bool {
        self.tracking.lock().await.is_some()
    }

    /// Target of the last equatorial request.
    pub fn target(&self) -> Option<Target> {
        self.shared.target.lock().clone()
    }

    // --- motion ---

    /// GoTo raw encoder positions using the configured approach.
    pub async fn goto_steps(&self, target: EncoderPosition) -> Result<GotoOutcome> {
        self.stop_tracking_session().await;
        let approach = self.shared.config().approach;
        self.run_goto(target, &approach).await
    }

    /// GoTo one axis, leaving the other where it is.
    pub async fn slew_axis(&self, axis: Axis, steps: u32, speed: SlewSpeed) -> Result<()> {
        self.stop_tracking_session().await;
        let generation = self.shared.generation();
        let mut target = self.axes().position();
        match axis {
            Axis::Azimuth => target.azm = steps,
            Axis::Altitude => target.alt = steps,
        }

        self.shared.set_operation(OperationState::Busy);
        let result = match self.shared.config().limits.check_encoder(target.azm, target.alt) {
            Ok(()) => self.slew_and_wait(axis, steps, speed, generation).await,
            Err(err) => {
                warn!(%axis, error = %err, "single-axis slew rejected");
                Err(err.into())
            }
        };
        self.finish(result)
    }

    async fn slew_and_wait(&self, axis: Axis, steps: u32, speed: SlewSpeed, generation: u64) -> Result<()> {
        self.shared.goto_axis(axis, steps, speed).await?;
        self.shared.wait_for_slew(axis, generation).await
    }

    /// Start (rate 1-9) or stop (rate 0) a manual slew.
    pub async fn slew_by_rate(&self, axis: Axis, rate: u8, direction: Direction) -> Result<()> {
        let rate = SlewRate::new(rate)?;
        debug!(%axis, rate = rate.value(), ?direction, "rate slew");
        self.shared.move_axis(axis, rate, direction).await
    }

    /// Resolve `target` and act on it according to `mode`.
    ///
    /// Slew and Track run the GoTo twice: a fast pass without approach,
    /// then a precise pass with the target recomputed for the new time.
    pub async fn goto_equatorial(&self, target: Target, mode: CoordSetMode) -> Result<CoordSetOutcome> {
        if let Target::Sidereal(position) = &target {
            *self.shared.last_equatorial.lock() = *position;
        }
        *self.shared.target.lock() = Some(target.clone());

        if mode == CoordSetMode::Sync {
            return self.sync(&target).await.map(CoordSetOutcome::Synced);
        }

        self.stop_tracking_session().await;
        let generation = self.shared.generation();

        let coarse = self.shared.config().approach.with_mode(ApproachMode::Disabled);
        self.equatorial_pass(&target, &coarse, generation).await?;
        let precise = self.shared.config().approach;
        let outcome = self.equatorial_pass(&target, &precise, generation).await?;
        self.shared.check_generation(generation)?;

        if mode == CoordSetMode::Track {
            self.start_tracking(target, generation).await?;
            Ok(CoordSetOutcome::Tracking(outcome))
        } else {
            Ok(CoordSetOutcome::Slewed(outcome))
        }
    }

    /// One GoTo to where `target` is right now.
    async fn equatorial_pass(&self, target: &Target, approach: &ApproachConfig, generation: u64) -> Result<GotoOutcome> {
        let delta_t = self.shared.config().tracking.delta_t_secs;
        let now = self.shared.clock.now();
        let position = self.shared.resolve(target, now);
        let (steps, rates) = self.shared.with_pipeline(|pipeline, model| {
            let steps = pipeline.equatorial_to_steps(model, position, now).to_encoder();
            let rates = (approach.mode == ApproachMode::Tracking)
                .then(|| pipeline.tracking_rates(model, target, position, now, delta_t));
            (steps, rates)
        });
        info!(
            mode = ?approach.mode,
            ra = position.ra.value(),
            dec = position.dec.value(),
            azm = steps.azm,
            alt = steps.alt,
            "equatorial GoTo"
        );

        GotoSequencer::new(&self.shared, generation)
            .run(steps, approach, rates)
            .await
    }

    /// Declare that the mount currently points at `target` and record the
    /// pair as an alignment point.
    pub async fn sync(&self, target: &Target) -> Result<PointDisposition> {
        self.shared.set_operation(OperationState::Busy);
        let result = self.sync_inner(target).await;
        self.finish(result)
    }

    async fn sync_inner(&self, target: &Target) -> Result<PointDisposition> {
        let encoders = self.shared.read_position().await?;
        let now = self.shared.clock.now();
        let position = self.shared.resolve(target, now);
        *self.shared.last_equatorial.lock() = position;

        let sky = self.shared.with_pipeline(|pipeline, _| pipeline.sky_position(position, now));
        let mount = encoders.to_steps();
        let disposition = self.shared.model.lock().add_point(
            vector_from_altaz(sky.az.value(), sky.alt.value()),
            vector_from_altaz(mount.azm.to_degrees().value(), mount.alt.to_degrees().value()),
            1.0,
        );
        let status = self.alignment_status();
        info!(
            ?disposition,
            points = status.point_count,
            rms_arcsec = status.rms_arcsec,
            "sync"
        );

        let azm = self.shared.set_position(Axis::Azimuth, encoders.azm).await;
        let alt = self.shared.set_position(Axis::Altitude, encoders.alt).await;
        azm.and(alt)?;
        Ok(disposition)
    }

    /// GoTo the park position (0, 0) without approach and mark the mount
    /// parked.
    pub async fn park(&self) -> Result<GotoOutcome> {
        self.stop_tracking_session().await;
        let approach = self.shared.config().approach.with_mode(ApproachMode::Disabled);
        let outcome = self.run_goto(EncoderPosition::new(0, 0), &approach).await?;
        self.shared.parked.store(true, Ordering::SeqCst);
        info!("parked");
        Ok(outcome)
    }

    /// Clear the parked flag.
    pub fn unpark(&self) {
        self.shared.parked.store(false, Ordering::SeqCst);
        info!("unparked");
    }

    /// Fast GoTo to encoder zero on the selected axes, then wait for them.
    pub async fn home(&self, azimuth: bool, altitude: bool) -> Result<()> {
        self.stop_tracking_session().await;
        let generation = self.shared.generation();
        let axes: Vec<Axis> = Axis::ALL
            .into_iter()
            .filter(|axis| match axis {
                Axis::Azimuth => azimuth,
                Axis::Altitude => altitude,
            })
            .collect();

        self.shared.set_operation(OperationState::Busy);
        let result = self.home_axes(&axes, generation).await;
        self.finish(result)
    }

    async fn home_axes(&self, axes: &[Axis], generation: u64) -> Result<()> {
        for &axis in axes {
            self.shared.goto_axis(axis, 0, SlewSpeed::Fast).await?;
        }
        for &axis in axes {
            self.shared.wait_for_slew(axis, generation).await?;
        }
        Ok(())
    }

    /// Stop everything: bump the abort generation, cancel tracking, and send
    /// a zero rate to both axes.
    ///
    /// Axis state only records the stop for axes that acknowledged it.
    pub async fn abort(&self) -> Result<()> {
        self.shared.abort_generation.fetch_add(1, Ordering::SeqCst);
        warn!("abort");
        self.stop_tracking_session().await;
        let result = self.shared.stop_all().await;
        self.shared.set_goto_state(GotoState::Idle);
        result
    }

    // --- tracking ---

    /// Turn continuous tracking on (for the current target) or off.
    ///
    /// Turning it off sends a zero rate to both axes.
    pub async fn set_tracking(&self, enabled: bool) -> Result<()> {
        if enabled {
            if self.is_tracking().await {
                return Ok(());
            }
            let generation = self.shared.generation();
            let target = self
                .target()
                .unwrap_or_else(|| Target::Sidereal(*self.shared.last_equatorial.lock()));
            self.start_tracking(target, generation).await
        } else {
            self.stop_tracking_session().await;
            self.shared.stop_all().await
        }
    }

    /// Set raw guide rates on both axes.
    pub async fn set_guide_rate(&self, azm: GuideRate, alt: GuideRate) -> Result<()> {
        for (axis, guide) in [(Axis::Azimuth, azm), (Axis::Altitude, alt)] {
            let rate = StepsPerSec(guide.direction().sign() * f64::from(guide.value()) / GUIDE_RATE_SCALE);
            self.shared.send_guide_rate(axis, guide, rate).await?;
        }
        Ok(())
    }

    /// Replace the tracking session, unless an abort arrived after
    /// `generation` was taken. The check runs under the session lock; abort
    /// bumps the generation before taking it.
    async fn start_tracking(&self, target: Target, generation: u64) -> Result<()> {
        let mut session = self.tracking.lock().await;
        if let Some(previous) = session.take() {
            previous.stop().await;
        }
        self.shared.check_generation(generation)?;
        *session = Some(TrackingSession::start(Arc::clone(&self.shared), target));
        Ok(())
    }

    async fn stop_tracking_session(&self) {
        let previous = self.tracking.lock().await.take();
        if let Some(previous) = previous {
            previous.stop().await;
        }
    }

    // --- read-back ---

    /// Read both encoders.
    pub async fn read_position(&self) -> Result<EncoderPosition> {
        self.shared.read_position().await
    }

    /// Read both encoders and convert to equatorial coordinates.
    pub async fn current_equatorial(&self) -> Result<EquatorialCoord> {
        let position = self.shared.read_position().await?;
        Ok(self.equatorial_of(position))
    }

    fn equatorial_of(&self, position: EncoderPosition) -> EquatorialCoord {
        let now = self.shared.clock.now();
        self.shared
            .with_pipeline(|pipeline, model| pipeline.steps_to_equatorial(model, position.to_steps(), now))
    }

    /// Read positions and slew state; stop both axes if the mount has left
    /// the slew limits.
    pub async fn poll_status(&self) -> Result<MountStatus> {
        let position = self.shared.read_position().await?;
        let azm_done = self.shared.slew_done(Axis::Azimuth).await?;
        let alt_done = self.shared.slew_done(Axis::Altitude).await?;

        let limits = self.shared.config().limits;
        let limit_stop = match limits.check_encoder(position.azm, position.alt) {
            Ok(()) => false,
            Err(err) => {
                warn!(error = %err, "mount outside slew limits, stopping");
                self.shared.stop_all().await?;
                true
            }
        };

        Ok(MountStatus {
            position,
            equatorial: self.equatorial_of(position),
            slewing: !(azm_done && alt_done),
            tracking: self.is_tracking().await,
            parked: self.is_parked(),
            limit_stop,
            goto_state: self.goto_state(),
        })
    }

    // --- configuration ---

    /// Replace the slew limits.
    pub fn set_limits(&self, limits: SlewLimits) -> Result<()> {
        self.update_config(|config| config.limits = limits)
    }

    /// Replace the approach settings.
    pub fn set_approach(&self, approach: ApproachConfig) -> Result<()> {
        self.update_config(|config| config.approach = approach)
    }

    /// Replace the refraction and local-bias settings.
    pub fn set_transform(&self, transform: TransformConfig) -> Result<()> {
        self.update_config(|config| config.transform = transform)
    }

    fn update_config(&self, apply: impl FnOnce(&mut MountConfig)) -> Result<()> {
        let mut config = self.shared.config.lock();
        let mut candidate = *config;
        apply(&mut candidate);
        validate_config(&candidate)?;
        *config = candidate;
        Ok(())
    }

    /// Enable cord-wrap protection on the azimuth axis.
    pub async fn enable_cord_wrap(&self) -> Result<()> {
        self.azm_command(AuxCommand::new(CommandCode::MC_ENABLE_CORDWRAP, Axis::Azimuth.device()))
            .await
    }

    /// Disable cord-wrap protection on the azimuth axis.
    pub async fn disable_cord_wrap(&self) -> Result<()> {
        self.azm_command(AuxCommand::new(CommandCode::MC_DISABLE_CORDWRAP, Axis::Azimuth.device()))
            .await
    }

    /// Set the azimuth cord-wrap position.
    pub async fn set_cord_wrap_position(&self, steps: u32) -> Result<()> {
        self.azm_command(AuxCommand::with_steps(
            CommandCode::MC_SET_CORDWRAP_POS,
            Axis::Azimuth.device(),
            steps,
        ))
        .await
    }

    /// Read the azimuth cord-wrap position.
    pub async fn cord_wrap_position(&self) -> Result<u32> {
        let command = AuxCommand::new(CommandCode::MC_GET_CORDWRAP_POS, Axis::Azimuth.device());
        self.shared
            .exchange(command, |_, response| Ok(response.steps()?))
            .await
    }

    async fn azm_command(&self, command: AuxCommand) -> Result<()> {
        self.shared.exchange(command, |_, _| Ok(())).await
    }

    // --- alignment ---

    /// Remove every alignment point.
    pub fn clear_alignment(&self) {
        self.shared.model.lock().clear();
        info!("alignment cleared");
    }

    /// Remove the most recent alignment point.
    pub fn undo_last_alignment(&self) -> Option<AlignmentPoint> {
        self.shared.model.lock().remove_last()
    }

    /// Point count, model tier, residual and mechanical terms.
    pub fn alignment_status(&self) -> AlignmentStatus {
        self.shared.model.lock().status()
    }

    /// Copy of the alignment points.
    pub fn alignment_points(&self) -> Vec<AlignmentPoint> {
        self.shared.model.lock().points().to_vec()
    }

    // --- helpers ---

    async fn run_goto(&self, target: EncoderPosition, approach: &ApproachConfig) -> Result<GotoOutcome> {
        let generation = self.shared.generation();
        GotoSequencer::new(&self.shared, generation)
            .run(target, approach, None)
            .await
    }

    fn finish<R>(&self, result: Result<R>) -> Result<R> {
        self.shared.set_operation(match result {
            Ok(_) => OperationState::Ok,
            Err(_) => OperationState::Alert,
        });
        result
    }
}
