//! State shared between the mount facade, the GoTo sequencer and the
//! tracking task, plus the per-axis command primitives.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::alignment::AlignmentModel;
use crate::config::units::StepsPerSec;
use crate::config::MountConfig;
use crate::error::{MotionError, Result, TransportError};
use crate::motion::{AxesState, Axis, Direction, EncoderPosition, GotoState, GuideRate, OperationState, SlewRate, SlewSpeed};
use crate::protocol::{AuxCommand, CommandCode};
use crate::transform::{AstronomicalOracle, Clock, CoordinateTransformPipeline, EquatorialCoord, JulianDate, Target};

use super::transport::MountTransport;

/// Everything the mount owns.
///
/// The transport sits behind an async lock held for one round trip at a
/// time. The remaining state sits behind short synchronous locks that are
/// never held across an await.
pub(crate) struct Shared<T, O, C> {
    pub(crate) transport: tokio::sync::Mutex<T>,
    pub(crate) axes: Mutex<AxesState>,
    pub(crate) model: Mutex<AlignmentModel>,
    pub(crate) config: Mutex<MountConfig>,
    pub(crate) oracle: O,
    pub(crate) clock: C,
    /// Bumped by every abort; in-flight sequences compare against the value
    /// they started with.
    pub(crate) abort_generation: AtomicU64,
    /// Last commanded equatorial position, the fallback for unresolved bodies.
    pub(crate) last_equatorial: Mutex<EquatorialCoord>,
    pub(crate) target: Mutex<Option<Target>>,
    pub(crate) parked: AtomicBool,
    pub(crate) goto_state: Mutex<GotoState>,
    pub(crate) operation: Mutex<OperationState>,
}

impl<T, O, C> Shared<T, O, C>
where
    T: MountTransport,
    O: AstronomicalOracle + Sync,
    C: Clock + Sync,
{
    pub(crate) fn new(transport: T, oracle: O, clock: C, config: MountConfig) -> Self {
        Self {
            transport: tokio::sync::Mutex::new(transport),
            axes: Mutex::new(AxesState::with_backlash(config.backlash.azm, config.backlash.alt)),
            model: Mutex::new(AlignmentModel::new(config.alignment)),
            config: Mutex::new(config),
            oracle,
            clock,
            abort_generation: AtomicU64::new(0),
            last_equatorial: Mutex::new(EquatorialCoord::default()),
            target: Mutex::new(None),
            parked: AtomicBool::new(false),
            goto_state: Mutex::new(GotoState::Idle),
            operation: Mutex::new(OperationState::Idle),
        }
    }

    pub(crate) fn config(&self) -> MountConfig {
        *self.config.lock()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.abort_generation.load(Ordering::SeqCst)
    }

    pub(crate) fn check_generation(&self, started: u64) -> Result<()> {
        if self.generation() == started {
            Ok(())
        } else {
            Err(MotionError::Aborted.into())
        }
    }

    pub(crate) fn set_goto_state(&self, state: GotoState) {
        debug!(?state, "goto");
        *self.goto_state.lock() = state;
        *self.operation.lock() = state.operation_state();
    }

    pub(crate) fn set_operation(&self, state: OperationState) {
        *self.operation.lock() = state;
    }

    /// Run `f` with a pipeline built from the current configuration and
    /// the current alignment model.
    pub(crate) fn with_pipeline<R>(
        &self,
        f: impl FnOnce(&CoordinateTransformPipeline<'_, O>, &AlignmentModel) -> R,
    ) -> R {
        let config = self.config();
        let model = self.model.lock();
        let pipeline = CoordinateTransformPipeline::new(&self.oracle, &config.site, &config.transform);
        f(&pipeline, &model)
    }

    /// Where `target` is now, falling back to the last commanded position.
    pub(crate) fn resolve(&self, target: &Target, at: JulianDate) -> EquatorialCoord {
        let config = self.config();
        target
            .resolve(&self.oracle, &config.site, at)
            .unwrap_or_else(|| *self.last_equatorial.lock())
    }

    /// One round trip, then `update` applied to the axis state while the
    /// transport lock is still held.
    pub(crate) async fn exchange<R, F>(&self, command: AuxCommand, update: F) -> Result<R>
    where
        F: FnOnce(&mut AxesState, &AuxCommand) -> Result<R> + Send,
    {
        let timeout = self.config().transport.timeout();
        let mut transport = self.transport.lock().await;
        let response = tokio::time::timeout(timeout, transport.send_command(&command))
            .await
            .map_err(|_| TransportError::Timeout)??;
        trace!(command = %command.command, destination = %command.destination, "acknowledged");
        let mut axes = self.axes.lock();
        update(&mut axes, &response)
    }

    pub(crate) async fn goto_axis(&self, axis: Axis, target: u32, speed: SlewSpeed) -> Result<()> {
        let command = AuxCommand::with_steps(speed.command(), axis.device(), target);
        self.exchange(command, move |axes, _| {
            axes.axis_mut(axis).begin_slew(target);
            Ok(())
        })
        .await
    }

    /// `true` once the axis reports it has stopped.
    pub(crate) async fn slew_done(&self, axis: Axis) -> Result<bool> {
        let command = AuxCommand::new(CommandCode::MC_SLEW_DONE, axis.device());
        self.exchange(command, move |axes, response| {
            let done = response.payload.first() == Some(&CommandCode::SLEW_DONE_REPLY);
            if done && axes.axis(axis).slewing {
                axes.axis_mut(axis).finish_slew();
            }
            Ok(done)
        })
        .await
    }

    /// Poll slew-done until the axis stops, the poll budget runs out or an
    /// abort arrives.
    pub(crate) async fn wait_for_slew(&self, axis: Axis, generation: u64) -> Result<()> {
        let transport = self.config().transport;
        for _ in 0..transport.slew_poll_limit {
            self.check_generation(generation)?;
            if self.slew_done(axis).await? {
                return Ok(());
            }
            tokio::time::sleep(transport.slew_poll_interval()).await;
        }
        Err(MotionError::SlewTimeout(axis).into())
    }

    pub(crate) async fn move_axis(&self, axis: Axis, rate: SlewRate, direction: Direction) -> Result<()> {
        let command = AuxCommand::with_byte(SlewRate::command(direction), axis.device(), rate.value());
        self.exchange(command, move |axes, _| {
            let state = axes.axis_mut(axis);
            if rate == SlewRate::STOP {
                state.stop();
            } else {
                state.begin_move(direction);
            }
            Ok(())
        })
        .await
    }

    pub(crate) async fn stop_axis(&self, axis: Axis) -> Result<()> {
        self.move_axis(axis, SlewRate::STOP, Direction::Positive).await
    }

    pub(crate) async fn stop_all(&self) -> Result<()> {
        let azm = self.stop_axis(Axis::Azimuth).await;
        let alt = self.stop_axis(Axis::Altitude).await;
        azm.and(alt)
    }

    pub(crate) async fn set_axis_rate(&self, axis: Axis, rate: StepsPerSec) -> Result<GuideRate> {
        let guide = GuideRate::from_steps_per_sec(rate);
        self.send_guide_rate(axis, guide, rate).await?;
        Ok(guide)
    }

    pub(crate) async fn send_guide_rate(&self, axis: Axis, guide: GuideRate, rate: StepsPerSec) -> Result<()> {
        let command = AuxCommand::with_steps(guide.command(), axis.device(), guide.value());
        self.exchange(command, move |axes, _| {
            axes.axis_mut(axis).set_rate(rate);
            Ok(())
        })
        .await
    }

    pub(crate) async fn get_position(&self, axis: Axis) -> Result<u32> {
        let command = AuxCommand::new(CommandCode::MC_GET_POSITION, axis.device());
        self.exchange(command, move |axes, response| {
            let position = response.steps()?;
            axes.axis_mut(axis).set_position(position);
            Ok(position)
        })
        .await
    }

    pub(crate) async fn set_position(&self, axis: Axis, position: u32) -> Result<()> {
        let command = AuxCommand::with_steps(CommandCode::MC_SET_POSITION, axis.device(), position);
        self.exchange(command, move |axes, _| {
            axes.axis_mut(axis).set_position(position);
            Ok(())
        })
        .await
    }

    pub(crate) async fn read_position(&self) -> Result<EncoderPosition> {
        let azm = self.get_position(Axis::Azimuth).await?;
        let alt = self.get_position(Axis::Altitude).await?;
        Ok(EncoderPosition::new(azm, alt))
    }
}
