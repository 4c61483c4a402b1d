//! Continuous tracking loop.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::motion::{Axis, AxisRates};
use crate::transform::{AstronomicalOracle, Clock, Target};

use super::shared::Shared;
use super::transport::MountTransport;

/// Predicts per-axis rates for a target and sends them as guide rates.
pub(crate) struct TrackingController<T, O, C> {
    shared: Arc<Shared<T, O, C>>,
    target: Target,
}

impl<T, O, C> TrackingController<T, O, C>
where
    T: MountTransport + 'static,
    O: AstronomicalOracle + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    pub(crate) fn new(shared: Arc<Shared<T, O, C>>, target: Target) -> Self {
        Self { shared, target }
    }

    /// One iteration: resolve the target either side of now, derive rates,
    /// send one guide-rate command per axis.
    pub(crate) async fn step(&self) -> Result<AxisRates> {
        let now = self.shared.clock.now();
        let delta_t = self.shared.config().tracking.delta_t_secs;
        let fallback = *self.shared.last_equatorial.lock();
        let rates = self
            .shared
            .with_pipeline(|pipeline, model| pipeline.tracking_rates(model, &self.target, fallback, now, delta_t));

        // Both axes get their command even if the first one fails.
        let mut first_error = None;
        for axis in Axis::ALL {
            let rate = rates.get(axis);
            match self.shared.set_axis_rate(axis, rate).await {
                Ok(guide) => debug!(
                    %axis,
                    value = guide.value(),
                    command = %guide.command(),
                    arcsec_per_sec = rate.to_arcsec_per_sec(),
                    "guide rate"
                ),
                Err(err) => {
                    warn!(%axis, error = %err, "guide rate not sent");
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(rates),
        }
    }

    /// Tick until cancelled. Failed iterations are logged and retried on the
    /// next tick.
    pub(crate) async fn run(self, mut cancel: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.shared.config().tracking.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *cancel.borrow() {
                break;
            }
            tokio::select! {
                biased;
                _ = cancel.changed() => break,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                biased;
                _ = cancel.changed() => break,
                result = self.step() => {
                    if let Err(err) = result {
                        warn!(error = %err, "tracking iteration failed");
                    }
                }
            }
        }
        debug!("tracking loop stopped");
    }
}

/// A running tracking task.
pub(crate) struct TrackingSession {
    pub(crate) target: Target,
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl TrackingSession {
    /// Spawn a tracking task for `target`.
    pub(crate) fn start<T, O, C>(shared: Arc<Shared<T, O, C>>, target: Target) -> Self
    where
        T: MountTransport + 'static,
        O: AstronomicalOracle + Send + Sync + 'static,
        C: Clock + Send + Sync + 'static,
    {
        info!(?target, "tracking started");
        let (cancel, receiver) = watch::channel(false);
        let controller = TrackingController::new(shared, target.clone());
        let handle = tokio::spawn(controller.run(receiver));
        Self { target, cancel, handle }
    }

    /// Cancel the task and wait for it to finish. Does not stop the mount.
    pub(crate) async fn stop(self) {
        // The receiver is gone only if the task already ended.
        let _ = self.cancel.send(true);
        if let Err(err) = self.handle.await {
            warn!(error = %err, "tracking task ended abnormally");
        }
        info!(target = ?self.target, "tracking stopped");
    }
}
