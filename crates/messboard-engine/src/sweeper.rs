use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::engine::LifecycleEngine;

/// Periodic background sweep.
///
/// Ticks immediately on start, then every `interval`. A failed sweep is
/// logged and the next tick simply tries again; there is nobody to report
/// the error to.
pub struct Sweeper;

impl Sweeper {
    /// Spawn the sweep loop on the current tokio runtime.
    pub fn spawn(engine: Arc<LifecycleEngine>, interval: Duration) -> SweeperHandle {
        let (shutdown, mut stop) = watch::channel(false);
        let period = interval.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_secs = period.as_secs(), "background sweeper started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let now = engine.now();
                        match engine.sweep(now).await {
                            Ok(report) => debug!(count = report.deleted_count, "background sweep done"),
                            Err(e) => error!(error = %e, "background sweep failed"),
                        }
                    }
                    changed = stop.changed() => {
                        // Sender dropped counts as a stop request too.
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("background sweeper stopped");
        });

        SweeperHandle { shutdown, task }
    }
}

/// Handle to a running [`Sweeper`].
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the loop and wait for an in-flight sweep to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "sweeper task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
