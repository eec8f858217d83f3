use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::ports::Sweepable;

/// Background task that reclaims expired entries on a fixed interval.
///
/// Purely a memory bound: lazy expiry on read already keeps stale values
/// from being served, so a failed sweep is logged and retried next tick,
/// never escalated.
pub struct Sweeper;

impl Sweeper {
    pub fn spawn(stores: Vec<Arc<dyn Sweepable>>, interval: Duration) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        for store in &stores {
                            match store.delete_expired().await {
                                Ok(0) => {}
                                Ok(removed) => debug!("sweeper removed {} expired entries", removed),
                                Err(e) => warn!("sweep failed, retrying next interval: {}", e),
                            }
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
        });

        SweeperHandle { shutdown_tx, task }
    }
}

/// Owned by whoever started the sweeper; dropped (or shut down) at process
/// teardown.
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }
}
