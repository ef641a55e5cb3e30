use std::time::Duration;

use opsgate_application::CatalogService;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Spawns the catalog polling task. It exits once `shutdown` flips to `true`
/// or its sender is dropped.
pub fn spawn_catalog_reload(
    catalog_service: CatalogService,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the initial load already ran.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match catalog_service.reload_if_changed().await {
                        Ok(true) => debug!("catalog reload applied"),
                        Ok(false) => {}
                        Err(error) => warn!(error = %error, "catalog reload failed; retrying next interval"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("catalog reload task stopped");
    })
}
