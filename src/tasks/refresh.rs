//! Periodic Refresh Task
//!
//! Re-runs the "all nodes" chain on a fixed interval, bypassing the cache
//! read. Upstream data lands in the store and the cache even when nobody is
//! polling the API.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::service::NodeService;

/// Spawns the refresh loop. The first refresh runs one full `interval`
/// after startup.
///
/// The returned handle is aborted during graceful shutdown.
pub fn spawn_refresh_task(service: Arc<NodeService>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting refresh task with interval of {:?}", interval);

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match service.refresh_all().await {
                Ok(served) => debug!(
                    source = %served.source(),
                    count = served.snapshot.nodes.len(),
                    "refresh complete"
                ),
                Err(err) => warn!("refresh failed: {}", err),
            }
        }
    })
}
