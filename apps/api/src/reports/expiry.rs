use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::reports::store::ReportStore;

/// Periodically deletes expired reports, independent of request traffic.
/// The first sweep runs immediately. Failures are logged and the loop carries on.
pub fn spawn_expiry_sweeper(store: Arc<dyn ReportStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match store.purge_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(purged) => info!(purged, store = store.name(), security = true, "expired analyses purged"),
                Err(e) => error!("expiry sweep failed: {e}"),
            }
        }
    })
}
