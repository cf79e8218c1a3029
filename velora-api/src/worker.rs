use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, info};
use velora_catalog::AvailabilityIndex;
use velora_shared::events::HoldsSweptEvent;

use crate::log_telemetry;

/// Background sweep that reaps capacity holds whose callers never
/// committed them (e.g. a crash between reserve and persist), so failed
/// booking attempts cannot strand capacity.
pub fn spawn_hold_sweeper(
    availability: Arc<AvailabilityIndex>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        info!("Hold sweeper started, running every {}s", every.as_secs());
        let mut ticker = interval(every);
        loop {
            ticker.tick().await;
            let released = availability.sweep_expired(chrono::Utc::now());
            if released > 0 {
                info!(released, "released expired capacity holds");
                log_telemetry(
                    "holds.swept",
                    &HoldsSweptEvent { released, timestamp: chrono::Utc::now().timestamp() },
                );
            } else {
                debug!("no expired holds to release");
            }
        }
    })
}
