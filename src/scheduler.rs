// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::pipeline::Pipeline;

/// Default gap between digests (one week).
pub const DEFAULT_INTERVAL_HOURS: u64 = 168;

/// Spawn a background loop that runs the collection every `interval`.
/// The first tick fires immediately. A failed run is logged and the loop keeps going.
pub fn spawn_scheduler(pipeline: Arc<Pipeline>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match pipeline.run_collection().await {
                Ok(report) => tracing::info!(
                    target: "pipeline",
                    collected = report.collected,
                    unique = report.unique,
                    notified = report.notified,
                    "scheduled run finished"
                ),
                Err(e) => tracing::warn!(target: "pipeline", error = ?e, "scheduled run failed"),
            }
        }
    })
}
