//! Periodic location sync and distance rebuild.

use std::sync::Arc;

use sprout_engine::Engine;
use tokio_util::sync::CancellationToken;

/// Sync locations and make sure the distance matrix is fresh, every
/// `distance_refresh_interval`. The first tick fires at startup.
pub async fn run(engine: Arc<Engine>, cancel: CancellationToken) {
    let period = engine.config().distance_refresh_interval;
    tracing::info!(interval_secs = period.as_secs(), "Distance refresh loop started");

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Distance refresh loop stopping");
                break;
            }
            _ = interval.tick() => refresh(&engine).await,
        }
    }
}

async fn refresh(engine: &Engine) {
    let rebuilt = match engine.sync_locations().await {
        Ok(report) => {
            tracing::debug!(changed = report.changed(), "Location sync finished");
            report.rebuild.is_some()
        }
        Err(e) => {
            tracing::error!(error = %e, "Location sync failed");
            false
        }
    };
    if rebuilt {
        return;
    }
    if let Err(e) = engine.rebuild_distances().await {
        tracing::error!(error = %e, "Distance rebuild failed");
    }
}
