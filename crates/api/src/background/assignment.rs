//! Periodic assignment cycle.

use std::sync::Arc;

use chrono::Utc;
use sprout_engine::Engine;
use tokio_util::sync::CancellationToken;

/// Run one assignment cycle every `assignment_interval`.
pub async fn run(engine: Arc<Engine>, cancel: CancellationToken) {
    let period = engine.config().assignment_interval;
    tracing::info!(interval_secs = period.as_secs(), "Assignment loop started");

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Assignment loop stopping");
                break;
            }
            _ = interval.tick() => {
                match engine.run_assignment(Utc::now()).await {
                    Ok(report) if report.pending > 0 || report.created > 0 => {
                        tracing::info!(?report, "Assignment cycle completed");
                    }
                    Ok(_) => tracing::debug!("Assignment cycle: nothing to do"),
                    Err(e) => tracing::error!(error = %e, "Assignment cycle failed"),
                }
            }
        }
    }
}
