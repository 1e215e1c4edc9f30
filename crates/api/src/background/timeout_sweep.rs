//! Fires escalation timeouts whose in-process timer was lost, e.g. to a
//! restart.

use std::sync::Arc;

use chrono::Utc;
use sprout_engine::Engine;
use tokio_util::sync::CancellationToken;

pub async fn run(engine: Arc<Engine>, cancel: CancellationToken) {
    let period = engine.config().timeout_sweep_interval;
    tracing::info!(interval_secs = period.as_secs(), "Timeout sweep started");

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Timeout sweep stopping");
                break;
            }
            _ = interval.tick() => {
                let moved = engine.sweep_timeouts(Utc::now()).await;
                if moved == 0 {
                    tracing::debug!("Timeout sweep: nothing overdue");
                }
            }
        }
    }
}
