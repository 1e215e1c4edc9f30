use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Liveness of the service, its database and the escalation engine.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database cannot be reached.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    pub escalation: EscalationHealth,
}

/// What the escalation controller is currently waiting on.
#[derive(Serialize)]
pub struct EscalationHealth {
    /// Delivered messages still waiting for a click.
    pub open_deliveries: usize,
    pub timeout_secs: u64,
}

/// GET /health
///
/// Timers keep running while the database is down, so the engine part is
/// reported either way.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = match sprout_db::health_check(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            false
        }
    };

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        escalation: EscalationHealth {
            open_deliveries: state.engine.escalation().open_deliveries(),
            timeout_secs: state.engine.config().escalation_timeout.as_secs(),
        },
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
