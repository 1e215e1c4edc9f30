use std::sync::Arc;

use sprout_engine::Engine;
use sprout_notify::SlackConfig;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone; everything inside is behind `Arc` or is a pool handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, used for the health check.
    pub pool: sprout_db::DbPool,
    pub config: Arc<ServerConfig>,
    pub engine: Arc<Engine>,
    /// Slack settings; the signing secret authenticates interactions.
    pub slack: Arc<SlackConfig>,
}
