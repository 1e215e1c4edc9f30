pub mod distances;
pub mod health;
pub mod slack;
pub mod tasks;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /distances/rebuild           recompute every floor (POST)
/// /distances/summary           expected vs stored pairs (GET)
/// /locations/sync              pull floor resources (POST)
/// /assignments/run             one assignment cycle (POST)
/// /tasks/{id}                  task state (GET)
/// /tasks/{id}/confirm          operator confirmation (POST)
/// /tasks/{id}/reset            back to pending (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/distances", distances::router())
        .route("/locations/sync", post(handlers::distances::sync_locations))
        .route("/assignments/run", post(handlers::assignments::run))
        .nest("/tasks", tasks::router())
}
