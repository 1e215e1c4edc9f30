//! Route definitions for the `/tasks` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tasks;
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /{id}           -> get_task
/// POST   /{id}/confirm   -> confirm
/// POST   /{id}/reset     -> reset
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(tasks::get_task))
        .route("/{id}/confirm", post(tasks::confirm))
        .route("/{id}/reset", post(tasks::reset))
}
