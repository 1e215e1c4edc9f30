//! Route definitions for the `/distances` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::distances;
use crate::state::AppState;

/// Routes mounted at `/distances`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rebuild", post(distances::rebuild))
        .route("/summary", get(distances::summary))
}
