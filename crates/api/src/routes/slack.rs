use axum::routing::post;
use axum::Router;

use crate::handlers::slack;
use crate::state::AppState;

/// Mount the Slack interactivity webhook (root level, not under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/slack/interactions", post(slack::interactions))
}
