//! Slack interactivity webhook.
//!
//! Slack expects an answer within three seconds, so the handler only
//! authenticates and parses the request, then confirms in the background.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use chrono::Utc;
use sprout_core::signing::verify_signature;
use sprout_engine::ConfirmRequest;
use sprout_notify::parse_interaction;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> AppResult<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(format!("missing {name} header")))
}

/// POST /slack/interactions
pub async fn interactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<StatusCode> {
    if state.slack.signing_secret.is_empty() {
        return Err(AppError::Unauthorized("signing secret not configured".into()));
    }
    let timestamp = header(&headers, TIMESTAMP_HEADER)?;
    let signature = header(&headers, SIGNATURE_HEADER)?;
    verify_signature(
        &state.slack.signing_secret,
        timestamp,
        &body,
        signature,
        Utc::now().timestamp(),
    )
    .map_err(|e| {
        tracing::warn!(error = %e, "Rejected Slack request");
        AppError::Unauthorized(e.to_string())
    })?;

    let payload = parse_interaction(&body).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let Some(confirmation) = payload.watering_confirmation() else {
        tracing::debug!(kind = %payload.kind, "Ignoring Slack interaction");
        return Ok(StatusCode::OK);
    };

    let engine = state.engine.clone();
    tokio::spawn(async move {
        let task_id = confirmation.task_id;
        let request = ConfirmRequest {
            task_id,
            delivery: confirmation.delivery,
            confirmed_by: confirmation.slack_user_id,
        };
        match engine.confirm(request, Utc::now()).await {
            Ok(result) => tracing::info!(task_id, ?result, "Slack confirmation handled"),
            Err(e) => tracing::error!(task_id, error = %e, "Slack confirmation failed"),
        }
    });

    Ok(StatusCode::OK)
}
