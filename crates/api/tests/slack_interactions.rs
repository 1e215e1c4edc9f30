//! Tests for the Slack interactivity webhook.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use chrono::Utc;
use common::{
    assign, memory_app, office, post_signed_slack, post_slack, slack_form, unreachable_pool,
};
use serde_json::json;
use sprout_core::ports::{DeliveryHandle, DeliveryOutcome};
use sprout_core::status::TaskStatus;
use sprout_core::types::DbId;
use sprout_engine::memory::MemoryPorts;
use sprout_notify::blocks::WATERING_DONE_ACTION;

fn click(task_id: DbId, user: &str, delivery: &DeliveryHandle) -> serde_json::Value {
    json!({
        "type": "block_actions",
        "user": {"id": user},
        "channel": {"id": delivery.channel},
        "message": {"ts": delivery.message_ref},
        "actions": [{"action_id": WATERING_DONE_ACTION, "value": task_id.to_string()}]
    })
}

/// Poll until the confirmation spawned by the handler lands.
async fn wait_for_status(mem: &MemoryPorts, task_id: DbId, status: TaskStatus) -> bool {
    for _ in 0..100 {
        if mem.tasks.task(task_id).status == status {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn missing_headers_are_rejected() {
    let (app, _engine) = memory_app(&MemoryPorts::new(vec![], vec![]));

    let response = post_slack(app, "payload=%7B%7D".into(), None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bad_signature_is_rejected() {
    let (app, _engine) = memory_app(&MemoryPorts::new(vec![], vec![]));
    let timestamp = Utc::now().timestamp().to_string();

    let response = post_slack(
        app,
        "payload=%7B%7D".into(),
        Some(timestamp),
        Some(format!("v0={}", "ab".repeat(32))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn empty_signing_secret_rejects_everything() {
    let mem = MemoryPorts::new(vec![], vec![]);
    let mut slack = common::test_slack();
    slack.signing_secret.clear();
    let app = common::build_test_app(unreachable_pool(), Arc::new(mem.engine()), slack);

    let response = post_signed_slack(app, "payload=%7B%7D".into()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_payload_is_bad_request() {
    let (app, _engine) = memory_app(&MemoryPorts::new(vec![], vec![]));

    let response = post_signed_slack(app, "payload=%7Bnot-json".into()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn other_interactions_are_acknowledged() {
    let (app, _engine) = memory_app(&MemoryPorts::new(vec![], vec![]));
    let body = slack_form(&json!({"type": "view_submission"}));

    let response = post_signed_slack(app, body).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn assignee_click_confirms_the_task() {
    let mem = office();
    let (app, engine) = memory_app(&mem);
    let id = assign(&mem, &engine).await;
    let delivery = mem.notifier.last_delivery().unwrap();

    let response = post_signed_slack(app, slack_form(&click(id, "U-P1", &delivery))).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(wait_for_status(&mem, id, TaskStatus::Done).await);
    assert!(mem.tasks.schedule(10).is_some());
}

#[tokio::test]
async fn click_by_someone_else_leaves_task_assigned() {
    let mem = office();
    let (app, engine) = memory_app(&mem);
    let id = assign(&mem, &engine).await;
    let delivery = mem.notifier.last_delivery().unwrap();

    let response = post_signed_slack(app, slack_form(&click(id, "U-OTHER", &delivery))).await;
    assert_eq!(response.status(), StatusCode::OK);

    // The rejected click closes its message as too late.
    for _ in 0..100 {
        if !mem.notifier.outcomes().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(mem.notifier.outcomes(), vec![DeliveryOutcome::TooLate]);
    assert_eq!(mem.tasks.task(id).status, TaskStatus::Assigned);
}
