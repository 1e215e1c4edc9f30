#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::ServiceExt;

use sprout_api::config::ServerConfig;
use sprout_api::handlers::slack::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use sprout_api::router::build_app;
use sprout_api::state::AppState;
use sprout_core::signing::compute_signature;
use sprout_core::types::DbId;
use sprout_engine::memory::{booking, location, MemoryPorts};
use sprout_engine::Engine;
use sprout_notify::SlackConfig;

pub const SIGNING_SECRET: &str = "test-signing-secret";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
    }
}

pub fn test_slack() -> SlackConfig {
    SlackConfig {
        bot_token: "xoxb-test".to_string(),
        signing_secret: SIGNING_SECRET.to_string(),
        api_url: "http://127.0.0.1:1".to_string(),
    }
}

/// A pool pointing at nothing; any query fails quickly.
pub fn unreachable_pool() -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(250))
        .connect_lazy("postgres://sprout@127.0.0.1:1/sprout")
        .unwrap()
}

/// Build the full application router around `engine`.
///
/// Goes through `build_app`, so tests exercise the same middleware stack
/// production uses.
pub fn build_test_app(pool: PgPool, engine: Arc<Engine>, slack: SlackConfig) -> Router {
    build_app(AppState {
        pool,
        config: Arc::new(test_config()),
        engine,
        slack: Arc::new(slack),
    })
}

/// Router backed by in-memory ports.
pub fn memory_app(mem: &MemoryPorts) -> (Router, Arc<Engine>) {
    let engine = Arc::new(mem.engine());
    let app = build_test_app(unreachable_pool(), engine.clone(), test_slack());
    (app, engine)
}

/// Two desks on floor 1, a plant at `A` due since yesterday and `p1`
/// sitting at `B` with Slack id `U-P1`.
pub fn office() -> MemoryPorts {
    let mem = MemoryPorts::new(
        vec![location(1, "A", 0.0, 0.0, 1), location(2, "B", 3.0, 4.0, 1)],
        vec![booking("B", "p1", Some("p1@example.com"), 1)],
    );
    mem.handles.insert("p1@example.com", "U-P1");
    mem.tasks
        .add_plant(10, "A", 1, Some(7), Utc::now() - chrono::Duration::days(1));
    mem
}

/// Rebuild distances and run one cycle; returns the task it assigned.
pub async fn assign(mem: &MemoryPorts, engine: &Engine) -> DbId {
    engine.rebuild_distances().await.unwrap();
    let report = engine.run_assignment(Utc::now()).await.unwrap();
    assert_eq!(report.assigned, 1, "office fixture should assign one task");
    mem.tasks.all_tasks()[0].id
}

pub async fn send(app: Router, method: Method, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri).await
}

pub async fn post(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri).await
}

/// Encode an interaction payload the way Slack posts it.
pub fn slack_form(payload: &serde_json::Value) -> String {
    serde_urlencoded::to_string([("payload", payload.to_string())]).unwrap()
}

/// POST a form body to the interactivity endpoint with the given headers.
pub async fn post_slack(
    app: Router,
    body: String,
    timestamp: Option<String>,
    signature: Option<String>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/slack/interactions")
        .header("content-type", "application/x-www-form-urlencoded");
    if let Some(ts) = timestamp {
        builder = builder.header(TIMESTAMP_HEADER, ts);
    }
    if let Some(sig) = signature {
        builder = builder.header(SIGNATURE_HEADER, sig);
    }
    app.oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap()
}

/// POST a correctly signed interaction.
pub async fn post_signed_slack(app: Router, body: String) -> Response<Body> {
    let timestamp = Utc::now().timestamp().to_string();
    let signature = compute_signature(SIGNING_SECRET, &timestamp, body.as_bytes());
    post_slack(app, body, Some(timestamp), Some(signature)).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
