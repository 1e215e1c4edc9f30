//! Port adapters over [`SlackApi`].

use async_trait::async_trait;
use sprout_core::ports::{
    DeliveryHandle, DeliveryOutcome, HandleLookup, NotificationChannel, PortError, PortResult,
};
use sprout_core::watering::TaskSummary;

use crate::api::{SlackApi, SlackApiError};
use crate::blocks::{outcome_message, task_message};

fn delivery_error(err: SlackApiError) -> PortError {
    PortError::Delivery(err.to_string())
}

/// Delivers task messages as Slack DMs.
#[derive(Clone)]
pub struct SlackNotifier {
    api: SlackApi,
}

impl SlackNotifier {
    pub fn new(api: SlackApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl NotificationChannel for SlackNotifier {
    async fn send(&self, handle: &str, summary: &TaskSummary) -> PortResult<DeliveryHandle> {
        let (text, blocks) = task_message(summary);
        let posted = self
            .api
            .post_message(handle, &text, &blocks)
            .await
            .map_err(delivery_error)?;
        tracing::debug!(
            task_id = summary.task_id,
            channel = %posted.channel,
            ts = %posted.ts,
            "Task message posted",
        );
        Ok(DeliveryHandle {
            channel: posted.channel,
            message_ref: posted.ts,
        })
    }

    async fn close(&self, delivery: &DeliveryHandle, outcome: DeliveryOutcome) -> PortResult<()> {
        let (text, blocks) = outcome_message(outcome);
        self.api
            .update_message(&delivery.channel, &delivery.message_ref, &text, &blocks)
            .await
            .map_err(delivery_error)
    }
}

#[async_trait]
impl HandleLookup for SlackNotifier {
    async fn lookup_handle(&self, email: &str) -> PortResult<Option<String>> {
        self.api
            .lookup_user_by_email(email)
            .await
            .map_err(|e| PortError::Source(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Query, State};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::config::SlackConfig;

    type Calls = Arc<Mutex<Vec<(String, Value)>>>;

    async fn post_message(State(calls): State<Calls>, Json(body): Json<Value>) -> Json<Value> {
        calls.lock().unwrap().push(("chat.postMessage".into(), body.clone()));
        if body["channel"] == "U-BLOCKED" {
            return Json(json!({"ok": false, "error": "channel_not_found"}));
        }
        Json(json!({"ok": true, "channel": "D-123", "ts": "1700000000.000200"}))
    }

    async fn update(State(calls): State<Calls>, Json(body): Json<Value>) -> Json<Value> {
        calls.lock().unwrap().push(("chat.update".into(), body));
        Json(json!({"ok": true}))
    }

    async fn lookup(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        match params.get("email").map(String::as_str) {
            Some("ada@x.io") => Json(json!({"ok": true, "user": {"id": "U-ADA"}})),
            _ => Json(json!({"ok": false, "error": "users_not_found"})),
        }
    }

    async fn notifier() -> (SlackNotifier, Calls) {
        let calls: Calls = Arc::default();
        let app = Router::new()
            .route("/chat.postMessage", post(post_message))
            .route("/chat.update", post(update))
            .route("/users.lookupByEmail", get(lookup))
            .with_state(calls.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = SlackConfig {
            bot_token: "xoxb-test".into(),
            signing_secret: "secret".into(),
            api_url: format!("http://{addr}"),
        };
        (SlackNotifier::new(SlackApi::new(&config).unwrap()), calls)
    }

    fn summary() -> TaskSummary {
        TaskSummary {
            task_id: 5,
            plant_name: Some("Fern".into()),
            location_name: "Desk 1".into(),
            volume_ml: Some(200),
            method: None,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn send_returns_channel_and_ts() {
        let (notifier, calls) = notifier().await;
        let handle = notifier.send("U-1", &summary()).await.unwrap();
        assert_eq!(
            handle,
            DeliveryHandle {
                channel: "D-123".into(),
                message_ref: "1700000000.000200".into(),
            }
        );

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].0, "chat.postMessage");
        assert_eq!(calls[0].1["channel"], "U-1");
    }

    #[tokio::test]
    async fn slack_error_is_a_delivery_error() {
        let (notifier, _) = notifier().await;
        let err = notifier.send("U-BLOCKED", &summary()).await.unwrap_err();
        assert!(matches!(err, PortError::Delivery(msg) if msg.contains("channel_not_found")));
    }

    #[tokio::test]
    async fn close_rewrites_the_message() {
        let (notifier, calls) = notifier().await;
        let handle = DeliveryHandle {
            channel: "D-123".into(),
            message_ref: "1.1".into(),
        };
        notifier.close(&handle, DeliveryOutcome::TimedOut).await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].0, "chat.update");
        assert_eq!(calls[0].1["ts"], "1.1");
        assert_eq!(calls[0].1["text"], "The time to confirm has run out.");
    }

    #[tokio::test]
    async fn lookup_maps_not_found_to_none() {
        let (notifier, _) = notifier().await;
        assert_eq!(
            notifier.lookup_handle("ada@x.io").await.unwrap().as_deref(),
            Some("U-ADA")
        );
        assert_eq!(notifier.lookup_handle("nobody@x.io").await.unwrap(), None);
    }
}
