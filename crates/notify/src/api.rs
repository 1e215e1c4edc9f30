//! Minimal Slack Web API client.
//!
//! Only the three methods the notifier needs are wrapped:
//! `chat.postMessage`, `chat.update` and `users.lookupByEmail`.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::config::SlackConfig;

/// HTTP request timeout for a single call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from the Slack Web API layer.
#[derive(Debug, thiserror::Error)]
pub enum SlackApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Slack returned a non-2xx status code.
    #[error("Slack API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// Slack answered `{"ok": false, "error": ...}`.
    #[error("Slack rejected the call: {0}")]
    Slack(String),
}

/// Common shape of Web API responses.
#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    error: Option<String>,
    channel: Option<String>,
    ts: Option<String>,
    user: Option<SlackUser>,
}

#[derive(Debug, Deserialize)]
struct SlackUser {
    id: String,
}

/// Where a posted message landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel: String,
    pub ts: String,
}

/// HTTP client for the Slack Web API.
#[derive(Clone)]
pub struct SlackApi {
    client: reqwest::Client,
    api_url: String,
    bot_token: String,
}

impl SlackApi {
    pub fn new(config: &SlackConfig) -> Result<Self, SlackApiError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &SlackConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            bot_token: config.bot_token.clone(),
        }
    }

    /// Post a message. `channel` may be a user id, which opens a DM.
    pub async fn post_message(
        &self,
        channel: &str,
        text: &str,
        blocks: &serde_json::Value,
    ) -> Result<PostedMessage, SlackApiError> {
        let body = json!({
            "channel": channel,
            "text": text,
            "blocks": blocks,
        });
        let response = self.call_json("chat.postMessage", &body).await?;
        match (response.channel, response.ts) {
            (Some(channel), Some(ts)) => Ok(PostedMessage { channel, ts }),
            _ => Err(SlackApiError::Slack("postMessage returned no channel/ts".into())),
        }
    }

    /// Replace the content of a previously posted message.
    pub async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        text: &str,
        blocks: &serde_json::Value,
    ) -> Result<(), SlackApiError> {
        let body = json!({
            "channel": channel,
            "ts": ts,
            "text": text,
            "blocks": blocks,
        });
        self.call_json("chat.update", &body).await?;
        Ok(())
    }

    /// Resolve an email to a Slack user id. `None` when no user has it.
    pub async fn lookup_user_by_email(&self, email: &str) -> Result<Option<String>, SlackApiError> {
        let response = self
            .client
            .get(format!("{}/users.lookupByEmail", self.api_url))
            .bearer_auth(&self.bot_token)
            .query(&[("email", email)])
            .send()
            .await?;

        match Self::parse_response(response).await {
            Ok(parsed) => Ok(parsed.user.map(|u| u.id)),
            Err(SlackApiError::Slack(code)) if code == "users_not_found" => Ok(None),
            Err(e) => Err(e),
        }
    }

    // ---- private helpers ----

    async fn call_json(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<SlackResponse, SlackApiError> {
        let response = self
            .client
            .post(format!("{}/{}", self.api_url, method))
            .bearer_auth(&self.bot_token)
            .json(body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Check the HTTP status, then the `ok` flag.
    async fn parse_response(response: reqwest::Response) -> Result<SlackResponse, SlackApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SlackApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: SlackResponse = response.json().await?;
        if !parsed.ok {
            return Err(SlackApiError::Slack(
                parsed.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }
        Ok(parsed)
    }
}
