/// Default Slack Web API root.
pub const DEFAULT_API_URL: &str = "https://slack.com/api";

/// Slack configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct SlackConfig {
    /// Bot token (`xoxb-...`). Without it nothing can be delivered.
    pub bot_token: String,
    /// Secret used to verify interactivity callbacks.
    pub signing_secret: String,
    pub api_url: String,
}

impl SlackConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                | Default                  |
    /// |------------------------|--------------------------|
    /// | `SLACK_BOT_TOKEN`      | empty                    |
    /// | `SLACK_SIGNING_SECRET` | empty                    |
    /// | `SLACK_API_URL`        | `https://slack.com/api`  |
    pub fn from_env() -> Self {
        let bot_token = std::env::var("SLACK_BOT_TOKEN").unwrap_or_default();
        if bot_token.is_empty() {
            tracing::warn!("SLACK_BOT_TOKEN is not set; notifications will fail");
        }
        let signing_secret = std::env::var("SLACK_SIGNING_SECRET").unwrap_or_default();
        if signing_secret.is_empty() {
            tracing::warn!("SLACK_SIGNING_SECRET is not set; interactions will be rejected");
        }
        let api_url = std::env::var("SLACK_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Self {
            bot_token,
            signing_secret,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }
}
