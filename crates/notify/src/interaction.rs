//! Parsing of Slack interactivity callbacks.
//!
//! Slack posts `application/x-www-form-urlencoded` with a single
//! `payload` field holding JSON. Only `block_actions` carrying the
//! watering button are turned into a [`Confirmation`].

use serde::Deserialize;
use sprout_core::ports::DeliveryHandle;
use sprout_core::types::DbId;

use crate::blocks::WATERING_DONE_ACTION;

#[derive(Debug, thiserror::Error)]
pub enum InteractionError {
    #[error("invalid form body: {0}")]
    Form(#[from] serde_urlencoded::de::Error),

    #[error("invalid payload JSON: {0}")]
    Payload(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct FormBody {
    payload: String,
}

/// The parts of an interaction payload the service reads.
#[derive(Debug, Clone, Deserialize)]
pub struct InteractionPayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub actions: Vec<BlockAction>,
    pub user: Option<IdRef>,
    pub channel: Option<IdRef>,
    pub message: Option<MessageRef>,
    pub container: Option<Container>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockAction {
    pub action_id: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageRef {
    pub ts: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Container {
    pub channel_id: Option<String>,
    pub message_ts: Option<String>,
}

/// A click on the watering button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub task_id: DbId,
    /// The message that was clicked, so it can be rewritten.
    pub delivery: Option<DeliveryHandle>,
    /// Slack user id of whoever clicked.
    pub slack_user_id: Option<String>,
}

/// Decode a raw interactivity request body.
pub fn parse_interaction(body: &[u8]) -> Result<InteractionPayload, InteractionError> {
    let form: FormBody = serde_urlencoded::from_bytes(body)?;
    Ok(serde_json::from_str(&form.payload)?)
}

impl InteractionPayload {
    /// The message the interaction came from, from `channel`/`message`
    /// or else from `container`.
    pub fn delivery(&self) -> Option<DeliveryHandle> {
        let channel = self
            .channel
            .as_ref()
            .map(|c| c.id.clone())
            .or_else(|| self.container.as_ref()?.channel_id.clone())?;
        let ts = self
            .message
            .as_ref()
            .map(|m| m.ts.clone())
            .or_else(|| self.container.as_ref()?.message_ts.clone())?;
        Some(DeliveryHandle {
            channel,
            message_ref: ts,
        })
    }

    /// The watering confirmation carried by this interaction, if any.
    pub fn watering_confirmation(&self) -> Option<Confirmation> {
        if self.kind != "block_actions" {
            return None;
        }
        let action = self
            .actions
            .iter()
            .find(|a| a.action_id == WATERING_DONE_ACTION)?;
        let task_id = action.value.as_deref()?.trim().parse::<DbId>().ok()?;
        Some(Confirmation {
            task_id,
            delivery: self.delivery(),
            slack_user_id: self.user.as_ref().map(|u| u.id.clone()),
        })
    }
}
