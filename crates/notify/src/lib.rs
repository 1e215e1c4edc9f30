//! Slack delivery for watering notifications.
//!
//! Provides a Web API client, Block Kit rendering for task messages and
//! their final states, parsing of interactivity callbacks, and
//! [`SlackNotifier`], which adapts all of it to the engine's
//! notification and handle-lookup ports.

pub mod api;
pub mod blocks;
pub mod config;
pub mod interaction;
pub mod notifier;

pub use api::{SlackApi, SlackApiError};
pub use config::SlackConfig;
pub use interaction::{parse_interaction, Confirmation, InteractionError};
pub use notifier::SlackNotifier;
