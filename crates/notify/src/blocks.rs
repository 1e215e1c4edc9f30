//! Block Kit rendering for task notifications.

use serde_json::{json, Value};
use sprout_core::ports::DeliveryOutcome;
use sprout_core::watering::TaskSummary;

/// `action_id` of the confirmation button.
pub const WATERING_DONE_ACTION: &str = "watering_done";

/// Shown when a plant has no name.
pub const UNKNOWN_PLANT: &str = "Unknown plant";

/// Notification fallback text (shown in push notifications).
const TASK_FALLBACK_TEXT: &str = "Please water the plant!";

/// Final text for each outcome.
pub fn outcome_text(outcome: DeliveryOutcome) -> &'static str {
    match outcome {
        DeliveryOutcome::TimedOut => "The time to confirm has run out.",
        DeliveryOutcome::Confirmed => "Thanks! The plant has been watered.",
        DeliveryOutcome::TooLate => "This confirmation came too late.",
        DeliveryOutcome::AlreadyDone => "This plant has already been watered.",
        DeliveryOutcome::NotFound => {
            "There was a problem confirming the watering (task not found)."
        }
    }
}

/// Fallback text and blocks for a new task message.
pub fn task_message(summary: &TaskSummary) -> (String, Value) {
    let mut text = format!(
        "*Watering task*\n*Plant:* {}\n*Location:* {}\n",
        summary.plant_name.as_deref().unwrap_or(UNKNOWN_PLANT),
        summary.location_name,
    );
    if let Some(volume) = summary.volume_ml.filter(|v| *v > 0) {
        text.push_str(&format!("*Amount:* {volume} ml\n"));
    }
    if let Some(method) = summary.method.as_deref().filter(|m| !m.is_empty()) {
        text.push_str(&format!("*Method:* {method}\n"));
    }

    let mut blocks = vec![json!({
        "type": "section",
        "text": {"type": "mrkdwn", "text": text},
    })];

    if let Some(url) = summary.image_url.as_deref().filter(|u| !u.is_empty()) {
        blocks.push(json!({
            "type": "image",
            "image_url": url,
            "alt_text": "Picture of the plant",
        }));
    }

    blocks.push(json!({
        "type": "actions",
        "elements": [{
            "type": "button",
            "text": {"type": "plain_text", "text": "Watered"},
            "style": "primary",
            "action_id": WATERING_DONE_ACTION,
            "value": summary.task_id.to_string(),
        }],
    }));

    (TASK_FALLBACK_TEXT.to_string(), Value::Array(blocks))
}

/// Fallback text and blocks replacing a message once its outcome is known.
/// The button is dropped so the message cannot be clicked again.
pub fn outcome_message(outcome: DeliveryOutcome) -> (String, Value) {
    let text = outcome_text(outcome);
    let mrkdwn = match outcome {
        DeliveryOutcome::Confirmed => text.to_string(),
        DeliveryOutcome::TooLate | DeliveryOutcome::NotFound => format!(":warning: *{text}*"),
        DeliveryOutcome::TimedOut | DeliveryOutcome::AlreadyDone => format!("*{text}*"),
    };
    let blocks = json!([{
        "type": "section",
        "text": {"type": "mrkdwn", "text": mrkdwn},
    }]);
    (text.to_string(), blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> TaskSummary {
        TaskSummary {
            task_id: 42,
            plant_name: Some("Monstera".into()),
            location_name: "Desk 3".into(),
            volume_ml: Some(300),
            method: Some("from below".into()),
            image_url: Some("https://img.example/monstera.jpg".into()),
        }
    }

    #[test]
    fn task_message_has_section_image_and_button() {
        let (fallback, blocks) = task_message(&summary());
        assert_eq!(fallback, TASK_FALLBACK_TEXT);

        let blocks = blocks.as_array().unwrap();
        assert_eq!(blocks.len(), 3);
        let text = blocks[0]["text"]["text"].as_str().unwrap();
        assert!(text.contains("Monstera"));
        assert!(text.contains("Desk 3"));
        assert!(text.contains("300 ml"));
        assert!(text.contains("from below"));
        assert_eq!(blocks[1]["type"], "image");

        let button = &blocks[2]["elements"][0];
        assert_eq!(button["action_id"], WATERING_DONE_ACTION);
        assert_eq!(button["value"], "42");
    }

    #[test]
    fn optional_fields_are_left_out() {
        let mut s = summary();
        s.plant_name = None;
        s.volume_ml = None;
        s.method = None;
        s.image_url = None;

        let (_, blocks) = task_message(&s);
        let blocks = blocks.as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        let text = blocks[0]["text"]["text"].as_str().unwrap();
        assert!(text.contains(UNKNOWN_PLANT));
        assert!(!text.contains("Amount"));
        assert!(!text.contains("Method"));
    }

    #[test]
    fn outcome_message_has_no_button() {
        for outcome in [
            DeliveryOutcome::TimedOut,
            DeliveryOutcome::Confirmed,
            DeliveryOutcome::TooLate,
            DeliveryOutcome::AlreadyDone,
            DeliveryOutcome::NotFound,
        ] {
            let (text, blocks) = outcome_message(outcome);
            assert_eq!(text, outcome_text(outcome));
            let blocks = blocks.as_array().unwrap();
            assert_eq!(blocks.len(), 1);
            assert_eq!(blocks[0]["type"], "section");
        }
    }

    #[test]
    fn outcome_texts() {
        assert_eq!(
            outcome_text(DeliveryOutcome::TimedOut),
            "The time to confirm has run out."
        );
        assert_eq!(
            outcome_text(DeliveryOutcome::Confirmed),
            "Thanks! The plant has been watered."
        );
    }
}
