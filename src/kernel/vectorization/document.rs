//! Plain-text document construction from a job event (C7, spec.md §4.7).

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::kernel::events::EventType;

/// Keys pulled out of `event_data` in this fixed order when present.
const IMPORTANT_KEYS: &[&str] = &[
    "message",
    "thought",
    "action",
    "observation",
    "error",
    "output",
    "result",
    "task",
    "agent",
    "content",
    "query",
    "response",
];

/// Values longer than this (after JSON serialization) are truncated.
const VALUE_TRUNCATION_CAP: usize = 4_000;

/// Builds the plain-text representation of one event that gets chunked and embedded.
pub fn build_document(event_type: EventType, event_time: DateTime<Utc>, event_data: &Value) -> String {
    let mut out = String::new();
    out.push_str("Event Type: ");
    out.push_str(event_type.as_str());
    out.push('\n');
    out.push_str("Time: ");
    out.push_str(&event_time.to_rfc3339());
    out.push('\n');

    let Some(obj) = event_data.as_object() else {
        return out;
    };

    for key in IMPORTANT_KEYS {
        let Some(value) = obj.get(*key) else {
            continue;
        };
        let rendered = render_value(value);
        if rendered.is_empty() {
            continue;
        }
        out.push_str(key);
        out.push_str(": ");
        out.push_str(&rendered);
        out.push('\n');
    }

    out
}

fn render_value(value: &Value) -> String {
    let rendered = match value {
        Value::String(s) => s.clone(),
        Value::Null => return String::new(),
        other => serde_json::to_string(other).unwrap_or_default(),
    };

    if rendered.chars().count() > VALUE_TRUNCATION_CAP {
        let truncated: String = rendered.chars().take(VALUE_TRUNCATION_CAP).collect();
        format!("{truncated}…")
    } else {
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_header_and_present_keys_in_fixed_order() {
        let data = serde_json::json!({
            "response": "the answer",
            "message": "hello",
            "agent": "researcher",
        });
        let doc = build_document(EventType::AgentStep, Utc::now(), &data);

        let message_pos = doc.find("message:").unwrap();
        let agent_pos = doc.find("agent:").unwrap();
        let response_pos = doc.find("response:").unwrap();
        assert!(message_pos < agent_pos);
        assert!(agent_pos < response_pos);
    }

    #[test]
    fn omits_absent_keys() {
        let data = serde_json::json!({ "message": "hi" });
        let doc = build_document(EventType::CrewMessage, Utc::now(), &data);
        assert!(doc.contains("message: hi"));
        assert!(!doc.contains("task:"));
    }

    #[test]
    fn complex_values_are_json_serialized() {
        let data = serde_json::json!({ "output": { "nested": true } });
        let doc = build_document(EventType::TaskComplete, Utc::now(), &data);
        assert!(doc.contains(r#"output: {"nested":true}"#));
    }

    #[test]
    fn long_values_are_truncated() {
        let long = "x".repeat(VALUE_TRUNCATION_CAP + 500);
        let data = serde_json::json!({ "message": long });
        let doc = build_document(EventType::CrewMessage, Utc::now(), &data);
        assert!(doc.contains('…'));
        assert!(doc.len() < long.len() + 200);
    }
}
