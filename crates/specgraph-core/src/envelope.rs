// ABOUTME: Uniform result envelope shared by every tool in the toolchain.
// ABOUTME: Success payloads get status=success; failures become {status: error, error}.

use crate::error::Result;
use serde::Serialize;
use serde_json::{json, Map, Value as JsonValue};
use std::fmt;

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// Wrap a serializable payload into a success envelope. The payload must
/// serialize to a JSON object; its keys are merged next to `status`.
pub fn success<T: Serialize>(payload: &T) -> Result<JsonValue> {
    let value = serde_json::to_value(payload)?;
    Ok(success_value(value))
}

/// Wrap an already-built JSON object into a success envelope.
pub fn success_value(value: JsonValue) -> JsonValue {
    let mut map = match value {
        JsonValue::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("result".to_string(), other);
            map
        }
    };
    map.insert("status".to_string(), json!(STATUS_SUCCESS));
    JsonValue::Object(map)
}

/// Build an error envelope with a human-readable reason.
pub fn error(message: impl fmt::Display) -> JsonValue {
    json!({
        "status": STATUS_ERROR,
        "error": message.to_string(),
    })
}

/// Collapse an internal result into an envelope. This is the single
/// conversion point: no tool raises through its public surface.
pub fn from_result(result: Result<JsonValue>) -> JsonValue {
    match result {
        Ok(value) => {
            if value.get("status").is_some() {
                value
            } else {
                success_value(value)
            }
        }
        Err(err) => error(err),
    }
}

pub fn is_success(envelope: &JsonValue) -> bool {
    envelope.get("status").and_then(JsonValue::as_str) == Some(STATUS_SUCCESS)
}

/// Per-sub-tool outcome recorded by composite tools. The outer envelope
/// stays `success` even when individual signals fail.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SignalStatus {
    #[serde(flatten)]
    entries: Map<String, JsonValue>,
}

impl SignalStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, signal: &str) {
        self.entries
            .insert(signal.to_string(), json!(STATUS_SUCCESS));
    }

    pub fn record_error(&mut self, signal: &str, reason: impl fmt::Display) {
        self.entries.insert(
            signal.to_string(),
            json!(format!("{STATUS_ERROR}: {reason}")),
        );
    }

    pub fn record_unavailable(&mut self, signal: &str) {
        self.entries.insert(signal.to_string(), json!("unavailable"));
    }

    pub fn success_count(&self) -> usize {
        self.entries
            .values()
            .filter(|v| v.as_str() == Some(STATUS_SUCCESS))
            .count()
    }

    pub fn is_success(&self, signal: &str) -> bool {
        self.entries.get(signal).and_then(JsonValue::as_str) == Some(STATUS_SUCCESS)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpecGraphError;

    #[test]
    fn success_merges_payload_keys() {
        let envelope = success(&json!({"count": 3})).unwrap();
        assert_eq!(envelope["status"], "success");
        assert_eq!(envelope["count"], 3);
    }

    #[test]
    fn non_object_payload_nests_under_result() {
        let envelope = success_value(json!([1, 2, 3]));
        assert_eq!(envelope["status"], "success");
        assert_eq!(envelope["result"], json!([1, 2, 3]));
    }

    #[test]
    fn error_envelope_carries_reason() {
        let envelope = error("missing directory");
        assert_eq!(envelope["status"], "error");
        assert_eq!(envelope["error"], "missing directory");
        assert!(!is_success(&envelope));
    }

    #[test]
    fn from_result_converts_failures() {
        let err: Result<JsonValue> = Err(SpecGraphError::InvalidInput("bad ref".into()));
        let envelope = from_result(err);
        assert_eq!(envelope["status"], "error");
        assert!(envelope["error"].as_str().unwrap().contains("bad ref"));
    }

    #[test]
    fn signal_status_counts_successes() {
        let mut status = SignalStatus::new();
        status.record_success("change_classification");
        status.record_success("breaking_changes");
        status.record_error("type_safety", "git show failed");
        status.record_unavailable("llm_enrichment");
        assert_eq!(status.success_count(), 2);
        assert!(status.is_success("breaking_changes"));
        assert!(!status.is_success("type_safety"));
        assert_eq!(status.len(), 4);
    }
}
