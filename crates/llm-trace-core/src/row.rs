//! Flat tabular form of a trace.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::trace_info::TraceState;

/// Column names of a trace row, in order.
pub const TRACE_ROW_COLUMNS: [&str; 12] = [
    "trace_id",
    "trace",
    "client_request_id",
    "state",
    "request_time",
    "execution_duration",
    "request",
    "response",
    "trace_metadata",
    "tags",
    "spans",
    "assessments",
];

/// One row of a trace table. Field order matches `TRACE_ROW_COLUMNS`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceRow {
    pub trace_id: String,
    /// The whole trace as compact JSON text.
    pub trace: String,
    pub client_request_id: Option<String>,
    pub state: TraceState,
    pub request_time: DateTime<Utc>,
    pub execution_duration: Option<u64>,
    pub request: serde_json::Value,
    pub response: serde_json::Value,
    pub trace_metadata: HashMap<String, String>,
    pub tags: HashMap<String, String>,
    pub spans: Vec<serde_json::Value>,
    pub assessments: Vec<serde_json::Value>,
}

impl TraceRow {
    /// Cell values in column order.
    pub fn values(&self) -> Vec<serde_json::Value> {
        let object = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        TRACE_ROW_COLUMNS
            .iter()
            .map(|column| object.get(*column).cloned().unwrap_or(serde_json::Value::Null))
            .collect()
    }
}

/// Parse a serialized payload back into JSON, keeping the raw text when it
/// is not valid JSON.
pub(crate) fn deserialize_json_attr(raw: Option<&str>) -> serde_json::Value {
    let Some(raw) = raw else {
        return serde_json::Value::Null;
    };
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, value = raw, "Failed to deserialize JSON attribute");
            serde_json::Value::String(raw.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_json_payload() {
        assert_eq!(deserialize_json_attr(Some(r#"{"a": [1, 2]}"#)), json!({"a": [1, 2]}));
        assert_eq!(deserialize_json_attr(Some("3")), json!(3));
    }

    #[test]
    fn test_falls_back_to_raw_text() {
        assert_eq!(deserialize_json_attr(Some("not json {")), json!("not json {"));
        assert_eq!(deserialize_json_attr(Some("")), json!(""));
    }

    #[test]
    fn test_missing_payload_is_null() {
        assert_eq!(deserialize_json_attr(None), serde_json::Value::Null);
    }
}
