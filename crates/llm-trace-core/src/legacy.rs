//! Legacy trace metadata shape and its one-shot upgrade.
//!
//! Older traces identify themselves by `request_id` and carry millisecond
//! timestamps and a `status` field. `TraceInfoV2::into_current` converts that
//! shape into `TraceInfo`; `Trace::new` calls it once at construction.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::assessment::Assessment;
use crate::error::{Result, TraceError};
use crate::trace_info::{TraceInfo, TraceLocation, TraceState};

/// Status values of the legacy shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraceStatus {
    #[default]
    Unspecified,
    InProgress,
    Ok,
    Error,
}

impl From<TraceStatus> for TraceState {
    fn from(status: TraceStatus) -> Self {
        match status {
            TraceStatus::Unspecified => TraceState::StateUnspecified,
            TraceStatus::InProgress => TraceState::InProgress,
            TraceStatus::Ok => TraceState::Ok,
            TraceStatus::Error => TraceState::Error,
        }
    }
}

/// Trace metadata in the legacy shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceInfoV2 {
    pub request_id: String,
    #[serde(default)]
    pub experiment_id: Option<String>,
    pub timestamp_ms: i64,
    #[serde(default)]
    pub execution_time_ms: Option<i64>,
    #[serde(default)]
    pub status: TraceStatus,
    #[serde(default)]
    pub request_metadata: HashMap<String, String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub assessments: Vec<Assessment>,
}

impl TraceInfoV2 {
    /// Whether a serialized `info` section is in the legacy shape.
    pub fn is_legacy_dict(value: &serde_json::Value) -> bool {
        value.get("request_id").is_some() && value.get("trace_id").is_none()
    }

    /// Parse the legacy shape. Fails when `timestamp_ms` is outside the
    /// representable date range.
    pub fn from_dict(value: &serde_json::Value) -> Result<Self> {
        let info = Self::deserialize(value).map_err(|e| {
            TraceError::invalid_argument(format!("Unable to parse legacy trace info: {}", e))
        })?;
        if Utc.timestamp_millis_opt(info.timestamp_ms).single().is_none() {
            return Err(TraceError::invalid_argument(format!(
                "Invalid timestamp_ms {} in legacy trace info '{}'",
                info.timestamp_ms, info.request_id
            )));
        }
        Ok(info)
    }

    /// Convert into the current shape.
    ///
    /// The trace's own request/response payloads become the previews,
    /// truncated to `preview_max_length` characters.
    pub fn into_current(
        self,
        request: Option<&str>,
        response: Option<&str>,
        preview_max_length: usize,
    ) -> TraceInfo {
        tracing::debug!(request_id = %self.request_id, "Upgrading legacy trace info");

        TraceInfo {
            trace_id: self.request_id,
            client_request_id: None,
            trace_location: TraceLocation {
                experiment_id: self.experiment_id,
            },
            request_preview: request.map(|r| truncate_chars(r, preview_max_length)),
            response_preview: response.map(|r| truncate_chars(r, preview_max_length)),
            state: self.status.into(),
            request_time: millis_to_datetime(self.timestamp_ms),
            execution_duration: self
                .execution_time_ms
                .map(|ms| ms.max(0) as u64),
            trace_metadata: self.request_metadata,
            tags: self.tags,
            assessments: self.assessments,
        }
    }
}

fn millis_to_datetime(ms: i64) -> DateTime<Utc> {
    match Utc.timestamp_millis_opt(ms).single() {
        Some(time) => time,
        None => {
            tracing::debug!(timestamp_ms = ms, "Legacy timestamp out of range, using epoch");
            DateTime::<Utc>::default()
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy() -> TraceInfoV2 {
        TraceInfoV2::from_dict(&json!({
            "request_id": "tr-legacy",
            "experiment_id": "0",
            "timestamp_ms": 1_700_000_000_000i64,
            "execution_time_ms": 250,
            "status": "OK",
            "request_metadata": {"trace.inputs": "{}"},
            "tags": {"trace.name": "run"}
        }))
        .unwrap()
    }

    #[test]
    fn test_detect_legacy_dict() {
        assert!(TraceInfoV2::is_legacy_dict(&json!({"request_id": "x"})));
        assert!(!TraceInfoV2::is_legacy_dict(&json!({"trace_id": "x"})));
        assert!(!TraceInfoV2::is_legacy_dict(&json!({"trace_id": "x", "request_id": "x"})));
    }

    #[test]
    fn test_into_current_maps_fields() {
        let info = legacy().into_current(Some(r#"{"x": 1}"#), Some("2"), 1000);

        assert_eq!(info.trace_id, "tr-legacy");
        assert_eq!(info.state, TraceState::Ok);
        assert_eq!(info.execution_duration, Some(250));
        assert_eq!(info.request_time.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(info.trace_location.experiment_id.as_deref(), Some("0"));
        assert_eq!(info.request_preview.as_deref(), Some(r#"{"x": 1}"#));
        assert_eq!(info.response_preview.as_deref(), Some("2"));
        assert_eq!(info.trace_metadata["trace.inputs"], "{}");
        assert_eq!(info.tags["trace.name"], "run");
    }

    #[test]
    fn test_from_dict_rejects_out_of_range_timestamp() {
        let err = TraceInfoV2::from_dict(&json!({
            "request_id": "tr-bad",
            "timestamp_ms": i64::MAX
        }))
        .unwrap_err();
        assert!(matches!(err, TraceError::InvalidArgument(_)));
        assert!(err.to_string().contains("tr-bad"));
    }

    #[test]
    fn test_into_current_out_of_range_falls_back_to_epoch() {
        let mut info = legacy();
        info.timestamp_ms = i64::MAX;
        let current = info.into_current(None, None, 10);
        assert_eq!(current.request_time.timestamp_millis(), 0);
    }

    #[test]
    fn test_previews_are_truncated_by_chars() {
        let info = legacy().into_current(Some("héllo wörld"), None, 5);
        assert_eq!(info.request_preview.as_deref(), Some("héllo"));
        assert!(info.response_preview.is_none());
    }
}
