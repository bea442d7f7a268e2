//! Transport representation sent to a tracking backend.
//!
//! The backend's trace message carries trace metadata only. Spans are not
//! part of it and are never added by `Trace::to_proto`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::assessment::Assessment;
use crate::trace_info::{TraceInfo, TraceLocation, TraceState};

/// Seconds and nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtoTimestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl From<DateTime<Utc>> for ProtoTimestamp {
    fn from(ts: DateTime<Utc>) -> Self {
        Self {
            seconds: ts.timestamp(),
            nanos: ts.timestamp_subsec_nanos() as i32,
        }
    }
}

/// Span of time in seconds and nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtoDuration {
    pub seconds: i64,
    pub nanos: i32,
}

impl ProtoDuration {
    pub fn from_millis(ms: u64) -> Self {
        Self {
            seconds: (ms / 1000) as i64,
            nanos: ((ms % 1000) * 1_000_000) as i32,
        }
    }
}

/// Trace metadata message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtoTraceInfo {
    pub trace_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_request_id: Option<String>,
    pub trace_location: TraceLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_preview: Option<String>,
    pub request_time: ProtoTimestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_duration: Option<ProtoDuration>,
    pub state: TraceState,
    pub trace_metadata: HashMap<String, String>,
    pub tags: HashMap<String, String>,
    pub assessments: Vec<Assessment>,
}

impl From<&TraceInfo> for ProtoTraceInfo {
    fn from(info: &TraceInfo) -> Self {
        Self {
            trace_id: info.trace_id.clone(),
            client_request_id: info.client_request_id.clone(),
            trace_location: info.trace_location.clone(),
            request_preview: info.request_preview.clone(),
            response_preview: info.response_preview.clone(),
            request_time: info.request_time.into(),
            execution_duration: info.execution_duration.map(ProtoDuration::from_millis),
            state: info.state,
            trace_metadata: info.trace_metadata.clone(),
            tags: info.tags.clone(),
            assessments: info.assessments.clone(),
        }
    }
}

/// Trace message. Holds `trace_info` and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtoTrace {
    pub trace_info: ProtoTraceInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_conversion() {
        let ts = Utc.timestamp_opt(1_700_000_000, 123_000_000).unwrap();
        let proto = ProtoTimestamp::from(ts);
        assert_eq!(proto.seconds, 1_700_000_000);
        assert_eq!(proto.nanos, 123_000_000);
    }

    #[test]
    fn test_duration_from_millis() {
        let d = ProtoDuration::from_millis(2_345);
        assert_eq!(d.seconds, 2);
        assert_eq!(d.nanos, 345_000_000);
    }

    #[test]
    fn test_info_message_uses_camel_case() {
        let info = TraceInfo::new("tr-1", Utc::now()).with_execution_duration(10);
        let json = serde_json::to_value(ProtoTraceInfo::from(&info)).unwrap();
        assert_eq!(json["traceId"], "tr-1");
        assert_eq!(json["executionDuration"]["nanos"], 10_000_000);
    }
}
