//! Trace-level metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::assessment::Assessment;
use crate::error::{Result, TraceError};

/// Lifecycle state of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraceState {
    #[default]
    StateUnspecified,
    InProgress,
    Ok,
    Error,
}

impl fmt::Display for TraceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TraceState::StateUnspecified => "STATE_UNSPECIFIED",
            TraceState::InProgress => "IN_PROGRESS",
            TraceState::Ok => "OK",
            TraceState::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Where the trace is stored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TraceLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_id: Option<String>,
}

/// Metadata of one trace: identity, state, timing, tags and assessments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceInfo {
    pub trace_id: String,
    #[serde(default)]
    pub client_request_id: Option<String>,
    #[serde(default)]
    pub trace_location: TraceLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_preview: Option<String>,
    #[serde(default)]
    pub state: TraceState,
    pub request_time: DateTime<Utc>,
    /// Execution duration in milliseconds.
    #[serde(default)]
    pub execution_duration: Option<u64>,
    #[serde(default)]
    pub trace_metadata: HashMap<String, String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub assessments: Vec<Assessment>,
}

impl TraceInfo {
    pub fn new(trace_id: impl Into<String>, request_time: DateTime<Utc>) -> Self {
        Self {
            trace_id: trace_id.into(),
            client_request_id: None,
            trace_location: TraceLocation::default(),
            request_preview: None,
            response_preview: None,
            state: TraceState::StateUnspecified,
            request_time,
            execution_duration: None,
            trace_metadata: HashMap::new(),
            tags: HashMap::new(),
            assessments: Vec::new(),
        }
    }

    pub fn with_state(mut self, state: TraceState) -> Self {
        self.state = state;
        self
    }

    pub fn with_client_request_id(mut self, id: impl Into<String>) -> Self {
        self.client_request_id = Some(id.into());
        self
    }

    pub fn with_execution_duration(mut self, duration_ms: u64) -> Self {
        self.execution_duration = Some(duration_ms);
        self
    }

    pub fn with_experiment_id(mut self, experiment_id: impl Into<String>) -> Self {
        self.trace_location.experiment_id = Some(experiment_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.trace_metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Append an assessment to the log.
    pub fn add_assessment(&mut self, assessment: Assessment) {
        self.assessments.push(assessment);
    }

    /// Supersede the assessment with id `previous_id`.
    ///
    /// The old entry is replaced by its invalidated copy in place and
    /// `replacement` is appended, so both remain in the log.
    pub fn override_assessment(&mut self, previous_id: &str, mut replacement: Assessment) -> Result<()> {
        let position = self
            .assessments
            .iter()
            .position(|a| a.assessment_id.as_deref() == Some(previous_id))
            .ok_or_else(|| {
                TraceError::invalid_argument(format!(
                    "Assessment '{}' not found in trace '{}'",
                    previous_id, self.trace_id
                ))
            })?;

        let superseded = self.assessments[position].invalidated();
        self.assessments[position] = superseded;
        replacement.overrides = Some(previous_id.to_string());
        self.assessments.push(replacement);
        Ok(())
    }

    pub fn to_dict(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_dict(value: &serde_json::Value) -> Result<Self> {
        Self::deserialize(value).map_err(|e| {
            TraceError::invalid_argument(format!("Unable to parse trace info: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::AssessmentSource;
    use serde_json::json;

    fn info() -> TraceInfo {
        TraceInfo::new("tr-1", Utc::now())
            .with_state(TraceState::Ok)
            .with_execution_duration(12)
            .with_tag("env", "dev")
    }

    #[test]
    fn test_state_wire_names() {
        let dict = info().to_dict().unwrap();
        assert_eq!(dict["state"], "OK");
        assert_eq!(
            serde_json::to_value(TraceState::InProgress).unwrap(),
            json!("IN_PROGRESS")
        );
        assert_eq!(TraceState::StateUnspecified.to_string(), "STATE_UNSPECIFIED");
    }

    #[test]
    fn test_dict_roundtrip() {
        let mut original = info().with_metadata("trace.user", "alice");
        original.add_assessment(Assessment::feedback(
            "quality",
            json!(5),
            AssessmentSource::human("alice"),
        ));

        let back = TraceInfo::from_dict(&original.to_dict().unwrap()).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_override_keeps_both_entries() {
        let mut info = info();
        info.add_assessment(
            Assessment::feedback("correct", json!(false), AssessmentSource::llm_judge("j"))
                .with_assessment_id("a-1"),
        );
        let replacement =
            Assessment::feedback("correct", json!(true), AssessmentSource::human("reviewer"))
                .with_assessment_id("a-2");

        info.override_assessment("a-1", replacement).unwrap();

        assert_eq!(info.assessments.len(), 2);
        assert_eq!(info.assessments[0].valid, Some(false));
        assert_eq!(info.assessments[1].overrides.as_deref(), Some("a-1"));
    }

    #[test]
    fn test_override_unknown_id() {
        let mut info = info();
        let replacement = Assessment::feedback("x", json!(1), AssessmentSource::default());
        let err = info.override_assessment("missing", replacement).unwrap_err();
        assert!(err.to_string().contains("missing"));
        assert!(info.assessments.is_empty());
    }

    #[test]
    fn test_from_dict_requires_trace_id() {
        let err = TraceInfo::from_dict(&json!({"request_time": "2024-01-01T00:00:00Z"}))
            .unwrap_err();
        assert!(matches!(err, TraceError::InvalidArgument(_)));
    }
}
