//! Span payload of a trace.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TraceError};
use crate::span::Span;

/// Request/response payloads and the spans collected for one trace.
///
/// `spans` keeps emission order; nothing in this crate reorders it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TraceData {
    /// Serialized request payload, usually JSON text.
    #[serde(default)]
    pub request: Option<String>,
    /// Serialized response payload, usually JSON text.
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub spans: Vec<Span>,
}

impl TraceData {
    pub fn new(spans: Vec<Span>) -> Self {
        Self {
            request: None,
            response: None,
            spans,
        }
    }

    pub fn with_request(mut self, request: impl Into<String>) -> Self {
        self.request = Some(request.into());
        self
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    /// First span without a parent.
    pub fn root_span(&self) -> Option<&Span> {
        self.spans.iter().find(|span| span.is_root())
    }

    pub fn to_dict(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_dict(value: &serde_json::Value) -> Result<Self> {
        Self::deserialize(value).map_err(|e| {
            TraceError::invalid_argument(format!("Unable to parse trace data: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_spans_are_legal() {
        let data = TraceData::from_dict(&json!({"request": "{}", "response": null, "spans": []}))
            .unwrap();
        assert!(data.spans.is_empty());
        assert!(data.root_span().is_none());
        assert_eq!(data.request.as_deref(), Some("{}"));
    }

    #[test]
    fn test_root_span_is_first_parentless() {
        let data = TraceData::new(vec![
            Span::builder("s2", "tr", "child").parent_id("s1").build(),
            Span::builder("s1", "tr", "root").build(),
        ]);
        assert_eq!(data.root_span().unwrap().span_id, "s1");
    }

    #[test]
    fn test_from_dict_rejects_bad_spans() {
        let err = TraceData::from_dict(&json!({"spans": [{"name": 3}]})).unwrap_err();
        assert!(matches!(err, TraceError::InvalidArgument(_)));
    }
}
