//! The `Trace` aggregate: metadata plus span data.
//!
//! Search, dictionary/JSON serialization, transport conversion and tabular
//! export all live here. None of these operations mutate the trace.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::assessment::Assessment;
use crate::config::TraceConfig;
use crate::error::{json_type_name, Result, TraceError};
use crate::legacy::TraceInfoV2;
use crate::row::{deserialize_json_attr, TraceRow, TRACE_ROW_COLUMNS};
use crate::search::{AssessmentSearch, SpanSearch};
use crate::span::Span;
use crate::trace_data::TraceData;
use crate::trace_info::TraceInfo;
use crate::transport::{ProtoTrace, ProtoTraceInfo};

/// MIME type under which a renderer receives the trace identity payload.
pub const TRACE_MIME_TYPE: &str = "application/x-llm-trace+json";

/// Metadata accepted by `Trace::new`: either shape, upgraded on entry.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceInfoShape {
    Current(TraceInfo),
    Legacy(TraceInfoV2),
}

impl From<TraceInfo> for TraceInfoShape {
    fn from(info: TraceInfo) -> Self {
        TraceInfoShape::Current(info)
    }
}

impl From<TraceInfoV2> for TraceInfoShape {
    fn from(info: TraceInfoV2) -> Self {
        TraceInfoShape::Legacy(info)
    }
}

/// One recorded execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub info: TraceInfo,
    pub data: TraceData,
}

impl Trace {
    /// Compose a trace, upgrading legacy metadata with default settings.
    pub fn new(info: impl Into<TraceInfoShape>, data: TraceData) -> Self {
        Self::with_config(info, data, &TraceConfig::default())
    }

    /// Compose a trace, upgrading legacy metadata with `config`.
    ///
    /// The upgrade reads the trace's own request/response payloads.
    pub fn with_config(info: impl Into<TraceInfoShape>, data: TraceData, config: &TraceConfig) -> Self {
        let info = match info.into() {
            TraceInfoShape::Current(info) => info,
            TraceInfoShape::Legacy(legacy) => legacy.into_current(
                data.request.as_deref(),
                data.response.as_deref(),
                config.preview_max_length,
            ),
        };
        Self { info, data }
    }

    pub fn trace_id(&self) -> &str {
        &self.info.trace_id
    }

    /// Spans matching every predicate in `search`, in emission order.
    pub fn search_spans(&self, search: &SpanSearch) -> Vec<&Span> {
        self.data
            .spans
            .iter()
            .filter(|span| search.matches(span))
            .collect()
    }

    /// Assessments matching `search`, in the order they were appended.
    pub fn search_assessments(&self, search: &AssessmentSearch) -> Vec<&Assessment> {
        self.info
            .assessments
            .iter()
            .filter(|assessment| search.matches(assessment))
            .collect()
    }

    pub fn to_dict(&self) -> Result<Value> {
        let mut map = Map::new();
        map.insert("info".to_string(), self.info.to_dict()?);
        map.insert("data".to_string(), self.data.to_dict()?);
        Ok(Value::Object(map))
    }

    /// Parse the `{info, data}` document form.
    pub fn from_dict(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            TraceError::invalid_argument(format!(
                "Unable to parse Trace from dictionary. Expected an object. Got: {}",
                json_type_name(value)
            ))
        })?;

        let info = map.get("info").filter(|v| !v.is_null());
        let data = map.get("data").filter(|v| !v.is_null());
        let (Some(info), Some(data)) = (info, data) else {
            let received: Vec<&String> = map.keys().collect();
            return Err(TraceError::invalid_argument(format!(
                "Unable to parse Trace from dictionary. Expected keys: 'info' and 'data'. \
                 Received keys: {:?}",
                received
            )));
        };

        let data = TraceData::from_dict(data)?;
        if TraceInfoV2::is_legacy_dict(info) {
            return Ok(Self::new(TraceInfoV2::from_dict(info)?, data));
        }
        Ok(Self::new(TraceInfo::from_dict(info)?, data))
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let dict = self.to_dict()?;
        let text = if pretty {
            serde_json::to_string_pretty(&dict)?
        } else {
            serde_json::to_string(&dict)?
        };
        Ok(text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let dict: Value = serde_json::from_str(text).map_err(|e| {
            TraceError::invalid_argument(format!(
                "Unable to parse trace JSON: {}. Error: {}",
                text, e
            ))
        })?;
        Self::from_dict(&dict)
    }

    /// Transport form: trace metadata only, spans excluded.
    pub fn to_proto(&self) -> ProtoTrace {
        ProtoTrace {
            trace_info: ProtoTraceInfo::from(&self.info),
        }
    }

    /// Flatten into one table row. Never fails: payloads that are not JSON
    /// are kept as raw text.
    pub fn to_dataframe_row(&self) -> TraceRow {
        let trace = self.to_json(false).unwrap_or_else(|e| {
            tracing::warn!(trace_id = %self.info.trace_id, error = %e, "Failed to serialize trace");
            String::new()
        });

        TraceRow {
            trace_id: self.info.trace_id.clone(),
            trace,
            client_request_id: self.info.client_request_id.clone(),
            state: self.info.state,
            request_time: self.info.request_time,
            execution_duration: self.info.execution_duration,
            request: deserialize_json_attr(self.data.request.as_deref()),
            response: deserialize_json_attr(self.data.response.as_deref()),
            trace_metadata: self.info.trace_metadata.clone(),
            tags: self.info.tags.clone(),
            spans: self.data.spans.iter().map(Span::to_dict).collect(),
            assessments: self
                .info
                .assessments
                .iter()
                .map(Assessment::to_dictionary)
                .collect(),
        }
    }

    /// Column names of `to_dataframe_row`, in order.
    pub fn dataframe_columns() -> &'static [&'static str] {
        &TRACE_ROW_COLUMNS
    }

    /// Identity payload for renderers that fetch the full trace themselves.
    pub fn display_payload(&self) -> String {
        Value::String(self.info.trace_id.clone()).to_string()
    }

    /// MIME bundle for display integrations.
    pub fn display_bundle(&self, config: &TraceConfig) -> BTreeMap<&'static str, String> {
        let mut bundle = BTreeMap::new();
        bundle.insert("text/plain", self.to_string());
        if config.display_enabled {
            bundle.insert(TRACE_MIME_TYPE, self.display_payload());
        }
        bundle
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Trace(trace_id={})", self.info.trace_id)
    }
}
