//! Span types recorded inside a trace.
//!
//! A `Span` is one execution unit within a trace. Spans are built once by
//! upstream instrumentation and are read-only afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{json_type_name, Result, TraceError};

/// Kind of work a span represents.
///
/// Well-known kinds have their own variants; anything else is kept verbatim
/// in `Custom` so user-defined span types survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum SpanType {
    Llm,
    Chain,
    Agent,
    Tool,
    ChatModel,
    Retriever,
    Parser,
    Embedding,
    Reranker,
    Memory,
    #[default]
    Unknown,
    Custom(String),
}

impl SpanType {
    /// Wire name of this span type.
    pub fn as_str(&self) -> &str {
        match self {
            SpanType::Llm => "LLM",
            SpanType::Chain => "CHAIN",
            SpanType::Agent => "AGENT",
            SpanType::Tool => "TOOL",
            SpanType::ChatModel => "CHAT_MODEL",
            SpanType::Retriever => "RETRIEVER",
            SpanType::Parser => "PARSER",
            SpanType::Embedding => "EMBEDDING",
            SpanType::Reranker => "RERANKER",
            SpanType::Memory => "MEMORY",
            SpanType::Unknown => "UNKNOWN",
            SpanType::Custom(name) => name,
        }
    }
}

impl fmt::Display for SpanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpanType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "LLM" => SpanType::Llm,
            "CHAIN" => SpanType::Chain,
            "AGENT" => SpanType::Agent,
            "TOOL" => SpanType::Tool,
            "CHAT_MODEL" => SpanType::ChatModel,
            "RETRIEVER" => SpanType::Retriever,
            "PARSER" => SpanType::Parser,
            "EMBEDDING" => SpanType::Embedding,
            "RERANKER" => SpanType::Reranker,
            "MEMORY" => SpanType::Memory,
            "UNKNOWN" => SpanType::Unknown,
            other => SpanType::Custom(other.to_string()),
        })
    }
}

impl From<&str> for SpanType {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(span_type) => span_type,
            Err(never) => match never {},
        }
    }
}

impl TryFrom<&serde_json::Value> for SpanType {
    type Error = TraceError;

    /// Accepts only a JSON string; every other JSON type is rejected.
    fn try_from(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(s) => Ok(SpanType::from(s.as_str())),
            other => Err(TraceError::invalid_argument(format!(
                "Invalid type for 'span_type'. Expected a span type string. Got: {}",
                json_type_name(other)
            ))),
        }
    }
}

impl Serialize for SpanType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SpanType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(SpanType::from(raw.as_str()))
    }
}

/// Completion status of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpanStatus {
    #[default]
    Unset,
    Ok,
    Error,
}

/// A single recorded span.
///
/// Fields are readable through accessors only; a span cannot be changed
/// once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub(crate) span_id: String,
    pub(crate) trace_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) parent_id: Option<String>,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) span_type: SpanType,
    #[serde(default)]
    pub(crate) status: SpanStatus,
    pub(crate) start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) end_time: Option<DateTime<Utc>>,
    /// `Some(Value::Null)` is a recorded null and survives a round trip;
    /// `None` means nothing was recorded and the key is omitted.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "recorded_value"
    )]
    pub(crate) inputs: Option<serde_json::Value>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "recorded_value"
    )]
    pub(crate) outputs: Option<serde_json::Value>,
    #[serde(default)]
    pub(crate) attributes: HashMap<String, serde_json::Value>,
}

/// A present key always yields `Some`, including an explicit `null`.
fn recorded_value<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<serde_json::Value>, D::Error> {
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl Span {
    /// Start building a span with its identity fields.
    pub fn builder(
        span_id: impl Into<String>,
        trace_id: impl Into<String>,
        name: impl Into<String>,
    ) -> SpanBuilder {
        SpanBuilder {
            span: Span {
                span_id: span_id.into(),
                trace_id: trace_id.into(),
                parent_id: None,
                name: name.into(),
                span_type: SpanType::Unknown,
                status: SpanStatus::Unset,
                start_time: Utc::now(),
                end_time: None,
                inputs: None,
                outputs: None,
                attributes: HashMap::new(),
            },
        }
    }

    pub fn span_id(&self) -> &str {
        &self.span_id
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span_type(&self) -> &SpanType {
        &self.span_type
    }

    pub fn status(&self) -> SpanStatus {
        self.status
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Recorded inputs. `Some(Value::Null)` is distinct from `None`.
    pub fn inputs(&self) -> Option<&serde_json::Value> {
        self.inputs.as_ref()
    }

    pub fn outputs(&self) -> Option<&serde_json::Value> {
        self.outputs.as_ref()
    }

    pub fn attributes(&self) -> &HashMap<String, serde_json::Value> {
        &self.attributes
    }

    /// Wall-clock duration in milliseconds, if the span has ended.
    pub fn duration_ms(&self) -> Option<u64> {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds().max(0) as u64)
    }

    /// A root span has no parent.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Dictionary form used in trace documents and tabular rows.
    pub fn to_dict(&self) -> serde_json::Value {
        // Plain data with string keys; this cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Span(name={:?}, span_id={:?}, span_type={})",
            self.name, self.span_id, self.span_type
        )
    }
}

/// Builder for `Span`.
#[derive(Debug, Clone)]
pub struct SpanBuilder {
    span: Span,
}

impl SpanBuilder {
    pub fn parent_id(mut self, parent_id: impl Into<String>) -> Self {
        self.span.parent_id = Some(parent_id.into());
        self
    }

    pub fn span_type(mut self, span_type: SpanType) -> Self {
        self.span.span_type = span_type;
        self
    }

    pub fn status(mut self, status: SpanStatus) -> Self {
        self.span.status = status;
        self
    }

    /// Set start and end time.
    pub fn timing(mut self, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        self.span.start_time = start;
        self.span.end_time = end;
        self
    }

    pub fn inputs(mut self, inputs: serde_json::Value) -> Self {
        self.span.inputs = Some(inputs);
        self
    }

    pub fn outputs(mut self, outputs: serde_json::Value) -> Self {
        self.span.outputs = Some(outputs);
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.span.attributes.insert(key.into(), value);
        self
    }

    pub fn build(self) -> Span {
        self.span
    }
}
