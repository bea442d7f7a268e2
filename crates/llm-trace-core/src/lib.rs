//! Trace data model for LLM trace management.
//!
//! A [`Trace`] pairs trace-level metadata ([`TraceInfo`]) with the collected
//! spans and payloads ([`TraceData`]). Traces are built by upstream
//! instrumentation; this crate reads them.
//!
//! # Features
//!
//! - **Search**: filter spans by type, name (exact or pattern) and id, and
//!   assessments by name, span, variant and validity
//! - **Serialization**: `{info, data}` dictionary and JSON forms with full
//!   round-trip fidelity
//! - **Legacy upgrade**: metadata in the older `request_id` shape is converted
//!   once, when the trace is constructed
//! - **Transport**: metadata-only message for tracking backends
//! - **Tabular export**: fixed-column rows for data frames
//!
//! # Example
//!
//! ```rust
//! use llm_trace_core::{NameMatcher, Span, SpanSearch, SpanType, Trace, TraceData, TraceInfo};
//!
//! let spans = vec![
//!     Span::builder("s1", "tr-1", "add_one").span_type(SpanType::Tool).build(),
//!     Span::builder("s2", "tr-1", "add_two").span_type(SpanType::Tool).build(),
//!     Span::builder("s3", "tr-1", "multiply_by_two").span_type(SpanType::Tool).build(),
//! ];
//! let trace = Trace::new(TraceInfo::new("tr-1", chrono::Utc::now()), TraceData::new(spans));
//!
//! let search = SpanSearch::new().name(NameMatcher::pattern("add.*").unwrap());
//! let found: Vec<&str> = trace.search_spans(&search).into_iter().map(|s| s.name()).collect();
//! assert_eq!(found, vec!["add_one", "add_two"]);
//! ```

pub mod assessment;
pub mod config;
pub mod error;
pub mod legacy;
pub mod row;
pub mod search;
pub mod span;
pub mod trace;
pub mod trace_data;
pub mod trace_info;
pub mod transport;

pub use assessment::{
    Assessment, AssessmentError, AssessmentSource, AssessmentSourceType, AssessmentType,
    AssessmentValue, ExpectationValue, FeedbackValue,
};
pub use config::{TraceConfig, TraceConfigBuilder};
pub use error::{Result, TraceError};
pub use legacy::{TraceInfoV2, TraceStatus};
pub use row::{TraceRow, TRACE_ROW_COLUMNS};
pub use search::{AssessmentSearch, NameMatcher, SpanSearch};
pub use span::{Span, SpanBuilder, SpanStatus, SpanType};
pub use trace::{Trace, TraceInfoShape, TRACE_MIME_TYPE};
pub use trace_data::TraceData;
pub use trace_info::{TraceInfo, TraceLocation, TraceState};
pub use transport::{ProtoDuration, ProtoTimestamp, ProtoTrace, ProtoTraceInfo};
