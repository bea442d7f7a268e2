//! CLI command definitions for trace inspection
//!
//! Provides Clap-based commands that load a serialized trace and run span
//! searches, assessment searches and exports against it.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use std::io::Read;
use std::path::{Path, PathBuf};

use llm_trace_core::{
    AssessmentSearch, AssessmentType, NameMatcher, SpanSearch, SpanType, Trace, TraceConfig,
};

/// Trace inspection CLI
///
/// Load a trace document (`{"info": ..., "data": ...}`) and query it.
#[derive(Parser, Debug)]
#[command(name = "trace-inspect")]
#[command(about = "Inspect and search serialized LLM traces", long_about = None)]
#[command(version)]
pub struct InspectCli {
    /// Output verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Pretty-print JSON output (also enabled by TRACE_PRETTY_JSON=true)
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: InspectCommands,
}

/// Assessment variant filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AssessmentKind {
    Feedback,
    Expectation,
}

impl From<AssessmentKind> for AssessmentType {
    fn from(kind: AssessmentKind) -> Self {
        match kind {
            AssessmentKind::Feedback => AssessmentType::Feedback,
            AssessmentKind::Expectation => AssessmentType::Expectation,
        }
    }
}

/// Available inspection commands
#[derive(Subcommand, Debug)]
pub enum InspectCommands {
    /// Print a short summary of the trace
    Summary {
        /// Path to the trace JSON file, or `-` for stdin
        #[arg(short, long)]
        trace: PathBuf,
    },

    /// Search spans
    ///
    /// All given filters must match. Without filters every span is listed.
    Spans {
        /// Path to the trace JSON file, or `-` for stdin
        #[arg(short, long)]
        trace: PathBuf,

        /// Exact span name
        #[arg(long, conflicts_with = "pattern")]
        name: Option<String>,

        /// Regular expression matched anywhere in the span name
        #[arg(long)]
        pattern: Option<String>,

        /// Span type, e.g. LLM, TOOL, CHAIN
        #[arg(long)]
        span_type: Option<String>,

        /// Exact span id
        #[arg(long)]
        span_id: Option<String>,
    },

    /// Search assessments
    ///
    /// Invalidated assessments are skipped unless `--all` is given.
    Assessments {
        /// Path to the trace JSON file, or `-` for stdin
        #[arg(short, long)]
        trace: PathBuf,

        /// Assessment name
        #[arg(long)]
        name: Option<String>,

        /// Span the assessment is attached to
        #[arg(long)]
        span_id: Option<String>,

        /// Include invalidated assessments
        #[arg(long)]
        all: bool,

        /// Restrict to one assessment variant
        #[arg(long, value_enum)]
        assessment_type: Option<AssessmentKind>,
    },

    /// Print the trace as one tabular row keyed by column name
    Row {
        /// Path to the trace JSON file, or `-` for stdin
        #[arg(short, long)]
        trace: PathBuf,
    },

    /// Print the transport message for the trace
    Proto {
        /// Path to the trace JSON file, or `-` for stdin
        #[arg(short, long)]
        trace: PathBuf,
    },
}

/// Build a span query from command-line filters
pub fn build_span_search(
    name: Option<String>,
    pattern: Option<String>,
    span_type: Option<String>,
    span_id: Option<String>,
) -> llm_trace_core::Result<SpanSearch> {
    let mut search = SpanSearch::new();
    if let Some(name) = name {
        search = search.name(name);
    }
    if let Some(pattern) = pattern {
        search = search.name(NameMatcher::pattern(&pattern)?);
    }
    if let Some(span_type) = span_type {
        search = search.span_type(SpanType::from(span_type.as_str()));
    }
    if let Some(span_id) = span_id {
        search = search.span_id(span_id);
    }
    Ok(search)
}

/// Load a trace document from a file or stdin
pub fn load_trace(path: &Path) -> anyhow::Result<Trace> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read trace from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read trace file {}", path.display()))?
    };

    tracing::debug!(path = %path.display(), bytes = text.len(), "Loaded trace document");
    Ok(Trace::from_json(&text)?)
}

/// Execute a command and return its JSON output
pub fn execute(command: InspectCommands) -> anyhow::Result<Value> {
    match command {
        InspectCommands::Summary { trace } => {
            let trace = load_trace(&trace)?;
            Ok(json!({
                "summary": trace.to_string(),
                "trace_id": trace.info.trace_id,
                "state": trace.info.state,
                "execution_duration": trace.info.execution_duration,
                "span_count": trace.data.spans.len(),
                "assessment_count": trace.info.assessments.len(),
            }))
        }
        InspectCommands::Spans {
            trace,
            name,
            pattern,
            span_type,
            span_id,
        } => {
            let search = build_span_search(name, pattern, span_type, span_id)?;
            let trace = load_trace(&trace)?;
            let spans: Vec<Value> = trace
                .search_spans(&search)
                .into_iter()
                .map(|span| span.to_dict())
                .collect();
            tracing::info!(matches = spans.len(), "Span search complete");
            Ok(Value::Array(spans))
        }
        InspectCommands::Assessments {
            trace,
            name,
            span_id,
            all,
            assessment_type,
        } => {
            let search = AssessmentSearch {
                name,
                span_id,
                all,
                assessment_type: assessment_type.map(Into::into),
            };
            let trace = load_trace(&trace)?;
            let assessments: Vec<Value> = trace
                .search_assessments(&search)
                .into_iter()
                .map(|a| a.to_dictionary())
                .collect();
            tracing::info!(matches = assessments.len(), "Assessment search complete");
            Ok(Value::Array(assessments))
        }
        InspectCommands::Row { trace } => {
            let trace = load_trace(&trace)?;
            let row = trace.to_dataframe_row();
            let cells: serde_json::Map<String, Value> = Trace::dataframe_columns()
                .iter()
                .map(|c| c.to_string())
                .zip(row.values())
                .collect();
            Ok(Value::Object(cells))
        }
        InspectCommands::Proto { trace } => {
            let trace = load_trace(&trace)?;
            Ok(serde_json::to_value(trace.to_proto())?)
        }
    }
}

/// Render command output as JSON text
pub fn render(output: &Value, pretty: bool) -> anyhow::Result<String> {
    let pretty = pretty || TraceConfig::from_env().pretty_json;
    let text = if pretty {
        serde_json::to_string_pretty(output)?
    } else {
        serde_json::to_string(output)?
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spans_command() {
        let cli = InspectCli::parse_from([
            "trace-inspect",
            "spans",
            "--trace",
            "t.json",
            "--pattern",
            "add.*",
            "--span-type",
            "TOOL",
        ]);
        match cli.command {
            InspectCommands::Spans {
                pattern, span_type, ..
            } => {
                assert_eq!(pattern.as_deref(), Some("add.*"));
                assert_eq!(span_type.as_deref(), Some("TOOL"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_name_conflicts_with_pattern() {
        let result = InspectCli::try_parse_from([
            "trace-inspect",
            "spans",
            "--trace",
            "t.json",
            "--name",
            "a",
            "--pattern",
            "b",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_build_span_search() {
        let search = build_span_search(
            None,
            Some("^add".to_string()),
            Some("TOOL".to_string()),
            Some("s1".to_string()),
        )
        .unwrap();
        assert!(matches!(search.name, Some(NameMatcher::Pattern(_))));
        assert_eq!(search.span_type, Some(SpanType::Tool));
        assert_eq!(search.span_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_build_span_search_bad_pattern() {
        let err = build_span_search(None, Some("(".to_string()), None, None).unwrap_err();
        assert!(err.is_user_error());
    }

    #[test]
    fn test_parse_assessment_type() {
        let cli = InspectCli::parse_from([
            "trace-inspect",
            "assessments",
            "-t",
            "t.json",
            "--all",
            "--assessment-type",
            "expectation",
        ]);
        match cli.command {
            InspectCommands::Assessments {
                all,
                assessment_type,
                ..
            } => {
                assert!(all);
                assert_eq!(assessment_type, Some(AssessmentKind::Expectation));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
