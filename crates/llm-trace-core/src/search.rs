//! Search predicates over spans and assessments.
//!
//! All predicates in a query are combined with logical AND. An unset
//! predicate matches everything. Queries never reorder their input.

use regex::Regex;
use std::fmt;

use crate::assessment::{Assessment, AssessmentType};
use crate::error::{json_type_name, Result, TraceError};
use crate::span::{Span, SpanType};

/// Matcher for span names: exact string or unanchored pattern.
#[derive(Debug, Clone)]
pub enum NameMatcher {
    Exact(String),
    Pattern(Regex),
}

impl NameMatcher {
    /// Compile a pattern matcher.
    pub fn pattern(pattern: &str) -> Result<Self> {
        Regex::new(pattern).map(NameMatcher::Pattern).map_err(|e| {
            TraceError::invalid_argument(format!("Invalid name pattern '{}': {}", pattern, e))
        })
    }

    /// Exact equality for strings; a pattern matches anywhere in the name.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NameMatcher::Exact(expected) => expected == name,
            NameMatcher::Pattern(re) => re.is_match(name),
        }
    }
}

impl fmt::Display for NameMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameMatcher::Exact(s) => write!(f, "{:?}", s),
            NameMatcher::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

impl From<&str> for NameMatcher {
    fn from(s: &str) -> Self {
        NameMatcher::Exact(s.to_string())
    }
}

impl From<String> for NameMatcher {
    fn from(s: String) -> Self {
        NameMatcher::Exact(s)
    }
}

impl From<Regex> for NameMatcher {
    fn from(re: Regex) -> Self {
        NameMatcher::Pattern(re)
    }
}

impl TryFrom<&serde_json::Value> for NameMatcher {
    type Error = TraceError;

    /// A JSON string is an exact name; `{"pattern": "..."}` is a pattern.
    fn try_from(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(s) => Ok(NameMatcher::Exact(s.clone())),
            serde_json::Value::Object(map) => match map.get("pattern") {
                Some(serde_json::Value::String(p)) if map.len() == 1 => NameMatcher::pattern(p),
                _ => Err(TraceError::invalid_argument(
                    "Invalid type for 'name'. Expected a string or {\"pattern\": <string>}. Got: object",
                )),
            },
            other => Err(TraceError::invalid_argument(format!(
                "Invalid type for 'name'. Expected a string or a pattern. Got: {}",
                json_type_name(other)
            ))),
        }
    }
}

/// Span query.
#[derive(Debug, Clone, Default)]
pub struct SpanSearch {
    pub span_type: Option<SpanType>,
    pub name: Option<NameMatcher>,
    pub span_id: Option<String>,
}

impl SpanSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn span_type(mut self, span_type: SpanType) -> Self {
        self.span_type = Some(span_type);
        self
    }

    pub fn name(mut self, name: impl Into<NameMatcher>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }

    pub fn matches(&self, span: &Span) -> bool {
        self.name.as_ref().map_or(true, |m| m.matches(&span.name))
            && self.span_type.as_ref().map_or(true, |t| *t == span.span_type)
            && self.span_id.as_ref().map_or(true, |id| *id == span.span_id)
    }

    /// Build a query from a JSON object with optional `name`, `span_type`
    /// and `span_id` keys. `null` values and `null` input mean "unset".
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let map = match value {
            serde_json::Value::Null => return Ok(Self::default()),
            serde_json::Value::Object(map) => map,
            other => {
                return Err(TraceError::invalid_argument(format!(
                    "Span search must be an object. Got: {}",
                    json_type_name(other)
                )))
            }
        };

        let mut search = Self::default();
        for (key, v) in map {
            if v.is_null() {
                continue;
            }
            match key.as_str() {
                "name" => search.name = Some(NameMatcher::try_from(v)?),
                "span_type" => search.span_type = Some(SpanType::try_from(v)?),
                "span_id" => match v {
                    serde_json::Value::String(id) => search.span_id = Some(id.clone()),
                    other => {
                        return Err(TraceError::invalid_argument(format!(
                            "Invalid type for 'span_id'. Expected a string. Got: {}",
                            json_type_name(other)
                        )))
                    }
                },
                other => {
                    return Err(TraceError::invalid_argument(format!(
                        "Unknown span search key '{}'",
                        other
                    )))
                }
            }
        }
        Ok(search)
    }
}

/// Assessment query.
///
/// By default only valid assessments are returned, where an unset
/// validity counts as valid. `all` skips the validity gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssessmentSearch {
    pub name: Option<String>,
    pub span_id: Option<String>,
    pub all: bool,
    pub assessment_type: Option<AssessmentType>,
}

impl AssessmentSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }

    pub fn all(mut self, all: bool) -> Self {
        self.all = all;
        self
    }

    pub fn assessment_type(mut self, assessment_type: AssessmentType) -> Self {
        self.assessment_type = Some(assessment_type);
        self
    }

    pub fn matches(&self, assessment: &Assessment) -> bool {
        self.name.as_ref().map_or(true, |n| *n == assessment.name)
            && self
                .span_id
                .as_ref()
                .map_or(true, |id| assessment.span_id.as_ref() == Some(id))
            && (self.all || assessment.is_valid())
            && self
                .assessment_type
                .map_or(true, |t| t == assessment.assessment_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::AssessmentSource;
    use serde_json::json;

    fn span(name: &str, span_type: SpanType) -> Span {
        Span::builder(format!("id-{}", name), "tr", name)
            .span_type(span_type)
            .build()
    }

    #[test]
    fn test_pattern_is_unanchored() {
        let matcher = NameMatcher::pattern("two").unwrap();
        assert!(matcher.matches("add_two"));
        assert!(matcher.matches("two_step"));
        assert!(!matcher.matches("add_one"));
    }

    #[test]
    fn test_exact_does_not_match_substring() {
        let matcher = NameMatcher::from("add");
        assert!(matcher.matches("add"));
        assert!(!matcher.matches("add_one"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = NameMatcher::pattern("add(").unwrap_err();
        assert!(matches!(err, TraceError::InvalidArgument(_)));
    }

    #[test]
    fn test_empty_search_matches_everything() {
        assert!(SpanSearch::new().matches(&span("x", SpanType::Llm)));
    }

    #[test]
    fn test_combined_predicates() {
        let search = SpanSearch::new()
            .name("add_one")
            .span_type(SpanType::Tool)
            .span_id("id-add_one");
        assert!(search.matches(&span("add_one", SpanType::Tool)));
        assert!(!search.matches(&span("add_one", SpanType::Chain)));
    }

    #[test]
    fn test_name_matcher_from_value() {
        assert!(matches!(
            NameMatcher::try_from(&json!("run")).unwrap(),
            NameMatcher::Exact(_)
        ));
        assert!(matches!(
            NameMatcher::try_from(&json!({"pattern": "add.*"})).unwrap(),
            NameMatcher::Pattern(_)
        ));

        let err = NameMatcher::try_from(&json!(7)).unwrap_err();
        assert!(err.to_string().contains("'name'"));
        assert!(err.to_string().contains("number"));
    }

    #[test]
    fn test_span_search_from_value() {
        let search = SpanSearch::from_value(&json!({
            "name": {"pattern": "^add"},
            "span_type": "TOOL",
            "span_id": null
        }))
        .unwrap();
        assert_eq!(search.span_type, Some(SpanType::Tool));
        assert!(search.span_id.is_none());

        let err = SpanSearch::from_value(&json!({"span_type": ["TOOL"]})).unwrap_err();
        assert!(err.to_string().contains("'span_type'"));
        assert!(err.to_string().contains("array"));

        let err = SpanSearch::from_value(&json!({"nmae": "x"})).unwrap_err();
        assert!(err.to_string().contains("nmae"));
    }

    #[test]
    fn test_assessment_validity_gate() {
        let source = AssessmentSource::human("u");
        let unset = Assessment::feedback("q", json!(1), source.clone());
        let valid = unset.clone().with_valid(Some(true));
        let invalid = unset.clone().with_valid(Some(false));

        let default = AssessmentSearch::new();
        assert!(default.matches(&unset));
        assert!(default.matches(&valid));
        assert!(!default.matches(&invalid));
        assert!(AssessmentSearch::new().all(true).matches(&invalid));
    }

    #[test]
    fn test_assessment_span_id_requires_equal_reference() {
        let source = AssessmentSource::human("u");
        let trace_level = Assessment::feedback("q", json!(1), source.clone());
        let span_level = trace_level.clone().with_span_id("s1");

        let search = AssessmentSearch::new().span_id("s1");
        assert!(search.matches(&span_level));
        assert!(!search.matches(&trace_level));
    }
}
