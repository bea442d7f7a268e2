//! Assessments attached to traces and spans.
//!
//! An assessment is either an expectation (ground truth) or feedback (a
//! judgment on the output). Assessments form an append-only log: a newer
//! assessment supersedes an older one by pointing at it through `overrides`,
//! while the older entry is replaced by a copy marked `valid = false`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TraceError};

/// Who produced an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentSourceType {
    #[default]
    SourceTypeUnspecified,
    Human,
    LlmJudge,
    Code,
}

/// Origin of an assessment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssessmentSource {
    pub source_type: AssessmentSourceType,
    #[serde(default)]
    pub source_id: String,
}

impl AssessmentSource {
    pub fn new(source_type: AssessmentSourceType, source_id: impl Into<String>) -> Self {
        Self {
            source_type,
            source_id: source_id.into(),
        }
    }

    pub fn human(source_id: impl Into<String>) -> Self {
        Self::new(AssessmentSourceType::Human, source_id)
    }

    pub fn llm_judge(source_id: impl Into<String>) -> Self {
        Self::new(AssessmentSourceType::LlmJudge, source_id)
    }

    pub fn code(source_id: impl Into<String>) -> Self {
        Self::new(AssessmentSourceType::Code, source_id)
    }
}

/// Error captured while computing a feedback value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentError {
    pub error_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Expected value for an expectation assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationValue {
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Judgment carried by a feedback assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackValue {
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AssessmentError>,
}

/// Variant payload of an assessment. The variant name is the serialized tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentValue {
    Expectation(ExpectationValue),
    Feedback(FeedbackValue),
}

impl AssessmentValue {
    pub fn assessment_type(&self) -> AssessmentType {
        match self {
            AssessmentValue::Expectation(_) => AssessmentType::Expectation,
            AssessmentValue::Feedback(_) => AssessmentType::Feedback,
        }
    }

    /// The raw judged or expected value.
    pub fn value(&self) -> &serde_json::Value {
        match self {
            AssessmentValue::Expectation(e) => &e.value,
            AssessmentValue::Feedback(f) => &f.value,
        }
    }
}

/// Tag used to filter assessments by variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentType {
    Expectation,
    Feedback,
}

impl fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssessmentType::Expectation => write!(f, "expectation"),
            AssessmentType::Feedback => write!(f, "feedback"),
        }
    }
}

impl FromStr for AssessmentType {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "expectation" => Ok(AssessmentType::Expectation),
            "feedback" => Ok(AssessmentType::Feedback),
            other => Err(TraceError::invalid_argument(format!(
                "Invalid assessment type '{}'. Expected one of: expectation, feedback",
                other
            ))),
        }
    }
}

/// A feedback or expectation judgment on a trace or one of its spans.
///
/// Fields are read through accessors. Changes are made by building a new
/// assessment, e.g. with [`Assessment::overriding`] or [`Assessment::invalidated`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) assessment_id: Option<String>,
    #[serde(rename = "assessment_name")]
    pub(crate) name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) span_id: Option<String>,
    #[serde(default)]
    pub(crate) source: AssessmentSource,
    pub(crate) create_time: DateTime<Utc>,
    pub(crate) last_update_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) rationale: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub(crate) metadata: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) overrides: Option<String>,
    /// Tri-state validity. `None` means never explicitly invalidated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) valid: Option<bool>,
    #[serde(flatten)]
    pub(crate) value: AssessmentValue,
}

impl Assessment {
    fn with_value(name: impl Into<String>, value: AssessmentValue, source: AssessmentSource) -> Self {
        let now = Utc::now();
        Self {
            assessment_id: None,
            name: name.into(),
            trace_id: None,
            span_id: None,
            source,
            create_time: now,
            last_update_time: now,
            rationale: None,
            metadata: HashMap::new(),
            overrides: None,
            valid: None,
            value,
        }
    }

    /// Create a feedback assessment.
    pub fn feedback(
        name: impl Into<String>,
        value: serde_json::Value,
        source: AssessmentSource,
    ) -> Self {
        Self::with_value(
            name,
            AssessmentValue::Feedback(FeedbackValue { value, error: None }),
            source,
        )
    }

    /// Create an expectation assessment.
    pub fn expectation(
        name: impl Into<String>,
        value: serde_json::Value,
        source: AssessmentSource,
    ) -> Self {
        Self::with_value(
            name,
            AssessmentValue::Expectation(ExpectationValue { value }),
            source,
        )
    }

    /// Build the assessment that supersedes `previous`.
    ///
    /// The new entry keeps the name, trace and span of `previous`, records
    /// its id in `overrides` and is explicitly valid.
    pub fn overriding(previous: &Assessment, value: AssessmentValue, source: AssessmentSource) -> Self {
        let mut next = Self::with_value(previous.name.clone(), value, source);
        next.trace_id = previous.trace_id.clone();
        next.span_id = previous.span_id.clone();
        next.overrides = previous.assessment_id.clone();
        next.valid = Some(true);
        next
    }

    pub fn with_assessment_id(mut self, id: impl Into<String>) -> Self {
        self.assessment_id = Some(id.into());
        self
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_valid(mut self, valid: Option<bool>) -> Self {
        self.valid = valid;
        self
    }

    pub fn assessment_id(&self) -> Option<&str> {
        self.assessment_id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn span_id(&self) -> Option<&str> {
        self.span_id.as_deref()
    }

    pub fn source(&self) -> &AssessmentSource {
        &self.source
    }

    pub fn create_time(&self) -> DateTime<Utc> {
        self.create_time
    }

    pub fn last_update_time(&self) -> DateTime<Utc> {
        self.last_update_time
    }

    pub fn rationale(&self) -> Option<&str> {
        self.rationale.as_deref()
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Id of the assessment this one supersedes.
    pub fn overrides(&self) -> Option<&str> {
        self.overrides.as_deref()
    }

    /// Raw tri-state validity flag.
    pub fn valid(&self) -> Option<bool> {
        self.valid
    }

    pub fn value(&self) -> &AssessmentValue {
        &self.value
    }

    /// Copy of this assessment marked as superseded.
    pub fn invalidated(&self) -> Self {
        let mut copy = self.clone();
        copy.valid = Some(false);
        copy.last_update_time = Utc::now();
        copy
    }

    /// Validity under the default-permissive policy: only an explicit
    /// `valid = false` makes an assessment invalid.
    pub fn is_valid(&self) -> bool {
        self.valid != Some(false)
    }

    pub fn assessment_type(&self) -> AssessmentType {
        self.value.assessment_type()
    }

    /// Dictionary form used in tabular rows.
    pub fn to_dictionary(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unset_validity_is_valid() {
        let a = Assessment::feedback("relevance", json!(0.9), AssessmentSource::human("bob"));
        assert_eq!(a.valid, None);
        assert!(a.is_valid());
        assert!(a.clone().with_valid(Some(true)).is_valid());
        assert!(!a.with_valid(Some(false)).is_valid());
    }

    #[test]
    fn test_variant_tag_serialization() {
        let a = Assessment::expectation("expected_answer", json!("42"), AssessmentSource::human("u"))
            .with_span_id("s1");
        let dict = a.to_dictionary();

        assert_eq!(dict["assessment_name"], "expected_answer");
        assert_eq!(dict["expectation"]["value"], "42");
        assert!(dict.get("feedback").is_none());
        assert_eq!(dict["span_id"], "s1");

        let back: Assessment = serde_json::from_value(dict).unwrap();
        assert_eq!(back, a);
        assert_eq!(back.assessment_type(), AssessmentType::Expectation);
    }

    #[test]
    fn test_feedback_error_roundtrip() {
        let mut a = Assessment::feedback("safety", json!(null), AssessmentSource::llm_judge("judge"));
        a.value = AssessmentValue::Feedback(FeedbackValue {
            value: json!(null),
            error: Some(AssessmentError {
                error_code: "RATE_LIMIT".to_string(),
                error_message: Some("slow down".to_string()),
            }),
        });

        let json = serde_json::to_string(&a).unwrap();
        let back: Assessment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn test_overriding_links_previous() {
        let old = Assessment::feedback("correct", json!(false), AssessmentSource::llm_judge("j"))
            .with_assessment_id("a-1")
            .with_trace_id("tr-1")
            .with_span_id("s1");
        let new = Assessment::overriding(
            &old,
            AssessmentValue::Feedback(FeedbackValue { value: json!(true), error: None }),
            AssessmentSource::human("reviewer"),
        );

        assert_eq!(new.overrides.as_deref(), Some("a-1"));
        assert_eq!(new.name, "correct");
        assert_eq!(new.span_id.as_deref(), Some("s1"));
        assert_eq!(new.valid, Some(true));

        let superseded = old.invalidated();
        assert_eq!(superseded.valid, Some(false));
        assert_eq!(old.valid, None);
    }

    #[test]
    fn test_assessment_type_parse() {
        assert_eq!("feedback".parse::<AssessmentType>().unwrap(), AssessmentType::Feedback);
        assert_eq!(
            "expectation".parse::<AssessmentType>().unwrap(),
            AssessmentType::Expectation
        );
        let err = "opinion".parse::<AssessmentType>().unwrap_err();
        assert!(err.to_string().contains("opinion"));
    }
}
