//! Execution context of a prediction request.
//!
//! An `ExecutionContext` describes the request currently being served:
//! its id, whether it runs as part of an evaluation, the dependency schemas
//! to record on the trace, and the model/endpoint serving it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{ContextError, Result};

/// Per-request correlation data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Unique identifier of the prediction request.
    #[serde(default)]
    pub request_id: Option<String>,
    /// Whether the request is part of a model evaluation.
    #[serde(default)]
    pub is_evaluate: bool,
    /// Dependency schemas to attach to the trace tags.
    #[serde(default)]
    pub dependencies_schemas: Option<HashMap<String, Value>>,
    /// Logged model serving the request.
    #[serde(default)]
    pub model_id: Option<String>,
    /// Serving endpoint that received the request.
    #[serde(default)]
    pub endpoint_name: Option<String>,
}

/// The fields of `ExecutionContext` that can be updated by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextField {
    RequestId,
    IsEvaluate,
    DependenciesSchemas,
    ModelId,
    EndpointName,
}

impl ContextField {
    pub const ALL: [ContextField; 5] = [
        ContextField::RequestId,
        ContextField::IsEvaluate,
        ContextField::DependenciesSchemas,
        ContextField::ModelId,
        ContextField::EndpointName,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextField::RequestId => "request_id",
            ContextField::IsEvaluate => "is_evaluate",
            ContextField::DependenciesSchemas => "dependencies_schemas",
            ContextField::ModelId => "model_id",
            ContextField::EndpointName => "endpoint_name",
        }
    }

    /// Type-check `value` for this field.
    fn assignment(self, value: Value) -> Result<Assignment> {
        let mismatch = |expected: &str, got: &Value| {
            ContextError::invalid_argument(format!(
                "Field '{}' expects {}, got: {}",
                self.as_str(),
                expected,
                got
            ))
        };

        let optional_string = |value: Value| match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Err(mismatch("a string or null", &other)),
        };

        match self {
            ContextField::RequestId => optional_string(value).map(Assignment::RequestId),
            ContextField::ModelId => optional_string(value).map(Assignment::ModelId),
            ContextField::EndpointName => optional_string(value).map(Assignment::EndpointName),
            ContextField::IsEvaluate => match value {
                Value::Bool(b) => Ok(Assignment::IsEvaluate(b)),
                other => Err(mismatch("a bool", &other)),
            },
            ContextField::DependenciesSchemas => match value {
                Value::Null => Ok(Assignment::DependenciesSchemas(None)),
                Value::Object(map) => Ok(Assignment::DependenciesSchemas(Some(
                    map.into_iter().collect(),
                ))),
                other => Err(mismatch("an object or null", &other)),
            },
        }
    }
}

impl fmt::Display for ContextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextField {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self> {
        ContextField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| ContextError::UnknownAttribute(s.to_string()))
    }
}

/// A validated, not yet applied field write.
enum Assignment {
    RequestId(Option<String>),
    IsEvaluate(bool),
    DependenciesSchemas(Option<HashMap<String, Value>>),
    ModelId(Option<String>),
    EndpointName(Option<String>),
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_evaluate(mut self, is_evaluate: bool) -> Self {
        self.is_evaluate = is_evaluate;
        self
    }

    pub fn with_dependencies_schemas(mut self, schemas: HashMap<String, Value>) -> Self {
        self.dependencies_schemas = Some(schemas);
        self
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn with_endpoint_name(mut self, endpoint_name: impl Into<String>) -> Self {
        self.endpoint_name = Some(endpoint_name.into());
        self
    }

    pub fn set_request_id(&mut self, request_id: Option<String>) {
        self.request_id = request_id;
    }

    pub fn set_evaluate(&mut self, is_evaluate: bool) {
        self.is_evaluate = is_evaluate;
    }

    pub fn set_dependencies_schemas(&mut self, schemas: Option<HashMap<String, Value>>) {
        self.dependencies_schemas = schemas;
    }

    pub fn set_model_id(&mut self, model_id: Option<String>) {
        self.model_id = model_id;
    }

    pub fn set_endpoint_name(&mut self, endpoint_name: Option<String>) {
        self.endpoint_name = endpoint_name;
    }

    /// Update fields by name.
    ///
    /// Every name and value is checked before anything is written, so an
    /// unknown field (`UnknownAttribute`) or a badly typed value
    /// (`InvalidArgument`) leaves the context untouched.
    pub fn update<K, I>(&mut self, fields: I) -> Result<()>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let assignments = fields
            .into_iter()
            .map(|(name, value)| name.as_ref().parse::<ContextField>()?.assignment(value))
            .collect::<Result<Vec<_>>>()?;

        for assignment in assignments {
            self.apply(assignment);
        }
        Ok(())
    }

    /// Update a single field.
    pub fn update_field(&mut self, field: ContextField, value: Value) -> Result<()> {
        let assignment = field.assignment(value)?;
        self.apply(assignment);
        Ok(())
    }

    fn apply(&mut self, assignment: Assignment) {
        match assignment {
            Assignment::RequestId(v) => self.request_id = v,
            Assignment::IsEvaluate(v) => self.is_evaluate = v,
            Assignment::DependenciesSchemas(v) => self.dependencies_schemas = v,
            Assignment::ModelId(v) => self.model_id = v,
            Assignment::EndpointName(v) => self.endpoint_name = v,
        }
    }

    /// Read a context from loosely typed input.
    ///
    /// `null` means "no context". An object is read as a context; keys it
    /// does not recognize are ignored so newer producers stay compatible.
    /// Any other JSON type fails with `TypeMismatch`.
    pub fn from_value(value: &Value) -> Result<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Object(_) => Self::deserialize(value).map(Some).map_err(|e| {
                ContextError::invalid_argument(format!("Malformed execution context: {}", e))
            }),
            other => Err(ContextError::type_mismatch(format!(
                "Expected context to be an ExecutionContext object, but got: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let ctx = ExecutionContext::new();
        assert!(ctx.request_id.is_none());
        assert!(!ctx.is_evaluate);
        assert!(ctx.dependencies_schemas.is_none());
    }

    #[test]
    fn test_update_known_field() {
        let mut ctx = ExecutionContext::new().with_request_id("req-1");
        ctx.update([("model_id", json!("m1"))]).unwrap();
        assert_eq!(ctx.model_id.as_deref(), Some("m1"));
        assert_eq!(ctx.request_id.as_deref(), Some("req-1"));
    }

    #[test]
    fn test_update_unknown_field_leaves_context_unchanged() {
        let mut ctx = ExecutionContext::new().with_request_id("req-1");
        let before = ctx.clone();

        let err = ctx
            .update([("model_id", json!("m1")), ("bogus", json!("x"))])
            .unwrap_err();

        assert_eq!(err, ContextError::UnknownAttribute("bogus".to_string()));
        assert_eq!(ctx, before);
    }

    #[test]
    fn test_update_wrong_value_type() {
        let mut ctx = ExecutionContext::new();
        let err = ctx.update([("is_evaluate", json!("yes"))]).unwrap_err();
        assert!(matches!(err, ContextError::InvalidArgument(_)));
        assert!(!ctx.is_evaluate);
    }

    #[test]
    fn test_update_null_clears_optional_field() {
        let mut ctx = ExecutionContext::new().with_endpoint_name("ep");
        ctx.update_field(ContextField::EndpointName, Value::Null).unwrap();
        assert!(ctx.endpoint_name.is_none());
    }

    #[test]
    fn test_update_dependencies_schemas() {
        let mut ctx = ExecutionContext::new();
        ctx.update([(
            "dependencies_schemas".to_string(),
            json!({"retriever": [{"name": "docs"}]}),
        )])
        .unwrap();
        assert_eq!(
            ctx.dependencies_schemas.unwrap()["retriever"],
            json!([{"name": "docs"}])
        );
    }

    #[test]
    fn test_field_names() {
        for field in ContextField::ALL {
            assert_eq!(field.as_str().parse::<ContextField>().unwrap(), field);
        }
    }

    #[test]
    fn test_from_value() {
        assert_eq!(ExecutionContext::from_value(&Value::Null).unwrap(), None);

        let ctx = ExecutionContext::from_value(&json!({
            "request_id": "r",
            "is_evaluate": true,
            "added_later": 1
        }))
        .unwrap()
        .unwrap();
        assert_eq!(ctx.request_id.as_deref(), Some("r"));
        assert!(ctx.is_evaluate);

        let err = ExecutionContext::from_value(&json!("r")).unwrap_err();
        assert!(matches!(err, ContextError::TypeMismatch(_)));
    }
}
