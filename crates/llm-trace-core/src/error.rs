//! Error types for trace model operations
//!
//! Every error is raised synchronously by the call that detected it.

use thiserror::Error;

/// Main error type for trace operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    /// Malformed serialized input or an unsupported search predicate
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Serializing a well-formed trace failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TraceError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        TraceError::InvalidArgument(msg.into())
    }

    /// Check if this error was caused by caller input
    pub fn is_user_error(&self) -> bool {
        matches!(self, TraceError::InvalidArgument(_))
    }
}

impl From<serde_json::Error> for TraceError {
    fn from(err: serde_json::Error) -> Self {
        TraceError::Serialization(err.to_string())
    }
}

/// Result type alias for trace operations
pub type Result<T> = std::result::Result<T, TraceError>;

/// Human readable name of a JSON value's type, used in argument errors.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TraceError::invalid_argument("bad key");
        assert_eq!(err.to_string(), "Invalid argument: bad key");
    }

    #[test]
    fn test_is_user_error() {
        assert!(TraceError::InvalidArgument("x".to_string()).is_user_error());
        assert!(!TraceError::Serialization("x".to_string()).is_user_error());
    }

    #[test]
    fn test_json_type_name() {
        assert_eq!(json_type_name(&serde_json::json!(1)), "number");
        assert_eq!(json_type_name(&serde_json::json!([1])), "array");
        assert_eq!(json_type_name(&serde_json::Value::Null), "null");
    }
}
