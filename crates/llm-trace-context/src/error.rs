//! Error types for execution context operations

use thiserror::Error;

/// Main error type for context operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// An update named a field the context does not have
    #[error("Context has no attribute named '{0}'")]
    UnknownAttribute(String),

    /// A value that is not a context was supplied where a context is required
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// A known field received a value of the wrong type, or no context is bound
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ContextError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        ContextError::InvalidArgument(msg.into())
    }

    /// Create a type mismatch error
    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        ContextError::TypeMismatch(msg.into())
    }
}

/// Result type alias for context operations
pub type Result<T> = std::result::Result<T, ContextError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ContextError::UnknownAttribute("bogus".to_string());
        assert_eq!(err.to_string(), "Context has no attribute named 'bogus'");

        let err = ContextError::type_mismatch("got 3");
        assert_eq!(err.to_string(), "Type mismatch: got 3");
    }
}
