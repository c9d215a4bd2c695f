//! Error types for tabson

use thiserror::Error;

/// Result type alias for tabson operations
pub type Result<T> = std::result::Result<T, MarshalError>;

/// Errors surfaced by the marshalling layer
///
/// Only shape problems are reported here. A single field whose value cannot be
/// represented is dropped from the produced document instead of failing the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarshalError {
    /// Input is neither a document string nor a table
    #[error("JSON string or table required, got {0}")]
    InvalidShape(String),

    /// Query input is neither a query object, a document string nor a table
    #[error("Query, JSON string or table required, got {0}")]
    InvalidQueryShape(String),

    /// Document text could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl MarshalError {
    /// Returns true if the input did not match any accepted shape
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            MarshalError::InvalidShape(_)
                | MarshalError::InvalidQueryShape(_)
                | MarshalError::Parse(_)
        )
    }
}

impl From<serde_json::Error> for MarshalError {
    fn from(err: serde_json::Error) -> Self {
        MarshalError::Parse(err.to_string())
    }
}

// Extended JSON conversion errors (when bson-errors feature is enabled)
#[cfg(feature = "bson-errors")]
impl From<bson::extjson::de::Error> for MarshalError {
    fn from(err: bson::extjson::de::Error) -> Self {
        MarshalError::Parse(format!("extended JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_shape() {
        let err = MarshalError::InvalidShape("boolean".to_string());
        assert_eq!(err.to_string(), "JSON string or table required, got boolean");
    }

    #[test]
    fn test_error_display_invalid_query_shape() {
        let err = MarshalError::InvalidQueryShape("number".to_string());
        assert_eq!(
            err.to_string(),
            "Query, JSON string or table required, got number"
        );
    }

    #[test]
    fn test_error_display_parse() {
        let err = MarshalError::Parse("unexpected end of input".to_string());
        assert_eq!(err.to_string(), "Parse error: unexpected end of input");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let err: MarshalError = json_err.into();
        assert!(matches!(err, MarshalError::Parse(_)));
    }

    #[test]
    fn test_is_shape_error() {
        assert!(MarshalError::InvalidShape("nil".to_string()).is_shape_error());
        assert!(MarshalError::InvalidQueryShape("nil".to_string()).is_shape_error());
        assert!(MarshalError::Parse("bad".to_string()).is_shape_error());
    }

    #[test]
    fn test_result_type_err() {
        let result: Result<i32> = Err(MarshalError::Parse("failed".to_string()));
        assert!(result.is_err());
    }
}
