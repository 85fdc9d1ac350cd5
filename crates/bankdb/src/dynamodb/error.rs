//! Error types for DynamoDB operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for the dynamodb module.
pub type Result<T> = std::result::Result<T, DynamodbError>;

/// Errors that can occur during DynamoDB operations.
#[derive(Error, Debug)]
pub enum DynamodbError {
    #[error("AWS SDK error: {0}")]
    AwsSdk(String),

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid table spec '{table_name}': {reason}")]
    InvalidTableSpec { table_name: String, reason: String },

    #[error("unsupported attribute value tag '{tag}' in item for table '{table_name}'")]
    UnsupportedAttributeValue { table_name: String, tag: String },

    #[error("malformed item for table '{table_name}': {reason}")]
    MalformedItem { table_name: String, reason: String },

    #[error("gave up on table '{table_name}' after {attempts} batch writes, {remaining} items still unprocessed")]
    RetriesExhausted {
        table_name: String,
        attempts: u32,
        remaining: usize,
    },

    #[error("timeout waiting for table '{table_name}' to become active")]
    TableActivationTimeout { table_name: String },

    #[error("operation cancelled by user")]
    UserCancelled,

    #[error("prompt failed: {0}")]
    Prompt(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_error_is_not_labelled_as_a_store_error() {
        let err = DynamodbError::Prompt("not a terminal".to_string());

        assert_eq!(err.to_string(), "prompt failed: not a terminal");
    }
}
