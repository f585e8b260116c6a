//! Error types for the Stackforge service.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StackforgeError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("LLM provider error: {0}")]
    LlmError(String),
    #[error("Archive error: {0}")]
    ArchiveError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl From<sqlx::Error> for StackforgeError {
    fn from(err: sqlx::Error) -> Self {
        StackforgeError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for StackforgeError {
    fn from(err: serde_json::Error) -> Self {
        StackforgeError::ValidationError(format!("JSON serialization error: {err}"))
    }
}

impl From<config::ConfigError> for StackforgeError {
    fn from(err: config::ConfigError) -> Self {
        StackforgeError::ConfigurationError(err.to_string())
    }
}

pub type StackforgeResult<T> = anyhow::Result<T, StackforgeError>;
