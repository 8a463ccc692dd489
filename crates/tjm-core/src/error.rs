use thiserror::Error;

/// Application-wide error types for the TJM pipeline.
#[derive(Error, Debug)]
pub enum AppError {
    /// Raw record is not an object or lacks a non-empty identity field.
    /// The only error that drops a record before it is scored.
    #[error("Structural error: {0}")]
    StructuralError(String),

    /// Missing or invalid configuration, unreachable input or sinks.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A row with the same `(source, source_id)` already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Non-database sink write failed (e.g. the backup file).
    #[error("Sink error: {0}")]
    SinkError(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Operation timed out.
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    /// File system operation failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Another pipeline run is still active on this orchestrator.
    #[error("A pipeline run is already in progress")]
    RunInProgress,
}

impl AppError {
    /// Returns true if this error is transient and worth retrying.
    ///
    /// Constraint violations are never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) => true,
            AppError::DatabaseError(msg) => {
                msg.contains("connection") || msg.contains("reset") || msg.contains("timed out")
            }
            _ => false,
        }
    }

    /// Returns true for uniqueness-constraint violations.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, AppError::DuplicateKey(_))
    }
}
