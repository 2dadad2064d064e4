//! Error types for the Gatehouse request queue.

use thiserror::Error;

/// Queue and session level errors
#[derive(Debug, Error)]
pub enum GatehouseError {
    #[error("Invalid request kind: {0}")]
    InvalidKind(String),

    #[error("Invalid priority: {0}")]
    InvalidPriority(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Errors raised by the spreadsheet backend collaborator
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Row {index} out of range for sheet {sheet}")]
    RowOutOfRange { sheet: String, index: usize },

    #[error("Write rejected: {0}")]
    WriteRejected(String),
}

impl From<config::ConfigError> for GatehouseError {
    fn from(err: config::ConfigError) -> Self {
        GatehouseError::ConfigError(err.to_string())
    }
}
