//! CLI-level error type and exit-code mapping.
//!
//! Per the external interface contract: 0 on success, 2 on a validation
//! error (bad input, bad config, schema violations), 3 on anything else
//! unexpected (I/O, network, serialization failures bubbling up from a
//! collaborator crate).

use thiserror::Error;

/// Errors surfaced at the CLI boundary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad input, bad flags, or a schema violation. Exit code 2.
    #[error("{0}")]
    Validation(String),

    /// Everything else: I/O, network, or an unexpected failure from a
    /// collaborator crate. Exit code 3.
    #[error("{0}")]
    Unexpected(String),
}

impl AppError {
    /// Process exit code for this error.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Unexpected(_) => 3,
        }
    }

    /// Build a validation error from a message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<riskdrift_data::DataError> for AppError {
    fn from(err: riskdrift_data::DataError) -> Self {
        match err {
            riskdrift_data::DataError::MissingUserAgent
            | riskdrift_data::DataError::InvalidSymbol(_)
            | riskdrift_data::DataError::CikNotFound(_) => Self::Validation(err.to_string()),
            other => Self::Unexpected(other.to_string()),
        }
    }
}

impl From<riskdrift_output::OutputError> for AppError {
    fn from(err: riskdrift_output::OutputError) -> Self {
        Self::Unexpected(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Unexpected(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unexpected(err.to_string())
    }
}

/// Result alias used throughout the binary.
pub type Result<T> = std::result::Result<T, AppError>;
