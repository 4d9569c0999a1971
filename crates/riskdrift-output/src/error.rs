//! Error types for artifact writing.

use thiserror::Error;

/// Result alias used throughout `riskdrift-output`.
pub type Result<T> = std::result::Result<T, OutputError>;

/// Errors raised while writing or reading JSON artifacts.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Serialization or deserialization of an artifact failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing or reading an artifact file failed.
    #[error("IO error writing {path}: {source}")]
    Io {
        /// Path of the artifact being written or read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
