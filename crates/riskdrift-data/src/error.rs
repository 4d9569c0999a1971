//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid symbol
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Cache error
    #[error("Cache error: {0}")]
    Cache(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// SEC EDGAR API error
    #[error("EDGAR API error: {0}")]
    EdgarApi(String),

    /// CIK not found for ticker
    #[error("CIK not found for ticker: {0}")]
    CikNotFound(String),

    /// Filing not found
    #[error("Filing not found: {0}")]
    FilingNotFound(String),

    /// Requests were rate-limited or throttled past the configured retry budget.
    #[error("exhausted {attempts} retry attempts against {url}: last status {last_status}")]
    RetriesExhausted {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// The URL being requested.
        url: String,
        /// The last HTTP status observed.
        last_status: u16,
    },

    /// No `User-Agent` was configured; SEC EDGAR requires one identifying
    /// the requester and a contact, so this is a configuration error, not a
    /// fetch error, and must be raised before any request is attempted.
    #[error("no SEC user agent configured: pass --user-agent or set SEC_USER_AGENT")]
    MissingUserAgent,
}
