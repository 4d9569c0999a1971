//! Error types for the risk-drift analytic pipeline.

use thiserror::Error;

/// Errors raised by the pure text-analytic pipeline.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A canonical-terms specification failed validation.
    #[error("canonical terms specification invalid: {0}")]
    CanonicalTermsInvalid(String),

    /// A regular expression failed to compile. Indicates a programming error,
    /// since all patterns used by this crate are compile-time constants.
    #[error("internal pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),

    /// JSON (de)serialization of a specification or artifact type failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A computation was attempted on an empty or otherwise degenerate corpus.
    #[error("empty corpus: {0}")]
    EmptyCorpus(String),
}

/// Result alias used throughout `riskdrift-core`.
pub type Result<T> = std::result::Result<T, CoreError>;
