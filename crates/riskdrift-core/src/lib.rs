#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/riskdrift/riskdrift-rs/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod canonical;
pub mod error;
pub mod excerpt;
pub mod html;
pub mod lexicon;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod section;
pub mod shift;
pub mod tokenize;
pub mod types;
pub mod year;

pub use error::{CoreError, Result};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
