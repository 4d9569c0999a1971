#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/riskdrift/riskdrift-rs/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod artifacts;
pub mod error;
pub mod index;

pub use artifacts::{
    CompanyMeta, ExcerptsArtifact, ExtractionSummary, FilingExtraction, FilingRecord, MetricsArtifact,
    SimilarityArtifact, ShiftsArtifact,
};
pub use error::{OutputError, Result};
pub use index::{
    Coverage, DriftPoint, FeaturedCase, IndexArtifact, IndexCompanyEntry, MetricsSummary, Quality, QualityLevel,
};

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
