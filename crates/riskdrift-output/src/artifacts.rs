//! Per-company JSON artifact types and writers: `meta.json`, `filings.json`,
//! `metrics_10k_item1a.json`, `similarity_10k_item1a.json`,
//! `shifts_10k_item1a.json`, `excerpts_10k_item1a.json`.
//!
//! `metrics_10k_item1a.json` keeps the snake_case field names the rest of
//! this workspace's JSON artifacts don't use elsewhere (`drift_vs_prev` and
//! friends) - reproduced as-is rather than normalized to camelCase; see
//! `DESIGN.md`.

use crate::error::Result;
use riskdrift_core::pipeline::{CompanyAnalysis, MetricsResult, SimilarityResult};
use riskdrift_core::types::{ExcerptPair, ShiftPair};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

fn write_pretty<T: Serialize>(dir: &Path, file_name: &str, value: &T) -> Result<()> {
    let path = dir.join(file_name);
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&path, json).map_err(|source| crate::error::OutputError::Io { path: path.display().to_string(), source })
}

/// Per-year extraction method/warning tallies attached to `meta.json`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionSummary {
    /// Count of section-years extracted by each [`riskdrift_core::types::ExtractionMethod`] tag.
    pub method_counts: BTreeMap<String, u64>,
    /// Count of each diagnostic warning tag observed across all filings.
    pub warning_counts: BTreeMap<String, u64>,
}

/// `meta.json`: company identity and run-level notes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompanyMeta {
    /// Ticker symbol as resolved at fetch time.
    pub ticker: String,
    /// Zero-padded 10-digit CIK.
    pub cik: String,
    /// Company name as registered with the SEC.
    pub company_name: String,
    /// RFC 3339 UTC timestamp of when this company's artifacts were last built.
    pub last_updated_utc: String,
    /// Distinct SEC form types included (e.g. `10-K`, `20-F`).
    pub forms_included: Vec<String>,
    /// Distinct section labels included (e.g. `Item 1A`).
    pub sections_included: Vec<String>,
    /// Free-form operator notes (degraded years, skipped filings, etc.).
    pub notes: Vec<String>,
    /// Aggregate extraction-method/warning tallies, when computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionSummary>,
}

/// Extraction diagnostics embedded in one `filings.json` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilingExtraction {
    /// Extraction confidence in `[0, 1]`.
    pub confidence: f64,
    /// Strategy that produced the extract.
    pub method: String,
    /// Diagnostic warning tags raised during extraction.
    pub errors: Vec<String>,
}

/// One `filings.json` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilingRecord {
    /// Resolved section year.
    pub year: i32,
    /// SEC form type.
    pub form: String,
    /// Date the filing was submitted, `YYYY-MM-DD`.
    pub filing_date: String,
    /// Date the filing reports on, `YYYY-MM-DD`.
    pub report_date: String,
    /// SEC accession number, dashed form.
    pub accession_number: String,
    /// Primary document filename within the filing.
    pub primary_document: String,
    /// Public EDGAR Archives URL for the primary document.
    pub sec_url: String,
    /// Extraction diagnostics for this filing's section.
    pub extraction: FilingExtraction,
}

/// `metrics_10k_item1a.json`. Field names are intentionally snake_case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsArtifact {
    /// Section label these metrics were computed over.
    pub section: String,
    /// Full year series, ascending (including invalid years).
    pub years: Vec<i32>,
    /// `1 - cosine_similarity` against the prior year; `null` at position 0
    /// and wherever either side of the pair is an invalid section-year.
    pub drift_vs_prev: Vec<Option<f64>>,
    /// 5th-percentile bootstrap bound on drift.
    pub drift_ci_low: Vec<Option<f64>>,
    /// 95th-percentile bootstrap bound on drift.
    pub drift_ci_high: Vec<Option<f64>>,
    /// Sentence-reuse boilerplate score against the prior year.
    pub boilerplate_score: Vec<Option<f64>>,
}

/// `similarity_10k_item1a.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityArtifact {
    /// Section label this matrix was computed over.
    pub section: String,
    /// Valid years included, ascending.
    pub years: Vec<i32>,
    /// Square, symmetric cosine-similarity matrix; diagonal exactly `1.0`.
    pub cosine_similarity: Vec<Vec<f64>>,
}

/// `shifts_10k_item1a.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShiftsArtifact {
    /// Section label these shift pairs were computed over.
    pub section: String,
    /// One entry per valid adjacent year pair.
    pub year_pairs: Vec<ShiftPair>,
}

/// `excerpts_10k_item1a.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExcerptsArtifact {
    /// Section label these excerpts were drawn from.
    pub section: String,
    /// One entry per valid adjacent year pair, same pairing as `ShiftsArtifact`.
    pub pairs: Vec<ExcerptPair>,
}

/// Project a [`CompanyAnalysis`] into the `metrics_10k_item1a.json` and
/// `similarity_10k_item1a.json` shapes.
pub fn metrics_artifact(section: &str, metrics: &MetricsResult) -> MetricsArtifact {
    MetricsArtifact {
        section: section.to_string(),
        years: metrics.years.clone(),
        drift_vs_prev: metrics.drift_vs_prev.clone(),
        drift_ci_low: metrics.drift_ci_low.clone(),
        drift_ci_high: metrics.drift_ci_high.clone(),
        boilerplate_score: metrics.boilerplate_score.clone(),
    }
}

/// Project a [`CompanyAnalysis`]'s similarity matrix into artifact shape.
pub fn similarity_artifact(section: &str, similarity: &SimilarityResult) -> SimilarityArtifact {
    SimilarityArtifact { section: section.to_string(), years: similarity.years.clone(), cosine_similarity: similarity.matrix.clone() }
}

/// Project shift pairs into artifact shape.
pub fn shifts_artifact(section: &str, shift_pairs: &[ShiftPair]) -> ShiftsArtifact {
    ShiftsArtifact { section: section.to_string(), year_pairs: shift_pairs.to_vec() }
}

/// Project excerpt pairs into artifact shape.
pub fn excerpts_artifact(section: &str, excerpt_pairs: &[ExcerptPair]) -> ExcerptsArtifact {
    ExcerptsArtifact { section: section.to_string(), pairs: excerpt_pairs.to_vec() }
}

/// Write all six per-company artifacts into `dir`, which must already exist.
pub fn write_company_artifacts(
    dir: &Path,
    meta: &CompanyMeta,
    filings: &[FilingRecord],
    section: &str,
    analysis: &CompanyAnalysis,
) -> Result<()> {
    write_pretty(dir, "meta.json", meta)?;
    write_pretty(dir, "filings.json", filings)?;
    write_pretty(dir, "metrics_10k_item1a.json", &metrics_artifact(section, &analysis.metrics))?;
    write_pretty(dir, "similarity_10k_item1a.json", &similarity_artifact(section, &analysis.similarity))?;
    write_pretty(dir, "shifts_10k_item1a.json", &shifts_artifact(section, &analysis.shift_pairs))?;
    write_pretty(dir, "excerpts_10k_item1a.json", &excerpts_artifact(section, &analysis.excerpt_pairs))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskdrift_core::pipeline::{MetricsResult, SimilarityResult};

    #[test]
    fn metrics_artifact_preserves_snake_case_field_names() {
        let metrics = MetricsResult {
            years: vec![2022, 2023],
            drift_vs_prev: vec![None, Some(0.12)],
            drift_ci_low: vec![None, Some(0.08)],
            drift_ci_high: vec![None, Some(0.18)],
            boilerplate_score: vec![None, Some(0.6)],
        };
        let artifact = metrics_artifact("Item 1A", &metrics);
        let json = serde_json::to_string(&artifact).unwrap();
        assert!(json.contains("\"drift_vs_prev\""));
        assert!(json.contains("\"boilerplate_score\""));
    }

    #[test]
    fn similarity_artifact_uses_camel_case() {
        let similarity = SimilarityResult { years: vec![2022], matrix: vec![vec![1.0]] };
        let artifact = similarity_artifact("Item 1A", &similarity);
        let json = serde_json::to_string(&artifact).unwrap();
        assert!(json.contains("\"cosineSimilarity\""));
    }
}
