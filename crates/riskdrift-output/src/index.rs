//! Cross-company `index.json`: per-company coverage/quality summaries plus
//! the metrics-summary, auto-pair, and featured-case surfaces from §11.4.

use crate::error::Result;
use riskdrift_core::pipeline::MetricsResult;
use riskdrift_core::types::SectionYear;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Coverage threshold tier. `Unknown` applies when a company has no valid
/// section-years at all (no confidence figures to threshold against).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    /// Coverage >= 9 valid years and minimum confidence >= 0.80.
    High,
    /// Coverage >= 7 valid years and minimum confidence >= 0.70.
    Medium,
    /// Everything else with at least one valid year.
    Low,
    /// No valid section-years.
    Unknown,
}

/// A company's year-coverage summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Coverage {
    /// Valid years, ascending.
    pub years: Vec<i32>,
    /// `years.len()`.
    pub count: usize,
    /// Earliest valid year, when any exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_year: Option<i32>,
    /// Latest valid year, when any exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_year: Option<i32>,
}

/// A company's quality tier and the confidence figures it was computed from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quality {
    /// Coverage/confidence tier.
    pub level: QualityLevel,
    /// Minimum per-year extraction confidence among valid years.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,
    /// Median per-year extraction confidence among valid years.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median_confidence: Option<f64>,
}

/// One named drift year-pair (used by both `metricsSummary` and `autoPair`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriftPoint {
    /// Earlier year.
    pub from: i32,
    /// Later year.
    pub to: i32,
    /// `drift_vs_prev` value for this pair.
    pub value: f64,
}

/// Peak- and latest-drift summary for a company.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    /// The year-pair with the largest populated `drift_vs_prev` value.
    pub peak: DriftPoint,
    /// The most recent populated year-pair.
    pub latest: DriftPoint,
}

/// A curated annotation attached to specific companies by ticker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedCase {
    /// Ticker this annotation was attached to.
    pub ticker: String,
    /// Short human-readable blurb.
    pub blurb: String,
}

/// One `companies[]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexCompanyEntry {
    /// Ticker symbol.
    pub ticker: String,
    /// Company name as registered with the SEC.
    pub company_name: String,
    /// Zero-padded 10-digit CIK.
    pub cik: String,
    /// Standard Industrial Classification code, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sic: Option<String>,
    /// Human-readable SIC description, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sic_description: Option<String>,
    /// Listing exchange, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    /// Year-coverage summary.
    pub coverage: Coverage,
    /// Quality tier.
    pub quality: Quality,
    /// Peak/latest drift summary, when at least one pair was computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_summary: Option<MetricsSummary>,
    /// The single most interesting (highest-drift) year-pair.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_pair: Option<DriftPoint>,
    /// Curated annotation, when this ticker appears in the featured-case list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_case: Option<FeaturedCase>,
}

/// The cross-company `index.json` artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexArtifact {
    /// Index schema version.
    pub version: u32,
    /// RFC 3339 UTC timestamp of index generation.
    pub generated_at_utc: String,
    /// Section label these summaries were computed over.
    pub section: String,
    /// Configured lookback window, in years.
    pub lookback_target_years: u32,
    /// `companies.len()`.
    pub company_count: usize,
    /// Per-company summaries.
    pub companies: Vec<IndexCompanyEntry>,
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 { sorted[n / 2] } else { (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0 }
}

fn quality_for(confidences: &[f64], coverage_count: usize) -> Quality {
    if confidences.is_empty() {
        return Quality { level: QualityLevel::Unknown, min_confidence: None, median_confidence: None };
    }
    let mut sorted = confidences.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let min_confidence = sorted[0];
    let median_confidence = median(&sorted);

    let level = if coverage_count >= 9 && min_confidence >= 0.80 {
        QualityLevel::High
    } else if coverage_count >= 7 && min_confidence >= 0.70 {
        QualityLevel::Medium
    } else {
        QualityLevel::Low
    };
    Quality { level, min_confidence: Some(min_confidence), median_confidence: Some(median_confidence) }
}

fn coverage_for(section_years: &[SectionYear]) -> (Coverage, Vec<f64>) {
    let mut valid: Vec<&SectionYear> = section_years.iter().filter(|y| y.is_valid()).collect();
    valid.sort_by_key(|y| y.year);
    let years: Vec<i32> = valid.iter().map(|y| y.year).collect();
    let confidences: Vec<f64> = valid.iter().map(|y| y.confidence).collect();
    let coverage = Coverage {
        count: years.len(),
        min_year: years.first().copied(),
        max_year: years.last().copied(),
        years,
    };
    (coverage, confidences)
}

fn drift_points(metrics: &MetricsResult) -> Vec<DriftPoint> {
    metrics
        .drift_vs_prev
        .iter()
        .enumerate()
        .filter_map(|(i, value)| {
            let value = (*value)?;
            if i == 0 {
                return None;
            }
            Some(DriftPoint { from: metrics.years[i - 1], to: metrics.years[i], value })
        })
        .collect()
}

fn metrics_summary_for(metrics: &MetricsResult) -> (Option<MetricsSummary>, Option<DriftPoint>) {
    let points = drift_points(metrics);
    let Some(latest) = points.last().cloned() else { return (None, None) };
    let peak = points
        .iter()
        .cloned()
        .fold(points[0].clone(), |best, p| if p.value > best.value { p } else { best });
    let summary = MetricsSummary { peak: peak.clone(), latest };
    (Some(summary), Some(peak))
}

/// One company's worth of input to the index builder.
pub struct CompanyIndexInput<'a> {
    /// Ticker symbol.
    pub ticker: String,
    /// Company name.
    pub company_name: String,
    /// Zero-padded 10-digit CIK.
    pub cik: String,
    /// SIC code, when known.
    pub sic: Option<String>,
    /// SIC description, when known.
    pub sic_description: Option<String>,
    /// Listing exchange, when known.
    pub exchange: Option<String>,
    /// This company's full (including invalid) section-year series.
    pub section_years: &'a [SectionYear],
    /// This company's computed drift/CI/boilerplate series.
    pub metrics: &'a MetricsResult,
}

fn build_company_entry(input: &CompanyIndexInput<'_>, featured: &HashMap<String, String>) -> IndexCompanyEntry {
    let (coverage, confidences) = coverage_for(input.section_years);
    let quality = quality_for(&confidences, coverage.count);
    let (metrics_summary, auto_pair) = metrics_summary_for(input.metrics);
    let featured_case =
        featured.get(&input.ticker).map(|blurb| FeaturedCase { ticker: input.ticker.clone(), blurb: blurb.clone() });

    IndexCompanyEntry {
        ticker: input.ticker.clone(),
        company_name: input.company_name.clone(),
        cik: input.cik.clone(),
        sic: input.sic.clone(),
        sic_description: input.sic_description.clone(),
        exchange: input.exchange.clone(),
        coverage,
        quality,
        metrics_summary,
        auto_pair,
        featured_case,
    }
}

/// Build the cross-company index from already-computed per-company inputs.
/// `featured` maps ticker to a curated blurb; tickers absent from it simply
/// omit `featuredCase`.
pub fn build_index(
    generated_at_utc: &str,
    section: &str,
    lookback_target_years: u32,
    companies: &[CompanyIndexInput<'_>],
    featured: &HashMap<String, String>,
) -> IndexArtifact {
    let mut entries: Vec<IndexCompanyEntry> = companies.iter().map(|c| build_company_entry(c, featured)).collect();
    entries.sort_by(|a, b| a.ticker.cmp(&b.ticker));
    IndexArtifact {
        version: 1,
        generated_at_utc: generated_at_utc.to_string(),
        section: section.to_string(),
        lookback_target_years,
        company_count: entries.len(),
        companies: entries,
    }
}

/// Write the index artifact to `path`.
pub fn write_index(path: &Path, index: &IndexArtifact) -> Result<()> {
    let json = serde_json::to_string_pretty(index)?;
    fs::write(path, json).map_err(|source| crate::error::OutputError::Io { path: path.display().to_string(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year(y: i32, confidence: f64) -> SectionYear {
        SectionYear { year: y, text: "risk factors text".to_string(), paragraphs: vec!["p".to_string()], confidence }
    }

    #[test]
    fn high_quality_requires_nine_years_and_high_confidence() {
        let years: Vec<SectionYear> = (2015..2024).map(|y| year(y, 0.85)).collect();
        let (coverage, confidences) = coverage_for(&years);
        let quality = quality_for(&confidences, coverage.count);
        assert_eq!(coverage.count, 9);
        assert_eq!(quality.level, QualityLevel::High);
    }

    #[test]
    fn low_confidence_caps_quality_at_low() {
        let years: Vec<SectionYear> = (2015..2024).map(|y| year(y, 0.55)).collect();
        let (coverage, confidences) = coverage_for(&years);
        let quality = quality_for(&confidences, coverage.count);
        assert_eq!(quality.level, QualityLevel::Low);
    }

    #[test]
    fn no_valid_years_yields_unknown_quality() {
        let years = vec![year(2023, 0.1)];
        let (coverage, confidences) = coverage_for(&years);
        let quality = quality_for(&confidences, coverage.count);
        assert_eq!(quality.level, QualityLevel::Unknown);
    }

    #[test]
    fn metrics_summary_picks_highest_drift_as_peak() {
        let metrics = MetricsResult {
            years: vec![2021, 2022, 2023],
            drift_vs_prev: vec![None, Some(0.10), Some(0.40)],
            drift_ci_low: vec![None, Some(0.05), Some(0.30)],
            drift_ci_high: vec![None, Some(0.15), Some(0.50)],
            boilerplate_score: vec![None, Some(0.5), Some(0.2)],
        };
        let (summary, auto_pair) = metrics_summary_for(&metrics);
        let summary = summary.unwrap();
        assert_eq!(summary.peak.value, 0.40);
        assert_eq!(summary.latest.to, 2023);
        assert_eq!(auto_pair.unwrap().value, 0.40);
    }

    #[test]
    fn featured_case_only_attaches_to_listed_tickers() {
        let mut featured = HashMap::new();
        featured.insert("ACME".to_string(), "Notable pivot into cybersecurity risk.".to_string());
        let metrics = MetricsResult {
            years: vec![2023],
            drift_vs_prev: vec![None],
            drift_ci_low: vec![None],
            drift_ci_high: vec![None],
            boilerplate_score: vec![None],
        };
        let section_years = vec![year(2023, 0.9)];
        let acme = CompanyIndexInput {
            ticker: "ACME".to_string(),
            company_name: "Acme Corp".to_string(),
            cik: "0000000001".to_string(),
            sic: None,
            sic_description: None,
            exchange: None,
            section_years: &section_years,
            metrics: &metrics,
        };
        let other = CompanyIndexInput {
            ticker: "ZEBRA".to_string(),
            company_name: "Zebra Inc".to_string(),
            cik: "0000000002".to_string(),
            sic: None,
            sic_description: None,
            exchange: None,
            section_years: &section_years,
            metrics: &metrics,
        };
        let index = build_index("2026-01-01T00:00:00Z", "Item 1A", 10, &[acme, other], &featured);
        assert!(index.companies[0].featured_case.is_some());
        assert!(index.companies[1].featured_case.is_none());
    }
}
