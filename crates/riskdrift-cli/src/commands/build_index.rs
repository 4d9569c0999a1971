//! `build-index`: sweep a directory of per-company artifact subdirectories
//! and summarize them into the cross-company `index.json`.

use crate::error::{AppError, Result};
use riskdrift_core::pipeline::MetricsResult;
use riskdrift_core::types::SectionYear;
use riskdrift_output::artifacts::MetricsArtifact;
use riskdrift_output::index::{CompanyIndexInput, build_index, write_index};
use riskdrift_output::CompanyMeta;
use std::collections::HashMap;
use std::path::PathBuf;

const SECTION_LABEL: &str = "Item 1A";

/// Arguments for `build-index`.
pub struct Args {
    /// Directory containing one subdirectory per company's artifacts.
    pub data_dir: PathBuf,
    /// Where to write `index.json`.
    pub out: PathBuf,
    /// Lookback window to record on the index (informational only).
    pub lookback_target_years: u32,
    /// Ticker -> curated blurb, attached as `featuredCase` when present.
    pub featured: HashMap<String, String>,
}

/// Run `build-index`.
pub fn run(args: Args) -> Result<()> {
    let mut entries = Vec::new();
    for dir_entry in std::fs::read_dir(&args.data_dir)? {
        let dir_entry = dir_entry?;
        let path = dir_entry.path();
        if !path.is_dir() {
            continue;
        }
        let meta_path = path.join("meta.json");
        if !meta_path.exists() {
            continue;
        }
        entries.push(load_company(&path)?);
    }

    let inputs: Vec<CompanyIndexInput<'_>> = entries
        .iter()
        .map(|(meta, section_years, metrics)| CompanyIndexInput {
            ticker: meta.ticker.clone(),
            company_name: meta.company_name.clone(),
            cik: meta.cik.clone(),
            sic: None,
            sic_description: None,
            exchange: None,
            section_years,
            metrics,
        })
        .collect();

    let generated_at = chrono::Utc::now().to_rfc3339();
    let index = build_index(&generated_at, SECTION_LABEL, args.lookback_target_years, &inputs, &args.featured);
    write_index(&args.out, &index)?;

    tracing::info!(companies = index.company_count, out = %args.out.display(), "wrote index");
    Ok(())
}

/// Load one company's `meta.json` and `metrics_10k_item1a.json`, and
/// reconstruct a minimal `SectionYear` series (text/paragraphs are not
/// needed for coverage/quality computation, only confidence and validity).
fn load_company(dir: &std::path::Path) -> Result<(CompanyMeta, Vec<SectionYear>, MetricsResult)> {
    let meta: CompanyMeta = serde_json::from_str(&std::fs::read_to_string(dir.join("meta.json"))?)?;
    let metrics_path = dir.join("metrics_10k_item1a.json");
    let metrics: MetricsArtifact = serde_json::from_str(&std::fs::read_to_string(&metrics_path)?)
        .map_err(|e| AppError::validation(format!("parsing {}: {e}", metrics_path.display())))?;

    let filings: Vec<riskdrift_output::FilingRecord> =
        serde_json::from_str(&std::fs::read_to_string(dir.join("filings.json"))?)?;
    let confidence_by_year: HashMap<i32, f64> = filings.iter().map(|f| (f.year, f.extraction.confidence)).collect();

    let section_years = metrics
        .years
        .iter()
        .map(|&year| {
            let confidence = confidence_by_year.get(&year).copied().unwrap_or(0.0);
            let text = if confidence >= 0.5 { "x".to_string() } else { String::new() };
            SectionYear { year, text, paragraphs: Vec::new(), confidence }
        })
        .collect();

    let result = MetricsResult {
        years: metrics.years,
        drift_vs_prev: metrics.drift_vs_prev,
        drift_ci_low: metrics.drift_ci_low,
        drift_ci_high: metrics.drift_ci_high,
        boilerplate_score: metrics.boilerplate_score,
    };

    Ok((meta, section_years, result))
}
