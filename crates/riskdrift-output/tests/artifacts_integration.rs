//! Integration tests covering the full per-company artifact write/read
//! round-trip (driven by a real pipeline analysis) and the cross-company
//! index builder over several synthetic companies.

use riskdrift_core::pipeline::{analyze_company, MetricsResult};
use riskdrift_core::types::SectionYear;
use riskdrift_output::artifacts::{
    ExcerptsArtifact, FilingExtraction, FilingRecord, MetricsArtifact, ShiftsArtifact, SimilarityArtifact,
    write_company_artifacts,
};
use riskdrift_output::index::{build_index, write_index, CompanyIndexInput, IndexArtifact, QualityLevel};
use riskdrift_output::{CompanyMeta, ExtractionSummary};
use std::collections::{BTreeMap, HashMap};

struct TempDir(std::path::PathBuf);

impl TempDir {
    fn new(label: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("riskdrift-output-it-{label}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.0).ok();
    }
}

fn section_year(year: i32, text: &str) -> SectionYear {
    let paragraphs: Vec<String> = text.split("\n\n").map(str::to_string).collect();
    SectionYear { year, text: text.to_string(), paragraphs, confidence: 0.9 }
}

const YEAR_A: &str = "We face significant competition across our core product lines and geographic markets. \
Our manufacturing depends on a concentrated set of overseas suppliers subject to tariff and logistics risk.";

const YEAR_B: &str = "Artificial intelligence adoption introduces new operational, competitive, and regulatory risk. \
Cybersecurity incidents could disrupt operations, compromise data, and harm our reputation with customers.";

#[test]
fn company_artifacts_round_trip_with_expected_casing_per_file() {
    let temp = TempDir::new("company");
    let years = vec![section_year(2022, YEAR_A), section_year(2023, YEAR_B)];
    let analysis = analyze_company(&years, None);

    let meta = CompanyMeta {
        ticker: "ACME".to_string(),
        cik: "0000000123".to_string(),
        company_name: "Acme Corp".to_string(),
        last_updated_utc: "2026-01-01T00:00:00Z".to_string(),
        forms_included: vec!["10-K".to_string()],
        sections_included: vec!["Item 1A".to_string()],
        notes: Vec::new(),
        extraction: Some(ExtractionSummary {
            method_counts: BTreeMap::from([("html_heading".to_string(), 2)]),
            warning_counts: BTreeMap::new(),
        }),
    };
    let filings = vec![
        FilingRecord {
            year: 2022,
            form: "10-K".to_string(),
            filing_date: "2022-11-01".to_string(),
            report_date: "2022-09-30".to_string(),
            accession_number: "0000000123-22-000001".to_string(),
            primary_document: "acme-20220930.htm".to_string(),
            sec_url: "https://www.sec.gov/Archives/edgar/data/123/acme-20220930.htm".to_string(),
            extraction: FilingExtraction { confidence: 0.9, method: "html_heading".to_string(), errors: Vec::new() },
        },
        FilingRecord {
            year: 2023,
            form: "10-K".to_string(),
            filing_date: "2023-11-01".to_string(),
            report_date: "2023-09-30".to_string(),
            accession_number: "0000000123-23-000001".to_string(),
            primary_document: "acme-20230930.htm".to_string(),
            sec_url: "https://www.sec.gov/Archives/edgar/data/123/acme-20230930.htm".to_string(),
            extraction: FilingExtraction { confidence: 0.9, method: "html_heading".to_string(), errors: Vec::new() },
        },
    ];

    write_company_artifacts(&temp.0, &meta, &filings, "Item 1A", &analysis).unwrap();

    for file in [
        "meta.json",
        "filings.json",
        "metrics_10k_item1a.json",
        "similarity_10k_item1a.json",
        "shifts_10k_item1a.json",
        "excerpts_10k_item1a.json",
    ] {
        assert!(temp.0.join(file).exists(), "{file} was not written");
    }

    let meta_raw = std::fs::read_to_string(temp.0.join("meta.json")).unwrap();
    let round_tripped: CompanyMeta = serde_json::from_str(&meta_raw).unwrap();
    assert_eq!(round_tripped, meta);
    assert!(meta_raw.contains("\"companyName\""), "meta.json uses camelCase");

    let metrics_raw = std::fs::read_to_string(temp.0.join("metrics_10k_item1a.json")).unwrap();
    let metrics: MetricsArtifact = serde_json::from_str(&metrics_raw).unwrap();
    assert_eq!(metrics.years, vec![2022, 2023]);
    assert!(metrics_raw.contains("\"drift_vs_prev\""), "metrics artifact keeps snake_case field names");
    assert!(!metrics_raw.contains("\"driftVsPrev\""));

    let similarity_raw = std::fs::read_to_string(temp.0.join("similarity_10k_item1a.json")).unwrap();
    let similarity: SimilarityArtifact = serde_json::from_str(&similarity_raw).unwrap();
    assert!(similarity_raw.contains("\"cosineSimilarity\""), "similarity artifact uses camelCase");
    assert_eq!(similarity.years, vec![2022, 2023]);

    let shifts_raw = std::fs::read_to_string(temp.0.join("shifts_10k_item1a.json")).unwrap();
    let shifts: ShiftsArtifact = serde_json::from_str(&shifts_raw).unwrap();
    assert_eq!(shifts.year_pairs.len(), 1);

    let excerpts_raw = std::fs::read_to_string(temp.0.join("excerpts_10k_item1a.json")).unwrap();
    let excerpts: ExcerptsArtifact = serde_json::from_str(&excerpts_raw).unwrap();
    assert_eq!(excerpts.pairs.len(), 1);
}

fn synthetic_metrics(years: Vec<i32>, drift: Vec<Option<f64>>) -> MetricsResult {
    let len = years.len();
    MetricsResult {
        years,
        drift_vs_prev: drift,
        drift_ci_low: vec![None; len],
        drift_ci_high: vec![None; len],
        boilerplate_score: vec![None; len],
    }
}

#[test]
fn index_build_and_write_round_trips_across_several_companies_with_distinct_tiers() {
    let temp = TempDir::new("index");

    let high_years: Vec<SectionYear> = (2015..2024).map(|y| section_year(y, YEAR_A)).collect();
    let high_metrics = synthetic_metrics(
        (2015..2024).collect(),
        std::iter::once(None).chain((2016..2024).map(|_| Some(0.05))).collect(),
    );

    let low_years = vec![section_year(2023, YEAR_B)];
    let low_metrics = synthetic_metrics(vec![2023], vec![None]);

    let featured = HashMap::from([("HIGH".to_string(), "Nine-year steady filer.".to_string())]);

    let inputs = vec![
        CompanyIndexInput {
            ticker: "HIGH".to_string(),
            company_name: "Steady Corp".to_string(),
            cik: "0000000001".to_string(),
            sic: None,
            sic_description: None,
            exchange: None,
            section_years: &high_years,
            metrics: &high_metrics,
        },
        CompanyIndexInput {
            ticker: "LOW".to_string(),
            company_name: "Newcomer Inc".to_string(),
            cik: "0000000002".to_string(),
            sic: None,
            sic_description: None,
            exchange: None,
            section_years: &low_years,
            metrics: &low_metrics,
        },
    ];

    let index = build_index("2026-01-01T00:00:00Z", "Item 1A", 10, &inputs, &featured);
    let out_path = temp.0.join("index.json");
    write_index(&out_path, &index).unwrap();

    let raw = std::fs::read_to_string(&out_path).unwrap();
    let round_tripped: IndexArtifact = serde_json::from_str(&raw).unwrap();
    assert_eq!(round_tripped.company_count, 2);

    let high = round_tripped.companies.iter().find(|c| c.ticker == "HIGH").unwrap();
    assert_eq!(high.quality.level, QualityLevel::High);
    assert!(high.featured_case.is_some());

    let low = round_tripped.companies.iter().find(|c| c.ticker == "LOW").unwrap();
    assert_eq!(low.quality.level, QualityLevel::Low, "a single covered year falls short of the medium/high tiers");
    assert!(low.metrics_summary.is_none(), "a single year has no prior-year drift pair to summarize");
    assert!(low.featured_case.is_none());
    assert!(raw.contains("\"lookbackTargetYears\""));
}
