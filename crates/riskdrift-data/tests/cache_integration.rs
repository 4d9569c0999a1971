//! Integration tests for the on-disk filing cache: round-tripping filing
//! bodies and risk-factors extracts across two companies, usage reporting,
//! and size-limit eviction.

use riskdrift_data::cache::{FilingCache, FilingMeta, RiskFactorsMeta, enforce_size_limit, usage_report};

struct TempDir(std::path::PathBuf);

impl TempDir {
    fn new(label: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("riskdrift-cache-it-{label}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.0).ok();
    }
}

fn filing_meta(form: &str) -> FilingMeta {
    FilingMeta {
        form_type: form.to_string(),
        filing_date: "2023-11-03".to_string(),
        report_date: "2023-09-30".to_string(),
        primary_document: "form10k.htm".to_string(),
        sha256: "deadbeef".to_string(),
    }
}

fn risk_meta(confidence: f64) -> RiskFactorsMeta {
    RiskFactorsMeta {
        confidence,
        method: "html_heading".to_string(),
        warnings: Vec::new(),
        extractor_version: "1.0".to_string(),
    }
}

#[test]
fn filing_and_risk_factors_round_trip_independently_per_accession() {
    let temp = TempDir::new("round-trip");
    let cache = FilingCache::new(&temp.0);

    let html = "<html><body>Item 1A. Risk Factors. We face competition.</body></html>";
    cache.save_filing("0000320193", "0000320193-23-000077", html, &filing_meta("10-K")).unwrap();

    assert_eq!(cache.load_filing_html("0000320193", "0000320193-23-000077").unwrap().as_deref(), Some(html));
    assert!(cache.load_risk_text("0000320193", "0000320193-23-000077", "10-K").unwrap().is_none());

    let extracted = "We face competition in every market we serve.";
    cache.save_risk_factors("0000320193", "0000320193-23-000077", "10-K", extracted, &risk_meta(0.92)).unwrap();

    let loaded_text = cache.load_risk_text("0000320193", "0000320193-23-000077", "10-K").unwrap();
    assert_eq!(loaded_text.as_deref(), Some(extracted));

    let loaded_meta = cache.load_risk_meta("0000320193", "0000320193-23-000077").unwrap().unwrap();
    assert_eq!(loaded_meta.method, "html_heading");
    assert!((loaded_meta.confidence - 0.92).abs() < 1e-9);
}

#[test]
fn twenty_f_filings_cache_under_a_distinct_key_from_ten_k() {
    let temp = TempDir::new("20f-key");
    let cache = FilingCache::new(&temp.0);

    cache.save_risk_factors("0001234567", "acc-1", "10-K", "ten-k risk text", &risk_meta(0.8)).unwrap();
    cache.save_risk_factors("0001234567", "acc-1", "20-F", "twenty-f risk text", &risk_meta(0.8)).unwrap();

    let ten_k = cache.load_risk_text("0001234567", "acc-1", "10-K").unwrap();
    let twenty_f = cache.load_risk_text("0001234567", "acc-1", "20-F").unwrap();
    assert_eq!(ten_k.as_deref(), Some("ten-k risk text"));
    assert_eq!(twenty_f.as_deref(), Some("twenty-f risk text"));
}

#[test]
fn usage_report_aggregates_bytes_and_files_per_cik_across_companies() {
    let temp = TempDir::new("usage");
    let cache = FilingCache::new(&temp.0);

    cache.save_filing("0000320193", "acc-aapl-1", &"a".repeat(500), &filing_meta("10-K")).unwrap();
    cache.save_filing("0000320193", "acc-aapl-2", &"b".repeat(500), &filing_meta("10-K")).unwrap();
    cache.save_filing("0000789019", "acc-msft-1", &"c".repeat(500), &filing_meta("10-K")).unwrap();

    let report = usage_report(&temp.0);
    assert_eq!(report.per_cik.len(), 2);
    assert!(report.total_files >= 6, "2 files per save_filing call across 3 calls");
    assert!(report.total_bytes > 0);

    let (aapl_bytes, aapl_files) = report.per_cik["0000320193"];
    assert_eq!(aapl_files, 4);
    let (msft_bytes, msft_files) = report.per_cik["0000789019"];
    assert_eq!(msft_files, 2);
    assert!(aapl_bytes > msft_bytes / 3);
}

#[test]
fn enforce_size_limit_evicts_raw_html_before_exceeding_is_a_noop() {
    let temp = TempDir::new("eviction");
    let cache = FilingCache::new(&temp.0);

    for i in 0..5 {
        cache
            .save_filing("0000320193", &format!("acc-{i}"), &"x".repeat(10_000), &filing_meta("10-K"))
            .unwrap();
    }

    let removed_none = enforce_size_limit(&temp.0, 5.0).unwrap();
    assert!(removed_none.is_empty(), "well under the cap, nothing should be evicted");

    let removed = enforce_size_limit(&temp.0, 0.000001).unwrap();
    assert!(!removed.is_empty(), "a near-zero cap should force eviction of raw html bodies");
    for path in &removed {
        assert_eq!(path.file_name().unwrap(), "filing.html.gz");
    }

    for i in 0..5 {
        assert!(cache.load_filing_meta("0000320193", &format!("acc-{i}")).unwrap().is_some(), "meta survives eviction");
    }
}

#[test]
fn missing_risk_factors_cache_entry_is_none_not_an_error() {
    let temp = TempDir::new("missing");
    let cache = FilingCache::new(&temp.0);
    assert!(cache.load_risk_text("0000000001", "nonexistent", "10-K").unwrap().is_none());
    assert!(cache.load_risk_meta("0000000001", "nonexistent").unwrap().is_none());
}
