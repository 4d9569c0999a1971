//! `fetch-and-build`: resolve a ticker, pull its annual filings (cached
//! where possible), run the extraction/normalization/drift pipeline, and
//! write the per-company JSON artifacts.

use crate::error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use riskdrift_core::canonical::CanonicalTermsMap;
use riskdrift_core::types::{Filing, SectionYear};
use riskdrift_core::{normalize, pipeline, section, year};
use riskdrift_data::cache::{EXTRACTOR_VERSION, FilingCache, FilingMeta, RiskFactorsMeta};
use riskdrift_data::edgar::EdgarClient;
use riskdrift_output::{CompanyMeta, ExtractionSummary, FilingExtraction, FilingRecord};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

const SECTION_LABEL: &str = "Item 1A";

/// Arguments for `fetch-and-build`.
pub struct Args {
    /// Ticker symbol to fetch.
    pub ticker: String,
    /// Number of most-recent distinct fiscal years to retain.
    pub years: u32,
    /// Output directory for this company's artifacts.
    pub out: PathBuf,
    /// Cap on the number of filings considered before fetching bodies.
    pub limit: Option<usize>,
    /// Also accept `20-F` foreign-private-issuer annual filings.
    pub include_20f: bool,
    /// `User-Agent` for SEC EDGAR requests.
    pub user_agent: String,
    /// Minimum interval between SEC EDGAR requests.
    pub rate_limit_interval: Duration,
    /// On-disk cache directory.
    pub cache_dir: PathBuf,
    /// Compiled canonical-terms map, when provided.
    pub canonical_terms: Option<CanonicalTermsMap>,
}

/// Run `fetch-and-build`.
pub async fn run(args: Args) -> Result<()> {
    let client = EdgarClient::with_rate_limit(&args.user_agent, args.rate_limit_interval)?;
    let cache = FilingCache::new(&args.cache_dir);

    let span = tracing::info_span!("fetch_and_build", ticker = %args.ticker);
    let _guard = span.enter();

    let company = client.resolve_ticker(&args.ticker).await?;
    tracing::info!(cik = %company.cik, name = %company.company_name, "resolved ticker");

    let mut annual = client.annual_filings(&company.cik, args.include_20f).await?;
    annual.sort_by_key(|f| f.filing_date);
    if let Some(limit) = args.limit {
        let start = annual.len().saturating_sub(limit);
        annual.drain(..start);
    }

    let candidate_filings: Vec<Filing> = annual
        .iter()
        .map(|f| Filing {
            cik: company.cik.clone(),
            accession_number: f.accession_number.clone(),
            form_type: f.form.clone(),
            filing_date: f.filing_date,
            report_date: f.report_date,
            primary_document: f.primary_document.clone(),
            raw_bytes: Vec::new(),
            section_year: None,
        })
        .collect();

    let mut resolved = year::resolve_section_years(candidate_filings);
    let keep_from = resolved.len().saturating_sub(args.years as usize);
    resolved.drain(..keep_from);

    let progress = ProgressBar::new(resolved.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("valid template")
            .progress_chars("█▓░"),
    );

    let mut section_years = Vec::with_capacity(resolved.len());
    let mut filing_records = Vec::with_capacity(resolved.len());
    let mut method_counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut warning_counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut notes = Vec::new();
    let mut forms_included: Vec<String> = Vec::new();

    for filing in &resolved {
        progress.set_message(format!("{}", filing.section_year.unwrap_or_default()));

        let (confidence, method, warnings, normalized_text) =
            extract_with_cache(&client, &cache, &company.cik, filing).await?;

        let year = filing.section_year.expect("resolve_section_years always assigns a year");
        let paragraphs = normalize::split_paragraphs(&normalized_text, normalize::DEFAULT_MIN_PARAGRAPH_CHARS);

        *method_counts.entry(method.clone()).or_insert(0) += 1;
        for warning in &warnings {
            *warning_counts.entry(warning.clone()).or_insert(0) += 1;
        }
        if confidence < 0.5 {
            notes.push(format!("{year}: low-confidence extraction ({method}), excluded from drift"));
        }
        if !forms_included.contains(&filing.form_type) {
            forms_included.push(filing.form_type.clone());
        }

        let annual_filing =
            annual.iter().find(|f| f.accession_number == filing.accession_number).expect("resolved from annual");

        filing_records.push(FilingRecord {
            year,
            form: filing.form_type.clone(),
            filing_date: filing.filing_date.format("%Y-%m-%d").to_string(),
            report_date: filing.report_date.format("%Y-%m-%d").to_string(),
            accession_number: filing.accession_number.clone(),
            primary_document: filing.primary_document.clone(),
            sec_url: annual_filing.document_url(&company.cik),
            extraction: FilingExtraction { confidence, method, errors: warnings },
        });

        section_years.push(SectionYear { year, text: normalized_text, paragraphs, confidence });
        progress.inc(1);
    }
    progress.finish_with_message("done");

    filing_records.sort_by_key(|f| f.year);
    section_years.sort_by_key(|y| y.year);

    let analysis = pipeline::analyze_company(&section_years, args.canonical_terms.as_ref());

    std::fs::create_dir_all(&args.out)?;
    let meta = CompanyMeta {
        ticker: args.ticker.to_uppercase(),
        cik: company.cik,
        company_name: company.company_name,
        last_updated_utc: chrono::Utc::now().to_rfc3339(),
        forms_included,
        sections_included: vec![SECTION_LABEL.to_string()],
        notes,
        extraction: Some(ExtractionSummary { method_counts, warning_counts }),
    };
    riskdrift_output::artifacts::write_company_artifacts(&args.out, &meta, &filing_records, SECTION_LABEL, &analysis)?;

    tracing::info!(years = section_years.len(), out = %args.out.display(), "wrote company artifacts");
    Ok(())
}

/// Run S1/S2 for one filing, consulting the cache for both the raw filing
/// body and a previously computed risk-factors extract before hitting the
/// network or re-running extraction.
async fn extract_with_cache(
    client: &EdgarClient,
    cache: &FilingCache,
    cik: &str,
    filing: &Filing,
) -> Result<(f64, String, Vec<String>, String)> {
    if let Some(meta) = cache.load_risk_meta(cik, &filing.accession_number)?
        && let Some(text) = cache.load_risk_text(cik, &filing.accession_number, &filing.form_type)?
        && meta.extractor_version == EXTRACTOR_VERSION
    {
        return Ok((meta.confidence, meta.method, meta.warnings, text));
    }

    let html = match cache.load_filing_html(cik, &filing.accession_number)? {
        Some(html) => html,
        None => {
            let bytes = client.get_filing_document(cik, &filing.accession_number, &filing.primary_document).await?;
            let html = String::from_utf8_lossy(&bytes).into_owned();
            let sha256 = hex_sha256(&bytes);
            let filing_meta = FilingMeta {
                form_type: filing.form_type.clone(),
                filing_date: filing.filing_date.format("%Y-%m-%d").to_string(),
                report_date: filing.report_date.format("%Y-%m-%d").to_string(),
                primary_document: filing.primary_document.clone(),
                sha256,
            };
            cache.save_filing(cik, &filing.accession_number, &html, &filing_meta)?;
            html
        }
    };

    let extract = if html.trim().is_empty() {
        let mut e = riskdrift_core::types::SectionExtract::not_found();
        e.warnings.push("html_missing".to_string());
        e
    } else {
        section::extract_from_html(&html)
    };

    let normalized_text = normalize::normalize_text(&extract.text);
    let method = extract.method.as_str().to_string();

    let risk_meta = RiskFactorsMeta {
        confidence: extract.confidence,
        method: method.clone(),
        warnings: extract.warnings.clone(),
        extractor_version: EXTRACTOR_VERSION.to_string(),
    };
    cache.save_risk_factors(cik, &filing.accession_number, &filing.form_type, &normalized_text, &risk_meta)?;

    Ok((extract.confidence, method, extract.warnings, normalized_text))
}

fn hex_sha256(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
