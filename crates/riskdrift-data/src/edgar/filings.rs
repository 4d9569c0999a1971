//! Domain types for SEC EDGAR's submissions API: the company-level
//! filing history (recent plus paginated older submission files) and the
//! annual-filing subset (10-K / 20-F) this crate cares about.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use serde::Deserialize;

/// Form types counted as "annual filings" by this crate.
pub const DOMESTIC_ANNUAL_FORM: &str = "10-K";
/// Foreign-private-issuer annual form, included only with `--include-20f`.
pub const FOREIGN_ANNUAL_FORM: &str = "20-F";

/// Raw response from `GET /submissions/CIK{cik:010}.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionsResponse {
    /// Central Index Key, as returned (not necessarily zero-padded).
    pub cik: String,
    /// Company name on file with the SEC.
    pub name: String,
    /// Recent filing history (most recent ~1000 filings).
    pub filings: FilingHistory,
}

/// Container for a company's filing history.
#[derive(Debug, Clone, Deserialize)]
pub struct FilingHistory {
    /// Parallel-array recent filings.
    pub recent: RecentFilings,
    /// References to additional paginated submission files holding
    /// older filings, when the recent window does not cover the full
    /// history.
    #[serde(default)]
    pub files: Vec<SubmissionsFileRef>,
}

/// One additional paginated submissions file reference.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionsFileRef {
    /// Filename, fetched from `https://data.sec.gov/submissions/{name}`.
    pub name: String,
}

/// A paginated older-submissions file's body: the same parallel-array shape
/// as `recent`, without the outer `cik`/`name`/`filings` wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionsPage {
    /// Parallel-array filings from this page.
    #[serde(flatten)]
    pub filings: RecentFilings,
}

/// Parallel-array filing data, the shape the SEC returns for both `recent`
/// and each paginated older-submissions file.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RecentFilings {
    /// Accession numbers.
    pub accession_number: Vec<String>,
    /// Form types, e.g. `10-K`, `20-F`, `10-Q`.
    pub form: Vec<String>,
    /// Filing dates, `YYYY-MM-DD`.
    pub filing_date: Vec<String>,
    /// Period-of-report dates, `YYYY-MM-DD` (may be empty strings).
    #[serde(default)]
    pub report_date: Vec<String>,
    /// Primary document filenames.
    pub primary_document: Vec<String>,
}

/// One resolved annual filing (10-K or 20-F), ready for fetching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnualFiling {
    /// Accession number, e.g. `0000320193-24-000123`.
    pub accession_number: String,
    /// Form type (`10-K` or `20-F`).
    pub form: String,
    /// Date the filing was submitted.
    pub filing_date: NaiveDate,
    /// Period the filing reports on; falls back to `filing_date` when the
    /// SEC response carries an empty report date (seen on some older
    /// filings).
    pub report_date: NaiveDate,
    /// Primary document filename within the filing.
    pub primary_document: String,
}

impl AnnualFiling {
    /// URL to this filing's primary document under the EDGAR archive tree.
    pub fn document_url(&self, cik: &str) -> String {
        let accession_no_dashes = self.accession_number.replace('-', "");
        let cik_unpadded = cik.trim_start_matches('0');
        format!(
            "https://www.sec.gov/Archives/edgar/data/{}/{}/{}",
            if cik_unpadded.is_empty() { "0" } else { cik_unpadded },
            accession_no_dashes,
            self.primary_document
        )
    }
}

fn parse_date(raw: &str, fallback: NaiveDate) -> NaiveDate {
    if raw.is_empty() {
        return fallback;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap_or(fallback)
}

fn extract_annual_filings(filings: &RecentFilings, forms: &[&str]) -> Result<Vec<AnnualFiling>> {
    let mut out = Vec::new();
    for i in 0..filings.form.len() {
        if !forms.contains(&filings.form[i].as_str()) {
            continue;
        }
        let filing_date = NaiveDate::parse_from_str(&filings.filing_date[i], "%Y-%m-%d")
            .map_err(|e| DataError::Parse(format!("invalid filing date {:?}: {e}", filings.filing_date[i])))?;
        let report_date = filings.report_date.get(i).map(String::as_str).unwrap_or("");
        out.push(AnnualFiling {
            accession_number: filings.accession_number[i].clone(),
            form: filings.form[i].clone(),
            filing_date,
            report_date: parse_date(report_date, filing_date),
            primary_document: filings.primary_document[i].clone(),
        });
    }
    Ok(out)
}

impl SubmissionsResponse {
    /// Resolve the annual filings (10-K, and 20-F when `include_20f`) found
    /// in the `recent` window only (the caller merges in paginated pages
    /// separately via [`extract_annual_filings_from_page`]), sorted by
    /// ascending filing date.
    pub fn annual_filings(&self, include_20f: bool) -> Result<Vec<AnnualFiling>> {
        let forms: &[&str] = if include_20f {
            &[DOMESTIC_ANNUAL_FORM, FOREIGN_ANNUAL_FORM]
        } else {
            &[DOMESTIC_ANNUAL_FORM]
        };
        let mut filings = extract_annual_filings(&self.filings.recent, forms)?;
        filings.sort_by_key(|f| f.filing_date);
        Ok(filings)
    }
}

/// Resolve annual filings from one paginated older-submissions page.
pub fn extract_annual_filings_from_page(page: &SubmissionsPage, include_20f: bool) -> Result<Vec<AnnualFiling>> {
    let forms: &[&str] =
        if include_20f { &[DOMESTIC_ANNUAL_FORM, FOREIGN_ANNUAL_FORM] } else { &[DOMESTIC_ANNUAL_FORM] };
    extract_annual_filings(&page.filings, forms)
}

/// Pad a CIK (with or without leading zeros) to the 10-digit form EDGAR
/// URLs require.
pub fn pad_cik(cik: &str) -> String {
    format!("{cik:0>10}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recent(forms: &[&str], dates: &[&str]) -> RecentFilings {
        RecentFilings {
            accession_number: forms.iter().enumerate().map(|(i, _)| format!("0000000000-24-{i:06}")).collect(),
            form: forms.iter().map(|f| f.to_string()).collect(),
            filing_date: dates.iter().map(|d| d.to_string()).collect(),
            report_date: vec![String::new(); forms.len()],
            primary_document: forms.iter().enumerate().map(|(i, _)| format!("doc{i}.htm")).collect(),
        }
    }

    #[test]
    fn pads_unpadded_cik() {
        assert_eq!(pad_cik("320193"), "0000320193");
        assert_eq!(pad_cik("0000320193"), "0000320193");
    }

    #[test]
    fn filters_10k_only_by_default() {
        let response = SubmissionsResponse {
            cik: "320193".into(),
            name: "Example Corp".into(),
            filings: FilingHistory {
                recent: recent(&["10-K", "10-Q", "20-F"], &["2023-10-01", "2023-07-01", "2022-10-01"]),
                files: Vec::new(),
            },
        };
        let filings = response.annual_filings(false).unwrap();
        assert_eq!(filings.len(), 1);
        assert_eq!(filings[0].form, "10-K");
    }

    #[test]
    fn includes_20f_when_requested() {
        let response = SubmissionsResponse {
            cik: "320193".into(),
            name: "Example Corp".into(),
            filings: FilingHistory {
                recent: recent(&["10-K", "20-F"], &["2023-10-01", "2022-10-01"]),
                files: Vec::new(),
            },
        };
        let filings = response.annual_filings(true).unwrap();
        assert_eq!(filings.len(), 2);
        assert_eq!(filings[0].filing_date, NaiveDate::from_ymd_opt(2022, 10, 1).unwrap());
    }

    #[test]
    fn document_url_strips_accession_dashes() {
        let filing = AnnualFiling {
            accession_number: "0000320193-23-000077".into(),
            form: "10-K".into(),
            filing_date: NaiveDate::from_ymd_opt(2023, 11, 3).unwrap(),
            report_date: NaiveDate::from_ymd_opt(2023, 9, 30).unwrap(),
            primary_document: "aapl-20230930.htm".into(),
        };
        let url = filing.document_url("0000320193");
        assert_eq!(url, "https://www.sec.gov/Archives/edgar/data/320193/000032019323000077/aapl-20230930.htm");
    }
}
