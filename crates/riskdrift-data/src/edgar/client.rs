//! SEC EDGAR API client: ticker/CIK resolution, filing-history retrieval
//! (including paginated older submissions), and filing-document fetch, all
//! behind a shared rate limiter and exponential-backoff retry policy.

use crate::edgar::filings::{self, AnnualFiling, SubmissionsPage, SubmissionsResponse};
use crate::error::{DataError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

const EDGAR_BASE_URL: &str = "https://data.sec.gov";
const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(100);
const MAX_RETRY_ATTEMPTS: u32 = 5;
const MAX_BACKOFF_SECS: u64 = 8;

/// Raw per-company ticker/exchange listing entry from
/// `company_tickers.json` (and its `_exchange` sibling, which adds an
/// `exchange` field this crate does not otherwise need).
#[derive(Debug, Deserialize)]
struct CompanyInfo {
    cik_str: u64,
    ticker: String,
    title: String,
}

/// Resolved ticker lookup result.
#[derive(Debug, Clone)]
pub struct CompanyMatch {
    /// Zero-padded 10-digit CIK.
    pub cik: String,
    /// Company name as registered with the SEC.
    pub company_name: String,
}

struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self { last_request: Instant::now() - min_interval, min_interval }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// SEC EDGAR API client: rate-limited, retrying, and requiring an
/// explicitly configured `User-Agent` before any request is attempted.
pub struct EdgarClient {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    base_url: String,
}

impl EdgarClient {
    /// Build a client with the default 10 req/s rate limit. `user_agent`
    /// must identify the requester and a contact; SEC EDGAR otherwise
    /// rejects requests. Returns [`DataError::MissingUserAgent`] if empty.
    pub fn new(user_agent: &str) -> Result<Self> {
        Self::with_rate_limit(user_agent, DEFAULT_RATE_LIMIT)
    }

    /// Build a client with a custom minimum interval between requests.
    pub fn with_rate_limit(user_agent: &str, min_interval: Duration) -> Result<Self> {
        if user_agent.trim().is_empty() {
            return Err(DataError::MissingUserAgent);
        }
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(DataError::Network)?;

        Ok(Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(min_interval))),
            base_url: EDGAR_BASE_URL.to_string(),
        })
    }

    async fn get_with_retry(&self, url: &str) -> Result<reqwest::Response> {
        let mut attempt: u32 = 0;
        loop {
            self.rate_limiter.lock().await.wait().await;
            let response = self.client.get(url).send().await.map_err(DataError::Network)?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }
            if (status.as_u16() == 403 || status.as_u16() == 429) && attempt + 1 < MAX_RETRY_ATTEMPTS {
                let backoff = 2_u64.saturating_pow(attempt).min(MAX_BACKOFF_SECS);
                sleep(Duration::from_secs(backoff)).await;
                attempt += 1;
                continue;
            }
            if status.as_u16() == 403 || status.as_u16() == 429 {
                return Err(DataError::RetriesExhausted {
                    attempts: attempt + 1,
                    url: url.to_string(),
                    last_status: status.as_u16(),
                });
            }
            return Err(DataError::EdgarApi(format!("request to {url} failed: HTTP {status}")));
        }
    }

    /// Resolve a ticker to its CIK and registered company name, consulting
    /// both `company_tickers.json` and `company_tickers_exchange.json`
    /// (the latter adds exchange-listed names the former sometimes lacks).
    pub async fn resolve_ticker(&self, ticker: &str) -> Result<CompanyMatch> {
        if ticker.trim().is_empty() {
            return Err(DataError::InvalidSymbol("empty ticker".to_string()));
        }
        let ticker_upper = ticker.to_uppercase();

        let response = self.get_with_retry("https://www.sec.gov/files/company_tickers.json").await?;
        let data: HashMap<String, CompanyInfo> =
            response.json().await.map_err(|e| DataError::EdgarApi(format!("parsing company tickers: {e}")))?;

        for company in data.values() {
            if company.ticker.to_uppercase() == ticker_upper {
                return Ok(CompanyMatch {
                    cik: filings::pad_cik(&company.cik_str.to_string()),
                    company_name: company.title.clone(),
                });
            }
        }

        if let Ok(response) = self.get_with_retry("https://www.sec.gov/files/company_tickers_exchange.json").await
            && let Ok(rows) = response.json::<ExchangeTickers>().await
            && let Some(row) = rows.find(&ticker_upper)
        {
            return Ok(row);
        }

        Err(DataError::CikNotFound(ticker.to_string()))
    }

    /// Fetch a company's full filing history: the `recent` window plus any
    /// paginated older-submissions files it references.
    pub async fn get_company_filings(&self, cik: &str) -> Result<SubmissionsResponse> {
        if cik.trim().is_empty() {
            return Err(DataError::InvalidSymbol("empty CIK".to_string()));
        }
        let padded = filings::pad_cik(cik);
        let url = format!("{}/submissions/CIK{}.json", self.base_url, padded);
        let response = self.get_with_retry(&url).await?;
        let parsed: SubmissionsResponse =
            response.json().await.map_err(|e| DataError::EdgarApi(format!("parsing submissions for {padded}: {e}")))?;
        Ok(parsed)
    }

    /// Fetch one paginated older-submissions page by filename (as listed in
    /// `SubmissionsResponse.filings.files`).
    pub async fn get_submissions_page(&self, file_name: &str) -> Result<SubmissionsPage> {
        let url = format!("{}/submissions/{}", self.base_url, file_name);
        let response = self.get_with_retry(&url).await?;
        let parsed: SubmissionsPage =
            response.json().await.map_err(|e| DataError::EdgarApi(format!("parsing submissions page {file_name}: {e}")))?;
        Ok(parsed)
    }

    /// Resolve the complete list of annual filings (10-K, and 20-F when
    /// `include_20f`) for a company, merging the recent window with every
    /// paginated older-submissions file, sorted ascending by filing date.
    pub async fn annual_filings(&self, cik: &str, include_20f: bool) -> Result<Vec<AnnualFiling>> {
        let submissions = self.get_company_filings(cik).await?;
        let mut all = submissions.annual_filings(include_20f)?;

        for file_ref in &submissions.filings.files {
            let page = self.get_submissions_page(&file_ref.name).await?;
            all.extend(filings::extract_annual_filings_from_page(&page, include_20f)?);
        }

        all.sort_by_key(|f| f.filing_date);
        Ok(all)
    }

    /// Fetch a filing's primary document body as raw bytes.
    pub async fn get_filing_document(&self, cik: &str, accession: &str, document: &str) -> Result<Vec<u8>> {
        if accession.is_empty() {
            return Err(DataError::EdgarApi("empty accession number".to_string()));
        }
        if document.is_empty() {
            return Err(DataError::EdgarApi("empty document name".to_string()));
        }
        let padded = filings::pad_cik(cik);
        let accession_no_dash = accession.replace('-', "");
        let url = format!("{}/Archives/edgar/data/{}/{}/{}", self.base_url, padded, accession_no_dash, document);
        let response = self.get_with_retry(&url).await?;
        let bytes = response.bytes().await.map_err(DataError::Network)?;
        Ok(bytes.to_vec())
    }
}

impl std::fmt::Debug for EdgarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgarClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ExchangeTickers {
    fields: Vec<String>,
    data: Vec<Vec<serde_json::Value>>,
}

impl ExchangeTickers {
    fn find(&self, ticker_upper: &str) -> Option<CompanyMatch> {
        let cik_idx = self.fields.iter().position(|f| f == "cik")?;
        let ticker_idx = self.fields.iter().position(|f| f == "ticker")?;
        let name_idx = self.fields.iter().position(|f| f == "name")?;

        for row in &self.data {
            let row_ticker = row.get(ticker_idx)?.as_str()?;
            if row_ticker.to_uppercase() == ticker_upper {
                let cik_num = row.get(cik_idx)?.as_u64()?;
                let name = row.get(name_idx)?.as_str()?.to_string();
                return Some(CompanyMatch { cik: filings::pad_cik(&cik_num.to_string()), company_name: name });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_user_agent() {
        let err = EdgarClient::new("").unwrap_err();
        assert!(matches!(err, DataError::MissingUserAgent));
    }

    #[test]
    fn accepts_configured_user_agent() {
        assert!(EdgarClient::new("riskdrift/0.1 (contact@example.com)").is_ok());
    }

    #[tokio::test]
    async fn resolve_ticker_rejects_empty_input() {
        let client = EdgarClient::new("riskdrift/0.1 (contact@example.com)").unwrap();
        let err = client.resolve_ticker("").await.unwrap_err();
        assert!(matches!(err, DataError::InvalidSymbol(_)));
    }
}
