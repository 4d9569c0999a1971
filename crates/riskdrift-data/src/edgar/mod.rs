//! SEC EDGAR data fetching: ticker/CIK resolution, annual-filing history
//! (10-K / 20-F), and filing-document retrieval.
//!
//! # Example
//!
//! ```no_run
//! use riskdrift_data::edgar::EdgarClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = EdgarClient::new("riskdrift/0.1 (contact@example.com)")?;
//!     let company = client.resolve_ticker("AAPL").await?;
//!     let filings = client.annual_filings(&company.cik, false).await?;
//!     println!("Found {} annual filings", filings.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod filings;

pub use client::{CompanyMatch, EdgarClient};
pub use filings::{AnnualFiling, FilingHistory, RecentFilings, SubmissionsResponse, pad_cik};
