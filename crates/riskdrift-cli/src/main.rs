//! Command-line driver for the risk-factor drift pipeline: resolves SEC
//! tickers, fetches and caches annual filings, runs the six-stage
//! text-analytic pipeline, and writes per-company and cross-company JSON
//! artifacts.

mod commands;
mod config;
mod error;
mod logging;

use clap::{Parser, Subcommand};
use error::{AppError, Result};
use riskdrift_core::canonical::CanonicalTermsMap;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "riskdrift")]
#[command(about = "Risk-factor textual-drift analysis over SEC annual filings", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and compile a concept/variant canonical-terms specification.
    BuildCanonicalTerms {
        /// Input concept/variant specification (JSON).
        #[arg(long = "in")]
        input: PathBuf,
        /// Where to write the compiled mapping.
        #[arg(long)]
        out: PathBuf,
        /// Where to write the human-readable markdown report.
        #[arg(long)]
        report: PathBuf,
        /// Validate only; do not write `out`/`report`.
        #[arg(long)]
        check: bool,
        /// Treat non-fatal warnings as errors.
        #[arg(long)]
        strict: bool,
        /// Scan a directory of already-built shift artifacts for
        /// near-duplicate variant candidates.
        #[arg(long = "scan-public")]
        scan_public: Option<PathBuf>,
        /// Suggestions to keep per concept when `--scan-public` is set.
        #[arg(long = "scan-top-k", default_value_t = 10)]
        scan_top_k: usize,
    },

    /// Resolve a ticker, fetch its annual filings, and build its artifacts.
    FetchAndBuild {
        /// Ticker symbol.
        #[arg(long)]
        ticker: String,
        /// Number of most-recent distinct fiscal years to retain.
        #[arg(long, default_value_t = config::DEFAULT_LOOKBACK_YEARS)]
        years: u32,
        /// Output directory for this company's artifacts.
        #[arg(long)]
        out: PathBuf,
        /// Cap on the number of filings considered before fetching bodies.
        #[arg(long)]
        limit: Option<usize>,
        /// Also accept `20-F` foreign-private-issuer annual filings.
        #[arg(long = "include-20f")]
        include_20f: bool,
        /// `User-Agent` for SEC EDGAR requests; falls back to `SEC_USER_AGENT`.
        #[arg(long = "user-agent")]
        user_agent: Option<String>,
        /// On-disk cache directory; falls back to a platform cache dir.
        #[arg(long = "cache-dir")]
        cache_dir: Option<PathBuf>,
        /// Maximum SEC EDGAR requests per second.
        #[arg(long = "rate-limit", default_value_t = config::DEFAULT_RATE_LIMIT_PER_SEC)]
        rate_limit: u64,
        /// Path to a compiled canonical-terms mapping.
        #[arg(long = "canonical-terms")]
        canonical_terms: Option<PathBuf>,
    },

    /// Summarize a directory of per-company artifacts into `index.json`.
    BuildIndex {
        /// Directory containing one subdirectory per company's artifacts.
        #[arg(long = "data-dir")]
        data_dir: PathBuf,
        /// Output path for the index; defaults to `<data-dir>/index.json`.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Lookback window, in years, recorded on the index.
        #[arg(long = "lookback-years", default_value_t = config::DEFAULT_LOOKBACK_YEARS)]
        lookback_years: u32,
        /// Path to a `{ticker: blurb}` JSON map of curated featured cases.
        #[arg(long)]
        featured: Option<PathBuf>,
    },

    /// Check already-built artifacts against the pipeline's invariants.
    Validate {
        /// Directory containing one subdirectory per company's artifacts.
        #[arg(long = "data-dir")]
        data_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "command failed");
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::BuildCanonicalTerms { input, out, report, check, strict, scan_public, scan_top_k } => {
            commands::canonical_terms::run(commands::canonical_terms::Args {
                input,
                out,
                report,
                check,
                strict,
                scan_public,
                scan_top_k,
            })
        }

        Commands::FetchAndBuild { ticker, years, out, limit, include_20f, user_agent, cache_dir, rate_limit, canonical_terms } => {
            let user_agent = config::resolve_user_agent(user_agent.as_deref())
                .ok_or_else(|| AppError::validation(format!("no SEC user agent configured: pass --user-agent or set {}", config::SEC_USER_AGENT_ENV)))?;
            let cache_dir = config::resolve_cache_dir(cache_dir);
            let canonical_terms = canonical_terms.map(load_canonical_terms).transpose()?;

            commands::fetch_build::run(commands::fetch_build::Args {
                ticker,
                years,
                out,
                limit,
                include_20f,
                user_agent,
                rate_limit_interval: config::rate_limit_interval(rate_limit),
                cache_dir,
                canonical_terms,
            })
            .await
        }

        Commands::BuildIndex { data_dir, out, lookback_years, featured } => {
            let out = out.unwrap_or_else(|| data_dir.join("index.json"));
            let featured = featured.map(load_featured).transpose()?.unwrap_or_default();
            commands::build_index::run(commands::build_index::Args {
                data_dir,
                out,
                lookback_target_years: lookback_years,
                featured,
            })
        }

        Commands::Validate { data_dir } => commands::validate::run(commands::validate::Args { data_dir }),
    }
}

fn load_canonical_terms(path: PathBuf) -> Result<CanonicalTermsMap> {
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| AppError::validation(format!("reading {}: {e}", path.display())))?;
    serde_json::from_str(&raw).map_err(|e| AppError::validation(format!("parsing {}: {e}", path.display())))
}

fn load_featured(path: PathBuf) -> Result<HashMap<String, String>> {
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| AppError::validation(format!("reading {}: {e}", path.display())))?;
    serde_json::from_str(&raw).map_err(|e| AppError::validation(format!("parsing {}: {e}", path.display())))
}
