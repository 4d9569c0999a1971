//! Layered configuration: CLI flags override environment variables, which
//! override built-in defaults.

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable carrying the required SEC EDGAR `User-Agent`.
pub const SEC_USER_AGENT_ENV: &str = "SEC_USER_AGENT";

/// Requests per second enforced against SEC EDGAR.
pub const DEFAULT_RATE_LIMIT_PER_SEC: u64 = 10;

/// Default lookback window, in years, for `fetch-and-build`.
pub const DEFAULT_LOOKBACK_YEARS: u32 = 10;

/// Resolve the `User-Agent` string: explicit flag first, then
/// `SEC_USER_AGENT`. Absence is a configuration error raised by the caller
/// before any network collaborator is constructed.
pub fn resolve_user_agent(flag: Option<&str>) -> Option<String> {
    flag.map(str::to_string).or_else(|| std::env::var(SEC_USER_AGENT_ENV).ok()).filter(|s| !s.trim().is_empty())
}

/// Resolve the on-disk filing cache directory: explicit flag first, then a
/// platform cache directory resolved via `dirs`, falling back to the
/// system temp directory if even that is unavailable.
pub fn resolve_cache_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| dirs::cache_dir().unwrap_or_else(std::env::temp_dir).join("riskdrift"))
}

/// Minimum interval between SEC EDGAR requests for a given requests-per-second budget.
pub fn rate_limit_interval(requests_per_sec: u64) -> Duration {
    Duration::from_millis((1000 / requests_per_sec.max(1)).max(1))
}
