//! On-disk, gzip-compressed cache for fetched filing bodies and extracted
//! risk-factors text, keyed by CIK and accession number.

use crate::error::{DataError, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Default cache size limit, enforced by [`enforce_size_limit`].
pub const MAX_CACHE_GB: f64 = 5.0;

/// On-disk cache rooted at a configurable directory, mirroring the
/// fetch-and-build pipeline's layout: `filings/{cik}/{accession}/...`.
pub struct FilingCache {
    root: PathBuf,
}

/// Metadata recorded alongside a cached filing body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingMeta {
    /// SEC form type.
    pub form_type: String,
    /// Filing date, `YYYY-MM-DD`.
    pub filing_date: String,
    /// Period-of-report date, `YYYY-MM-DD`.
    pub report_date: String,
    /// Primary document filename as fetched.
    pub primary_document: String,
    /// sha256 hex digest of the cached plain-text body.
    pub sha256: String,
}

/// Metadata recorded alongside a cached risk-factors extract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactorsMeta {
    /// Extraction confidence in `[0, 1]`.
    pub confidence: f64,
    /// Strategy that produced the extract.
    pub method: String,
    /// Diagnostic warning tags.
    pub warnings: Vec<String>,
    /// The extractor/normalizer version this cache entry was built with,
    /// so a version bump can force a selective re-extraction.
    pub extractor_version: String,
}

/// Current extractor/normalizer version tag, bumped whenever S1/S2's
/// behavior changes in a way that should invalidate cached extracts.
pub const EXTRACTOR_VERSION: &str = "1.0";

fn risk_filename_for_form(form_type: &str) -> &'static str {
    if form_type.to_uppercase().trim().starts_with("20-F") { "item_3d.txt.gz" } else { "item_1a.txt.gz" }
}

fn atomic_write_bytes(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("cache-entry").to_string();
    tmp_name.push_str(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

fn gzip_compress(text: &str) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(text.as_bytes())?;
    Ok(encoder.finish()?)
}

fn gzip_decompress(data: &[u8]) -> Result<String> {
    let mut decoder = GzDecoder::new(data);
    let mut out = String::new();
    decoder.read_to_string(&mut out).map_err(DataError::Io)?;
    Ok(out)
}

impl FilingCache {
    /// Open (without creating) a cache rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn filing_dir(&self, cik: &str, accession: &str) -> PathBuf {
        self.root.join("filings").join(cik).join(accession)
    }

    /// Read a cached filing's plain-text body, if present.
    pub fn load_filing_text(&self, cik: &str, accession: &str) -> Result<Option<String>> {
        let path = self.filing_dir(cik, accession).join("filing.txt.gz");
        self.load_gz_text(&path)
    }

    /// Read a cached filing's raw HTML body, if present.
    pub fn load_filing_html(&self, cik: &str, accession: &str) -> Result<Option<String>> {
        let path = self.filing_dir(cik, accession).join("filing.html.gz");
        self.load_gz_text(&path)
    }

    /// Persist a filing's raw HTML body and its metadata, atomically.
    pub fn save_filing(&self, cik: &str, accession: &str, html: &str, meta: &FilingMeta) -> Result<()> {
        let dir = self.filing_dir(cik, accession);
        atomic_write_bytes(&dir.join("filing.html.gz"), &gzip_compress(html)?)?;
        let meta_json = serde_json::to_vec_pretty(meta)?;
        atomic_write_bytes(&dir.join("filing_meta.json"), &meta_json)?;
        Ok(())
    }

    /// Read a cached filing's metadata, if present.
    pub fn load_filing_meta(&self, cik: &str, accession: &str) -> Result<Option<FilingMeta>> {
        self.load_json(&self.filing_dir(cik, accession).join("filing_meta.json"))
    }

    /// Read a cached risk-factors extract, if present.
    pub fn load_risk_text(&self, cik: &str, accession: &str, form_type: &str) -> Result<Option<String>> {
        let path = self.filing_dir(cik, accession).join("risk").join(risk_filename_for_form(form_type));
        self.load_gz_text(&path)
    }

    /// Persist a risk-factors extract and its metadata, atomically.
    pub fn save_risk_factors(
        &self,
        cik: &str,
        accession: &str,
        form_type: &str,
        text: &str,
        meta: &RiskFactorsMeta,
    ) -> Result<()> {
        let dir = self.filing_dir(cik, accession).join("risk");
        atomic_write_bytes(&dir.join(risk_filename_for_form(form_type)), &gzip_compress(text)?)?;
        let meta_json = serde_json::to_vec_pretty(meta)?;
        atomic_write_bytes(&dir.join("rf_meta.json"), &meta_json)?;
        Ok(())
    }

    /// Read cached risk-factors metadata, if present.
    pub fn load_risk_meta(&self, cik: &str, accession: &str) -> Result<Option<RiskFactorsMeta>> {
        self.load_json(&self.filing_dir(cik, accession).join("risk").join("rf_meta.json"))
    }

    fn load_gz_text(&self, path: &Path) -> Result<Option<String>> {
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read(path)?;
        Ok(Some(gzip_decompress(&data)?))
    }

    fn load_json<T: for<'de> Deserialize<'de>>(&self, path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }
}

/// Aggregate byte/file usage of the cache, broken down per CIK.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheUsageReport {
    /// Total bytes across all cached files.
    pub total_bytes: u64,
    /// Total file count.
    pub total_files: u64,
    /// Bytes and file counts per CIK directory.
    pub per_cik: HashMap<String, (u64, u64)>,
}

fn walk_cache_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let Ok(entries) = std::fs::read_dir(root) else { return out };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            out.extend(walk_cache_files(&path));
        } else {
            out.push(path);
        }
    }
    out
}

/// Compute total cache usage, broken down per CIK directory under
/// `{root}/filings/{cik}/...`.
pub fn usage_report(root: &Path) -> CacheUsageReport {
    let mut report = CacheUsageReport::default();
    for path in walk_cache_files(root) {
        let Ok(meta) = std::fs::metadata(&path) else { continue };
        let size = meta.len();
        report.total_bytes += size;
        report.total_files += 1;

        let components: Vec<_> = path.components().collect();
        if let Some(idx) = components.iter().position(|c| c.as_os_str() == "filings")
            && idx + 1 < components.len()
        {
            let cik = components[idx + 1].as_os_str().to_string_lossy().to_string();
            let entry = report.per_cik.entry(cik).or_insert((0, 0));
            entry.0 += size;
            entry.1 += 1;
        }
    }
    report
}

/// Evict the least-recently-modified optional files (`filing.html.gz`, raw
/// bodies we can refetch) until total cache usage fits within `max_gb`
/// gigabytes. Returns the list of removed paths.
pub fn enforce_size_limit(root: &Path, max_gb: f64) -> Result<Vec<PathBuf>> {
    let limit_bytes = (max_gb * 1024.0 * 1024.0 * 1024.0) as u64;
    let mut report = usage_report(root);
    let mut removed = Vec::new();
    if report.total_bytes <= limit_bytes {
        return Ok(removed);
    }

    let mut optional: Vec<PathBuf> =
        walk_cache_files(root).into_iter().filter(|p| p.file_name().is_some_and(|n| n == "filing.html.gz")).collect();
    optional.sort_by_key(|p| std::fs::metadata(p).and_then(|m| m.modified()).ok());

    for path in optional {
        if report.total_bytes <= limit_bytes {
            break;
        }
        let Ok(meta) = std::fs::metadata(&path) else { continue };
        let size = meta.len();
        if std::fs::remove_file(&path).is_ok() {
            removed.push(path);
            report.total_bytes = report.total_bytes.saturating_sub(size);
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_filing_html_and_meta() {
        let dir = std::env::temp_dir().join(format!("riskdrift-cache-test-{}", std::process::id()));
        let cache = FilingCache::new(&dir);
        let meta = FilingMeta {
            form_type: "10-K".to_string(),
            filing_date: "2023-11-03".to_string(),
            report_date: "2023-09-30".to_string(),
            primary_document: "aapl-20230930.htm".to_string(),
            sha256: "deadbeef".to_string(),
        };
        cache.save_filing("0000320193", "0000320193-23-000077", "<html>hello</html>", &meta).unwrap();

        let loaded_html = cache.load_filing_html("0000320193", "0000320193-23-000077").unwrap();
        assert_eq!(loaded_html.as_deref(), Some("<html>hello</html>"));

        let loaded_meta = cache.load_filing_meta("0000320193", "0000320193-23-000077").unwrap().unwrap();
        assert_eq!(loaded_meta.form_type, "10-K");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn risk_filename_chooses_item_3d_for_20f() {
        assert_eq!(risk_filename_for_form("20-F"), "item_3d.txt.gz");
        assert_eq!(risk_filename_for_form("10-K"), "item_1a.txt.gz");
    }

    #[test]
    fn missing_entries_return_none() {
        let dir = std::env::temp_dir().join(format!("riskdrift-cache-missing-{}", std::process::id()));
        let cache = FilingCache::new(&dir);
        assert!(cache.load_filing_text("0000000001", "x").unwrap().is_none());
    }
}
