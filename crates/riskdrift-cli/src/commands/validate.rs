//! `validate`: check already-built per-company artifacts against the
//! invariants the pipeline is required to uphold -- chiefly the
//! term-hygiene rule (no adjacent-duplicate-token terms in any shift
//! list), but also the similarity-matrix and drift-array shape invariants.

use crate::error::{AppError, Result};
use riskdrift_core::tokenize::has_repeated_adjacent_tokens;
use riskdrift_output::artifacts::{ExcerptsArtifact, MetricsArtifact, ShiftsArtifact, SimilarityArtifact};
use std::path::{Path, PathBuf};

/// Arguments for `validate`.
pub struct Args {
    /// Directory containing one subdirectory per company's artifacts.
    pub data_dir: PathBuf,
}

/// Run `validate`. Returns a validation error (exit 2) listing every
/// violation found, or `Ok(())` if the corpus is clean.
pub fn run(args: Args) -> Result<()> {
    let mut violations = Vec::new();

    for dir_entry in std::fs::read_dir(&args.data_dir)? {
        let dir_entry = dir_entry?;
        let path = dir_entry.path();
        if !path.is_dir() {
            continue;
        }
        violations.extend(validate_company(&path)?);
    }

    if violations.is_empty() {
        tracing::info!(data_dir = %args.data_dir.display(), "validation passed");
        return Ok(());
    }

    Err(AppError::validation(violations.join("\n")))
}

fn validate_company(dir: &Path) -> Result<Vec<String>> {
    let mut violations = Vec::new();
    let ticker = dir.file_name().and_then(|n| n.to_str()).unwrap_or("?").to_string();

    if let Some(similarity) = read_optional::<SimilarityArtifact>(&dir.join("similarity_10k_item1a.json"))? {
        violations.extend(validate_similarity(&ticker, &similarity));
    }
    if let Some(metrics) = read_optional::<MetricsArtifact>(&dir.join("metrics_10k_item1a.json"))? {
        violations.extend(validate_metrics(&ticker, &metrics));
    }
    if let Some(shifts) = read_optional::<ShiftsArtifact>(&dir.join("shifts_10k_item1a.json"))? {
        violations.extend(validate_shifts(&ticker, &shifts));
    }
    if let Some(excerpts) = read_optional::<ExcerptsArtifact>(&dir.join("excerpts_10k_item1a.json"))? {
        violations.extend(validate_excerpts(&ticker, &excerpts));
    }

    Ok(violations)
}

fn read_optional<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)?;
    let value = serde_json::from_str(&raw)
        .map_err(|e| AppError::validation(format!("parsing {}: {e}", path.display())))?;
    Ok(Some(value))
}

fn validate_similarity(ticker: &str, similarity: &SimilarityArtifact) -> Vec<String> {
    let mut violations = Vec::new();
    let n = similarity.years.len();
    if similarity.cosine_similarity.len() != n || similarity.cosine_similarity.iter().any(|row| row.len() != n) {
        violations.push(format!("{ticker}: similarity matrix is not {n}x{n}"));
        return violations;
    }
    for i in 0..n {
        if (similarity.cosine_similarity[i][i] - 1.0).abs() > 1e-6 {
            violations.push(format!("{ticker}: similarity diagonal at {i} is not 1.0"));
        }
        for j in 0..n {
            let value = similarity.cosine_similarity[i][j];
            if !(0.0..=1.0001).contains(&value) {
                violations.push(format!("{ticker}: similarity[{i}][{j}] = {value} out of [0,1]"));
            }
            if (value - similarity.cosine_similarity[j][i]).abs() > 1e-6 {
                violations.push(format!("{ticker}: similarity matrix is not symmetric at ({i},{j})"));
            }
        }
    }
    violations
}

fn validate_metrics(ticker: &str, metrics: &MetricsArtifact) -> Vec<String> {
    let mut violations = Vec::new();
    let n = metrics.years.len();
    for (name, series) in [
        ("drift_vs_prev", &metrics.drift_vs_prev),
        ("drift_ci_low", &metrics.drift_ci_low),
        ("drift_ci_high", &metrics.drift_ci_high),
        ("boilerplate_score", &metrics.boilerplate_score),
    ] {
        if series.len() != n {
            violations.push(format!("{ticker}: {name} has length {} but years has {n}", series.len()));
        }
    }
    if metrics.drift_vs_prev.first().is_some_and(Option::is_some) {
        violations.push(format!("{ticker}: drift_vs_prev[0] is not null"));
    }
    for i in 0..n {
        let (Some(drift), Some(lo), Some(hi)) =
            (metrics.drift_vs_prev.get(i).copied().flatten(), metrics.drift_ci_low.get(i).copied().flatten(), metrics.drift_ci_high.get(i).copied().flatten())
        else {
            continue;
        };
        if !(lo <= drift && drift <= hi) {
            violations.push(format!("{ticker}: year index {i} has drift {drift} outside CI [{lo}, {hi}]"));
        }
    }
    violations
}

fn validate_shifts(ticker: &str, shifts: &ShiftsArtifact) -> Vec<String> {
    let mut violations = Vec::new();
    for pair in &shifts.year_pairs {
        let lists = [
            ("topRisers", &pair.top_risers),
            ("topFallers", &pair.top_fallers),
        ];
        for (field, terms) in lists {
            for stats in terms {
                if has_repeated_adjacent_tokens(&stats.term) {
                    violations.push(format!(
                        "{ticker}: {}-{} {field} term {:?} has adjacent duplicate tokens",
                        pair.from, pair.to, stats.term
                    ));
                }
            }
        }
        for (field, terms) in [("topRisersAlt", &pair.top_risers_alt), ("topFallersAlt", &pair.top_fallers_alt)] {
            for stats in terms.iter().flatten() {
                if has_repeated_adjacent_tokens(&stats.term) {
                    violations.push(format!(
                        "{ticker}: {}-{} {field} term {:?} has adjacent duplicate tokens",
                        pair.from, pair.to, stats.term
                    ));
                }
            }
        }
    }
    violations
}

fn validate_excerpts(ticker: &str, excerpts: &ExcerptsArtifact) -> Vec<String> {
    const MAX_PER_YEAR: usize = 3;
    let mut violations = Vec::new();
    for pair in &excerpts.pairs {
        let from_count = pair.representative_paragraphs.iter().filter(|p| p.year == pair.from).count();
        let to_count = pair.representative_paragraphs.iter().filter(|p| p.year == pair.to).count();
        if from_count > MAX_PER_YEAR || to_count > MAX_PER_YEAR {
            violations.push(format!(
                "{ticker}: {}-{} has {from_count}/{to_count} representative paragraphs, exceeds {MAX_PER_YEAR} per side",
                pair.from, pair.to
            ));
        }
    }
    violations
}
