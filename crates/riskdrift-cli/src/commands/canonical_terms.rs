//! `build-canonical-terms`: validate and compile a concept/variant
//! specification, optionally scanning an already-built corpus of
//! shift-term artifacts for near-duplicate variant candidates.

use crate::error::{AppError, Result};
use riskdrift_core::canonical::{CanonicalTermsMap, CanonicalTermsSpec, CONCEPT_NOISE_TOKENS, compile_terms};
use riskdrift_core::lexicon::SHORT_TOKEN_WHITELIST;
use riskdrift_output::ShiftsArtifact;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// Arguments for `build-canonical-terms`.
pub struct Args {
    /// Input concept/variant specification (JSON).
    pub input: PathBuf,
    /// Where to write the compiled, machine-readable mapping.
    pub out: PathBuf,
    /// Where to write the human-readable markdown report.
    pub report: PathBuf,
    /// Validate only; do not write `out`/`report`.
    pub check: bool,
    /// Treat warnings as errors.
    pub strict: bool,
    /// Directory of already-built per-company artifacts to scan for
    /// near-duplicate variant candidates.
    pub scan_public: Option<PathBuf>,
    /// Number of suggestions to keep per concept when scanning.
    pub scan_top_k: usize,
}

/// Normalization parameters recorded in the compiled output, documenting
/// the rules `normalize_variant` applies.
#[derive(Debug, Serialize)]
struct NormalizationParams {
    lowercase: bool,
    hyphens_to_space: bool,
    strip_non_alphanumeric: bool,
    collapse_whitespace: bool,
    min_token_length: usize,
}

/// The compiled map, flattened alongside informational fields a future
/// `fetch-and-build --canonical-terms` load only needs to ignore: the
/// emitted file deserializes directly back into [`CanonicalTermsMap`].
#[derive(Debug, Serialize)]
struct CompiledOutput<'a> {
    #[serde(flatten)]
    map: &'a CanonicalTermsMap,
    short_token_whitelist: &'static [&'static str],
    noise_tokens: &'static [&'static str],
    normalization: NormalizationParams,
}

/// Run `build-canonical-terms`.
pub fn run(args: Args) -> Result<()> {
    let raw = std::fs::read_to_string(&args.input)
        .map_err(|e| AppError::validation(format!("reading {}: {e}", args.input.display())))?;
    let spec: CanonicalTermsSpec = serde_json::from_str(&raw)
        .map_err(|e| AppError::validation(format!("parsing {}: {e}", args.input.display())))?;

    let (map, warnings) = compile_terms(&spec).map_err(|errors| {
        let mut lines = errors;
        lines.sort();
        AppError::validation(lines.join("\n"))
    })?;

    if args.strict && !warnings.is_empty() {
        return Err(AppError::validation(warnings.join("\n")));
    }

    let suggestions = match &args.scan_public {
        Some(dir) => scan_for_suggestions(dir, &map, args.scan_top_k)?,
        None => Vec::new(),
    };

    if args.check {
        for warning in &warnings {
            tracing::warn!(%warning, "canonical-terms warning");
        }
        tracing::info!(concepts = map.concepts.len(), "canonical-terms check passed");
        return Ok(());
    }

    let output = CompiledOutput {
        map: &map,
        short_token_whitelist: SHORT_TOKEN_WHITELIST,
        noise_tokens: CONCEPT_NOISE_TOKENS,
        normalization: NormalizationParams {
            lowercase: true,
            hyphens_to_space: true,
            strip_non_alphanumeric: true,
            collapse_whitespace: true,
            min_token_length: 3,
        },
    };
    let json = serde_json::to_string_pretty(&output)?;
    std::fs::write(&args.out, json)?;

    let report = render_report(&map, &warnings, &suggestions);
    std::fs::write(&args.report, report)?;

    Ok(())
}

fn render_report(map: &CanonicalTermsMap, warnings: &[String], suggestions: &[(String, Vec<Suggestion>)]) -> String {
    let mut out = String::new();
    out.push_str("# Canonical terms report\n\n");
    out.push_str(&format!("- concepts: {}\n", map.concepts.len()));
    out.push_str(&format!("- variants: {}\n", map.variant_to_concept.len()));
    out.push_str(&format!("- warnings: {}\n\n", warnings.len()));

    if !warnings.is_empty() {
        out.push_str("## Warnings\n\n");
        for warning in warnings {
            out.push_str(&format!("- {warning}\n"));
        }
        out.push('\n');
    }

    out.push_str("## Concepts\n\n");
    for concept in &map.concepts {
        out.push_str(&format!("- **{}** ({}): {}\n", concept.label, concept.id, concept.variants.join(", ")));
    }

    if !suggestions.is_empty() {
        out.push_str("\n## Near-duplicate suggestions\n\n");
        for (concept_id, hits) in suggestions {
            out.push_str(&format!("### {concept_id}\n\n"));
            for hit in hits {
                out.push_str(&format!("- `{}` (ratio {:.2}, from {})\n", hit.term, hit.ratio, hit.source));
            }
            out.push('\n');
        }
    }

    out
}

struct Suggestion {
    term: String,
    ratio: f64,
    source: String,
}

/// Walk `dir` recursively, collect every distinct shift term across
/// `shifts_10k_item1a.json` artifacts not already captured by `map`, and
/// for each concept keep the top-`top_k` near-duplicate candidates by a
/// `SequenceMatcher`-style ratio (or token-set containment).
fn scan_for_suggestions(
    dir: &Path,
    map: &CanonicalTermsMap,
    top_k: usize,
) -> Result<Vec<(String, Vec<Suggestion>)>> {
    let mut candidate_terms: BTreeSet<String> = BTreeSet::new();
    collect_shift_terms(dir, &mut candidate_terms)?;

    let known: HashSet<&str> = map.variant_to_concept.keys().map(String::as_str).collect();
    let mut results = Vec::new();

    for concept in &map.concepts {
        let mut hits = Vec::new();
        for term in &candidate_terms {
            if known.contains(term.as_str()) {
                continue;
            }
            let best = concept
                .variants
                .iter()
                .map(|variant| sequence_ratio(term, variant).max(token_containment(term, variant)))
                .fold(0.0_f64, f64::max);
            if best >= 0.92 {
                hits.push(Suggestion { term: term.clone(), ratio: best, source: "scan-public".to_string() });
            }
        }
        hits.sort_by(|a, b| b.ratio.partial_cmp(&a.ratio).unwrap());
        hits.truncate(top_k);
        if !hits.is_empty() {
            results.push((concept.id.clone(), hits));
        }
    }

    Ok(results)
}

fn collect_shift_terms(dir: &Path, into: &mut BTreeSet<String>) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_shift_terms(&path, into)?;
            continue;
        }
        if path.file_name().and_then(|n| n.to_str()) != Some("shifts_10k_item1a.json") {
            continue;
        }
        let raw = std::fs::read_to_string(&path)?;
        let Ok(artifact) = serde_json::from_str::<ShiftsArtifact>(&raw) else { continue };
        for pair in &artifact.year_pairs {
            for stats in pair.top_risers.iter().chain(&pair.top_fallers) {
                into.insert(stats.term.clone());
            }
            for alt in pair.top_risers_alt.iter().chain(&pair.top_fallers_alt).flatten() {
                into.insert(alt.term.clone());
            }
        }
    }
    Ok(())
}

/// `SequenceMatcher`-style similarity ratio: `2 * matching / (len_a + len_b)`,
/// where `matching` is the length of the longest common subsequence.
fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let mut table = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            table[i][j] =
                if a[i - 1] == b[j - 1] { table[i - 1][j - 1] + 1 } else { table[i - 1][j].max(table[i][j - 1]) };
        }
    }
    let matching = table[a.len()][b.len()];
    (2 * matching) as f64 / (a.len() + b.len()) as f64
}

/// Fraction of `a`'s token set contained in `b`'s, or vice versa, whichever
/// is larger.
fn token_containment(a: &str, b: &str) -> f64 {
    let a_tokens: HashSet<&str> = a.split_whitespace().collect();
    let b_tokens: HashSet<&str> = b.split_whitespace().collect();
    if a_tokens.is_empty() || b_tokens.is_empty() {
        return 0.0;
    }
    let shared = a_tokens.intersection(&b_tokens).count();
    let a_contained = shared as f64 / a_tokens.len() as f64;
    let b_contained = shared as f64 / b_tokens.len() as f64;
    a_contained.max(b_contained)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_have_ratio_one() {
        assert_eq!(sequence_ratio("supply chain", "supply chain"), 1.0);
    }

    #[test]
    fn near_duplicate_strings_score_above_threshold() {
        assert!(sequence_ratio("cybersecurity risk", "cyber security risk") > 0.85);
    }

    #[test]
    fn containment_detects_subset_tokens() {
        assert_eq!(token_containment("supply chain disruption", "supply chain"), 1.0);
    }
}
