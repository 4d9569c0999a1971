//! Term-shift analyzer (S5): smoothed log-odds with variance-normalized
//! z-scores, per-10k-token deltas, and distinctiveness filtering, producing
//! the top risers/fallers between two adjacent filing years.

use crate::tokenize::has_repeated_adjacent_tokens;
use crate::types::{ShiftPair, ShiftTermStats};
use std::collections::{BTreeMap, HashSet};

const ALPHA: f64 = 0.01;
const TOP_N: usize = 15;
const MIN_ALT_COMBINED: usize = 10;
const Z_THRESHOLD: f64 = 2.0;
const DELTA_THRESHOLD: f64 = 0.5;
const MIN_COMBINED_COUNT: u64 = 8;

fn vocabulary(prev: &BTreeMap<String, u64>, curr: &BTreeMap<String, u64>) -> HashSet<String> {
    prev.keys().chain(curr.keys()).cloned().collect()
}

fn term_stats(term: &str, c_prev: u64, c_curr: u64, n_prev: u64, n_curr: u64, vocab_size: usize) -> ShiftTermStats {
    let v = vocab_size as f64;
    let log_prev = ((c_prev as f64 + ALPHA) / (n_prev as f64 - c_prev as f64 + ALPHA * v)).ln();
    let log_curr = ((c_curr as f64 + ALPHA) / (n_curr as f64 - c_curr as f64 + ALPHA * v)).ln();
    let score = log_curr - log_prev;
    let z = score / (1.0 / (c_curr as f64 + ALPHA) + 1.0 / (c_prev as f64 + ALPHA)).sqrt();
    let per10k_prev = c_prev as f64 / n_prev as f64 * 10_000.0;
    let per10k_curr = c_curr as f64 / n_curr as f64 * 10_000.0;
    let delta = per10k_curr - per10k_prev;
    let distinctive =
        z.abs() >= Z_THRESHOLD && delta.abs() >= DELTA_THRESHOLD && (c_prev + c_curr) >= MIN_COMBINED_COUNT;

    ShiftTermStats {
        term: term.to_string(),
        score,
        z,
        count_prev: c_prev,
        count_curr: c_curr,
        per10k_prev,
        per10k_curr,
        delta_per10k: delta,
        distinctive,
        includes: Vec::new(),
    }
}

/// Compute per-term statistics for every vocabulary item present on either
/// side, rejecting any term carrying an immediate adjacent token duplicate.
pub fn compute_term_stats(prev_counts: &BTreeMap<String, u64>, curr_counts: &BTreeMap<String, u64>) -> Vec<ShiftTermStats> {
    let vocab = vocabulary(prev_counts, curr_counts);
    let vocab_size = vocab.len();
    let n_prev: u64 = prev_counts.values().sum();
    let n_curr: u64 = curr_counts.values().sum();

    let mut stats: Vec<ShiftTermStats> = vocab
        .into_iter()
        .filter(|term| !has_repeated_adjacent_tokens(term))
        .map(|term| {
            let c_prev = *prev_counts.get(&term).unwrap_or(&0);
            let c_curr = *curr_counts.get(&term).unwrap_or(&0);
            term_stats(&term, c_prev, c_curr, n_prev.max(1), n_curr.max(1), vocab_size.max(1))
        })
        .collect();
    stats.sort_by(|a, b| a.term.cmp(&b.term));
    stats
}

fn top_risers(stats: &[ShiftTermStats]) -> Vec<ShiftTermStats> {
    let mut sorted = stats.to_vec();
    sorted.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap().then_with(|| a.term.cmp(&b.term)));
    sorted.into_iter().take(TOP_N).collect()
}

fn top_fallers(stats: &[ShiftTermStats]) -> Vec<ShiftTermStats> {
    let mut sorted = stats.to_vec();
    sorted.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap().then_with(|| a.term.cmp(&b.term)));
    sorted.into_iter().take(TOP_N).collect()
}

fn summary_sentence(risers: &[ShiftTermStats], fallers: &[ShiftTermStats]) -> String {
    let top3 = |items: &[ShiftTermStats]| -> Vec<String> {
        items.iter().take(3).map(|s| s.term.clone()).collect()
    };
    let add_terms = top3(risers);
    let drop_terms = top3(fallers);

    let mut clauses = Vec::new();
    if !add_terms.is_empty() {
        clauses.push(format!("Adds emphasis on {}", add_terms.join(", ")));
    }
    if !drop_terms.is_empty() {
        clauses.push(format!("de-emphasizes {}", drop_terms.join(", ")));
    }
    if clauses.is_empty() {
        return String::new();
    }
    format!("{}.", clauses.join("; "))
}

/// Build the full shift pair for the primary term-count path (unigrams +
/// retained collocations + allowlist phrases), and optionally the alternate
/// path (document keyphrases + allowlist phrases) when its combined
/// selection clears the minimum-count gate.
pub fn build_shift_pair(
    from_year: i32,
    to_year: i32,
    primary_prev: &BTreeMap<String, u64>,
    primary_curr: &BTreeMap<String, u64>,
    alternate_prev: Option<&BTreeMap<String, u64>>,
    alternate_curr: Option<&BTreeMap<String, u64>>,
) -> ShiftPair {
    let primary_stats = compute_term_stats(primary_prev, primary_curr);
    let risers = top_risers(&primary_stats);
    let fallers = top_fallers(&primary_stats);
    let summary = summary_sentence(&risers, &fallers);

    let (alt_risers, alt_fallers, summary_alt) = match (alternate_prev, alternate_curr) {
        (Some(ap), Some(ac)) => {
            let alt_stats = compute_term_stats(ap, ac);
            let ar = top_risers(&alt_stats);
            let af = top_fallers(&alt_stats);
            if ar.len() + af.len() >= MIN_ALT_COMBINED {
                let alt_summary = summary_sentence(&ar, &af);
                (Some(ar), Some(af), Some(alt_summary))
            } else {
                (None, None, None)
            }
        }
        _ => (None, None, None),
    };

    ShiftPair {
        from: from_year,
        to: to_year,
        top_risers: risers,
        top_fallers: fallers,
        summary,
        top_risers_alt: alt_risers,
        top_fallers_alt: alt_fallers,
        summary_alt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn counts(pairs: &[(&str, u64)]) -> BTreeMap<String, u64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn riser_has_positive_score_when_term_appears_only_in_curr() {
        let prev = counts(&[("pricing", 50)]);
        let curr = counts(&[("pricing", 50), ("regulation", 40)]);
        let stats = compute_term_stats(&prev, &curr);
        let regulation = stats.iter().find(|s| s.term == "regulation").unwrap();
        assert!(regulation.score > 0.0);
    }

    #[test]
    fn rejects_repeated_adjacent_token_terms() {
        let prev = counts(&[("climate climate", 5)]);
        let curr = counts(&[("climate climate", 8)]);
        let stats = compute_term_stats(&prev, &curr);
        assert!(stats.is_empty());
    }

    #[test]
    fn summary_mentions_top_riser_and_faller() {
        let prev = counts(&[("legacy", 100), ("pricing", 50)]);
        let curr = counts(&[("legacy", 1), ("pricing", 50), ("cyberattack", 90)]);
        let pair = build_shift_pair(2022, 2023, &prev, &curr, None, None);
        assert!(pair.summary.contains("cyberattack") || pair.summary.contains("legacy"));
    }

    #[test]
    fn distinctiveness_requires_combined_count_gate() {
        let prev = counts(&[("novelterm", 1)]);
        let curr = counts(&[("novelterm", 2)]);
        let stats = compute_term_stats(&prev, &curr);
        let novel = stats.iter().find(|s| s.term == "novelterm").unwrap();
        assert!(!novel.distinctive);
        assert_relative_eq!(novel.count_prev as f64, 1.0);
    }
}
