//! Excerpt selector (S6): candidate gating, weighted term-pattern scoring
//! against a shift pair's top terms, and maximal-marginal-relevance
//! diversification of the chosen representative paragraphs.

use crate::lexicon::STOPWORDS;
use crate::normalize::normalize_text;
use crate::types::{ExcerptPair, RepresentativeParagraph, ShiftPair, ShiftTermStats};
use regex::Regex;
use std::collections::{HashMap, HashSet};

const MIN_PARAGRAPH_LEN: usize = 220;
const MAX_PARAGRAPH_LEN: usize = 2600;
const MAX_DIGIT_RATIO: f64 = 0.22;
const SECONDARY_WEIGHT: f64 = 0.25;
const MAX_TERM_HITS: u64 = 3;
const MAX_PER_YEAR: usize = 3;
const MMR_LAMBDA: f64 = 0.35;
const MMR_VOCAB_CAP: usize = 8_000;
const MAX_TERMS: usize = 15;

struct WeightedTerm {
    pattern: Regex,
    weight: f64,
}

fn compile_term_pattern(term: &str) -> Regex {
    let parts: Vec<String> = term.split_whitespace().map(regex::escape).collect();
    let pattern = format!(r"(?i)\b{}\b", parts.join(r"[\s\-\u{2010}-\u{2014}]+"));
    Regex::new(&pattern).unwrap_or_else(|_| Regex::new(&regex::escape(term)).unwrap())
}

fn weighted_terms(stats: &[ShiftTermStats]) -> Vec<WeightedTerm> {
    stats
        .iter()
        .map(|s| WeightedTerm { pattern: compile_term_pattern(&s.term), weight: s.score.abs().max(0.5) })
        .collect()
}

fn digit_ratio(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
    digits as f64 / text.chars().count() as f64
}

fn passes_candidate_gate(text: &str) -> bool {
    let len = text.chars().count();
    len >= MIN_PARAGRAPH_LEN && len <= MAX_PARAGRAPH_LEN && digit_ratio(text) <= MAX_DIGIT_RATIO
}

fn score_paragraph(text: &str, primary: &[WeightedTerm], secondary: &[WeightedTerm]) -> f64 {
    let primary_hits: f64 = primary
        .iter()
        .map(|t| (t.pattern.find_iter(text).count() as u64).min(MAX_TERM_HITS) as f64 * t.weight)
        .sum();
    if primary_hits <= 0.0 {
        return 0.0;
    }
    let secondary_hits: f64 = secondary
        .iter()
        .map(|t| (t.pattern.find_iter(text).count() as u64).min(MAX_TERM_HITS) as f64 * t.weight)
        .sum();
    primary_hits + SECONDARY_WEIGHT * secondary_hits
}

struct Candidate {
    year: i32,
    paragraph_index: usize,
    text: String,
    score: f64,
}

fn ngram_vocabulary(texts: &[&str]) -> Vec<String> {
    let word = Regex::new(r"[a-z]{2,}").unwrap();
    let mut freq: HashMap<String, u64> = HashMap::new();
    for text in texts {
        let tokens: Vec<String> = word
            .find_iter(&text.to_lowercase())
            .map(|m| m.as_str().to_string())
            .filter(|t| !STOPWORDS.contains(t.as_str()))
            .collect();
        for tok in &tokens {
            *freq.entry(tok.clone()).or_insert(0) += 1;
        }
        for pair in tokens.windows(2) {
            *freq.entry(format!("{} {}", pair[0], pair[1])).or_insert(0) += 1;
        }
    }
    let mut terms: Vec<String> = freq.keys().cloned().collect();
    terms.sort_by(|a, b| freq[b].cmp(&freq[a]).then_with(|| a.cmp(b)));
    terms.truncate(MMR_VOCAB_CAP);
    terms
}

fn ngram_vector(text: &str, vocab_index: &HashMap<String, usize>) -> Vec<f64> {
    let word = Regex::new(r"[a-z]{2,}").unwrap();
    let tokens: Vec<String> = word
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .filter(|t| !STOPWORDS.contains(t.as_str()))
        .collect();
    let mut counts = vec![0.0_f64; vocab_index.len()];
    for tok in &tokens {
        if let Some(&idx) = vocab_index.get(tok) {
            counts[idx] += 1.0;
        }
    }
    for pair in tokens.windows(2) {
        let bigram = format!("{} {}", pair[0], pair[1]);
        if let Some(&idx) = vocab_index.get(&bigram) {
            counts[idx] += 1.0;
        }
    }
    let norm = counts.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for c in counts.iter_mut() {
            *c /= norm;
        }
    }
    counts
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn mmr_select(candidates: Vec<Candidate>) -> Vec<Candidate> {
    if candidates.len() <= MAX_PER_YEAR {
        return candidates;
    }
    let texts: Vec<&str> = candidates.iter().map(|c| c.text.as_str()).collect();
    let vocab = ngram_vocabulary(&texts);
    let vocab_index: HashMap<String, usize> = vocab.into_iter().enumerate().map(|(i, t)| (t, i)).collect();
    let vectors: Vec<Vec<f64>> = texts.iter().map(|t| ngram_vector(t, &vocab_index)).collect();

    let mut remaining: Vec<usize> = (0..candidates.len()).collect();
    let mut selected: Vec<usize> = Vec::new();

    while !remaining.is_empty() && selected.len() < MAX_PER_YEAR {
        let mut best_idx = 0;
        let mut best_value = f64::MIN;
        for (pos, &idx) in remaining.iter().enumerate() {
            let relevance = candidates[idx].score;
            let value = if selected.is_empty() {
                relevance
            } else {
                let max_sim = selected.iter().map(|&s| cosine(&vectors[idx], &vectors[s])).fold(0.0_f64, f64::max);
                relevance - MMR_LAMBDA * max_sim
            };
            if value > best_value {
                best_value = value;
                best_idx = pos;
            }
        }
        selected.push(remaining.remove(best_idx));
    }

    let mut chosen: Vec<Candidate> = Vec::new();
    let mut remaining_candidates: HashMap<usize, Candidate> = candidates.into_iter().enumerate().collect();
    for idx in selected {
        if let Some(c) = remaining_candidates.remove(&idx) {
            chosen.push(c);
        }
    }
    chosen.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    chosen
}

/// Select, for a single side (`from` or `to`) of a shift pair, up to
/// [`MAX_PER_YEAR`] representative paragraphs from that year's normalized
/// paragraphs, scored against the pair's top terms.
pub fn select_representative_paragraphs(
    year: i32,
    paragraphs: &[String],
    primary_stats: &[ShiftTermStats],
    secondary_stats: &[ShiftTermStats],
) -> Vec<RepresentativeParagraph> {
    let primary = weighted_terms(primary_stats);
    let secondary = weighted_terms(secondary_stats);

    let mut candidates: Vec<Candidate> = paragraphs
        .iter()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let text = normalize_text(raw);
            if !passes_candidate_gate(&text) {
                return None;
            }
            let score = score_paragraph(&text, &primary, &secondary);
            if score <= 0.0 {
                return None;
            }
            Some(Candidate { year, paragraph_index: idx, text, score })
        })
        .collect();

    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap().then_with(|| b.text.len().cmp(&a.text.len())));

    mmr_select(candidates)
        .into_iter()
        .map(|c| RepresentativeParagraph { year: c.year, paragraph_index: c.paragraph_index, text: c.text })
        .collect()
}

fn dedup_preserving_order(terms: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for term in terms {
        let lower = term.to_lowercase();
        if seen.insert(lower.clone()) {
            out.push(lower);
        }
    }
    out
}

/// Build the full excerpt pair: highlight terms (risers then fallers, first
/// seen order) plus representative paragraphs from the `from` year scored
/// against fallers-as-primary and the `to` year scored against
/// risers-as-primary.
pub fn build_excerpt_pair(
    shift: &ShiftPair,
    from_paragraphs: &[String],
    to_paragraphs: &[String],
) -> ExcerptPair {
    let highlight_terms = dedup_preserving_order(
        shift
            .top_risers
            .iter()
            .take(MAX_TERMS)
            .chain(shift.top_fallers.iter().take(MAX_TERMS))
            .map(|s| s.term.clone()),
    );

    let mut representative_paragraphs =
        select_representative_paragraphs(shift.from, from_paragraphs, &shift.top_fallers, &shift.top_risers);
    representative_paragraphs.extend(select_representative_paragraphs(
        shift.to,
        to_paragraphs,
        &shift.top_risers,
        &shift.top_fallers,
    ));

    ExcerptPair { from: shift.from, to: shift.to, highlight_terms, representative_paragraphs }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(term: &str, score: f64) -> ShiftTermStats {
        ShiftTermStats {
            term: term.to_string(),
            score,
            z: 3.0,
            count_prev: 2,
            count_curr: 10,
            per10k_prev: 1.0,
            per10k_curr: 5.0,
            delta_per10k: 4.0,
            distinctive: true,
            includes: Vec::new(),
        }
    }

    #[test]
    fn rejects_short_and_long_paragraphs() {
        assert!(!passes_candidate_gate("too short"));
        assert!(!passes_candidate_gate(&"x".repeat(3000)));
    }

    #[test]
    fn rejects_digit_heavy_paragraphs() {
        let text = "1 2 3 4 5 6 7 8 9 0 ".repeat(15);
        assert!(!passes_candidate_gate(&text));
    }

    #[test]
    fn selects_paragraphs_mentioning_primary_terms() {
        let stats = vec![stat("cyberattack", 3.0)];
        let paragraph = format!(
            "Our systems face growing exposure to a cyberattack that could disrupt operations materially across our {}",
            "business segments and global supply chain partners over the coming fiscal year".repeat(2)
        );
        let paragraphs = vec![paragraph];
        let selected = select_representative_paragraphs(2023, &paragraphs, &stats, &[]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].year, 2023);
    }

    #[test]
    fn skips_paragraphs_with_no_primary_hit() {
        let stats = vec![stat("cyberattack", 3.0)];
        let paragraph = "x".repeat(300);
        let selected = select_representative_paragraphs(2023, &[paragraph], &stats, &[]);
        assert!(selected.is_empty());
    }
}
