//! Drift metrics (S4): a term-frequency-inverse-document-frequency vector
//! space, pairwise cosine similarity, bootstrap confidence intervals on
//! year-over-year drift, and sentence-reuse boilerplate scoring.

use crate::lexicon::STOPWORDS;
use ndarray::Array2;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

const BOOTSTRAP_SEED: u64 = 13;
const BOOTSTRAP_ITERATIONS: usize = 200;

static WORD_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z]{2,}").unwrap());
static SENTENCE_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+\s+").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

fn vector_space_tokens(text: &str) -> Vec<String> {
    WORD_RUN
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .filter(|tok| !STOPWORDS.contains(tok.as_str()))
        .collect()
}

/// A fitted term-frequency-inverse-document-frequency vectorizer over a
/// fixed vocabulary, reusable across the bootstrap resample.
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Fit a vectorizer over the given documents (already tokenized), with
    /// inverse-document-frequency smoothed the standard way
    /// (`ln((1+n)/(1+df)) + 1`) so no term has zero weight.
    pub fn fit(documents: &[Vec<String>]) -> Self {
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            let unique: HashSet<&String> = doc.iter().collect();
            for term in unique {
                if !vocabulary.contains_key(term) {
                    let idx = vocabulary.len();
                    vocabulary.insert(term.clone(), idx);
                }
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
        }
        let n = documents.len() as f64;
        let mut idf = vec![0.0; vocabulary.len()];
        for (term, &idx) in &vocabulary {
            let df = doc_freq[term] as f64;
            idf[idx] = ((1.0 + n) / (1.0 + df)).ln() + 1.0;
        }
        Self { vocabulary, idf }
    }

    /// Transform one tokenized document into an L2-normalized dense vector
    /// over the fitted vocabulary. Terms outside the vocabulary are ignored.
    pub fn transform(&self, tokens: &[String]) -> Vec<f64> {
        let mut counts = vec![0.0_f64; self.vocabulary.len()];
        for tok in tokens {
            if let Some(&idx) = self.vocabulary.get(tok) {
                counts[idx] += 1.0;
            }
        }
        for (idx, c) in counts.iter_mut().enumerate() {
            *c *= self.idf[idx];
        }
        let norm = counts.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for c in counts.iter_mut() {
                *c /= norm;
            }
        }
        counts
    }
}

/// Cosine similarity between two equal-length, already L2-normalized
/// vectors (their dot product). Returns 1.0 for two all-zero vectors so
/// identical empty documents compare as identical rather than undefined.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    if a.iter().all(|v| *v == 0.0) && b.iter().all(|v| *v == 0.0) {
        return 1.0;
    }
    dot.clamp(0.0, 1.0)
}

/// Build the symmetric cosine-similarity matrix across a company's valid
/// section-years, in order. The diagonal is exactly `1.0`.
pub fn similarity_matrix(texts: &[&str]) -> (TfidfVectorizer, Array2<f64>) {
    let documents: Vec<Vec<String>> = texts.iter().map(|t| vector_space_tokens(t)).collect();
    let vectorizer = TfidfVectorizer::fit(&documents);
    let vectors: Vec<Vec<f64>> = documents.iter().map(|d| vectorizer.transform(d)).collect();

    let n = texts.len();
    let mut matrix = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        matrix[[i, i]] = 1.0;
        for j in (i + 1)..n {
            let sim = cosine_similarity(&vectors[i], &vectors[j]);
            matrix[[i, j]] = sim;
            matrix[[j, i]] = sim;
        }
    }
    (vectorizer, matrix)
}

/// Adjacent-year drift: `1 - cosine_similarity`, rounded to 2 decimals.
pub fn drift(prev: &[f64], curr: &[f64]) -> f64 {
    ((1.0 - cosine_similarity(prev, curr)) * 100.0).round() / 100.0
}

/// A minimal-state xorshift64 generator, used only so the bootstrap is
/// reproducible across platforms without depending on `rand`'s algorithm
/// choice remaining stable across releases.
struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    fn seeded(seed: u64) -> Self {
        Self { state: seed.wrapping_mul(2685821657736338717).max(1) }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_index(&mut self, bound: usize) -> usize {
        (self.next_u64() % bound as u64) as usize
    }
}

fn resample_with_replacement(paragraphs: &[String], rng: &mut Xorshift64) -> Vec<String> {
    (0..paragraphs.len())
        .map(|_| paragraphs[rng.next_index(paragraphs.len())].clone())
        .collect()
}

fn percentile(sorted_samples: &[f64], pct: f64) -> f64 {
    if sorted_samples.is_empty() {
        return 0.0;
    }
    let rank = pct / 100.0 * (sorted_samples.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted_samples[lower];
    }
    let frac = rank - lower as f64;
    sorted_samples[lower] + (sorted_samples[upper] - sorted_samples[lower]) * frac
}

/// Percentile-bootstrap confidence interval on `1 - similarity` between two
/// years' paragraphs, reusing the already-fit vectorizer's vocabulary.
/// Deterministic: always reseeded with the constant `13`.
pub fn bootstrap_drift_ci(vectorizer: &TfidfVectorizer, prev_paragraphs: &[String], curr_paragraphs: &[String]) -> (f64, f64) {
    let mut rng = Xorshift64::seeded(BOOTSTRAP_SEED);
    let mut samples = Vec::with_capacity(BOOTSTRAP_ITERATIONS);
    for _ in 0..BOOTSTRAP_ITERATIONS {
        let prev_sample = resample_with_replacement(prev_paragraphs, &mut rng);
        let curr_sample = resample_with_replacement(curr_paragraphs, &mut rng);
        let prev_tokens = vector_space_tokens(&prev_sample.join(" "));
        let curr_tokens = vector_space_tokens(&curr_sample.join(" "));
        let prev_vec = vectorizer.transform(&prev_tokens);
        let curr_vec = vectorizer.transform(&curr_tokens);
        samples.push(1.0 - cosine_similarity(&prev_vec, &curr_vec));
    }
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let low = (percentile(&samples, 5.0) * 100.0).round() / 100.0;
    let high = (percentile(&samples, 95.0) * 100.0).round() / 100.0;
    (low, high)
}

fn sentence_tokenize(text: &str) -> Vec<String> {
    SENTENCE_BOUNDARY
        .split(text)
        .map(|s| WHITESPACE.replace_all(s.trim(), " ").to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Sentence-reuse boilerplate score: the fraction of `curr`'s sentences
/// that also appear verbatim (after lowercasing/whitespace-collapse) among
/// `prev`'s sentences. A single-sentence paragraph wholly reused scores
/// `1.0`.
pub fn boilerplate_score(prev: &str, curr: &str) -> f64 {
    let curr_sentences = sentence_tokenize(curr);
    if curr_sentences.is_empty() {
        return 0.0;
    }
    let prev_set: HashSet<String> = sentence_tokenize(prev).into_iter().collect();
    let reused = curr_sentences.iter().filter(|s| prev_set.contains(*s)).count();
    reused as f64 / curr_sentences.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identical_documents_have_similarity_one() {
        let texts = vec!["the company faces significant risk from competition", "the company faces significant risk from competition"];
        let (_, matrix) = similarity_matrix(&texts);
        assert_relative_eq!(matrix[[0, 1]], 1.0, epsilon = 1e-9);
        assert_eq!(matrix[[0, 0]], 1.0);
        assert_eq!(matrix[[1, 1]], 1.0);
    }

    #[test]
    fn disjoint_documents_have_similarity_zero() {
        let texts = vec!["competition pricing margin supply", "weather climate flooding drought"];
        let (_, matrix) = similarity_matrix(&texts);
        assert_relative_eq!(matrix[[0, 1]], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn bootstrap_ci_is_deterministic() {
        let texts = vec!["risk factor competition pricing margin", "risk factor regulation pricing supply"];
        let (vectorizer, _) = similarity_matrix(&texts);
        let prev_paras = vec!["risk factor competition pricing margin".to_string()];
        let curr_paras = vec!["risk factor regulation pricing supply".to_string()];
        let (lo1, hi1) = bootstrap_drift_ci(&vectorizer, &prev_paras, &curr_paras);
        let (lo2, hi2) = bootstrap_drift_ci(&vectorizer, &prev_paras, &curr_paras);
        assert_eq!(lo1, lo2);
        assert_eq!(hi1, hi2);
        assert!(lo1 <= hi1);
    }

    #[test]
    fn boilerplate_full_reuse_scores_one() {
        let prev = "We face intense competition in our markets.";
        let curr = "We face intense competition in our markets.";
        assert_relative_eq!(boilerplate_score(prev, curr), 1.0);
    }

    #[test]
    fn boilerplate_no_reuse_scores_zero() {
        let prev = "We face intense competition in our markets.";
        let curr = "Climate change could disrupt our supply chain.";
        assert_relative_eq!(boilerplate_score(prev, curr), 0.0);
    }
}
