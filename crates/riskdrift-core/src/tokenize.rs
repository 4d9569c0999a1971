//! Tokenizer and phrase engine (S3): unigrams, PMI collocations, TextRank-style
//! keyphrases, the curated phrase allowlist, and canonical-term folding.

use crate::canonical::CanonicalTermsMap;
use crate::lexicon::{HONORIFICS, NAME_SUFFIXES, NOISE_TOKENS, PHRASE_ALLOWLIST, SHORT_TOKEN_WHITELIST, STOPWORDS};
use crate::types::TermCounts;
use regex::{Regex, RegexBuilder};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static WORD_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z]{2,}").unwrap());

fn stopwords() -> &'static HashSet<&'static str> {
    static SET: LazyLock<HashSet<&'static str>> = LazyLock::new(|| STOPWORDS.iter().copied().collect());
    &SET
}

fn honorifics() -> &'static HashSet<&'static str> {
    static SET: LazyLock<HashSet<&'static str>> = LazyLock::new(|| HONORIFICS.iter().copied().collect());
    &SET
}

fn name_suffixes() -> &'static HashSet<&'static str> {
    static SET: LazyLock<HashSet<&'static str>> = LazyLock::new(|| NAME_SUFFIXES.iter().copied().collect());
    &SET
}

fn noise_tokens() -> &'static HashSet<&'static str> {
    static SET: LazyLock<HashSet<&'static str>> = LazyLock::new(|| NOISE_TOKENS.iter().copied().collect());
    &SET
}

fn short_whitelist() -> &'static HashSet<&'static str> {
    static SET: LazyLock<HashSet<&'static str>> = LazyLock::new(|| SHORT_TOKEN_WHITELIST.iter().copied().collect());
    &SET
}

/// Lowercase, filtered token stream for one document. Honorifics consume
/// the token immediately following them; name-suffix and corporate-noise
/// tokens are dropped outright; short tokens are dropped unless whitelisted.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let raw: Vec<&str> = WORD_RUN.find_iter(&lower).map(|m| m.as_str()).collect();

    let mut out = Vec::with_capacity(raw.len());
    let mut skip_next = false;
    for (idx, &tok) in raw.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }
        if stopwords().contains(tok) {
            continue;
        }
        if honorifics().contains(tok) {
            if idx + 1 < raw.len() {
                skip_next = true;
            }
            continue;
        }
        if name_suffixes().contains(tok) || noise_tokens().contains(tok) {
            continue;
        }
        if tok.len() < 3 && !short_whitelist().contains(tok) {
            continue;
        }
        out.push(tok.to_string());
    }
    out
}

/// Adjacent token pairs, skipping pairs where both tokens are identical.
pub fn bigrams(tokens: &[String]) -> Vec<(String, String)> {
    tokens
        .windows(2)
        .filter(|pair| pair[0] != pair[1])
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect()
}

/// Pointwise-mutual-information collocation retention over a pooled corpus
/// of per-document token streams. Returns the set of retained bigrams
/// (space-joined) with `pmi >= 4.0` among those with pooled count `>= 4`.
pub fn retained_collocations(document_tokens: &[Vec<String>]) -> HashSet<String> {
    let mut unigram_counts: HashMap<&str, u64> = HashMap::new();
    let mut bigram_counts: HashMap<(String, String), u64> = HashMap::new();
    let mut total_unigrams = 0u64;
    let mut total_bigrams = 0u64;

    for tokens in document_tokens {
        for tok in tokens {
            *unigram_counts.entry(tok.as_str()).or_insert(0) += 1;
            total_unigrams += 1;
        }
        for (a, b) in bigrams(tokens) {
            *bigram_counts.entry((a, b)).or_insert(0) += 1;
            total_bigrams += 1;
        }
    }

    if total_unigrams == 0 || total_bigrams == 0 {
        return HashSet::new();
    }

    let t1 = total_unigrams as f64;
    let t2 = total_bigrams as f64;
    let mut retained = HashSet::new();
    for ((x, y), &c) in &bigram_counts {
        if c < 4 {
            continue;
        }
        let cx = *unigram_counts.get(x.as_str()).unwrap_or(&0) as f64;
        let cy = *unigram_counts.get(y.as_str()).unwrap_or(&0) as f64;
        if cx == 0.0 || cy == 0.0 {
            continue;
        }
        let p_xy = c as f64 / t2;
        let p_x = cx / t1;
        let p_y = cy / t1;
        let pmi = (p_xy / (p_x * p_y)).log2();
        if pmi >= 4.0 {
            retained.insert(format!("{x} {y}"));
        }
    }
    retained
}

/// Per-document keyphrase extraction by damped random-walk co-occurrence
/// ranking (a TextRank-style graph rank), used as the alternate phrase
/// source for S5's alt shift lists.
pub fn keyphrases(tokens: &[String], doc_frequency: &HashMap<String, u64>) -> Vec<String> {
    const WINDOW: usize = 4;
    const DAMPING: f64 = 0.85;
    const ITERATIONS: usize = 25;
    const TOP_K: usize = 60;
    const MAX_PHRASES: usize = 250;

    let candidates: HashSet<&str> = tokens
        .iter()
        .filter(|t| doc_frequency.get(t.as_str()).copied().unwrap_or(0) >= 3)
        .map(String::as_str)
        .collect();
    if candidates.is_empty() {
        return Vec::new();
    }

    let mut node_index: HashMap<&str, usize> = HashMap::new();
    for tok in &candidates {
        let next = node_index.len();
        node_index.entry(tok).or_insert(next);
    }
    let n = node_index.len();
    let mut adjacency: Vec<HashMap<usize, f64>> = vec![HashMap::new(); n];

    for i in 0..tokens.len() {
        if !candidates.contains(tokens[i].as_str()) {
            continue;
        }
        let a = node_index[tokens[i].as_str()];
        for j in (i + 1)..tokens.len().min(i + 1 + WINDOW) {
            if !candidates.contains(tokens[j].as_str()) {
                continue;
            }
            let b = node_index[tokens[j].as_str()];
            if a == b {
                continue;
            }
            *adjacency[a].entry(b).or_insert(0.0) += 1.0;
            *adjacency[b].entry(a).or_insert(0.0) += 1.0;
        }
    }

    let mut ranks = vec![1.0 / n as f64; n];
    let out_weight: Vec<f64> = adjacency.iter().map(|edges| edges.values().sum()).collect();
    for _ in 0..ITERATIONS {
        let mut next_ranks = vec![(1.0 - DAMPING) / n as f64; n];
        for (node, edges) in adjacency.iter().enumerate() {
            for (&neighbor, &weight) in edges {
                if out_weight[node] > 0.0 {
                    next_ranks[neighbor] += DAMPING * ranks[node] * (weight / out_weight[node]);
                }
            }
        }
        ranks = next_ranks;
    }

    let mut ranked: Vec<(&str, f64)> = node_index.keys().map(|&tok| (tok, ranks[node_index[tok]])).collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then_with(|| a.0.cmp(b.0)));
    let top_set: HashSet<&str> = ranked.into_iter().take(TOP_K).map(|(tok, _)| tok).collect();

    let mut phrase_counts: HashMap<String, u64> = HashMap::new();
    let mut i = 0;
    while i < tokens.len() {
        if !top_set.contains(tokens[i].as_str()) {
            i += 1;
            continue;
        }
        let mut run_end = i + 1;
        while run_end < tokens.len() && run_end - i < 3 && top_set.contains(tokens[run_end].as_str()) {
            run_end += 1;
        }
        for len in (2..=(run_end - i).min(3)).rev() {
            let phrase = tokens[i..i + len].join(" ");
            *phrase_counts.entry(phrase).or_insert(0) += 1;
        }
        i = run_end.max(i + 1);
    }

    let mut phrases: Vec<String> = phrase_counts
        .into_iter()
        .filter(|(_, count)| *count >= 2)
        .map(|(phrase, _)| phrase)
        .collect();
    phrases.sort();
    phrases.truncate(MAX_PHRASES);
    phrases
}

fn allowlist_patterns() -> &'static [(String, Regex)] {
    static PATTERNS: LazyLock<Vec<(String, Regex)>> = LazyLock::new(|| {
        PHRASE_ALLOWLIST
            .iter()
            .map(|phrase| {
                let parts: Vec<String> = phrase.split(' ').map(regex::escape).collect();
                let pattern = format!(r"(?i)\b{}\b", parts.join(r"[\s\-\u{2010}-\u{2014}'\u{2019}]+"));
                (phrase.to_string(), Regex::new(&pattern).unwrap())
            })
            .collect()
    });
    &PATTERNS
}

/// Count occurrences of each allowlist phrase in `text`, case-insensitively
/// and tolerant of whitespace/hyphen/apostrophe punctuation between words.
pub fn allowlist_counts(text: &str) -> TermCounts {
    let mut counts = TermCounts::new();
    for (phrase, pattern) in allowlist_patterns() {
        let hits = pattern.find_iter(text).count() as u64;
        if hits > 0 {
            *counts.entry(phrase.clone()).or_insert(0) += hits;
        }
    }
    counts
}

/// Fold raw term counts through a loaded canonical-terms map: hits are
/// replaced by the concept's display label and the raw variant is recorded
/// in `includes`; misses pass through unchanged.
pub fn canonicalize_counts(
    counts: &TermCounts,
    map: Option<&CanonicalTermsMap>,
) -> (TermCounts, HashMap<String, HashSet<String>>) {
    let mut folded = TermCounts::new();
    let mut includes: HashMap<String, HashSet<String>> = HashMap::new();
    for (term, &count) in counts {
        match map.and_then(|m| m.lookup(term)) {
            Some(label) => {
                *folded.entry(label.clone()).or_insert(0) += count;
                includes.entry(label).or_default().insert(term.clone());
            }
            None => {
                *folded.entry(term.clone()).or_insert(0) += count;
            }
        }
    }
    (folded, includes)
}

/// Build the primary term-count vocabulary for one document: unigrams, PMI
/// collocations present in `retained_bigrams`, and allowlist phrases.
pub fn primary_counts(tokens: &[String], retained_bigrams: &HashSet<String>, text: &str) -> TermCounts {
    let mut counts = TermCounts::new();
    for tok in tokens {
        *counts.entry(tok.clone()).or_insert(0) += 1;
    }
    for (a, b) in bigrams(tokens) {
        let phrase = format!("{a} {b}");
        if retained_bigrams.contains(&phrase) {
            *counts.entry(phrase).or_insert(0) += 1;
        }
    }
    for (phrase, count) in allowlist_counts(text) {
        *counts.entry(phrase).or_insert(0) += count;
    }
    counts
}

/// Build the alternate term-count vocabulary: per-document keyphrases plus
/// allowlist phrases.
pub fn alternate_counts(tokens: &[String], doc_frequency: &HashMap<String, u64>, text: &str) -> TermCounts {
    let mut counts = TermCounts::new();
    for phrase in keyphrases(tokens, doc_frequency) {
        *counts.entry(phrase).or_insert(0) += 1;
    }
    for (phrase, count) in allowlist_counts(text) {
        *counts.entry(phrase).or_insert(0) += count;
    }
    counts
}

/// Document frequency (number of documents each token appears in at least
/// once) across a corpus, used by [`keyphrases`].
pub fn document_frequency(document_tokens: &[Vec<String>]) -> HashMap<String, u64> {
    let mut df: HashMap<String, u64> = HashMap::new();
    for tokens in document_tokens {
        let unique: HashSet<&String> = tokens.iter().collect();
        for tok in unique {
            *df.entry(tok.clone()).or_insert(0) += 1;
        }
    }
    df
}

/// True iff `term`'s whitespace-separated tokens contain an immediate
/// adjacent duplicate (e.g. `"climate climate"`). Used to reject terms at
/// generation time and to validate artifacts after the fact.
pub fn has_repeated_adjacent_tokens(term: &str) -> bool {
    let tokens: Vec<&str> = term.split_whitespace().collect();
    tokens.windows(2).any(|pair| pair[0] == pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{compile_terms, CanonicalTermsSpec, ConceptSpec};

    #[test]
    fn retains_strongly_associated_bigrams_above_the_pmi_threshold() {
        let mut docs: Vec<Vec<String>> = Vec::new();
        for _ in 0..5 {
            docs.push(vec!["cyberattack".to_string(), "resilience".to_string()]);
        }
        // Noise documents inflate the unigram pool without touching the
        // bigram's own counts, pushing its PMI above the retention floor.
        for i in 0..20 {
            docs.push(vec![format!("noiseword{i}")]);
        }
        let retained = retained_collocations(&docs);
        assert!(retained.contains("cyberattack resilience"));
    }

    #[test]
    fn excludes_bigrams_that_meet_the_count_floor_but_not_the_pmi_floor() {
        // A perfectly-correlated, isolated two-word vocabulary always scores
        // pmi = log2(4) = 2.0, below the 4.0 floor, regardless of count.
        let docs: Vec<Vec<String>> = (0..4).map(|_| vec!["common".to_string(), "word".to_string()]).collect();
        let retained = retained_collocations(&docs);
        assert!(!retained.contains("common word"));
    }

    #[test]
    fn retained_collocations_requires_a_minimum_pooled_count() {
        let docs: Vec<Vec<String>> = (0..3).map(|_| vec!["supply".to_string(), "chain".to_string()]).collect();
        let retained = retained_collocations(&docs);
        assert!(!retained.contains("supply chain"));
    }

    #[test]
    fn keyphrases_promotes_frequently_co_occurring_terms_over_rare_ones() {
        let mut tokens: Vec<String> = Vec::new();
        for _ in 0..10 {
            tokens.push("supply".to_string());
            tokens.push("chain".to_string());
        }
        tokens.push("rareterm".to_string());

        let mut doc_frequency: HashMap<String, u64> = HashMap::new();
        doc_frequency.insert("supply".to_string(), 5);
        doc_frequency.insert("chain".to_string(), 5);
        doc_frequency.insert("rareterm".to_string(), 1);

        let phrases = keyphrases(&tokens, &doc_frequency);
        assert!(phrases.contains(&"supply chain".to_string()));
        assert!(!phrases.iter().any(|p| p.contains("rareterm")));
    }

    #[test]
    fn canonicalize_counts_folds_variants_into_their_concept_label() {
        let spec = CanonicalTermsSpec {
            concepts: vec![ConceptSpec {
                id: "cyber".to_string(),
                label: "Cybersecurity Incidents".to_string(),
                variants: vec!["cyberattack".to_string(), "cyber attack".to_string()],
                conditional_variants: Vec::new(),
                notes: Vec::new(),
            }],
        };
        let (map, _warnings) = compile_terms(&spec).unwrap();

        let mut counts = TermCounts::new();
        counts.insert("cyberattack".to_string(), 3);
        counts.insert("cyber attack".to_string(), 2);
        counts.insert("unrelated term".to_string(), 7);

        let (folded, includes) = canonicalize_counts(&counts, Some(&map));

        assert_eq!(folded.get("Cybersecurity Incidents"), Some(&5));
        assert_eq!(folded.get("unrelated term"), Some(&7));
        assert!(includes.get("Cybersecurity Incidents").unwrap().contains("cyberattack"));
        assert!(includes.get("Cybersecurity Incidents").unwrap().contains("cyber attack"));
    }

    #[test]
    fn canonicalize_counts_passes_through_unchanged_without_a_map() {
        let mut counts = TermCounts::new();
        counts.insert("whatever".to_string(), 4);
        let (folded, includes) = canonicalize_counts(&counts, None);
        assert_eq!(folded, counts);
        assert!(includes.is_empty());
    }
}
