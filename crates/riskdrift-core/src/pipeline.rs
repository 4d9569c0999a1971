//! Company-level orchestration (S3-S6): wires the tokenizer/phrase engine,
//! drift metrics, term-shift analyzer, and excerpt selector together over
//! one company's ordered [`SectionYear`] series.
//!
//! Section extraction (S1) and normalization (S2) happen upstream, once
//! per filing, before a [`SectionYear`] ever reaches this module - this is
//! the only place that spans a whole company's corpus at once, since PMI
//! collocation retention and keyphrase document frequency are pooled
//! statistics over every valid year.

use crate::canonical::CanonicalTermsMap;
use crate::excerpt::build_excerpt_pair;
use crate::metrics::{self, TfidfVectorizer};
use crate::shift::build_shift_pair;
use crate::tokenize;
use crate::types::{ExcerptPair, SectionYear, ShiftPair, ShiftTermStats};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Pairwise cosine-similarity matrix over a company's *valid*
/// section-years only (see §4.4: "across all valid SectionYears").
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimilarityResult {
    /// Valid years included, ascending.
    pub years: Vec<i32>,
    /// Square, symmetric matrix; diagonal exactly `1.0`.
    pub matrix: Vec<Vec<f64>>,
}

/// Drift/confidence-interval/boilerplate series aligned to the company's
/// *full* year list (including invalid years); position 0 and any pair
/// touching an invalid year is `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricsResult {
    /// Every year in the company's series, ascending (valid or not).
    pub years: Vec<i32>,
    /// `1 - cosine_similarity` between each year and its predecessor.
    pub drift_vs_prev: Vec<Option<f64>>,
    /// 5th-percentile bootstrap bound on drift.
    pub drift_ci_low: Vec<Option<f64>>,
    /// 95th-percentile bootstrap bound on drift.
    pub drift_ci_high: Vec<Option<f64>>,
    /// Fraction of the later year's sentences reused verbatim from the
    /// earlier year.
    pub boilerplate_score: Vec<Option<f64>>,
}

/// Full S3-S6 output for one company.
#[derive(Debug, Clone, Default)]
pub struct CompanyAnalysis {
    /// S4 similarity matrix.
    pub similarity: SimilarityResult,
    /// S4 drift/CI/boilerplate series.
    pub metrics: MetricsResult,
    /// S5 shift pairs, one per valid adjacent year pair.
    pub shift_pairs: Vec<ShiftPair>,
    /// S6 excerpt pairs, one per valid adjacent year pair (same pairing as
    /// `shift_pairs`).
    pub excerpt_pairs: Vec<ExcerptPair>,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn build_similarity(valid: &[&SectionYear]) -> (SimilarityResult, Option<TfidfVectorizer>) {
    if valid.is_empty() {
        return (SimilarityResult::default(), None);
    }
    let texts: Vec<&str> = valid.iter().map(|y| y.text.as_str()).collect();
    let (vectorizer, raw) = metrics::similarity_matrix(&texts);
    let n = valid.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            matrix[i][j] = if i == j { 1.0 } else { round2(raw[[i, j]]) };
        }
    }
    let years = valid.iter().map(|y| y.year).collect();
    (SimilarityResult { years, matrix }, Some(vectorizer))
}

fn build_metrics(
    years: &[SectionYear],
    valid_index: &HashMap<i32, usize>,
    similarity: &SimilarityResult,
    vectorizer: Option<&TfidfVectorizer>,
) -> MetricsResult {
    let all_years: Vec<i32> = years.iter().map(|y| y.year).collect();
    let n = all_years.len();
    let mut drift_vs_prev = vec![None; n];
    let mut drift_ci_low = vec![None; n];
    let mut drift_ci_high = vec![None; n];
    let mut boilerplate_score = vec![None; n];

    for i in 1..n {
        let prev = &years[i - 1];
        let curr = &years[i];
        if !prev.is_valid() || !curr.is_valid() {
            continue;
        }
        let (Some(&prev_idx), Some(&curr_idx)) = (valid_index.get(&prev.year), valid_index.get(&curr.year)) else {
            continue;
        };
        let Some(vectorizer) = vectorizer else { continue };

        let sim = similarity.matrix[prev_idx][curr_idx];
        drift_vs_prev[i] = Some(round2(1.0 - sim));

        let (lo, hi) = metrics::bootstrap_drift_ci(vectorizer, &prev.paragraphs, &curr.paragraphs);
        drift_ci_low[i] = Some(lo);
        drift_ci_high[i] = Some(hi);

        boilerplate_score[i] = Some(round2(metrics::boilerplate_score(&prev.text, &curr.text)));
    }

    MetricsResult { years: all_years, drift_vs_prev, drift_ci_low, drift_ci_high, boilerplate_score }
}

struct YearTermCounts {
    year: i32,
    primary: BTreeMap<String, u64>,
    primary_includes: HashMap<String, HashSet<String>>,
    alternate: BTreeMap<String, u64>,
    alternate_includes: HashMap<String, HashSet<String>>,
}

fn build_term_counts(valid: &[&SectionYear], canonical: Option<&CanonicalTermsMap>) -> Vec<YearTermCounts> {
    let tokens_by_year: Vec<Vec<String>> = valid.iter().map(|y| tokenize::tokenize(&y.text)).collect();
    let retained_bigrams = tokenize::retained_collocations(&tokens_by_year);
    let doc_frequency = tokenize::document_frequency(&tokens_by_year);

    valid
        .iter()
        .zip(tokens_by_year.iter())
        .map(|(year, tokens)| {
            let primary_raw = tokenize::primary_counts(tokens, &retained_bigrams, &year.text);
            let alternate_raw = tokenize::alternate_counts(tokens, &doc_frequency, &year.text);
            let (primary, primary_includes) = tokenize::canonicalize_counts(&primary_raw, canonical);
            let (alternate, alternate_includes) = tokenize::canonicalize_counts(&alternate_raw, canonical);
            YearTermCounts { year: year.year, primary, primary_includes, alternate, alternate_includes }
        })
        .collect()
}

fn merge_includes(
    stats: &mut [ShiftTermStats],
    prev_includes: &HashMap<String, HashSet<String>>,
    curr_includes: &HashMap<String, HashSet<String>>,
) {
    for stat in stats.iter_mut() {
        let mut combined: HashSet<String> = HashSet::new();
        if let Some(v) = prev_includes.get(&stat.term) {
            combined.extend(v.iter().cloned());
        }
        if let Some(v) = curr_includes.get(&stat.term) {
            combined.extend(v.iter().cloned());
        }
        if !combined.is_empty() {
            let mut includes: Vec<String> = combined.into_iter().collect();
            includes.sort();
            stat.includes = includes;
        }
    }
}

fn annotate_pair_includes(pair: &mut ShiftPair, prev: &YearTermCounts, curr: &YearTermCounts) {
    merge_includes(&mut pair.top_risers, &prev.primary_includes, &curr.primary_includes);
    merge_includes(&mut pair.top_fallers, &prev.primary_includes, &curr.primary_includes);
    if let Some(risers) = pair.top_risers_alt.as_mut() {
        merge_includes(risers, &prev.alternate_includes, &curr.alternate_includes);
    }
    if let Some(fallers) = pair.top_fallers_alt.as_mut() {
        merge_includes(fallers, &prev.alternate_includes, &curr.alternate_includes);
    }
}

/// Run S3 (tokenization + phrase engine, pooled across the whole company
/// corpus) and then S4-S6 across every valid adjacent year pair.
pub fn analyze_company(years: &[SectionYear], canonical: Option<&CanonicalTermsMap>) -> CompanyAnalysis {
    let valid: Vec<&SectionYear> = years.iter().filter(|y| y.is_valid()).collect();
    let valid_index: HashMap<i32, usize> = valid.iter().enumerate().map(|(i, y)| (y.year, i)).collect();

    let (similarity, vectorizer) = build_similarity(&valid);
    let metrics = build_metrics(years, &valid_index, &similarity, vectorizer.as_ref());
    let term_counts = build_term_counts(&valid, canonical);
    let counts_by_year: HashMap<i32, &YearTermCounts> = term_counts.iter().map(|tc| (tc.year, tc)).collect();

    let mut shift_pairs = Vec::new();
    let mut excerpt_pairs = Vec::new();

    for i in 1..years.len() {
        let prev_year = &years[i - 1];
        let curr_year = &years[i];
        if !prev_year.is_valid() || !curr_year.is_valid() {
            continue;
        }
        let (Some(&prev_counts), Some(&curr_counts)) =
            (counts_by_year.get(&prev_year.year), counts_by_year.get(&curr_year.year))
        else {
            continue;
        };

        let mut pair = build_shift_pair(
            prev_year.year,
            curr_year.year,
            &prev_counts.primary,
            &curr_counts.primary,
            Some(&prev_counts.alternate),
            Some(&curr_counts.alternate),
        );
        annotate_pair_includes(&mut pair, prev_counts, curr_counts);

        let excerpt = build_excerpt_pair(&pair, &prev_year.paragraphs, &curr_year.paragraphs);
        shift_pairs.push(pair);
        excerpt_pairs.push(excerpt);
    }

    CompanyAnalysis { similarity, metrics, shift_pairs, excerpt_pairs }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year(y: i32, text: &str, confidence: f64) -> SectionYear {
        let paragraphs: Vec<String> = text.split("\n\n").map(str::to_string).collect();
        SectionYear { year: y, text: text.to_string(), paragraphs, confidence }
    }

    #[test]
    fn single_valid_year_has_trivial_similarity_and_no_pairs() {
        let years = vec![year(2023, "we face significant competition risk", 0.9)];
        let analysis = analyze_company(&years, None);
        assert_eq!(analysis.similarity.matrix, vec![vec![1.0]]);
        assert_eq!(analysis.metrics.drift_vs_prev, vec![None]);
        assert!(analysis.shift_pairs.is_empty());
        assert!(analysis.excerpt_pairs.is_empty());
    }

    #[test]
    fn excludes_low_confidence_year_from_similarity() {
        let years =
            vec![year(2022, "we face significant competition risk today", 0.9), year(2023, "garbled text", 0.2)];
        let analysis = analyze_company(&years, None);
        assert_eq!(analysis.similarity.years, vec![2022]);
        assert_eq!(analysis.metrics.drift_vs_prev, vec![None, None]);
    }

    #[test]
    fn identical_adjacent_years_drift_to_zero() {
        let text = "we face significant competition and pricing risk across all our markets this year";
        let years = vec![year(2022, text, 0.9), year(2023, text, 0.9)];
        let analysis = analyze_company(&years, None);
        assert_eq!(analysis.metrics.drift_vs_prev[1], Some(0.0));
        assert_eq!(analysis.metrics.drift_ci_low[1], Some(0.0));
        assert_eq!(analysis.metrics.drift_ci_high[1], Some(0.0));
    }

    #[test]
    fn disjoint_years_produce_shift_pair() {
        let years = vec![
            year(2022, "legacy hardware revenue declined amid weak demand conditions overall", 0.9),
            year(2023, "cyberattack exposure increased amid new regulatory scrutiny pressures", 0.9),
        ];
        let analysis = analyze_company(&years, None);
        assert_eq!(analysis.shift_pairs.len(), 1);
        assert_eq!(analysis.shift_pairs[0].from, 2022);
        assert_eq!(analysis.shift_pairs[0].to, 2023);
    }
}
