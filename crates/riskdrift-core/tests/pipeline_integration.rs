//! Integration tests for the whole-company S3-S6 pipeline.

use riskdrift_core::pipeline::analyze_company;
use riskdrift_core::tokenize::has_repeated_adjacent_tokens;
use riskdrift_core::types::SectionYear;

fn section_year(year: i32, text: &str) -> SectionYear {
    let paragraphs: Vec<String> = text.split("\n\n").map(str::to_string).collect();
    SectionYear { year, text: text.to_string(), paragraphs, confidence: 0.9 }
}

const YEAR_2021: &str = "We face significant competition in our core markets. \
Our supply chain depends on a small number of overseas manufacturers. \
Cybersecurity incidents could disrupt our operations and harm our reputation.";

const YEAR_2022: &str = "We face significant competition in our core markets. \
Artificial intelligence adoption introduces new operational and regulatory risk. \
Cybersecurity incidents could disrupt our operations and harm our reputation.";

const YEAR_2023: &str = "Artificial intelligence adoption introduces new operational and regulatory risk. \
Climate-related disruption to our logistics network could increase costs. \
Cybersecurity incidents could disrupt our operations and harm our reputation.";

#[test]
fn three_year_series_produces_consistent_aligned_artifacts() {
    let years = vec![section_year(2021, YEAR_2021), section_year(2022, YEAR_2022), section_year(2023, YEAR_2023)];
    let analysis = analyze_company(&years, None);

    // Similarity matrix: symmetric, diagonal 1.0, off-diagonal in [0, 1].
    let n = analysis.similarity.matrix.len();
    assert_eq!(n, 3);
    for i in 0..n {
        assert!((analysis.similarity.matrix[i][i] - 1.0).abs() < 1e-9);
        for j in 0..n {
            let value = analysis.similarity.matrix[i][j];
            assert!((0.0..=1.0001).contains(&value));
            assert!((value - analysis.similarity.matrix[j][i]).abs() < 1e-9);
        }
    }

    // Metrics arrays are aligned to the full year list, position 0 null.
    assert_eq!(analysis.metrics.years, vec![2021, 2022, 2023]);
    assert_eq!(analysis.metrics.drift_vs_prev.len(), 3);
    assert!(analysis.metrics.drift_vs_prev[0].is_none());
    assert!(analysis.metrics.drift_vs_prev[1].is_some());
    assert!(analysis.metrics.drift_vs_prev[2].is_some());

    // CI bounds bracket the point estimate wherever populated.
    for i in 0..3 {
        if let (Some(drift), Some(lo), Some(hi)) =
            (analysis.metrics.drift_vs_prev[i], analysis.metrics.drift_ci_low[i], analysis.metrics.drift_ci_high[i])
        {
            assert!(lo <= drift + 1e-9 && drift <= hi + 1e-9);
        }
    }

    // One shift pair per adjacent valid year-pair, no adjacent-duplicate-token terms.
    assert_eq!(analysis.shift_pairs.len(), 2);
    for pair in &analysis.shift_pairs {
        for stats in pair.top_risers.iter().chain(&pair.top_fallers) {
            assert!(!has_repeated_adjacent_tokens(&stats.term), "term {:?} has adjacent duplicate tokens", stats.term);
        }
    }

    // Excerpt pairs cap representative paragraphs at 3 per side and only
    // draw from the source SectionYear's own paragraphs.
    assert_eq!(analysis.excerpt_pairs.len(), 2);
    for pair in &analysis.excerpt_pairs {
        let from_year = years.iter().find(|y| y.year == pair.from).unwrap();
        let to_year = years.iter().find(|y| y.year == pair.to).unwrap();
        let from_count = pair.representative_paragraphs.iter().filter(|p| p.year == pair.from).count();
        let to_count = pair.representative_paragraphs.iter().filter(|p| p.year == pair.to).count();
        assert!(from_count <= 3 && to_count <= 3);
        for rep in &pair.representative_paragraphs {
            let source = if rep.year == pair.from { from_year } else { to_year };
            assert!(source.paragraphs.iter().any(|p| p.contains(&rep.text) || rep.text.contains(p.as_str())));
        }
    }
}

#[test]
fn repeated_year_pair_has_zero_drift() {
    let years = vec![section_year(2022, YEAR_2022), section_year(2023, YEAR_2022)];
    let analysis = analyze_company(&years, None);
    assert_eq!(analysis.metrics.drift_vs_prev[1], Some(0.0));
}

#[test]
fn low_confidence_year_is_excluded_from_similarity_and_metrics() {
    let mut degraded = section_year(2022, YEAR_2022);
    degraded.confidence = 0.2;
    let years = vec![section_year(2021, YEAR_2021), degraded, section_year(2023, YEAR_2023)];
    let analysis = analyze_company(&years, None);

    assert_eq!(analysis.similarity.years, vec![2021, 2023]);
    assert_eq!(analysis.metrics.years, vec![2021, 2022, 2023]);
    assert!(analysis.metrics.drift_vs_prev[1].is_none(), "2022 is invalid, its pair must be null");
    assert!(analysis.metrics.drift_vs_prev[2].is_none(), "2023 is adjacent to an invalid year, must be null");
}
