//! Section extractor (S1): locates and isolates the risk-factors section
//! within a filing's hypertext or plain-text body.

use crate::lexicon::MODAL_WORDS;
use crate::types::{EndMarker, ExtractionMethod, SectionExtract};
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

/// Which annual-filing form family a document belongs to; determines the
/// boundary-heading list used to terminate the extracted section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFamily {
    /// Domestic annual report (10-K): Item 1A is the risk-factors section.
    TenK,
    /// Foreign private issuer annual report (20-F): Item 3D.
    TwentyF,
}

struct BoundaryMarker {
    label: &'static str,
    pattern: &'static LazyLock<Regex>,
}

static ITEM1A_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"(?m)(^|\n\n+)\s*item\s*1\s*\.?\s*a\b")
        .case_insensitive(true)
        .build()
        .unwrap()
});
static ITEM3D_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"(?m)(^|\n\n+)\s*item\s*3\s*\.?\s*d\b")
        .case_insensitive(true)
        .build()
        .unwrap()
});
static ITEM3_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"(?m)^\s*item\s*3\b")
        .case_insensitive(true)
        .build()
        .unwrap()
});
static ITEM1C_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"(?m)(^|\n\n+)\s*item\s*1\s*\.?\s*c\b")
        .case_insensitive(true)
        .build()
        .unwrap()
});
static RISK_FACTORS_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"(?m)^\s*risk\s+factors?\b")
        .case_insensitive(true)
        .build()
        .unwrap()
});
static RISK_FACTORS: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"\brisk\s+factors?\b")
        .case_insensitive(true)
        .build()
        .unwrap()
});
static RISK_FACTORS_SLOPPY: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"r\s*i\s*s\s*k\s+f\s*a\s*c\s*t\s*o\s*r\s*s")
        .case_insensitive(true)
        .build()
        .unwrap()
});
static HEADING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"^(item\s+\d|risk factors|part\s+[ivx]+)\b")
        .case_insensitive(true)
        .build()
        .unwrap()
});

pub(crate) static END_MARKER_1C: LazyLock<Regex> = LazyLock::new(|| ITEM1C_HEADING.clone());
pub(crate) static END_MARKER_1B: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"(?m)(^|\n\n+)\s*item\s*1\s*\.?\s*b\b")
        .case_insensitive(true)
        .build()
        .unwrap()
});
pub(crate) static END_MARKER_2: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"(?m)(^|\n\n+)\s*item\s*2\b")
        .case_insensitive(true)
        .build()
        .unwrap()
});
pub(crate) static END_MARKER_4A: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"(?m)(^|\n\n+)\s*item\s*4\s*a\b")
        .case_insensitive(true)
        .build()
        .unwrap()
});
pub(crate) static END_MARKER_4B: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"(?m)(^|\n\n+)\s*item\s*4\s*b\b")
        .case_insensitive(true)
        .build()
        .unwrap()
});
pub(crate) static END_MARKER_4: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"(?m)(^|\n\n+)\s*item\s*4\b")
        .case_insensitive(true)
        .build()
        .unwrap()
});

fn end_markers_10k() -> Vec<BoundaryMarker> {
    vec![
        BoundaryMarker { label: "1C", pattern: &END_MARKER_1C },
        BoundaryMarker { label: "1B", pattern: &END_MARKER_1B },
        BoundaryMarker { label: "2", pattern: &END_MARKER_2 },
    ]
}

fn end_markers_20f() -> Vec<BoundaryMarker> {
    vec![
        BoundaryMarker { label: "4A", pattern: &END_MARKER_4A },
        BoundaryMarker { label: "4B", pattern: &END_MARKER_4B },
        BoundaryMarker { label: "4", pattern: &END_MARKER_4 },
    ]
}

fn heading_start_index(text: &str, match_start: usize, match_text: &str) -> usize {
    let lower = match_text.to_lowercase();
    match lower.rfind("item") {
        Some(rel) => match_start + rel,
        None => match_start,
    }
}

fn contains_risk_factors(text: &str) -> bool {
    RISK_FACTORS.is_match(text) || RISK_FACTORS_SLOPPY.is_match(text)
}

/// Find the nearest boundary heading at or after `start_idx + 1`; returns
/// the character index and the matched label.
fn find_end_marker(text: &str, start_idx: usize, markers: &[BoundaryMarker]) -> (Option<usize>, Option<&'static str>) {
    let search_from = char_to_byte(text, start_idx + 1);
    let mut end_idx: Option<usize> = None;
    let mut end_label: Option<&'static str> = None;
    for marker in markers {
        if let Some(m) = marker.pattern.find_at(text, search_from) {
            let idx = byte_to_char(text, m.start());
            if end_idx.is_none_or(|cur| idx < cur) {
                end_idx = Some(idx);
                end_label = Some(marker.label);
            }
        }
    }
    (end_idx, end_label)
}

// The stdlib `regex` crate operates on byte offsets; this module deals in
// character counts to match the Python original's `len()`/slicing semantics
// exactly for ASCII-heavy filing text. These helpers translate between the
// two only at the boundaries that matter (candidate starts/ends).
fn char_to_byte(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map_or(text.len(), |(byte_idx, _)| byte_idx)
}

fn byte_to_char(text: &str, byte_idx: usize) -> usize {
    text[..byte_idx].chars().count()
}

fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let start_b = char_to_byte(text, start);
    let end_b = char_to_byte(text, end);
    &text[start_b..end_b]
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn toc_cluster_penalty(section_head: &str) -> bool {
    let lines: Vec<&str> = section_head.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let mut count = 0;
    for line in lines.iter().take(30) {
        if Regex::new(r"(?i)^item\s+\d").unwrap().is_match(line) {
            count += 1;
        }
    }
    count >= 4
}

fn heading_density_bonus(section: &str) -> f64 {
    let lines: Vec<&str> = section.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        return 0.0;
    }
    let heading_like = lines
        .iter()
        .filter(|line| line.chars().count() <= 80 && (is_upper_line(line) || HEADING_LINE.is_match(line)))
        .count();
    let density = heading_like as f64 / lines.len() as f64;
    if heading_like >= 6 && density >= 0.03 { 0.1 } else { 0.0 }
}

fn is_upper_line(line: &str) -> bool {
    let has_letter = line.chars().any(|c| c.is_alphabetic());
    has_letter && !line.chars().any(|c| c.is_alphabetic() && c.is_lowercase())
}

fn modality_bonus(section: &str) -> f64 {
    let lower = section.to_lowercase();
    let words: Vec<&str> = Regex::new(r"[a-z]+").unwrap().find_iter(&lower).map(|m| m.as_str()).collect();
    if words.is_empty() {
        return 0.0;
    }
    let mut modal_count = words.iter().filter(|w| MODAL_WORDS.contains(w)).count();
    modal_count += lower.matches("subject to").count();
    let per_1k = modal_count as f64 / (words.len() as f64 / 1000.0);
    if per_1k >= 8.0 {
        0.2
    } else if per_1k >= 4.0 {
        0.1
    } else {
        0.0
    }
}

struct Candidate {
    section: String,
    confidence: f64,
    end_marker: Option<&'static str>,
    warnings: Vec<String>,
    length_chars: usize,
}

fn score_candidate(text: &str, start_idx: usize, end_idx: usize, doc_length: usize) -> (f64, Vec<String>) {
    let mut warnings = Vec::new();
    let base = 0.5;
    let length = end_idx.saturating_sub(start_idx);

    let length_bonus = if (15_000..=400_000).contains(&length) {
        0.2
    } else if length < 8_000 {
        warnings.push("length_out_of_band".to_string());
        -0.25
    } else {
        warnings.push("length_out_of_band".to_string());
        -0.1
    };

    let early_penalty = if doc_length > 0 && (start_idx as f64) < (doc_length as f64 * 0.08) {
        warnings.push("early_position_penalty".to_string());
        -0.15
    } else {
        0.0
    };

    let head_end = (start_idx + 2_500).min(end_idx);
    let head_snippet = char_slice(text, start_idx, head_end);
    let toc_penalty = if toc_cluster_penalty(head_snippet) {
        warnings.push("toc_cluster_penalty".to_string());
        -0.2
    } else {
        0.0
    };

    let section_text = char_slice(text, start_idx, end_idx);
    let modality = modality_bonus(section_text);
    let heading = heading_density_bonus(section_text);

    let score = (base + length_bonus + early_penalty + toc_penalty + modality + heading).clamp(0.05, 0.95);
    (score, warnings)
}

/// Run the text-scored + fallback extraction paths over already-normalized
/// plain text (no hypertext present, or hypertext-anchor path declined).
pub fn extract_from_text(text: &str) -> SectionExtract {
    let doc_length = char_len(text);
    let has_item_1c = ITEM1C_HEADING.is_match(text);

    let mut candidates: Vec<usize> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut add_candidate = |idx: usize, candidates: &mut Vec<usize>, seen: &mut std::collections::HashSet<usize>| {
        if seen.insert(idx) {
            candidates.push(idx);
        }
    };

    let mut found_item1a = false;
    for m in ITEM1A_HEADING.find_iter(text) {
        let start_byte = m.start();
        let start_idx = byte_to_char(text, heading_start_index(text, start_byte, m.as_str()));
        let window_end = (start_idx + 400).min(doc_length);
        let window = char_slice(text, start_idx, window_end);
        if !contains_risk_factors(window) {
            continue;
        }
        add_candidate(start_idx, &mut candidates, &mut seen);
        found_item1a = true;
    }

    let mut found_20f = false;
    if candidates.is_empty() {
        for m in ITEM3D_HEADING.find_iter(text) {
            let start_idx = byte_to_char(text, heading_start_index(text, m.start(), m.as_str()));
            let window_end = (start_idx + 400).min(doc_length);
            let window = char_slice(text, start_idx, window_end);
            if !contains_risk_factors(window) {
                continue;
            }
            add_candidate(start_idx, &mut candidates, &mut seen);
        }
        if !candidates.is_empty() {
            found_20f = true;
        } else {
            for m in ITEM3_HEADING.find_iter(text) {
                let start_idx = byte_to_char(text, heading_start_index(text, m.start(), m.as_str()));
                let search_from = char_to_byte(text, start_idx);
                if let Some(risk_match) = RISK_FACTORS_HEADING.find_at(text, search_from) {
                    let risk_start = byte_to_char(text, risk_match.start());
                    if risk_start.saturating_sub(start_idx) > 20_000 {
                        continue;
                    }
                    add_candidate(risk_start, &mut candidates, &mut seen);
                }
            }
            if !candidates.is_empty() {
                found_20f = true;
            }
        }
    }

    for m in RISK_FACTORS_HEADING.find_iter(text) {
        let start_idx = byte_to_char(text, m.start());
        let line_end_rel = text[m.start()..].find('\n').unwrap_or(text.len() - m.start());
        let line = &text[m.start()..m.start() + line_end_rel];
        if line.trim().chars().count() > 80 {
            continue;
        }
        add_candidate(start_idx, &mut candidates, &mut seen);
    }

    let end_markers = if found_20f {
        end_markers_20f()
    } else if !found_item1a {
        let has_10k_marker = end_markers_10k().iter().any(|m| m.pattern.is_match(text));
        if has_10k_marker { end_markers_10k() } else { end_markers_20f() }
    } else {
        end_markers_10k()
    };

    let mut best: Option<Candidate> = None;
    for start_idx in candidates {
        let (mut end_idx, mut end_marker) = find_end_marker(text, start_idx, &end_markers);
        let mut local_warnings = Vec::new();
        let mut penalty = 0.0;
        if end_idx.is_none() {
            end_idx = Some((start_idx + 80_000).min(doc_length));
            end_marker = None;
            local_warnings.push("end_not_found".to_string());
            penalty = -0.2;
        }
        let end_idx = end_idx.unwrap();
        let section = char_slice(text, start_idx, end_idx).trim().to_string();
        let (score, mut score_warnings) = score_candidate(text, start_idx, end_idx, doc_length);
        let score = (score + penalty).clamp(0.05, 0.95);
        score_warnings.extend(local_warnings);
        let length_chars = char_len(&section);
        let candidate = Candidate { section, confidence: score, end_marker, warnings: score_warnings, length_chars };
        if best.as_ref().is_none_or(|b| candidate.confidence > b.confidence) {
            best = Some(candidate);
        }
    }

    if let Some(best) = best {
        return SectionExtract {
            text: best.section,
            paragraphs: Vec::new(),
            confidence: best.confidence,
            method: ExtractionMethod::TextScored,
            end_marker_used: best.end_marker.map_or(EndMarker::NotFound, |m| EndMarker::Heading(m.to_string())),
            warnings: best.warnings,
            length_chars: best.length_chars,
            has_item_1c,
        };
    }

    if let Some(m) = RISK_FACTORS.find(text).or_else(|| RISK_FACTORS_SLOPPY.find(text)) {
        let start_idx = byte_to_char(text, m.start());
        let (end_idx, end_marker) = find_end_marker(text, start_idx, &end_markers);
        let mut warnings = Vec::new();
        let end_idx = match end_idx {
            Some(idx) => idx,
            None => {
                warnings.push("end_not_found".to_string());
                (start_idx + 80_000).min(doc_length)
            }
        };
        warnings.push("fallback_risk_word_only".to_string());
        let section = char_slice(text, start_idx, end_idx).trim().to_string();
        let length_chars = char_len(&section);
        return SectionExtract {
            text: section,
            paragraphs: Vec::new(),
            confidence: 0.35,
            method: ExtractionMethod::RiskFactorsFallback,
            end_marker_used: end_marker.map_or(EndMarker::NotFound, |m| EndMarker::Heading(m.to_string())),
            warnings,
            length_chars,
            has_item_1c,
        };
    }

    SectionExtract::not_found()
}

/// Apply the low-confidence gate: any extraction under 0.5 confidence always
/// carries the `low_confidence_item1a` warning.
pub fn apply_confidence_gate(mut extract: SectionExtract) -> SectionExtract {
    if extract.confidence < 0.5 && !extract.warnings.iter().any(|w| w == "low_confidence_item1a") {
        extract.warnings.push("low_confidence_item1a".to_string());
    }
    extract
}

/// Top-level S1 dispatcher for a filing's raw hypertext body: tries the
/// hypertext-anchor path first, then falls back to the text-scored and
/// bare-phrase paths over the document rendered to plain text.
pub fn extract_from_html(html: &str) -> SectionExtract {
    let normalized = crate::html::html_to_text(html);

    let anchor_warning = match crate::html::extract_via_anchor(html, &normalized) {
        crate::html::AnchorOutcome::Accepted(anchor_extract) => return apply_confidence_gate(anchor_extract),
        crate::html::AnchorOutcome::Rejected { best_confidence: Some(c) } if c < 0.5 => "anchor_low_confidence",
        crate::html::AnchorOutcome::Rejected { .. } => "anchor_missing",
    };

    let mut extract = extract_from_text(&normalized);
    extract.warnings.insert(0, anchor_warning.to_string());
    apply_confidence_gate(extract)
}

/// Top-level S1 dispatcher for input that is already plain text (no
/// hypertext to anchor against).
pub fn extract_from_plain_text(text: &str) -> SectionExtract {
    apply_confidence_gate(extract_from_text(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grow_to(buf: &mut String, filler: &str, target_chars: usize) {
        while buf.chars().count() < target_chars {
            buf.push_str(filler);
        }
    }

    /// SPEC_FULL.md's worked extraction-score scenario: an Item 1A heading
    /// followed by ~20,000 characters of modal-heavy paragraph text, closed
    /// by an Item 1B boundary. Front matter pushes the heading past the
    /// early-position threshold so only the length and modality bonuses
    /// apply.
    #[test]
    fn text_scored_matches_extraction_score_scenario() {
        let front_sentence = "Our company operates across diverse consumer and enterprise markets \
worldwide, investing in product development, customer support, and logistics infrastructure. ";
        let mut front_matter = String::new();
        grow_to(&mut front_matter, front_sentence, 3_000);

        let may_sentence = "This may adversely affect our operations and results across the markets we serve. ";
        let filler_sentence = "Our competitive position depends on continued execution across global operations. ";
        let mut body = may_sentence.repeat(180);
        grow_to(&mut body, filler_sentence, 19_980);

        let text =
            format!("{front_matter}\n\nITEM 1A. RISK FACTORS\n{body}\n\nITEM 1B. UNRESOLVED STAFF COMMENTS\n");

        let extract = extract_from_plain_text(&text);

        assert_eq!(extract.method, ExtractionMethod::TextScored);
        assert_eq!(extract.end_marker_used, EndMarker::Heading("1B".to_string()));
        assert!(extract.confidence >= 0.8 && extract.confidence <= 0.95, "confidence {} out of range", extract.confidence);
        assert!(
            extract.length_chars > 19_000 && extract.length_chars < 21_500,
            "length {} out of range",
            extract.length_chars
        );
    }

    #[test]
    fn score_candidate_rewards_well_sized_modal_heavy_sections() {
        let section_body = "This may adversely affect our results. ".repeat(450);
        let text = format!("ITEM 1A. RISK FACTORS\n{section_body}ITEM 1B.");
        let end_idx = text.chars().count() - "ITEM 1B.".chars().count();
        let (score, warnings) = score_candidate(&text, 0, end_idx, text.chars().count());
        assert!(score > 0.5, "expected a net-positive score, got {score}");
        assert!(!warnings.contains(&"length_out_of_band".to_string()));
    }

    #[test]
    fn score_candidate_penalizes_short_sections() {
        let text = "ITEM 1A. RISK FACTORS\nA brief paragraph with no real substance.";
        let end_idx = text.chars().count();
        let (score, warnings) = score_candidate(text, 0, end_idx, end_idx);
        assert!(warnings.contains(&"length_out_of_band".to_string()));
        assert!(score < 0.5);
    }

    #[test]
    fn extract_from_text_falls_back_to_bare_risk_factors_phrase() {
        let text = "Some unrelated front matter without any item headings at all. Risk factors \
affecting our business include competition and regulation.";
        let extract = extract_from_text(text);
        assert_eq!(extract.method, ExtractionMethod::RiskFactorsFallback);
        assert!((extract.confidence - 0.35).abs() < 1e-9);
    }

    #[test]
    fn extract_from_text_reports_not_found_without_any_signal() {
        let text = "This document contains no relevant section headings whatsoever.";
        let extract = extract_from_text(text);
        assert_eq!(extract.method, ExtractionMethod::NotFound);
        assert_eq!(extract.confidence, 0.0);
    }

    #[test]
    fn extract_from_html_distinguishes_missing_from_low_confidence_anchor() {
        let no_anchor_html = "<html><body><p>Nothing relevant here.</p></body></html>";
        let no_anchor = extract_from_html(no_anchor_html);
        assert!(no_anchor.warnings.contains(&"anchor_missing".to_string()));
        assert!(!no_anchor.warnings.contains(&"anchor_low_confidence".to_string()));

        let low_confidence_html = r#"<html><body>
<a href="#s1a">Item 1A</a>
<div id="s1a">
<p>Item 1A. Risk Factors.</p>
<p>We face minor competitive pressures across our markets and industry peers.</p>
<p>Item 2 Properties placeholder text line.</p>
<p>Item 3 Legal Proceedings placeholder text line.</p>
<p>Item 4 Mine Safety placeholder text line.</p>
<p>Item 5 Market placeholder text line.</p>
</div>
</body></html>"#;
        let low_confidence = extract_from_html(low_confidence_html);
        assert!(low_confidence.warnings.contains(&"anchor_low_confidence".to_string()));
        assert!(!low_confidence.warnings.contains(&"anchor_missing".to_string()));
    }
}
