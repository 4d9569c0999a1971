//! Minimal hypertext handling for the section extractor's anchor path.
//!
//! The filings this crate processes are machine-generated SEC EDGAR
//! documents, not arbitrary web pages, so a full HTML DOM is overkill: tags
//! are stripped and anchors are resolved with a small set of targeted
//! patterns rather than a tree walk.

use crate::normalize::collapse_whitespace;
use crate::section::{END_MARKER_1B, END_MARKER_1C, END_MARKER_2, END_MARKER_4, END_MARKER_4A, END_MARKER_4B};
use crate::types::{EndMarker, ExtractionMethod, SectionExtract};
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

static SCRIPT_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"(?is)<(script|style|noscript)\b[^>]*>.*?</\1>")
        .build()
        .unwrap()
});
static BLOCK_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"(?i)<(p|div|br|li|table|thead|tbody|tfoot|tr|td|th|h1|h2|h3|h4|h5|h6)\b[^>]*/?>")
        .build()
        .unwrap()
});
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static ENTITY_NBSP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&nbsp;|&#160;|&#xa0;").unwrap());
static ENTITY_AMP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&amp;").unwrap());
static ENTITY_LT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&lt;").unwrap());
static ENTITY_GT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&gt;").unwrap());
static ENTITY_QUOT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&quot;|&#34;").unwrap());
static ENTITY_APOS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#39;|&apos;").unwrap());

static ANCHOR_TAG: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r#"(?is)<a\s+[^>]*href\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a>"#)
        .build()
        .unwrap()
});
static ID_ATTR_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r#"(?is)<(\w+)\s+[^>]*\b(?:id|name)\s*=\s*["']([^"']+)["'][^>]*>(.*?)</\1>"#)
        .build()
        .unwrap()
});

static ANCHOR_ITEM1A: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"item\s*1\s*\.?\s*a").case_insensitive(true).build().unwrap()
});
static ANCHOR_ITEM3D: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"item\s*3\s*\.?\s*d").case_insensitive(true).build().unwrap()
});
static ANCHOR_ITEM3: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"item\s*3\b").case_insensitive(true).build().unwrap()
});
static ITEM1A_RISK_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"(?m)^\s*item\s*1\s*\.?\s*a\b.*risk\s+factors?")
        .case_insensitive(true)
        .build()
        .unwrap()
});
static ITEM3_RISK_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"(?m)^\s*item\s*3\b.*risk\s+factors?")
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

fn strip_tags_to_text(fragment: &str) -> String {
    let without_tags = ANY_TAG.replace_all(fragment, "");
    decode_entities(&without_tags).trim().to_string()
}

fn decode_entities(text: &str) -> String {
    let text = ENTITY_NBSP.replace_all(text, " ");
    let text = ENTITY_AMP.replace_all(&text, "&");
    let text = ENTITY_LT.replace_all(&text, "<");
    let text = ENTITY_GT.replace_all(&text, ">");
    let text = ENTITY_QUOT.replace_all(&text, "\"");
    let text = ENTITY_APOS.replace_all(&text, "'");
    text.into_owned()
}

/// Convert a filing's raw HTML body into normalized plain text, inserting
/// newlines at block-element boundaries the way a browser's text rendering
/// would, then running the cheap S2 whitespace pass.
pub fn html_to_text(html: &str) -> String {
    let no_scripts = SCRIPT_STYLE.replace_all(html, "");
    let with_breaks = BLOCK_OPEN.replace_all(&no_scripts, "\n");
    let text = strip_tags_to_text(&with_breaks);
    collapse_whitespace(&text)
}

fn heading_start(text: &str, match_start_byte: usize, match_text: &str) -> usize {
    let lower = match_text.to_lowercase();
    let char_start = text[..match_start_byte].chars().count();
    match lower.rfind("item") {
        Some(rel_bytes) => char_start + match_text[..rel_bytes].chars().count(),
        None => char_start,
    }
}

fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let byte_of = |idx: usize| text.char_indices().nth(idx).map_or(text.len(), |(b, _)| b);
    &text[byte_of(start)..byte_of(end)]
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn find_anchor_start(text: &str, anchor_text: &str, heading_pattern: &Regex) -> Option<usize> {
    if let Some(m) = heading_pattern.find(text) {
        return Some(text[..m.start()].chars().count());
    }
    let anchor_lower = Regex::new(r"\s+").unwrap().replace_all(anchor_text.trim(), " ").to_lowercase();
    if anchor_lower.is_empty() {
        return None;
    }
    text.to_lowercase().find(&anchor_lower).map(|byte_idx| text[..byte_idx].chars().count())
}

fn find_end_marker_simple(text: &str, start_idx: usize, markers: &[(&str, &Regex)]) -> (Option<usize>, Option<String>) {
    let search_from_byte = text.char_indices().nth(start_idx + 1).map_or(text.len(), |(b, _)| b);
    let mut end_idx = None;
    let mut end_label = None;
    for (label, pattern) in markers {
        if let Some(m) = pattern.find_at(text, search_from_byte) {
            let idx = text[..m.start()].chars().count();
            if end_idx.is_none_or(|cur| idx < cur) {
                end_idx = Some(idx);
                end_label = Some((*label).to_string());
            }
        }
    }
    (end_idx, end_label)
}

fn toc_cluster_penalty(section_head: &str) -> bool {
    static ITEM_LINE: LazyLock<Regex> =
        LazyLock::new(|| RegexBuilder::new(r"^item\s+\d").case_insensitive(true).build().unwrap());
    section_head
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(30)
        .filter(|l| ITEM_LINE.is_match(l))
        .count()
        >= 4
}

/// Outcome of the hypertext-anchor path: either an accepted section, or a
/// rejection carrying the highest confidence among any rejected candidates
/// (`None` if no candidate ever reached the scoring step at all), so the
/// caller can distinguish "anchor found but low confidence" from "no anchor
/// candidate at all".
pub enum AnchorOutcome {
    /// An anchor candidate met the confidence/length bar.
    Accepted(SectionExtract),
    /// No candidate was accepted.
    Rejected {
        /// Highest confidence among rejected candidates, if any candidate
        /// made it far enough to be scored.
        best_confidence: Option<f64>,
    },
}

/// Scan `html` for an anchor link (`<a href="#id">`) whose label matches one
/// of the risk-factors heading aliases, resolve it against `normalized_text`,
/// and score the resulting section. Returns [`AnchorOutcome::Rejected`] when
/// no anchor yields an acceptable (confidence >= 0.5, length >= 8000)
/// section, in which case the caller should fall back to the text-scored
/// path.
pub fn extract_via_anchor(html: &str, normalized_text: &str) -> AnchorOutcome {
    let has_item_1c = ITEM1C_HEADING.is_match(normalized_text);
    let doc_len = char_len(normalized_text);
    let mut best_rejected_confidence: Option<f64> = None;

    for cap in ANCHOR_TAG.captures_iter(html) {
        let href = cap.get(1).map_or("", |m| m.as_str());
        let link_text = strip_tags_to_text(cap.get(2).map_or("", |m| m.as_str())).to_lowercase();

        let is_item3 = ANCHOR_ITEM3D.is_match(&link_text) || ANCHOR_ITEM3.is_match(&link_text);
        let is_item1a = ANCHOR_ITEM1A.is_match(&link_text);
        if !is_item1a && !is_item3 && !link_text.contains("risk factors") {
            continue;
        }
        if !href.starts_with('#') || href.len() <= 1 {
            continue;
        }
        let anchor_id = &href[1..];
        let Some(target_caps) = ID_ATTR_ELEMENT
            .captures_iter(html)
            .find(|c| c.get(2).is_some_and(|m| m.as_str() == anchor_id))
        else {
            continue;
        };
        let anchor_text = {
            let inner = strip_tags_to_text(target_caps.get(3).map_or("", |m| m.as_str()));
            if inner.is_empty() { link_text.clone() } else { inner }
        };

        let heading_pattern: &Regex = if is_item3 { &ITEM3_RISK_HEADING } else { &ITEM1A_RISK_HEADING };
        let Some(start_idx) = find_anchor_start(normalized_text, &anchor_text, heading_pattern) else {
            continue;
        };

        let markers: Vec<(&str, &Regex)> = if is_item3 {
            vec![("4A", &END_MARKER_4A), ("4B", &END_MARKER_4B), ("4", &END_MARKER_4)]
        } else {
            vec![("1C", &END_MARKER_1C), ("1B", &END_MARKER_1B), ("2", &END_MARKER_2)]
        };

        let (end_idx, _end_marker) = find_end_marker_simple(normalized_text, start_idx, &markers);
        let mut confidence: f64 = 0.9;
        let mut local_warnings = Vec::new();
        let (end_idx, end_marker) = match end_idx {
            Some(idx) => (idx, _end_marker),
            None => {
                local_warnings.push("end_not_found".to_string());
                confidence -= 0.2;
                ((start_idx + 80_000).min(doc_len), None)
            }
        };
        let section = char_slice(normalized_text, start_idx, end_idx).trim().to_string();
        if char_len(&section) < 8_000 {
            local_warnings.push("length_out_of_band".to_string());
            confidence -= 0.15;
        }
        if doc_len > 0 && (start_idx as f64) < (doc_len as f64 * 0.08) {
            local_warnings.push("early_position_penalty".to_string());
            confidence -= 0.1;
        }
        let head_end = char_len(&section).min(2_500);
        if toc_cluster_penalty(char_slice(&section, 0, head_end)) {
            local_warnings.push("toc_cluster_penalty".to_string());
            confidence -= 0.15;
        }
        confidence = confidence.clamp(0.1, 0.95);
        best_rejected_confidence = Some(best_rejected_confidence.map_or(confidence, |best: f64| best.max(confidence)));

        if confidence < 0.5 || char_len(&section) < 8_000 {
            continue;
        }

        let length_chars = char_len(&section);
        return AnchorOutcome::Accepted(SectionExtract {
            text: section,
            paragraphs: Vec::new(),
            confidence,
            method: ExtractionMethod::HypertextAnchor,
            end_marker_used: end_marker.map_or(EndMarker::NotFound, EndMarker::Heading),
            warnings: local_warnings,
            length_chars,
            has_item_1c: has_item_1c && !is_item3,
        });
    }

    AnchorOutcome::Rejected { best_confidence: best_rejected_confidence }
}
