//! Text normalization and paragraphization (S2).
//!
//! Two passes are distinguished: [`collapse_whitespace`], a cheap pass used
//! while converting hypertext to plain text, and [`normalize_text`], the
//! fuller pass that repairs line-wrap artifacts and bullet formatting. The
//! excerpt selector (S6) re-applies [`normalize_text`] to paragraphs that
//! were paragraphized earlier, since a paragraph lifted straight from a
//! JSON artifact may not have gone through it yet.

use crate::lexicon::{COMMON_SHORT_WORDS, SUFFIX_FRAGMENTS};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Minimum paragraph length retained by [`split_paragraphs`].
pub const DEFAULT_MIN_PARAGRAPH_CHARS: usize = 200;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static HYPHEN_WRAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([A-Za-z])-\n([A-Za-z])").unwrap());
static BULLET_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*(?:\u{2022}|\u{00b7}|\*|\u{2013}|\u{2014}|-)\s+").unwrap());
static SHORT_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z]{1,3})\s*\n\s*([a-z][A-Za-z]+)").unwrap());
static TAIL_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z]{3,})\s*\n\s*([a-z]{1,2})\b").unwrap());
static SUFFIX_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z]{3,})\s*\n\s*([a-z]{2,})").unwrap());
static NEWLINE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\n+\s*").unwrap());
static TRADEMARK_BEFORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z])\s+([\u{ae}\u{2122}\u{2120}])").unwrap());
static TRADEMARK_AFTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\u{ae}\u{2122}\u{2120}])\s+([A-Za-z])").unwrap());
static OPEN_QUOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\u{201c}\s+").unwrap());
static CLOSE_QUOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+\u{201d}").unwrap());
static WHITESPACE_COLLAPSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

const BULLET_TOKEN: &str = "\u{0}__BULLET_BREAK__\u{0}";
const BULLET_SYMBOL: char = '\u{2022}';

/// Line-oriented whitespace collapse used while converting hypertext block
/// content into a single plain-text stream. Collapses intra-line whitespace,
/// rejoins a handful of known letter-spaced headings split across block
/// boundaries (`I` + `TEM 1A` -> `ITEM 1A`), and caps consecutive blank
/// lines at two.
pub fn collapse_whitespace(text: &str) -> String {
    let normalized_newlines = text.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<String> = normalized_newlines
        .split('\n')
        .map(|line| WHITESPACE_RUN.replace_all(line, " ").trim().to_string())
        .collect();

    let mut merged: Vec<String> = Vec::with_capacity(lines.len());
    let mut idx = 0usize;
    while idx < lines.len() {
        let line = &lines[idx];
        if line == "I" && idx + 1 < lines.len() && lines[idx + 1].starts_with("TEM") {
            merged.push(format!("I{}", lines[idx + 1]));
            idx += 2;
            continue;
        }
        if line == "RI" && idx + 1 < lines.len() && lines[idx + 1].starts_with("SK") {
            merged.push(format!("RI{}", lines[idx + 1]));
            idx += 2;
            continue;
        }
        if line == "RISK" && idx + 1 < lines.len() && lines[idx + 1].starts_with("FACTORS") {
            merged.push(format!("RISK {}", lines[idx + 1]));
            idx += 2;
            continue;
        }
        merged.push(line.clone());
        idx += 1;
    }

    let mut start = 0;
    while start < merged.len() && merged[start].is_empty() {
        start += 1;
    }
    let mut end = merged.len();
    while end > start && merged[end - 1].is_empty() {
        end -= 1;
    }
    let trimmed = &merged[start..end];

    let mut output: Vec<&str> = Vec::with_capacity(trimmed.len());
    let mut blank_count = 0;
    for line in trimmed {
        if line.is_empty() {
            blank_count += 1;
            if blank_count <= 2 {
                output.push("");
            }
        } else {
            blank_count = 0;
            output.push(line);
        }
    }
    output.join("\n")
}

fn starts_with_any(value: &str, fragments: &[&str]) -> bool {
    fragments.iter().any(|fragment| value.starts_with(fragment))
}

/// Full S2 normalization pass: legacy-punctuation replacement, line-wrap
/// repair, bullet rewrapping, and short-word/suffix aware rejoining of split
/// fragments, collapsing to a single-line paragraph of normal spacing.
pub fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut normalized = text
        .replace('\u{a0}', " ")
        .replace('\u{91}', "'")
        .replace('\u{92}', "'")
        .replace('\u{93}', "\"")
        .replace('\u{94}', "\"")
        .replace('\u{96}', "\u{2013}")
        .replace('\u{97}', "\u{2014}")
        .replace("\r\n", "\n")
        .replace('\r', "\n");

    normalized = HYPHEN_WRAP.replace_all(&normalized, "$1$2").into_owned();
    normalized = BULLET_LINE
        .replace_all(&normalized, format!("{BULLET_TOKEN}{BULLET_SYMBOL} "))
        .into_owned();

    normalized = SHORT_SPLIT
        .replace_all(&normalized, |caps: &Captures<'_>| {
            rejoin_or_space(&caps[1], &caps[2])
        })
        .into_owned();
    normalized = TAIL_SPLIT
        .replace_all(&normalized, |caps: &Captures<'_>| {
            rejoin_or_space(&caps[1], &caps[2])
        })
        .into_owned();
    normalized = SUFFIX_SPLIT
        .replace_all(&normalized, |caps: &Captures<'_>| {
            let left = &caps[1];
            let right = &caps[2];
            if starts_with_any(&right.to_lowercase(), SUFFIX_FRAGMENTS) {
                format!("{left}{right}")
            } else {
                format!("{left} {right}")
            }
        })
        .into_owned();

    normalized = NEWLINE_RUN.replace_all(&normalized, " ").into_owned();
    normalized = TRADEMARK_BEFORE.replace_all(&normalized, "$1$2").into_owned();
    normalized = TRADEMARK_AFTER.replace_all(&normalized, "$1 $2").into_owned();
    normalized = OPEN_QUOTE.replace_all(&normalized, "\u{201c}").into_owned();
    normalized = CLOSE_QUOTE.replace_all(&normalized, "\u{201d}").into_owned();
    normalized = normalized.replace(BULLET_TOKEN, "\n");
    normalized = WHITESPACE_COLLAPSE.replace_all(&normalized, " ").into_owned();
    normalized.trim().to_string()
}

fn rejoin_or_space(left: &str, right: &str) -> String {
    let left_lower = left.to_lowercase();
    let right_lower = right.to_lowercase();
    if COMMON_SHORT_WORDS.contains(&left_lower.as_str())
        || COMMON_SHORT_WORDS.contains(&right_lower.as_str())
    {
        format!("{left} {right}")
    } else {
        format!("{left}{right}")
    }
}

/// Split normalized text into paragraphs on runs of two or more newlines,
/// retaining only paragraphs at least `min_chars` long.
pub fn split_paragraphs(text: &str, min_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    for chunk in split_on_blank_lines(text) {
        let trimmed = chunk.trim();
        if !trimmed.is_empty() && trimmed.chars().count() >= min_chars {
            chunks.push(trimmed.to_string());
        }
    }
    chunks
}

fn split_on_blank_lines(text: &str) -> Vec<&str> {
    static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());
    BLANK_RUN.split(text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_split_item_heading() {
        let text = "I\nTEM 1A. RISK FACTORS\nbody text here";
        let out = collapse_whitespace(text);
        assert!(out.starts_with("ITEM 1A. RISK FACTORS"));
    }

    #[test]
    fn rejoins_hyphenated_wrap() {
        let out = normalize_text("This is a sub-\nstantial risk.");
        assert_eq!(out, "This is a substantial risk.");
    }

    #[test]
    fn retains_space_for_short_word_split() {
        // "to" is a common short word, so the split must retain a space.
        let out = normalize_text("We continue to\nmonitor the situation.");
        assert!(out.contains("to monitor"));
    }

    #[test]
    fn rejoins_suffix_fragment_split() {
        let out = normalize_text("We face significant disrup\ntion in our supply chain.");
        assert!(out.contains("disruption"));
    }

    #[test]
    fn split_paragraphs_filters_short_chunks() {
        let long_para = "x".repeat(250);
        let text = format!("short\n\n{long_para}\n\nshort again");
        let paras = split_paragraphs(&text, 200);
        assert_eq!(paras.len(), 1);
        assert_eq!(paras[0].len(), 250);
    }
}
