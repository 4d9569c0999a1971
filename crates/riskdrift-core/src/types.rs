//! Core data model shared by every pipeline stage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One annual filing, identified by its SEC accession number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filing {
    /// Central Index Key of the filer.
    pub cik: String,
    /// Accession number, e.g. `0000320193-24-000123`.
    pub accession_number: String,
    /// SEC form type, e.g. `10-K` or `20-F`.
    pub form_type: String,
    /// Date the filing was submitted.
    pub filing_date: chrono::NaiveDate,
    /// The period the filing reports on.
    pub report_date: chrono::NaiveDate,
    /// Filename of the primary document within the filing.
    pub primary_document: String,
    /// Raw bytes of the primary document, once fetched.
    pub raw_bytes: Vec<u8>,
    /// The fiscal/calendar year this filing represents in a company's series,
    /// once resolved (see [`crate::year::resolve_section_years`]).
    pub section_year: Option<i32>,
}

/// The strategy that produced a [`SectionExtract`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    /// Found via a hypertext anchor/link to the section heading.
    HypertextAnchor,
    /// Found by scoring heading candidates in normalized text.
    TextScored,
    /// Found via the bare "risk factors" phrase fallback.
    RiskFactorsFallback,
    /// No section could be located.
    NotFound,
    /// Input carried no hypertext to anchor against.
    NoHypertext,
}

impl ExtractionMethod {
    /// String form used in JSON artifacts and log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HypertextAnchor => "hypertext-anchor",
            Self::TextScored => "text-scored",
            Self::RiskFactorsFallback => "risk-factors-fallback",
            Self::NotFound => "not-found",
            Self::NoHypertext => "no-hypertext",
        }
    }
}

/// The boundary heading that terminated a section, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndMarker {
    /// A specific boundary heading label, e.g. `"1B"` or `"4"`.
    Heading(String),
    /// No boundary heading was found; extraction stopped at a length cap.
    NotFound,
}

/// Result of running the section extractor (S1) over one filing document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionExtract {
    /// Normalized, trimmed UTF-8 text of the section.
    pub text: String,
    /// Paragraphs of `text`, in order.
    pub paragraphs: Vec<String>,
    /// Extraction confidence in `[0, 1]`.
    pub confidence: f64,
    /// Strategy that produced this extract.
    pub method: ExtractionMethod,
    /// Which boundary heading terminated the section.
    pub end_marker_used: EndMarker,
    /// Ordered diagnostic warning tags.
    pub warnings: Vec<String>,
    /// Length of `text` in characters.
    pub length_chars: usize,
    /// Whether a sibling Item 1C (cybersecurity) heading was observed.
    pub has_item_1c: bool,
}

impl SectionExtract {
    /// A failed extraction: confidence 0, standard `item1a_not_found` warning.
    pub fn not_found() -> Self {
        Self {
            text: String::new(),
            paragraphs: Vec::new(),
            confidence: 0.0,
            method: ExtractionMethod::NotFound,
            end_marker_used: EndMarker::NotFound,
            warnings: vec!["item1a_not_found".to_string()],
            length_chars: 0,
            has_item_1c: false,
        }
    }

    /// Whether the extracted section meets the validity gate (`confidence >= 0.5`).
    pub fn is_valid(&self) -> bool {
        self.confidence >= 0.5 && !self.text.is_empty()
    }
}

/// One company-year's worth of section text, the unit every downstream
/// stage (S4-S6) consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionYear {
    /// Calendar/fiscal year this section represents.
    pub year: i32,
    /// Normalized section text.
    pub text: String,
    /// Paragraphs of `text`, in order.
    pub paragraphs: Vec<String>,
    /// Extraction confidence carried over from [`SectionExtract`].
    pub confidence: f64,
}

impl SectionYear {
    /// A `SectionYear` is valid iff its text is non-empty and confidence >= 0.5.
    pub fn is_valid(&self) -> bool {
        self.confidence >= 0.5 && !self.text.is_empty()
    }
}

/// Mapping of lowercase term (possibly multiword, space-joined) to raw count.
pub type TermCounts = BTreeMap<String, u64>;

/// Per-term statistics for one year-pair shift computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftTermStats {
    /// The term itself.
    pub term: String,
    /// Smoothed log-odds score (positive = rising, negative = falling).
    pub score: f64,
    /// Variance-normalized z-score of `score`.
    pub z: f64,
    /// Raw count in the earlier year.
    pub count_prev: u64,
    /// Raw count in the later year.
    pub count_curr: u64,
    /// Count in the earlier year, normalized per 10,000 tokens.
    pub per10k_prev: f64,
    /// Count in the later year, normalized per 10,000 tokens.
    pub per10k_curr: f64,
    /// `per10k_curr - per10k_prev`.
    pub delta_per10k: f64,
    /// Whether this term meets the distinctiveness bar (see [`crate::shift`]).
    pub distinctive: bool,
    /// Raw variants folded into this term by the canonical-terms map, if any.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub includes: Vec<String>,
}

/// Shift-term results for one adjacent year-pair, primary and alternate phrase sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftPair {
    /// Earlier year.
    pub from: i32,
    /// Later year.
    pub to: i32,
    /// Top 15 terms rising in usage, by primary phrase source.
    pub top_risers: Vec<ShiftTermStats>,
    /// Top 15 terms falling in usage, by primary phrase source.
    pub top_fallers: Vec<ShiftTermStats>,
    /// Plain-English summary of `top_risers`/`top_fallers`.
    pub summary: String,
    /// Top risers computed from keyphrases instead of unigrams/collocations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_risers_alt: Option<Vec<ShiftTermStats>>,
    /// Top fallers computed from keyphrases instead of unigrams/collocations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_fallers_alt: Option<Vec<ShiftTermStats>>,
    /// Plain-English summary of the alternate lists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_alt: Option<String>,
}

/// One representative paragraph chosen by the excerpt selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepresentativeParagraph {
    /// The year the paragraph is drawn from.
    pub year: i32,
    /// Index of the paragraph within that year's `SectionYear.paragraphs`.
    pub paragraph_index: usize,
    /// Paragraph text.
    pub text: String,
}

/// Excerpt selection results for one adjacent year-pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcerptPair {
    /// Earlier year.
    pub from: i32,
    /// Later year.
    pub to: i32,
    /// Distinct highlight terms, risers then fallers, first-seen order.
    pub highlight_terms: Vec<String>,
    /// Chosen representative paragraphs, at most `MAX_PARAGRAPHS_PER_YEAR` per side.
    pub representative_paragraphs: Vec<RepresentativeParagraph>,
}
