//! Canonical-terms compiler (ext): validates a curated concept/variant
//! specification and produces a variant-to-concept mapping for S3's
//! canonicalization step.

use crate::lexicon::SHORT_TOKEN_WHITELIST;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

/// Tokens disallowed as canonical-term variants regardless of length
/// (distinct from the tokenizer's corporate-noise list: this one targets
/// honorifics that slip into concept specifications written by hand).
pub const CONCEPT_NOISE_TOKENS: &[&str] = &["mr", "ms", "mrs", "dr"];

const MAX_QUIET_TOKEN_COUNT: usize = 6;

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9\s]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// One concept's declared variant spelling, possibly gated by a condition
/// (free-text note, not evaluated by this crate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalVariant {
    /// The variant spelling.
    pub variant: String,
    /// Free-text condition describing when this variant applies.
    pub condition: String,
}

/// One concept in the raw, unvalidated specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptSpec {
    /// Stable concept identifier.
    pub id: String,
    /// Human-readable display label.
    pub label: String,
    /// Required, non-empty list of variant spellings.
    pub variants: Vec<String>,
    /// Optional conditional variants.
    #[serde(default)]
    pub conditional_variants: Vec<ConditionalVariant>,
    /// Optional free-text notes, not validated.
    #[serde(default)]
    pub notes: Vec<String>,
}

/// The full raw specification: a list of concepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalTermsSpec {
    /// Declared concepts.
    pub concepts: Vec<ConceptSpec>,
}

/// Normalize a variant spelling: lowercase, hyphens/dashes to space, strip
/// non-alphanumeric, collapse whitespace, trim.
pub fn normalize_variant(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let dashes_to_space = lower.replace(['-', '\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}'], " ");
    let stripped = NON_ALNUM.replace_all(&dashes_to_space, "");
    WHITESPACE.replace_all(stripped.trim(), " ").trim().to_string()
}

fn token_count(normalized: &str) -> usize {
    normalized.split_whitespace().count()
}

/// One validation finding against a concept's variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// Fatal: build must fail.
    Error(String),
    /// Non-fatal: surfaced in the compiled report only.
    Warning(String),
}

fn validate_variant(concept_id: &str, raw: &str, seen_in_concept: &mut HashSet<String>) -> (Option<String>, Vec<ValidationIssue>) {
    let mut issues = Vec::new();
    let normalized = normalize_variant(raw);

    if normalized.is_empty() || !normalized.chars().any(|c| c.is_alphabetic()) {
        issues.push(ValidationIssue::Error(format!(
            "{concept_id}: variant {raw:?} normalizes to an empty or letter-less form"
        )));
        return (None, issues);
    }

    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    for tok in &tokens {
        if tok.len() < 3 && !SHORT_TOKEN_WHITELIST.contains(tok) {
            issues.push(ValidationIssue::Error(format!(
                "{concept_id}: short token not whitelisted: {tok:?} in variant {normalized:?}"
            )));
            return (None, issues);
        }
        if CONCEPT_NOISE_TOKENS.contains(tok) {
            issues.push(ValidationIssue::Error(format!(
                "{concept_id}: noise token disallowed: {tok:?} in variant {normalized:?}"
            )));
            return (None, issues);
        }
    }

    if token_count(&normalized) >= MAX_QUIET_TOKEN_COUNT {
        issues.push(ValidationIssue::Warning(format!(
            "{concept_id}: variant {normalized:?} has {} tokens (>= {MAX_QUIET_TOKEN_COUNT})",
            tokens.len()
        )));
    }

    if !seen_in_concept.insert(normalized.clone()) {
        issues.push(ValidationIssue::Error(format!(
            "{concept_id}: duplicate normalized variant {normalized:?}"
        )));
        return (None, issues);
    }

    (Some(normalized), issues)
}

/// One compiled concept: id, label, and variants sorted by
/// `(-token_count, -length, variant)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledConcept {
    /// Stable concept identifier.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Normalized variants, sorted.
    pub variants: Vec<String>,
}

/// The compiled, validated canonical-terms map loaded read-only by S3.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CanonicalTermsMap {
    /// Compiled concepts in input order.
    pub concepts: Vec<CompiledConcept>,
    /// Full normalized-variant to concept-id mapping.
    pub variant_to_concept: BTreeMap<String, String>,
    /// concept id -> display label, for convenient lookup.
    pub concept_labels: BTreeMap<String, String>,
}

impl CanonicalTermsMap {
    /// Look up a raw (not-yet-normalized) term and return its concept's
    /// display label, if the normalized form maps to a known concept.
    pub fn lookup(&self, raw_term: &str) -> Option<String> {
        let normalized = normalize_variant(raw_term);
        self.variant_to_concept
            .get(&normalized)
            .and_then(|concept_id| self.concept_labels.get(concept_id))
            .cloned()
    }
}

fn sort_variants(mut variants: Vec<String>) -> Vec<String> {
    variants.sort_by(|a, b| {
        let a_tokens = token_count(a);
        let b_tokens = token_count(b);
        b_tokens
            .cmp(&a_tokens)
            .then_with(|| b.len().cmp(&a.len()))
            .then_with(|| a.cmp(b))
    });
    variants
}

/// Validate and compile a raw specification. On success, returns the
/// compiled map plus any non-fatal warnings. On failure, returns every
/// validation error collected (not just the first).
pub fn compile_terms(spec: &CanonicalTermsSpec) -> Result<(CanonicalTermsMap, Vec<String>), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();
    let mut concepts = Vec::with_capacity(spec.concepts.len());
    let mut variant_to_concept: BTreeMap<String, String> = BTreeMap::new();
    let mut concept_labels: BTreeMap<String, String> = BTreeMap::new();
    let mut global_seen: HashMap<String, String> = HashMap::new();

    for concept in &spec.concepts {
        let mut seen_in_concept = HashSet::new();
        let mut normalized_variants = Vec::new();

        let mut raw_variants: Vec<&str> = concept.variants.iter().map(String::as_str).collect();
        raw_variants.extend(concept.conditional_variants.iter().map(|v| v.variant.as_str()));

        if concept.variants.is_empty() && concept.conditional_variants.is_empty() {
            errors.push(format!("{}: concept has no variants", concept.id));
            continue;
        }

        for raw in raw_variants {
            let (normalized, issues) = validate_variant(&concept.id, raw, &mut seen_in_concept);
            for issue in issues {
                match issue {
                    ValidationIssue::Error(msg) => errors.push(msg),
                    ValidationIssue::Warning(msg) => warnings.push(msg),
                }
            }
            let Some(normalized) = normalized else { continue };

            if let Some(existing_concept) = global_seen.get(&normalized) {
                if existing_concept != &concept.id {
                    errors.push(format!(
                        "variant overlap: {normalized} in {existing_concept} and {}",
                        concept.id
                    ));
                    continue;
                }
            } else {
                global_seen.insert(normalized.clone(), concept.id.clone());
            }

            variant_to_concept.insert(normalized.clone(), concept.id.clone());
            normalized_variants.push(normalized);
        }

        concept_labels.insert(concept.id.clone(), concept.label.clone());
        concepts.push(CompiledConcept {
            id: concept.id.clone(),
            label: concept.label.clone(),
            variants: sort_variants(normalized_variants),
        });
    }

    if !errors.is_empty() {
        errors.sort();
        errors.dedup();
        return Err(errors);
    }

    Ok((
        CanonicalTermsMap { concepts, variant_to_concept, concept_labels },
        warnings,
    ))
}
