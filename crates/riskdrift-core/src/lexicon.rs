//! Fixed word lists used by the tokenizer, phrase engine, and excerpt selector.
//!
//! Kept intentionally small and auditable rather than exhaustive.

/// English stopwords dropped during tokenization and TF-IDF vectorization.
pub const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "aren't", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "itself", "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of",
    "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own",
    "per", "same", "she", "should", "so", "some", "such", "than", "that", "the", "their",
    "theirs", "them", "themselves", "then", "there", "these", "they", "this", "those", "through",
    "to", "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours",
    "yourself", "yourselves",
];

/// Honorifics dropped during tokenization; the token following one is also dropped.
pub const HONORIFICS: &[&str] = &["mr", "mrs", "ms", "miss", "dr", "prof", "sir", "madam"];

/// Name suffixes and corporate abbreviations dropped during tokenization.
pub const NAME_SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv", "phd", "md"];

/// Corporate boilerplate tokens dropped during tokenization.
pub const NOISE_TOKENS: &[&str] = &["inc", "corp", "ltd", "co", "company", "u", "s", "us", "usa"];

/// Short tokens (< 3 chars) retained despite the general short-token rule.
pub const SHORT_TOKEN_WHITELIST: &[&str] = &["ai", "ml", "ip", "it", "vr", "ar"];

/// Curated 2-4 word regulatory/business phrases matched case-insensitively.
pub const PHRASE_ALLOWLIST: &[&str] = &[
    "artificial intelligence",
    "machine learning",
    "data security",
    "cyber security",
    "cybersecurity incident",
    "information security",
    "data privacy",
    "privacy regulation",
    "regulatory compliance",
    "government regulation",
    "trade restrictions",
    "export controls",
    "interest rates",
    "foreign exchange",
    "inflationary pressures",
    "supply chain",
    "supply disruption",
    "customer demand",
    "competitive landscape",
    "market share",
    "pricing pressure",
    "gross margin",
    "operating margin",
    "credit risk",
    "liquidity risk",
    "going concern",
    "material weakness",
    "internal controls",
    "financial reporting",
    "intellectual property",
    "patent infringement",
    "product liability",
    "class action",
    "litigation matters",
    "geopolitical tensions",
    "political instability",
    "climate change",
    "environmental regulation",
    "human capital",
    "talent retention",
    "labor shortages",
    "business continuity",
    "disaster recovery",
];

/// Common short words that should retain a space when S2 considers merging a
/// line-wrap split (see `normalize::rejoin_wrapped_words`).
pub const COMMON_SHORT_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "can", "did", "do", "for", "had",
    "has", "i", "if", "in", "is", "it", "its", "may", "not", "nor", "of", "on", "or", "our", "per",
    "the", "to", "us", "we", "who", "why", "you",
];

/// Morphological suffix fragments that indicate a word was split across a
/// line-wrap and should be rejoined without a space.
pub const SUFFIX_FRAGMENTS: &[&str] = &[
    "mation", "mations", "tion", "tions", "sion", "sions", "ment", "ments", "ness", "less",
    "ance", "ances", "ence", "ences", "ing", "ings", "ity", "ities", "ative", "atives", "able",
    "ably", "ization", "izations", "tory", "tories",
];

/// Modal words contributing to the text-scored section-extraction bonus.
pub const MODAL_WORDS: &[&str] = &["may", "could", "adversely"];
