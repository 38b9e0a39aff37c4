//! Keyword extraction for section summaries
//!
//! A local, near-free approximation used only for optional pre-filtering of
//! sections, never for ranking: lowercase tokens of four letters or more,
//! stop words removed, ranked by frequency. The stop-word list covers
//! Spanish and English because the corpus mixes both.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Default cap on extracted keywords
pub const MAX_KEYWORDS: usize = 8;

const STOP_WORDS: &[&str] = &[
    // Spanish
    "para", "este", "esta", "estos", "estas", "como", "cuando", "donde",
    "pero", "más", "sobre", "entre", "desde", "hasta", "según", "debe",
    "deben", "puede", "pueden", "será", "serán", "están", "cada", "todo",
    "todos", "toda", "todas", "tiene", "tienen", "también", "caso",
    // English
    "this", "that", "these", "those", "with", "from", "have", "has",
    "been", "will", "shall", "must", "should", "which", "their", "there",
    "about", "other", "each", "into", "only", "when", "where", "they",
    "them", "than", "then", "such", "some", "were", "also", "more",
];

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[a-záéíóúñü]{4,}\b").unwrap())
}

/// Extract up to `max` keywords from text by frequency.
///
/// Deterministic: ties keep first-occurrence order.
pub fn extract_keywords(text: &str, max: usize) -> Vec<String> {
    let lowered = text.to_lowercase();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for token in token_re().find_iter(&lowered) {
        let word = token.as_str();
        if STOP_WORDS.contains(&word) {
            continue;
        }
        let count = counts.entry(word).or_insert(0);
        if *count == 0 {
            order.push(word);
        }
        *count += 1;
    }

    // Stable sort on count keeps first-seen order among ties
    order.sort_by_key(|word| std::cmp::Reverse(counts[word]));
    order.truncate(max);

    order.into_iter().map(|w| w.to_string()).collect()
}
