//! Tiered text-to-command classifier.
//!
//! Tiers, first match wins: exact phrase, token set, fuzzy similarity.

use strsim::normalized_levenshtein;
use tracing::debug;

use super::command::Command;
use super::vocabulary::{PHRASES, VARIANTS};

/// A fuzzy candidate must be strictly more similar than this
pub const FUZZY_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Phrase,
    Token,
    Fuzzy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub command: Command,
    pub tier: MatchTier,
}

impl Classification {
    fn new(command: Command, tier: MatchTier) -> Self {
        Self { command, tier }
    }
}

/// Lowercase, drop every punctuation and symbol character, collapse whitespace
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classify a free-text utterance. Returns `None` when nothing matches.
pub fn classify(text: &str) -> Option<Classification> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return None;
    }

    let result = match_phrase(&normalized)
        .or_else(|| match_tokens(&normalized))
        .or_else(|| match_fuzzy(&normalized));

    match result {
        Some(classification) => debug!(
            text = %normalized,
            command = %classification.command,
            tier = ?classification.tier,
            "Voice command matched"
        ),
        None => debug!(text = %normalized, "No voice command matched"),
    }
    result
}

fn match_phrase(normalized: &str) -> Option<Classification> {
    PHRASES
        .iter()
        .find(|(phrase, _)| *phrase == normalized)
        .map(|(_, command)| Classification::new(*command, MatchTier::Phrase))
}

fn match_tokens(normalized: &str) -> Option<Classification> {
    let words: Vec<&str> = normalized.split(' ').collect();
    VARIANTS
        .iter()
        .find(|(_, variants)| words.iter().any(|word| variants.contains(word)))
        .map(|(command, _)| Classification::new(*command, MatchTier::Token))
}

fn match_fuzzy(normalized: &str) -> Option<Classification> {
    for word in normalized.split(' ') {
        for (command, variants) in VARIANTS {
            for variant in *variants {
                let similarity = normalized_levenshtein(word, variant);
                if similarity > FUZZY_THRESHOLD {
                    debug!(word, variant, similarity, "Fuzzy voice match");
                    return Some(Classification::new(*command, MatchTier::Fuzzy));
                }
            }
        }
    }
    None
}
