use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;

use crate::error::IndexError;
use crate::Position;

lazy_static! {
    static ref EDGES: Regex = Regex::new(r"(?u)^[^\p{L}\p{N}]+|[^\p{L}\p{N}]+$").expect("valid regex");
    static ref QUOTES: Regex = Regex::new("['\"\u{2018}\u{2019}\u{201C}\u{201D}]").expect("valid regex");
}

/// Turns raw whitespace-delimited tokens into index terms.
pub trait Tokenizer {
    /// Normalizes one raw token. May yield zero terms (pure punctuation) or
    /// several (hyphenated words).
    fn normalize(&self, raw: &str) -> Vec<String>;

    /// Splits `text` on whitespace and normalizes each token. Every term produced
    /// from the same raw token shares its position.
    fn tokenize(&self, text: &str) -> Vec<(String, Position)> {
        let mut out = Vec::new();
        for (pos, raw) in text.split_whitespace().enumerate() {
            for term in self.normalize(raw) {
                out.push((term, pos as Position));
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemmerAlgorithm {
    #[default]
    English,
    French,
    German,
    Spanish,
    Italian,
    Portuguese,
    Dutch,
    None,
}

impl StemmerAlgorithm {
    fn algorithm(self) -> Option<Algorithm> {
        match self {
            StemmerAlgorithm::English => Some(Algorithm::English),
            StemmerAlgorithm::French => Some(Algorithm::French),
            StemmerAlgorithm::German => Some(Algorithm::German),
            StemmerAlgorithm::Spanish => Some(Algorithm::Spanish),
            StemmerAlgorithm::Italian => Some(Algorithm::Italian),
            StemmerAlgorithm::Portuguese => Some(Algorithm::Portuguese),
            StemmerAlgorithm::Dutch => Some(Algorithm::Dutch),
            StemmerAlgorithm::None => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StemmerAlgorithm::English => "english",
            StemmerAlgorithm::French => "french",
            StemmerAlgorithm::German => "german",
            StemmerAlgorithm::Spanish => "spanish",
            StemmerAlgorithm::Italian => "italian",
            StemmerAlgorithm::Portuguese => "portuguese",
            StemmerAlgorithm::Dutch => "dutch",
            StemmerAlgorithm::None => "none",
        }
    }
}

impl fmt::Display for StemmerAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StemmerAlgorithm {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" | "porter" => Ok(StemmerAlgorithm::English),
            "french" => Ok(StemmerAlgorithm::French),
            "german" => Ok(StemmerAlgorithm::German),
            "spanish" => Ok(StemmerAlgorithm::Spanish),
            "italian" => Ok(StemmerAlgorithm::Italian),
            "portuguese" => Ok(StemmerAlgorithm::Portuguese),
            "dutch" => Ok(StemmerAlgorithm::Dutch),
            "none" => Ok(StemmerAlgorithm::None),
            other => Err(IndexError::InvalidInput(format!("unknown stemmer '{other}'"))),
        }
    }
}

/// NFKC folding, edge punctuation and quote stripping, lowercasing, hyphen
/// splitting and stemming.
pub struct TokenProcessor {
    stemmer: Option<Stemmer>,
}

impl TokenProcessor {
    pub fn new(algorithm: StemmerAlgorithm) -> Self {
        Self {
            stemmer: algorithm.algorithm().map(Stemmer::create),
        }
    }

    fn stem(&self, word: &str) -> String {
        match &self.stemmer {
            Some(stemmer) => stemmer.stem(word).into_owned(),
            None => word.to_string(),
        }
    }
}

impl Default for TokenProcessor {
    fn default() -> Self {
        Self::new(StemmerAlgorithm::default())
    }
}

impl Tokenizer for TokenProcessor {
    fn normalize(&self, raw: &str) -> Vec<String> {
        let folded = raw.nfkc().collect::<String>().to_lowercase();
        let trimmed = EDGES.replace_all(&folded, "");
        let cleaned = QUOTES.replace_all(&trimmed, "");
        if cleaned.is_empty() {
            return Vec::new();
        }

        if !cleaned.contains('-') {
            return vec![self.stem(&cleaned)];
        }

        // "well-known" indexes as "wellknown", "well" and "known".
        let mut terms = Vec::new();
        let joined: String = cleaned.chars().filter(|&c| c != '-').collect();
        if !joined.is_empty() {
            terms.push(self.stem(&joined));
        }
        for part in cleaned.split('-').filter(|p| !p.is_empty()) {
            let term = self.stem(part);
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
        terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_normalize() {
        let t = TokenProcessor::default();
        assert_eq!(t.normalize("Running,"), vec!["run"]);
        assert!(t.normalize("--").is_empty());
    }

    #[test]
    fn hyphenated_words_expand() {
        let t = TokenProcessor::new(StemmerAlgorithm::None);
        assert_eq!(t.normalize("Well-Known"), vec!["wellknown", "well", "known"]);
    }

    #[test]
    fn positions_follow_raw_tokens() {
        let t = TokenProcessor::new(StemmerAlgorithm::None);
        let toks = t.tokenize("the cat -- sat");
        assert_eq!(
            toks,
            vec![("the".to_string(), 0), ("cat".to_string(), 1), ("sat".to_string(), 3)]
        );
    }
}
