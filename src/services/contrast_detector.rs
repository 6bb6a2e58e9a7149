//! Lexical contrast detection over a symmetric term-pair lexicon.
//!
//! Purely lexical and case-insensitive. Terms match as substrings, so
//! "pass" also matches "password"; that false-positive risk is accepted
//! in exchange for catching inflected forms ("failed", "rejected").

use crate::domain::models::ContrastConfig;

#[derive(Debug, Clone)]
pub struct ContrastDetector {
    pairs: Vec<(String, String)>,
}

impl Default for ContrastDetector {
    fn default() -> Self {
        Self::from_config(&ContrastConfig::default())
    }
}

impl ContrastDetector {
    /// Build from term pairs. Terms are lowercased; pairs with an empty
    /// term are dropped since they would match everything.
    pub fn new<I, A, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: AsRef<str>,
        B: AsRef<str>,
    {
        let pairs = pairs
            .into_iter()
            .map(|(a, b)| {
                (
                    a.as_ref().trim().to_lowercase(),
                    b.as_ref().trim().to_lowercase(),
                )
            })
            .filter(|(a, b)| !a.is_empty() && !b.is_empty())
            .collect();
        Self { pairs }
    }

    pub fn from_config(config: &ContrastConfig) -> Self {
        Self::new(config.pairs.iter().map(|(a, b)| (a.as_str(), b.as_str())))
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// True iff one text holds a term and the other holds its counterpart.
    pub fn has_contrast(&self, text_a: &str, text_b: &str) -> bool {
        self.matching_pair(text_a, text_b).is_some()
    }

    /// The first lexicon pair that fires, in lexicon order.
    pub fn matching_pair(&self, text_a: &str, text_b: &str) -> Option<(&str, &str)> {
        let a = text_a.to_lowercase();
        let b = text_b.to_lowercase();
        self.pairs
            .iter()
            .find(|(x, y)| {
                (a.contains(x.as_str()) && b.contains(y.as_str()))
                    || (a.contains(y.as_str()) && b.contains(x.as_str()))
            })
            .map(|(x, y)| (x.as_str(), y.as_str()))
    }
}
