// ============================================================
// Layer 3 - SentencePair Domain Type
// ============================================================
// One aligned translation example: a source-language sentence
// and its target-language counterpart. Plain text, before any
// tokenisation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentencePair {
    pub source: String,
    pub target: String,
}

impl SentencePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self { source: source.into(), target: target.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.source.trim().is_empty() || self.target.trim().is_empty()
    }
}
