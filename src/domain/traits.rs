// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits, so a
// different corpus format or a different decoding strategy can
// be swapped in without touching the workflows.

use anyhow::Result;
use crate::domain::sentence_pair::SentencePair;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Anything that can produce aligned sentence pairs.
///
/// Implementations:
///   - TsvCorpusLoader → tab-separated `source<TAB>target` lines
pub trait CorpusSource {
    fn load_pairs(&self) -> Result<Vec<SentencePair>>;
}

// ─── Translator ───────────────────────────────────────────────────────────────
/// Anything that turns a source sentence into a target sentence.
///
/// Implementations:
///   - TranslateUseCase → greedy decoding with a trained checkpoint
pub trait Translator {
    fn translate(&self, sentence: &str) -> Result<String>;
}
