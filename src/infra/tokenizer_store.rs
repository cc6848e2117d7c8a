// ============================================================
// Layer 6 - Tokenizer Store
// ============================================================
// Builds, saves and loads the word-level tokenizer shared by
// the source and target languages.
//
// The tokenizer JSON is written directly in HuggingFace format
// and loaded back through tokenizers::Tokenizer, so the saved
// file is usable by any HF-compatible tool.
//
// Reserved ids:
//   0  <pad>   padding
//   1  </s>    end of sentence, appended to every encoding
//   2  <unk>   out-of-vocabulary words
//   3  <s>     decoder start token (never produced by encode)
//
// Vocabulary counting mirrors the tokenizer's own pipeline
// (Lowercase normalizer + Whitespace pre-tokenizer, which splits
// into runs of word characters and runs of punctuation), so every
// counted word is reachable at encode time.

use anyhow::{Context, Result};
use std::{collections::HashMap, path::PathBuf};
use tokenizers::Tokenizer;

use crate::domain::special_tokens::SpecialTokens;

pub const PAD_TOKEN:   &str = "<pad>";
pub const EOS_TOKEN:   &str = "</s>";
pub const UNK_TOKEN:   &str = "<unk>";
pub const START_TOKEN: &str = "<s>";

pub const PAD_ID:   u32 = 0;
pub const EOS_ID:   u32 = 1;
pub const UNK_ID:   u32 = 2;
pub const START_ID: u32 = 3;

const RESERVED: usize = 4;

/// Special token ids matching the vocabulary this store writes.
pub fn special_tokens() -> SpecialTokens {
    SpecialTokens::new(PAD_ID, START_ID, EOS_ID)
}

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self) -> PathBuf {
        self.dir.join("tokenizer.json")
    }

    /// Load existing tokenizer or build a new one from texts
    pub fn load_or_build(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        if self.path().exists() {
            tracing::info!("Loading existing tokenizer from disk");
            self.load()
        } else {
            tracing::info!("Building new tokenizer (max vocab_size={})", vocab_size);
            self.build_and_save(texts, vocab_size)
        }
    }

    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.path();
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e))
    }

    fn build_and_save(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        // ── Step 1: Count words the way the tokenizer will split them ────────
        let mut freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            for word in pre_tokenize(&text.to_lowercase()) {
                *freq.entry(word).or_insert(0) += 1;
            }
        }

        // Most frequent first; ties broken alphabetically so builds are reproducible
        let mut words: Vec<(String, usize)> = freq.into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(vocab_size.saturating_sub(RESERVED));

        // ── Step 2: Build vocab JSON ──────────────────────────────────────────
        let mut vocab = serde_json::json!({
            PAD_TOKEN:   PAD_ID,
            EOS_TOKEN:   EOS_ID,
            UNK_TOKEN:   UNK_ID,
            START_TOKEN: START_ID,
        });
        let mut next_id = RESERVED;
        for (word, _) in &words {
            if vocab.get(word).is_none() {
                vocab[word] = serde_json::json!(next_id);
                next_id += 1;
            }
        }

        // ── Step 3: Write tokenizer JSON in HuggingFace format ────────────────
        let added = |id: u32, content: &str| serde_json::json!({
            "id": id, "content": content, "single_word": false, "lstrip": false,
            "rstrip": false, "normalized": false, "special": true
        });
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                added(PAD_ID, PAD_TOKEN),
                added(EOS_ID, EOS_TOKEN),
                added(UNK_ID, UNK_TOKEN),
                added(START_ID, START_TOKEN),
            ],
            "normalizer": { "type": "Lowercase" },
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": UNK_TOKEN
            }
        });

        let tok_path = self.path();
        std::fs::write(&tok_path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| "Cannot write tokenizer JSON")?;

        tracing::info!("Tokenizer built with {} entries, saved to '{}'", next_id, tok_path.display());

        Tokenizer::from_file(&tok_path)
            .map_err(|e| anyhow::anyhow!("Cannot reload tokenizer: {e}"))
    }
}

/// Split into runs of word characters and runs of other non-space
/// characters, matching the `Whitespace` pre-tokenizer.
fn pre_tokenize(text: &str) -> Vec<String> {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut out: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_is_word = false;

    for c in text.chars() {
        if c.is_whitespace() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            continue;
        }
        if !current.is_empty() && is_word(c) != current_is_word {
            out.push(std::mem::take(&mut current));
        }
        current_is_word = is_word(c);
        current.push(c);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Encode `text`, truncate to `max_len - 1` tokens and append `</s>`.
pub fn encode_sentence(tokenizer: &Tokenizer, text: &str, max_len: usize) -> Result<Vec<u32>> {
    let enc = tokenizer
        .encode(text, false)
        .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
    let mut ids: Vec<u32> = enc.get_ids().to_vec();
    ids.truncate(max_len.saturating_sub(1));
    ids.push(EOS_ID);
    Ok(ids)
}

/// Decode ids back to text, dropping special tokens.
pub fn decode_ids(tokenizer: &Tokenizer, ids: &[u32]) -> Result<String> {
    tokenizer
        .decode(ids, true)
        .map_err(|e| anyhow::anyhow!("Decode: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pre_tokenize_splits_punctuation() {
        assert_eq!(pre_tokenize("¿dónde está?"), vec!["¿", "dónde", "está", "?"]);
        assert_eq!(pre_tokenize("it's  ok..."), vec!["it", "'", "s", "ok", "..."]);
    }

    #[test]
    fn test_build_encode_decode() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let texts = vec!["Hola mundo.".to_string(), "hola amigo".to_string()];

        let tok = store.load_or_build(&texts, 100).unwrap();
        // 4 reserved + hola, mundo, ".", amigo
        assert_eq!(tok.get_vocab_size(false), 8);
        assert_eq!(tok.token_to_id(START_TOKEN), Some(START_ID));

        let ids = encode_sentence(&tok, "Hola mundo", 16).unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(*ids.last().unwrap(), EOS_ID);
        assert!(ids.iter().all(|&id| id != UNK_ID));

        assert_eq!(decode_ids(&tok, &ids).unwrap(), "hola mundo");
    }

    #[test]
    fn test_vocab_size_cap_and_unknown_words() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let texts = vec!["a a a b b c".to_string()];

        // room for 2 words after the reserved ids: "a" and "b"
        let tok = store.load_or_build(&texts, 6).unwrap();
        assert_eq!(tok.get_vocab_size(false), 6);

        let ids = encode_sentence(&tok, "c", 8).unwrap();
        assert_eq!(ids, vec![UNK_ID, EOS_ID]);
    }

    #[test]
    fn test_truncation_keeps_eos() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let tok = store.load_or_build(&["one two three four".to_string()], 50).unwrap();

        let ids = encode_sentence(&tok, "one two three four", 3).unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[2], EOS_ID);
    }

    #[test]
    fn test_reloads_saved_tokenizer() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let built = store.load_or_build(&["x y".to_string()], 50).unwrap();

        // A second call ignores the texts and loads from disk
        let loaded = store.load_or_build(&[], 50).unwrap();
        assert_eq!(built.get_vocab_size(false), loaded.get_vocab_size(false));
    }
}
