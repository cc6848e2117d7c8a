// ============================================================
// Layer 3 - Special Token Contract
// ============================================================
// The model core never hard-codes token ids. Whoever owns the
// tokenizer decides these values once and they travel with the
// TrainConfig into training and inference.
//
//   pad_id        → filler id for short sequences (mask = 0)
//   start_id      → first decoder input token for every target
//   eos_id        → end of sequence; stops greedy decoding
//   ignore_index  → label value excluded from the loss,
//                   negative so it can never be a real token id

use serde::{Deserialize, Serialize};

/// Conventional label sentinel for "no loss at this position"
pub const DEFAULT_IGNORE_INDEX: i64 = -100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTokens {
    pub pad_id:       u32,
    pub start_id:     u32,
    pub eos_id:       u32,
    pub ignore_index: i64,
}

impl SpecialTokens {
    pub fn new(pad_id: u32, start_id: u32, eos_id: u32) -> Self {
        Self { pad_id, start_id, eos_id, ignore_index: DEFAULT_IGNORE_INDEX }
    }

    pub fn with_ignore_index(mut self, ignore_index: i64) -> Self {
        self.ignore_index = ignore_index;
        self
    }

    /// Check the ids against the decoder vocabulary they will index.
    pub fn validate(&self, decoder_vocab_size: usize) -> Result<(), String> {
        for (name, id) in [("pad_id", self.pad_id), ("start_id", self.start_id), ("eos_id", self.eos_id)] {
            if id as usize >= decoder_vocab_size {
                return Err(format!(
                    "{name} {id} is outside the decoder vocabulary (size {decoder_vocab_size})"
                ));
            }
        }
        if self.ignore_index >= 0 {
            return Err(format!(
                "ignore_index {} must be negative so it cannot collide with a token id",
                self.ignore_index
            ));
        }
        if self.start_id == self.pad_id {
            return Err("start_id and pad_id must differ, or every decoder row is fully masked".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_tokens() {
        let tokens = SpecialTokens::new(0, 65_001, 1);
        assert_eq!(tokens.ignore_index, -100);
        assert!(tokens.validate(65_002).is_ok());
    }

    #[test]
    fn test_start_id_outside_vocab() {
        // The start token is injected, so the vocabulary must grow to hold it
        let tokens = SpecialTokens::new(0, 65_001, 1);
        assert!(tokens.validate(65_001).is_err());
    }

    #[test]
    fn test_non_negative_ignore_index() {
        let tokens = SpecialTokens::new(0, 3, 1).with_ignore_index(0);
        assert!(tokens.validate(10).is_err());
    }

    #[test]
    fn test_start_equal_to_pad() {
        assert!(SpecialTokens::new(2, 2, 1).validate(10).is_err());
    }
}
