use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One tokenised translation example, not yet padded.
///
/// `input_ids` is the source sentence (ending in `</s>`).
/// `labels` is the target sentence (ending in `</s>`); it is both
/// the loss target and, after shifting, the decoder input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seq2SeqSample {
    pub input_ids: Vec<u32>,
    pub labels:    Vec<i64>,
}

impl Seq2SeqSample {
    pub fn new(input_ids: Vec<u32>, labels: Vec<i64>) -> Self {
        Self { input_ids, labels }
    }

    pub fn target_len(&self) -> usize {
        self.labels.len()
    }
}

pub struct Seq2SeqDataset {
    samples: Vec<Seq2SeqSample>,
}

impl Seq2SeqDataset {
    pub fn new(samples: Vec<Seq2SeqSample>) -> Self { Self { samples } }
}

impl Dataset<Seq2SeqSample> for Seq2SeqDataset {
    fn get(&self, index: usize) -> Option<Seq2SeqSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
