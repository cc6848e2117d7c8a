// ============================================================
// Layer 4 - Seq2Seq Batcher
// ============================================================
// Implements Burn's Batcher trait: turns a Vec<Seq2SeqSample>
// of ragged sequences into padded tensors.
//
// Padding is dynamic: each batch is padded only up to its own
// longest source / longest target, not to a global maximum.
//
//   input_ids       padded with pad_id          [batch, src_len]
//   attention_mask  1 = real token, 0 = padding [batch, src_len]
//   labels          padded with ignore_index    [batch, tgt_len]
//
// Padding labels with ignore_index (not pad_id) is what keeps
// padded target positions out of the loss.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::Seq2SeqSample;
use crate::domain::special_tokens::SpecialTokens;

// ─── Seq2SeqBatch ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct Seq2SeqBatch<B: Backend> {
    pub input_ids:      Tensor<B, 2, Int>,
    pub attention_mask: Tensor<B, 2, Int>,
    pub labels:         Tensor<B, 2, Int>,
}

// ─── Seq2SeqBatcher ───────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct Seq2SeqBatcher<B: Backend> {
    pub device: B::Device,
    tokens:     SpecialTokens,
}

impl<B: Backend> Seq2SeqBatcher<B> {
    pub fn new(device: B::Device, tokens: SpecialTokens) -> Self {
        Self { device, tokens }
    }
}

/// Pad every row to the longest row, returning (flat values, row width).
fn pad_rows<T: Copy>(rows: impl Iterator<Item = Vec<T>> + Clone, fill: T) -> (Vec<T>, usize) {
    let width = rows.clone().map(|r| r.len()).max().unwrap_or(0);
    let flat = rows
        .flat_map(|mut row| {
            row.resize(width, fill);
            row
        })
        .collect();
    (flat, width)
}

impl<B: Backend> Batcher<Seq2SeqSample, Seq2SeqBatch<B>> for Seq2SeqBatcher<B> {
    fn batch(&self, items: Vec<Seq2SeqSample>) -> Seq2SeqBatch<B> {
        let batch_size = items.len();
        let pad = self.tokens.pad_id as i64;

        let sources = items
            .iter()
            .map(|s| s.input_ids.iter().map(|&id| id as i64).collect::<Vec<_>>());
        let (input_flat, src_len) = pad_rows(sources, pad);

        let masks = items.iter().map(|s| vec![1i64; s.input_ids.len()]);
        let (mask_flat, _) = pad_rows(masks, 0);

        let targets = items.iter().map(|s| s.labels.clone());
        let (label_flat, tgt_len) = pad_rows(targets, self.tokens.ignore_index);

        let int_tensor = |values: Vec<i64>, width: usize| {
            Tensor::<B, 2, Int>::from_data(TensorData::new(values, [batch_size, width]), &self.device)
        };

        Seq2SeqBatch {
            input_ids:      int_tensor(input_flat, src_len),
            attention_mask: int_tensor(mask_flat, src_len),
            labels:         int_tensor(label_flat, tgt_len),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn ints(t: Tensor<TestBackend, 2, Int>) -> Vec<i64> {
        t.into_data().convert::<i64>().to_vec().unwrap()
    }

    #[test]
    fn test_dynamic_padding() {
        let batcher = Seq2SeqBatcher::<TestBackend>::new(
            Default::default(),
            SpecialTokens::new(0, 3, 1),
        );
        let batch = batcher.batch(vec![
            Seq2SeqSample::new(vec![10, 11, 1], vec![20, 1]),
            Seq2SeqSample::new(vec![12, 1], vec![21, 22, 23, 1]),
        ]);

        assert_eq!(batch.input_ids.dims(), [2, 3]);
        assert_eq!(batch.labels.dims(), [2, 4]);
        assert_eq!(ints(batch.input_ids), vec![10, 11, 1, 12, 1, 0]);
        assert_eq!(ints(batch.attention_mask), vec![1, 1, 1, 1, 1, 0]);
        assert_eq!(ints(batch.labels), vec![20, 1, -100, -100, 21, 22, 23, 1]);
    }

    #[test]
    fn test_uses_configured_pad_id() {
        let batcher = Seq2SeqBatcher::<TestBackend>::new(
            Default::default(),
            SpecialTokens::new(65_000, 65_001, 0),
        );
        let batch = batcher.batch(vec![
            Seq2SeqSample::new(vec![5], vec![7]),
            Seq2SeqSample::new(vec![5, 6], vec![7]),
        ]);
        assert_eq!(ints(batch.input_ids), vec![5, 65_000, 5, 6]);
        assert_eq!(ints(batch.attention_mask), vec![1, 0, 1, 1]);
    }
}
