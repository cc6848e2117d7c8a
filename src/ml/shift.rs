// ============================================================
// Layer 5 - Teacher-Forcing Shift
// ============================================================
// Builds decoder inputs from target labels for teacher-forced
// training: the decoder sees the true target, one step behind.
//
//   labels      [   5,  7,  9, -100 ]
//   shifted     [ <s>,  5,  7,    9 ]   roll right, start id first
//   ignored     [ <s>,  5,  7,  pad ]   label ignored → pad
//   mask        [   1,  1,  1,    0 ]   0 exactly where input is pad
//
// Two kinds of positions become pad:
//   - any ignore_index value rolled into the input
//   - any position whose own label is ignored (nothing to predict)
// Column 0 is exempt and always holds the start id; a causal
// query row with no visible key would turn into NaN.
//
// The start id comes from SpecialTokens, never a literal.

use burn::prelude::*;

use crate::domain::special_tokens::SpecialTokens;
use crate::ml::error::{ModelError, ModelResult};

#[derive(Debug, Clone)]
pub struct DecoderInputs<B: Backend> {
    /// [batch, len] token ids fed to the decoder
    pub input_ids: Tensor<B, 2, Int>,
    /// [batch, len] 1 = real token, 0 = pad
    pub mask: Tensor<B, 2, Int>,
}

pub fn shift_right<B: Backend>(
    labels: Tensor<B, 2, Int>,
    tokens: &SpecialTokens,
) -> ModelResult<DecoderInputs<B>> {
    let [batch, len] = labels.dims();
    if len == 0 {
        return Err(ModelError::EmptySequence("target labels"));
    }
    let device = labels.device();
    let pad    = tokens.pad_id as i64;

    let start   = start_column::<B>(batch, tokens, &device);
    let shifted = if len > 1 {
        Tensor::cat(vec![start, labels.clone().slice([0..batch, 0..len - 1])], 1)
    } else {
        start
    };

    let rolled_ignored = shifted.clone().equal_elem(tokens.ignore_index);
    let label_ignored  = labels.equal_elem(tokens.ignore_index);
    let input_ids = shifted
        .mask_fill(rolled_ignored, pad)
        .mask_fill(label_ignored, pad)
        .slice_assign([0..batch, 0..1], start_column(batch, tokens, &device));

    let mask = input_ids.clone().equal_elem(pad).bool_not().int();
    Ok(DecoderInputs { input_ids, mask })
}

fn start_column<B: Backend>(batch: usize, tokens: &SpecialTokens, device: &B::Device) -> Tensor<B, 2, Int> {
    Tensor::full([batch, 1], tokens.start_id as i64, device)
}
