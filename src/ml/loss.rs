// ============================================================
// Layer 5 - Token-Level Cross-Entropy with Ignore Index
// ============================================================
// Burn's CrossEntropyLoss takes pad token ids that must be valid
// class indices. Labels here mark "no loss" with a negative
// sentinel (ignore_index), so the masking is done by hand:
//
//   loss = -Σ log_softmax(logits)[label] / count
//
// summed and counted over non-ignored positions only. Ignored
// labels are swapped for class 0 before the gather so the index
// is always in range, then their log-probabilities are replaced
// with 0 (not multiplied by 0, so a NaN there cannot leak).

use burn::{prelude::*, tensor::activation};

use crate::ml::error::{ModelError, ModelResult};

/// logits: [batch, len, vocab], labels: [batch, len] → scalar loss [1]
pub fn masked_cross_entropy<B: Backend>(
    logits:       Tensor<B, 3>,
    labels:       Tensor<B, 2, Int>,
    ignore_index: i64,
) -> ModelResult<Tensor<B, 1>> {
    let [batch, len, _vocab] = logits.dims();
    let label_dims = labels.dims();
    if label_dims != [batch, len] {
        return Err(ModelError::MaskShape { expected: [batch, len], actual: label_dims });
    }

    let ignored = labels.clone().equal_elem(ignore_index);
    let keep    = ignored.clone().bool_not().float();
    let targets = labels.mask_fill(ignored.clone(), 0).reshape([batch, len, 1]);

    let picked = activation::log_softmax(logits, 2)
        .gather(2, targets)
        .reshape([batch, len]);

    let total = picked.mask_fill(ignored, 0.0).sum().neg();
    let count = keep.sum().clamp_min(1.0);
    Ok(total / count)
}
