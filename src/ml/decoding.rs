// ============================================================
// Layer 5 - Greedy Decoding
// ============================================================
// Autoregressive generation for a single source sentence:
//
//   1. Encode the source once
//   2. Start the decoder input at [start_id]
//   3. Run the decoder, take arg-max of the LAST position
//   4. Stop on eos_id, otherwise append and repeat
//
// The decoder input never exceeds the decoder's max_len.
// Always runs in Mode::Eval.

use burn::{prelude::*, tensor::TensorData};

use crate::domain::special_tokens::SpecialTokens;
use crate::ml::error::{require_dim, ModelResult};
use crate::ml::mode::Mode;
use crate::ml::transformer::Transformer;

/// enc_ids / enc_mask: [1, enc_len]. Returns generated ids without
/// the start token and without the terminating eos.
pub fn greedy_decode<B: Backend>(
    model:          &Transformer<B>,
    enc_ids:        Tensor<B, 2, Int>,
    enc_mask:       Option<Tensor<B, 2, Int>>,
    tokens:         &SpecialTokens,
    max_new_tokens: usize,
) -> ModelResult<Vec<u32>> {
    let [batch, _] = enc_ids.dims();
    require_dim("greedy decoding batch", 1, batch)?;

    let device     = enc_ids.device();
    let enc_output = model.encode(enc_ids, enc_mask.clone(), Mode::Eval)?;
    let budget     = max_new_tokens.min(model.decoder.max_len());

    let mut dec_input = vec![tokens.start_id as i64];
    let mut generated = Vec::new();

    for _ in 0..budget {
        let len = dec_input.len();
        let dec_ids = Tensor::<B, 2, Int>::from_data(
            TensorData::new(dec_input.clone(), [1, len]),
            &device,
        );
        let logits = model.decode(enc_output.clone(), dec_ids, enc_mask.clone(), None, Mode::Eval)?;
        let [_, _, vocab] = logits.dims();

        let next = logits
            .slice([0..1, len - 1..len, 0..vocab])
            .argmax(2)
            .into_scalar()
            .elem::<i64>();

        if next == tokens.eos_id as i64 {
            break;
        }
        generated.push(next as u32);
        dec_input.push(next);
    }

    tracing::debug!("Greedy decoding produced {} tokens", generated.len());
    Ok(generated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::transformer::TransformerConfig;
    use burn::backend::NdArray;
    use burn::module::Param;

    type TestBackend = NdArray;

    #[test]
    fn test_respects_token_budget_and_eos() {
        let device = Default::default();
        let model = TransformerConfig::symmetric(16, 4, 2, 32, 20, 20, 1, 0.1)
            .init::<TestBackend>(&device)
            .unwrap();
        let tokens = SpecialTokens::new(0, 3, 1);

        let enc_ids  = Tensor::<TestBackend, 2, Int>::from_ints([[5, 6, 7, 1]], &device);
        let enc_mask = Tensor::<TestBackend, 2, Int>::ones([1, 4], &device);

        let out = greedy_decode(&model, enc_ids, Some(enc_mask), &tokens, 6).unwrap();
        assert!(out.len() <= 6);
        assert!(out.iter().all(|&id| id != tokens.eos_id && id < 20));
    }

    #[test]
    fn test_budget_capped_by_max_len() {
        let device = Default::default();
        let model = TransformerConfig::symmetric(8, 4, 2, 4, 10, 10, 1, 0.0)
            .init::<TestBackend>(&device)
            .unwrap();
        // eos id outside the vocabulary can never be produced
        let tokens = SpecialTokens { pad_id: 0, start_id: 2, eos_id: 99, ignore_index: -100 };

        let enc_ids = Tensor::<TestBackend, 2, Int>::from_ints([[4, 5]], &device);
        let out = greedy_decode(&model, enc_ids, None, &tokens, 100).unwrap();
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_is_deterministic() {
        let device = Default::default();
        let model = TransformerConfig::symmetric(16, 4, 2, 32, 20, 20, 2, 0.5)
            .init::<TestBackend>(&device)
            .unwrap();
        let tokens = SpecialTokens::new(0, 3, 1);
        let enc_ids = Tensor::<TestBackend, 2, Int>::from_ints([[9, 8, 7]], &device);

        let a = greedy_decode(&model, enc_ids.clone(), None, &tokens, 8).unwrap();
        let b = greedy_decode(&model, enc_ids, None, &tokens, 8).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_batched_input() {
        let device = Default::default();
        let model = TransformerConfig::symmetric(8, 4, 2, 8, 10, 10, 1, 0.0)
            .init::<TestBackend>(&device)
            .unwrap();
        let tokens = SpecialTokens::new(0, 2, 1);
        let enc_ids = Tensor::<TestBackend, 2, Int>::zeros([2, 3], &device);
        assert!(greedy_decode(&model, enc_ids, None, &tokens, 4).is_err());
    }

    #[test]
    fn test_stops_immediately_when_eos_wins() {
        let device = Default::default();
        let mut model = TransformerConfig::symmetric(8, 4, 2, 16, 10, 10, 1, 0.0)
            .init::<TestBackend>(&device)
            .unwrap();
        let tokens = SpecialTokens::new(0, 2, 1);

        let mut bias = vec![0.0f32; 10];
        bias[tokens.eos_id as usize] = 1.0e4;
        model.decoder.head.bias = Some(Param::from_tensor(Tensor::from_floats(bias.as_slice(), &device)));

        let enc_ids = Tensor::<TestBackend, 2, Int>::from_ints([[4, 5, 1]], &device);
        let out = greedy_decode(&model, enc_ids, None, &tokens, 8).unwrap();
        assert!(out.is_empty(), "decoded {out:?}");
    }
}
