// ============================================================
// Layer 5 - Encoder
// ============================================================
// EncoderBlock (post-norm residual):
//
//   x = LayerNorm(x + SelfAttention(x, x, x, pad_mask))
//   x = LayerNorm(x + FeedForward(x))
//   x = Dropout(x)
//
// Encoder:
//
//   token ids → Embedding → PositionalEncoding
//             → n_layers × EncoderBlock → LayerNorm
//
// Every block is built independently, so no parameters are
// shared between layers.

use burn::{
    nn::{Dropout, DropoutConfig, Embedding, EmbeddingConfig, LayerNorm, LayerNormConfig},
    prelude::*,
};

use crate::ml::attention::{AttentionInput, MultiHeadAttention, MultiHeadAttentionConfig};
use crate::ml::error::{require_positive, ModelResult};
use crate::ml::feedforward::{FeedForward, FeedForwardConfig};
use crate::ml::mode::{apply_dropout, Mode};
use crate::ml::positional::{PositionalEncoding, PositionalEncodingConfig};

// ─── EncoderBlock ─────────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct EncoderBlockConfig {
    pub d_model: usize,
    pub d_k:     usize,
    pub n_heads: usize,
    pub max_len: usize,
    #[config(default = 0.1)]
    pub dropout: f64,
}

impl EncoderBlockConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ModelResult<EncoderBlock<B>> {
        let self_attn = MultiHeadAttentionConfig::new(self.d_model, self.d_k, self.n_heads, self.max_len)
            .init(device)?;
        let ffn = FeedForwardConfig::new(self.d_model)
            .with_dropout(self.dropout)
            .init(device)?;

        Ok(EncoderBlock {
            self_attn,
            ffn,
            norm1:   LayerNormConfig::new(self.d_model).init(device),
            norm2:   LayerNormConfig::new(self.d_model).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        })
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn: MultiHeadAttention<B>,
    pub ffn:       FeedForward<B>,
    pub norm1:     LayerNorm<B>,
    pub norm2:     LayerNorm<B>,
    pub dropout:   Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// x: [batch, len, d_model], pad_mask: [batch, len] → [batch, len, d_model]
    pub fn forward(
        &self,
        x:        Tensor<B, 3>,
        pad_mask: Option<Tensor<B, 2, Int>>,
        mode:     Mode,
    ) -> ModelResult<Tensor<B, 3>> {
        let attn = self
            .self_attn
            .forward(AttentionInput::self_attn(x.clone()).pad_mask(pad_mask))?
            .context;
        let x = self.norm1.forward(x + attn);

        let ffn_out = self.ffn.forward(x.clone(), mode);
        let x = self.norm2.forward(x + ffn_out);

        Ok(apply_dropout(&self.dropout, x, mode))
    }
}

// ─── Encoder ──────────────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct EncoderConfig {
    pub d_model:    usize,
    pub d_k:        usize,
    pub n_heads:    usize,
    pub max_len:    usize,
    pub vocab_size: usize,
    pub n_layers:   usize,
    #[config(default = 0.1)]
    pub dropout:    f64,
}

impl EncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ModelResult<Encoder<B>> {
        require_positive("encoder vocab_size", self.vocab_size)?;
        require_positive("encoder n_layers", self.n_layers)?;

        let block_cfg = EncoderBlockConfig::new(self.d_model, self.d_k, self.n_heads, self.max_len)
            .with_dropout(self.dropout);
        let blocks = (0..self.n_layers)
            .map(|_| block_cfg.init(device))
            .collect::<ModelResult<Vec<_>>>()?;

        Ok(Encoder {
            embedding: EmbeddingConfig::new(self.vocab_size, self.d_model).init(device),
            pos_encoding: PositionalEncodingConfig::new(self.d_model)
                .with_max_len(self.max_len)
                .with_dropout(self.dropout)
                .init(device)?,
            blocks,
            norm: LayerNormConfig::new(self.d_model).init(device),
        })
    }
}

#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    pub embedding:    Embedding<B>,
    pub pos_encoding: PositionalEncoding<B>,
    pub blocks:       Vec<EncoderBlock<B>>,
    pub norm:         LayerNorm<B>,
}

impl<B: Backend> Encoder<B> {
    /// input_ids: [batch, len] → [batch, len, d_model]
    pub fn forward(
        &self,
        input_ids: Tensor<B, 2, Int>,
        pad_mask:  Option<Tensor<B, 2, Int>>,
        mode:      Mode,
    ) -> ModelResult<Tensor<B, 3>> {
        let x = self.embedding.forward(input_ids);
        let mut x = self.pos_encoding.forward(x, mode)?;

        for block in &self.blocks {
            x = block.forward(x, pad_mask.clone(), mode)?;
        }
        Ok(self.norm.forward(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray;

    #[test]
    fn test_block_preserves_shape() {
        let device = Default::default();
        let block = EncoderBlockConfig::new(16, 4, 4, 32).init::<TestBackend>(&device).unwrap();

        let x = Tensor::random([2, 7, 16], Distribution::Normal(0.0, 1.0), &device);
        let mask = Tensor::<TestBackend, 2, Int>::from_ints(
            [[1, 1, 1, 1, 1, 0, 0], [1, 1, 1, 1, 1, 1, 1]],
            &device,
        );
        let out = block.forward(x, Some(mask), Mode::Eval).unwrap();
        assert_eq!(out.dims(), [2, 7, 16]);
    }

    #[test]
    fn test_layers_are_independent() {
        let device = Default::default();
        let encoder = EncoderConfig::new(8, 4, 2, 16, 50, 3).init::<TestBackend>(&device).unwrap();
        assert_eq!(encoder.blocks.len(), 3);

        let first:  Vec<f32> = encoder.blocks[0].self_attn.query.weight.val().into_data().to_vec().unwrap();
        let second: Vec<f32> = encoder.blocks[1].self_attn.query.weight.val().into_data().to_vec().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_encoder_output_shape() {
        let device = Default::default();
        let encoder = EncoderConfig::new(8, 4, 2, 16, 50, 2).init::<TestBackend>(&device).unwrap();

        let ids = Tensor::<TestBackend, 2, Int>::from_ints([[3, 9, 4, 0], [7, 1, 0, 0]], &device);
        let mask = Tensor::<TestBackend, 2, Int>::from_ints([[1, 1, 1, 0], [1, 1, 0, 0]], &device);
        let out = encoder.forward(ids, Some(mask), Mode::Eval).unwrap();
        assert_eq!(out.dims(), [2, 4, 8]);
    }

    #[test]
    fn test_eval_mode_is_deterministic() {
        let device = Default::default();
        let encoder = EncoderConfig::new(8, 4, 2, 16, 50, 2)
            .with_dropout(0.5)
            .init::<TestBackend>(&device)
            .unwrap();

        let ids  = Tensor::<TestBackend, 2, Int>::from_ints([[3, 9, 4, 0]], &device);
        let mask = Tensor::<TestBackend, 2, Int>::from_ints([[1, 1, 1, 0]], &device);

        let a: Vec<f32> = encoder
            .forward(ids.clone(), Some(mask.clone()), Mode::Eval).unwrap()
            .into_data().to_vec().unwrap();
        let b: Vec<f32> = encoder
            .forward(ids, Some(mask), Mode::Eval).unwrap()
            .into_data().to_vec().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_sequence_longer_than_max_len() {
        let device = Default::default();
        let encoder = EncoderConfig::new(8, 4, 2, 4, 50, 1).init::<TestBackend>(&device).unwrap();

        let ids = Tensor::<TestBackend, 2, Int>::zeros([1, 5], &device);
        assert!(encoder.forward(ids, None, Mode::Eval).is_err());
    }
}
