// ============================================================
// Layer 5 - Decoder
// ============================================================
// DecoderBlock (post-norm residual, three sublayers):
//
//   x = LayerNorm(y + CausalSelfAttention(y, y, y, dec_mask))
//   x = LayerNorm(x + CrossAttention(x, enc, enc, enc_mask))
//   x = LayerNorm(x + FeedForward(x))
//   x = Dropout(x)
//
// The causal mask in the first sublayer is what makes teacher
// forcing safe: position i can never read a target token > i.
// Cross-attention is not causal; every valid encoder position
// is visible.
//
// Decoder:
//
//   token ids → Embedding → PositionalEncoding
//             → n_layers × DecoderBlock → LayerNorm → Linear
//
// producing [batch, dec_len, vocab_size] logits.

use burn::{
    nn::{
        Dropout, DropoutConfig, Embedding, EmbeddingConfig, LayerNorm, LayerNormConfig, Linear,
        LinearConfig,
    },
    prelude::*,
};

use crate::ml::attention::{AttentionInput, MultiHeadAttention, MultiHeadAttentionConfig};
use crate::ml::error::{require_positive, ModelResult};
use crate::ml::feedforward::{FeedForward, FeedForwardConfig};
use crate::ml::mode::{apply_dropout, Mode};
use crate::ml::positional::{PositionalEncoding, PositionalEncodingConfig};

// ─── DecoderBlock ─────────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct DecoderBlockConfig {
    pub d_model: usize,
    pub d_k:     usize,
    pub n_heads: usize,
    pub max_len: usize,
    #[config(default = 0.1)]
    pub dropout: f64,
}

impl DecoderBlockConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ModelResult<DecoderBlock<B>> {
        let attn_cfg = MultiHeadAttentionConfig::new(self.d_model, self.d_k, self.n_heads, self.max_len);

        Ok(DecoderBlock {
            self_attn:  attn_cfg.clone().with_causal(true).init(device)?,
            cross_attn: attn_cfg.with_causal(false).init(device)?,
            ffn: FeedForwardConfig::new(self.d_model)
                .with_dropout(self.dropout)
                .init(device)?,
            norm1:   LayerNormConfig::new(self.d_model).init(device),
            norm2:   LayerNormConfig::new(self.d_model).init(device),
            norm3:   LayerNormConfig::new(self.d_model).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        })
    }
}

#[derive(Module, Debug)]
pub struct DecoderBlock<B: Backend> {
    pub self_attn:  MultiHeadAttention<B>,
    pub cross_attn: MultiHeadAttention<B>,
    pub ffn:        FeedForward<B>,
    pub norm1:      LayerNorm<B>,
    pub norm2:      LayerNorm<B>,
    pub norm3:      LayerNorm<B>,
    pub dropout:    Dropout,
}

impl<B: Backend> DecoderBlock<B> {
    /// enc_output: [batch, enc_len, d_model], dec_input: [batch, dec_len, d_model]
    /// → [batch, dec_len, d_model]
    pub fn forward(
        &self,
        enc_output: Tensor<B, 3>,
        dec_input:  Tensor<B, 3>,
        enc_mask:   Option<Tensor<B, 2, Int>>,
        dec_mask:   Option<Tensor<B, 2, Int>>,
        mode:       Mode,
    ) -> ModelResult<Tensor<B, 3>> {
        let attn = self
            .self_attn
            .forward(AttentionInput::self_attn(dec_input.clone()).pad_mask(dec_mask))?
            .context;
        let x = self.norm1.forward(dec_input + attn);

        let cross = self
            .cross_attn
            .forward(AttentionInput::cross(x.clone(), enc_output).pad_mask(enc_mask))?
            .context;
        let x = self.norm2.forward(x + cross);

        let ffn_out = self.ffn.forward(x.clone(), mode);
        let x = self.norm3.forward(x + ffn_out);

        Ok(apply_dropout(&self.dropout, x, mode))
    }
}

// ─── Decoder ──────────────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct DecoderConfig {
    pub d_model:    usize,
    pub d_k:        usize,
    pub n_heads:    usize,
    pub max_len:    usize,
    pub vocab_size: usize,
    pub n_layers:   usize,
    #[config(default = 0.1)]
    pub dropout:    f64,
}

impl DecoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ModelResult<Decoder<B>> {
        require_positive("decoder vocab_size", self.vocab_size)?;
        require_positive("decoder n_layers", self.n_layers)?;

        let block_cfg = DecoderBlockConfig::new(self.d_model, self.d_k, self.n_heads, self.max_len)
            .with_dropout(self.dropout);
        let blocks = (0..self.n_layers)
            .map(|_| block_cfg.init(device))
            .collect::<ModelResult<Vec<_>>>()?;

        Ok(Decoder {
            embedding: EmbeddingConfig::new(self.vocab_size, self.d_model).init(device),
            pos_encoding: PositionalEncodingConfig::new(self.d_model)
                .with_max_len(self.max_len)
                .with_dropout(self.dropout)
                .init(device)?,
            blocks,
            norm: LayerNormConfig::new(self.d_model).init(device),
            head: LinearConfig::new(self.d_model, self.vocab_size).init(device),
        })
    }
}

#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    pub embedding:    Embedding<B>,
    pub pos_encoding: PositionalEncoding<B>,
    pub blocks:       Vec<DecoderBlock<B>>,
    pub norm:         LayerNorm<B>,
    /// Projects the final hidden state to vocabulary logits
    pub head:         Linear<B>,
}

impl<B: Backend> Decoder<B> {
    /// → logits [batch, dec_len, vocab_size]
    pub fn forward(
        &self,
        enc_output: Tensor<B, 3>,
        dec_ids:    Tensor<B, 2, Int>,
        enc_mask:   Option<Tensor<B, 2, Int>>,
        dec_mask:   Option<Tensor<B, 2, Int>>,
        mode:       Mode,
    ) -> ModelResult<Tensor<B, 3>> {
        let x = self.embedding.forward(dec_ids);
        let mut x = self.pos_encoding.forward(x, mode)?;

        for block in &self.blocks {
            x = block.forward(enc_output.clone(), x, enc_mask.clone(), dec_mask.clone(), mode)?;
        }
        Ok(self.head.forward(self.norm.forward(x)))
    }

    pub fn max_len(&self) -> usize {
        self.pos_encoding.max_len()
    }
}
