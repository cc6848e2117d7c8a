// ============================================================
// Layer 5 - Transformer (Encoder + Decoder)
// ============================================================
// Pure composition: run the encoder once, hand its output to
// the decoder, return the decoder logits. The only state is
// the parameters of the two sub-models.
//
// The encoder and decoder may use different vocabularies, but
// they must agree on d_model because cross-attention reads the
// encoder output directly.

use burn::prelude::*;

use crate::ml::decoder::{Decoder, DecoderConfig};
use crate::ml::encoder::{Encoder, EncoderConfig};
use crate::ml::error::{ModelError, ModelResult};
use crate::ml::mode::Mode;

#[derive(Config, Debug)]
pub struct TransformerConfig {
    pub encoder: EncoderConfig,
    pub decoder: DecoderConfig,
}

impl TransformerConfig {
    /// Encoder and decoder with the same shape hyper-parameters,
    /// differing only in vocabulary size.
    #[allow(clippy::too_many_arguments)]
    pub fn symmetric(
        d_model:          usize,
        d_k:              usize,
        n_heads:          usize,
        max_len:          usize,
        enc_vocab_size:   usize,
        dec_vocab_size:   usize,
        n_layers:         usize,
        dropout:          f64,
    ) -> Self {
        Self::new(
            EncoderConfig::new(d_model, d_k, n_heads, max_len, enc_vocab_size, n_layers)
                .with_dropout(dropout),
            DecoderConfig::new(d_model, d_k, n_heads, max_len, dec_vocab_size, n_layers)
                .with_dropout(dropout),
        )
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ModelResult<Transformer<B>> {
        if self.encoder.d_model != self.decoder.d_model {
            return Err(ModelError::InvalidConfig(format!(
                "encoder d_model ({}) and decoder d_model ({}) must match",
                self.encoder.d_model, self.decoder.d_model
            )));
        }

        Ok(Transformer {
            encoder: self.encoder.init(device)?,
            decoder: self.decoder.init(device)?,
        })
    }
}

#[derive(Module, Debug)]
pub struct Transformer<B: Backend> {
    pub encoder: Encoder<B>,
    pub decoder: Decoder<B>,
}

impl<B: Backend> Transformer<B> {
    /// enc_ids: [batch, enc_len], dec_ids: [batch, dec_len]
    /// → logits [batch, dec_len, dec_vocab_size]
    pub fn forward(
        &self,
        enc_ids:  Tensor<B, 2, Int>,
        dec_ids:  Tensor<B, 2, Int>,
        enc_mask: Option<Tensor<B, 2, Int>>,
        dec_mask: Option<Tensor<B, 2, Int>>,
        mode:     Mode,
    ) -> ModelResult<Tensor<B, 3>> {
        let enc_output = self.encode(enc_ids, enc_mask.clone(), mode)?;
        self.decode(enc_output, dec_ids, enc_mask, dec_mask, mode)
    }

    pub fn encode(
        &self,
        enc_ids:  Tensor<B, 2, Int>,
        enc_mask: Option<Tensor<B, 2, Int>>,
        mode:     Mode,
    ) -> ModelResult<Tensor<B, 3>> {
        self.encoder.forward(enc_ids, enc_mask, mode)
    }

    pub fn decode(
        &self,
        enc_output: Tensor<B, 3>,
        dec_ids:    Tensor<B, 2, Int>,
        enc_mask:   Option<Tensor<B, 2, Int>>,
        dec_mask:   Option<Tensor<B, 2, Int>>,
        mode:       Mode,
    ) -> ModelResult<Tensor<B, 3>> {
        self.decoder.forward(enc_output, dec_ids, enc_mask, dec_mask, mode)
    }
}
