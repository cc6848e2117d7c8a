// ============================================================
// Layer 2 - Shape Check Use Case
// ============================================================
// Builds a freshly initialised model and pushes one batch of
// random token ids through it with prefix padding masks, then
// reports the logits shape. A quick end-to-end sanity check
// that needs no corpus, tokenizer or checkpoint.
//
// Defaults reproduce the reference smoke test:
//   encoder ids (8, 512) in [0, 20000), mask zero from 256
//   decoder ids (8, 256) in [0, 10000), mask zero from 128
//   → logits (8, 256, 10000)

use anyhow::Result;
use burn::{prelude::*, tensor::TensorData};
use rand::Rng;

use crate::ml::{mode::Mode, transformer::TransformerConfig};

type CheckBackend = burn::backend::NdArray;

#[derive(Debug, Clone)]
pub struct ShapeCheckConfig {
    pub batch_size:     usize,
    pub enc_len:        usize,
    pub enc_valid:      usize,
    pub dec_len:        usize,
    pub dec_valid:      usize,
    pub enc_vocab_size: usize,
    pub dec_vocab_size: usize,
    pub d_model:        usize,
    pub d_k:            usize,
    pub n_heads:        usize,
    pub n_layers:       usize,
    pub max_len:        usize,
    pub dropout:        f64,
}

impl Default for ShapeCheckConfig {
    fn default() -> Self {
        Self {
            batch_size:     8,
            enc_len:        512,
            enc_valid:      256,
            dec_len:        256,
            dec_valid:      128,
            enc_vocab_size: 20_000,
            dec_vocab_size: 10_000,
            d_model:        64,
            d_k:            16,
            n_heads:        4,
            n_layers:       4,
            max_len:        512,
            dropout:        0.1,
        }
    }
}

pub struct ShapeCheckUseCase {
    config: ShapeCheckConfig,
}

impl ShapeCheckUseCase {
    pub fn new(config: ShapeCheckConfig) -> Self {
        Self { config }
    }

    /// Returns the [batch, dec_len, dec_vocab_size] logits shape.
    pub fn execute(&self) -> Result<[usize; 3]> {
        let cfg    = &self.config;
        let device = Default::default();

        let model = TransformerConfig::symmetric(
            cfg.d_model,
            cfg.d_k,
            cfg.n_heads,
            cfg.max_len,
            cfg.enc_vocab_size,
            cfg.dec_vocab_size,
            cfg.n_layers,
            cfg.dropout,
        )
        .init::<CheckBackend>(&device)?;

        let enc_ids  = random_ids(cfg.batch_size, cfg.enc_len, cfg.enc_vocab_size, &device);
        let dec_ids  = random_ids(cfg.batch_size, cfg.dec_len, cfg.dec_vocab_size, &device);
        let enc_mask = prefix_mask(cfg.batch_size, cfg.enc_len, cfg.enc_valid, &device);
        let dec_mask = prefix_mask(cfg.batch_size, cfg.dec_len, cfg.dec_valid, &device);

        let logits = model.forward(enc_ids, dec_ids, Some(enc_mask), Some(dec_mask), Mode::Eval)?;
        let dims = logits.dims();
        tracing::info!("Transformer output shape: {:?}", dims);
        Ok(dims)
    }
}

fn random_ids<B: Backend>(batch: usize, len: usize, vocab: usize, device: &B::Device) -> Tensor<B, 2, Int> {
    let mut rng = rand::thread_rng();
    let values: Vec<i64> = (0..batch * len)
        .map(|_| rng.gen_range(0..vocab as i64))
        .collect();
    Tensor::from_data(TensorData::new(values, [batch, len]), device)
}

/// 1 for the first `valid` positions of every row, 0 after.
fn prefix_mask<B: Backend>(batch: usize, len: usize, valid: usize, device: &B::Device) -> Tensor<B, 2, Int> {
    let values: Vec<i64> = (0..batch * len)
        .map(|i| i64::from(i % len < valid))
        .collect();
    Tensor::from_data(TensorData::new(values, [batch, len]), device)
}
