// ============================================================
// Layer 5 - Sinusoidal Positional Encoding
// ============================================================
// Attention is permutation-invariant, so position has to be
// injected explicitly. Unlike a learned position embedding,
// this table is fixed: it is computed once at construction,
// holds no trainable parameters, and is never mutated.
//
//   PE(p, 2i)   = sin(p / 10000^(2i / d_model))
//   PE(p, 2i+1) = cos(p / 10000^(2i / d_model))
//
// At call time only the first `len` rows are added, followed
// by dropout (training mode only).
//
// Reference: Vaswani et al. (2017) §3.5

use burn::{
    nn::{Dropout, DropoutConfig},
    prelude::*,
    tensor::TensorData,
};

use crate::ml::error::{require_dim, require_positive, ModelError, ModelResult};
use crate::ml::mode::{apply_dropout, Mode};

#[derive(Config, Debug)]
pub struct PositionalEncodingConfig {
    pub d_model: usize,
    #[config(default = 2048)]
    pub max_len: usize,
    #[config(default = 0.1)]
    pub dropout: f64,
}

impl PositionalEncodingConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ModelResult<PositionalEncoding<B>> {
        require_positive("d_model", self.d_model)?;
        require_positive("max_len", self.max_len)?;

        let values = sinusoid_table(self.max_len, self.d_model);
        let table  = Tensor::from_data(TensorData::new(values, [self.max_len, self.d_model]), device);

        Ok(PositionalEncoding {
            table,
            dropout: DropoutConfig::new(self.dropout).init(),
            d_model: self.d_model,
            max_len: self.max_len,
        })
    }
}

/// Row-major [max_len, d_model] sinusoid table.
/// Works for odd d_model too: the last column is a sine.
pub fn sinusoid_table(max_len: usize, d_model: usize) -> Vec<f32> {
    let mut table  = vec![0.0f32; max_len * d_model];
    let log_base   = -(10_000f64.ln()) / d_model as f64;

    for pos in 0..max_len {
        let row = &mut table[pos * d_model..(pos + 1) * d_model];
        for i in (0..d_model).step_by(2) {
            let angle = pos as f64 * (i as f64 * log_base).exp();
            row[i] = angle.sin() as f32;
            if i + 1 < d_model {
                row[i + 1] = angle.cos() as f32;
            }
        }
    }
    table
}

#[derive(Module, Debug)]
pub struct PositionalEncoding<B: Backend> {
    /// [max_len, d_model], constant
    table:   Tensor<B, 2>,
    dropout: Dropout,
    d_model: usize,
    max_len: usize,
}

impl<B: Backend> PositionalEncoding<B> {
    /// x: [batch, len, d_model] → same shape with position signal added
    pub fn forward(&self, x: Tensor<B, 3>, mode: Mode) -> ModelResult<Tensor<B, 3>> {
        let [batch, len, d_model] = x.dims();
        require_dim("embedding d_model", self.d_model, d_model)?;
        if len > self.max_len {
            return Err(ModelError::SequenceTooLong { len, max_len: self.max_len });
        }

        let signal = self
            .table
            .clone()
            .slice([0..len, 0..d_model])
            .unsqueeze::<3>()
            .expand([batch, len, d_model]);

        Ok(apply_dropout(&self.dropout, x + signal, mode))
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}
