// ============================================================
// Layer 5 - Position-wise Feed-Forward Network
// ============================================================
// Applied to every position independently:
//
//   FFN(x) = Dropout(Linear₂(GELU(Linear₁(x))))
//
// Linear₁ expands d_model → 4·d_model, Linear₂ projects back.

use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation,
};

use crate::ml::error::{require_positive, ModelResult};
use crate::ml::mode::{apply_dropout, Mode};

#[derive(Config, Debug)]
pub struct FeedForwardConfig {
    pub d_model: usize,
    #[config(default = 0.1)]
    pub dropout: f64,
}

impl FeedForwardConfig {
    pub fn d_ff(&self) -> usize {
        4 * self.d_model
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ModelResult<FeedForward<B>> {
        require_positive("d_model", self.d_model)?;
        Ok(FeedForward {
            expand:  LinearConfig::new(self.d_model, self.d_ff()).init(device),
            project: LinearConfig::new(self.d_ff(), self.d_model).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        })
    }
}

#[derive(Module, Debug)]
pub struct FeedForward<B: Backend> {
    pub expand:  Linear<B>,
    pub project: Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> FeedForward<B> {
    pub fn forward(&self, x: Tensor<B, 3>, mode: Mode) -> Tensor<B, 3> {
        let hidden = activation::gelu(self.expand.forward(x));
        apply_dropout(&self.dropout, self.project.forward(hidden), mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_hidden_width_is_four_times_d_model() {
        let device = Default::default();
        let ffn = FeedForwardConfig::new(8).init::<NdArray>(&device).unwrap();
        assert_eq!(ffn.expand.weight.val().dims(), [8, 32]);
        assert_eq!(ffn.project.weight.val().dims(), [32, 8]);

        let out = ffn.forward(Tensor::ones([2, 3, 8], &device), Mode::Eval);
        assert_eq!(out.dims(), [2, 3, 8]);
    }
}
