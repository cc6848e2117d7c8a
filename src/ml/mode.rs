// ============================================================
// Layer 5 - Train / Eval Mode
// ============================================================
// Every sublayer that carries stochastic regularisation takes
// an explicit Mode argument instead of reading a hidden global
// flag. Callers choose the mode once per loop and it is passed
// down through Transformer → Encoder/Decoder → blocks.
//
//   Mode::Train: dropout active (on an autodiff backend)
//   Mode::Eval:  dropout skipped, output is deterministic

use burn::{nn::Dropout, prelude::*};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Eval,
}

impl Mode {
    pub fn is_train(self) -> bool {
        matches!(self, Mode::Train)
    }
}

/// Apply `dropout` only in training mode.
///
/// Burn's Dropout already becomes a no-op on a backend without
/// autodiff, so in Mode::Train on a plain inference backend
/// this is still the identity.
pub fn apply_dropout<B: Backend, const D: usize>(
    dropout: &Dropout,
    x:       Tensor<B, D>,
    mode:    Mode,
) -> Tensor<B, D> {
    if mode.is_train() {
        dropout.forward(x)
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::nn::DropoutConfig;

    type TestBackend = Autodiff<NdArray>;

    #[test]
    fn test_eval_mode_skips_dropout() {
        let device  = Default::default();
        let dropout = DropoutConfig::new(0.9).init();
        let x = Tensor::<TestBackend, 2>::ones([4, 16], &device);

        let y = apply_dropout(&dropout, x.clone(), Mode::Eval);
        let x: Vec<f32> = x.into_data().to_vec().unwrap();
        let y: Vec<f32> = y.into_data().to_vec().unwrap();
        assert_eq!(x, y);
    }

    #[test]
    fn test_train_mode_drops_on_autodiff_backend() {
        let device  = Default::default();
        let dropout = DropoutConfig::new(0.9).init();
        let x = Tensor::<TestBackend, 2>::ones([8, 64], &device);

        let y: Vec<f32> = apply_dropout(&dropout, x, Mode::Train)
            .into_data().to_vec().unwrap();
        // With p = 0.9 over 512 elements, some must be zeroed
        assert!(y.iter().any(|&v| v == 0.0));
    }
}
