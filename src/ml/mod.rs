// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// Everything that builds or runs the network lives here.
//
//   error.rs       - ModelError, returned by every fallible op
//   mode.rs        - Train / Eval switch threaded through forward
//   attention.rs   - scaled dot-product multi-head attention
//                    with optional causal mask and key padding
//   positional.rs  - fixed sinusoidal position table
//   feedforward.rs - position-wise GELU MLP (4 x d_model)
//   encoder.rs     - EncoderBlock and the stacked Encoder
//   decoder.rs     - DecoderBlock and the stacked Decoder + head
//   transformer.rs - Encoder + Decoder
//   shift.rs       - labels to teacher-forcing decoder inputs
//   loss.rs        - cross-entropy that skips ignored labels
//   decoding.rs    - greedy autoregressive generation
//   trainer.rs     - AdamW training loop with validation
//
// Reference: Vaswani et al. (2017) Attention Is All You Need
//            Burn Book §3 (Building Blocks), §5 (Training)

pub mod error;
pub mod mode;

pub mod attention;
pub mod positional;
pub mod feedforward;

pub mod encoder;
pub mod decoder;
pub mod transformer;

pub mod shift;
pub mod loss;

/// Greedy decoding for inference
pub mod decoding;

/// Full training loop with validation and checkpointing
pub mod trainer;
