// ============================================================
// Layer 5 - Model Errors
// ============================================================
// Every constructor and forward pass in the model core returns
// Result<_, ModelError>. Configuration problems are caught when
// a *Config::init() runs; shape problems are caught on the first
// forward call that sees them. Nothing is silently truncated.
//
// The application layer works with anyhow::Result, and
// ModelError converts into anyhow::Error through `?`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    /// A hyper-parameter combination that can never produce a valid model
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An input whose size along some axis disagrees with the configuration
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what:     &'static str,
        expected: usize,
        actual:   usize,
    },

    #[error("sequence length {len} exceeds max_len {max_len}")]
    SequenceTooLong { len: usize, max_len: usize },

    #[error("{0} must contain at least one position")]
    EmptySequence(&'static str),

    /// Padding masks must be [batch, key_len]
    #[error("padding mask shape {actual:?} does not match [batch, key_len] = {expected:?}")]
    MaskShape {
        expected: [usize; 2],
        actual:   [usize; 2],
    },
}

pub type ModelResult<T> = Result<T, ModelError>;

/// Fail with `InvalidConfig` when `value` is zero.
pub(crate) fn require_positive(name: &str, value: usize) -> ModelResult<()> {
    if value == 0 {
        return Err(ModelError::InvalidConfig(format!("{name} must be positive")));
    }
    Ok(())
}

/// Fail with `DimensionMismatch` when `actual != expected`.
pub(crate) fn require_dim(what: &'static str, expected: usize, actual: usize) -> ModelResult<()> {
    if expected != actual {
        return Err(ModelError::DimensionMismatch { what, expected, actual });
    }
    Ok(())
}
