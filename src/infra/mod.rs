// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
//   checkpoint.rs      - Transformer weights (CompactRecorder)
//                        plus TrainConfig as JSON
//   tokenizer_store.rs - word-level tokenizer build/save/load
//                        and the reserved special token ids
//   metrics.rs         - per-epoch loss history as CSV

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer training, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;
