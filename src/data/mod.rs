// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// From a parallel corpus file to padded tensor batches:
//
//   corpus.tsv
//       │
//       ▼
//   TsvCorpusLoader   → SentencePair per line
//       │
//       ▼
//   Preprocessor      → normalised text
//       │
//       ▼
//   Tokenizer         → token ids + </s> (infra::tokenizer_store)
//       │
//       ▼
//   split_train_val   → seeded train / validation split
//       │
//       ▼
//   Seq2SeqDataset    → Burn Dataset
//       │
//       ▼
//   Seq2SeqBatcher    → padded input_ids / attention_mask / labels
//       │
//       ▼
//   DataLoader        → batches for the training loop

/// Reads tab-separated sentence pairs
pub mod loader;

/// Normalises whitespace and control characters
pub mod preprocessor;

/// Burn Dataset over tokenised samples
pub mod dataset;

/// Burn Batcher with dynamic padding
pub mod batcher;

/// Seeded train/validation split
pub mod splitter;
