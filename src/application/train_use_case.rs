// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load sentence pairs       (Layer 4 - data)
//   Step 2: Build / load tokenizer    (Layer 6 - infra)
//   Step 3: Encode samples            (Layer 6 - infra)
//   Step 4: Seeded train/val split    (Layer 4 - data)
//   Step 5: Save config               (Layer 6 - infra)
//   Step 6: Run training loop         (Layer 5 - ml)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use crate::data::{
    dataset::{Seq2SeqDataset, Seq2SeqSample},
    loader::TsvCorpusLoader,
    splitter::split_train_val,
};
use crate::domain::{sentence_pair::SentencePair, special_tokens::SpecialTokens, traits::CorpusSource};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    tokenizer_store::{self, encode_sentence, TokenizerStore},
};
use crate::ml::{trainer::{run_training, LossHistory}, transformer::TransformerConfig};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Saved next to the
// checkpoints so the translate command can rebuild the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub corpus_path:    String,
    pub checkpoint_dir: String,
    pub max_pairs:      usize,
    pub train_fraction: f64,
    pub split_seed:     u64,
    pub max_input_len:  usize,
    pub max_target_len: usize,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub weight_decay:   f32,
    pub d_model:        usize,
    pub d_k:            usize,
    pub n_heads:        usize,
    pub n_layers:       usize,
    pub max_len:        usize,
    pub dropout:        f64,
    /// Upper bound while building the tokenizer; replaced by the
    /// real vocabulary size once it exists
    pub vocab_size:     usize,
    pub tokens:         SpecialTokens,
    /// Train on the NdArray CPU backend instead of WGPU
    pub cpu:            bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            corpus_path:    "data/spa.txt".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            max_pairs:      30_000,
            train_fraction: 0.7,
            split_seed:     42,
            max_input_len:  128,
            max_target_len: 128,
            batch_size:     32,
            epochs:         15,
            lr:             1e-3,
            weight_decay:   1e-2,
            d_model:        64,
            d_k:            16,
            n_heads:        4,
            n_layers:       4,
            max_len:        512,
            dropout:        0.1,
            vocab_size:     20_000,
            tokens:         tokenizer_store::special_tokens(),
            cpu:            false,
        }
    }
}

impl TrainConfig {
    /// Source and target share one tokenizer, so both sides use
    /// the same vocabulary size.
    pub fn model_config(&self) -> TransformerConfig {
        TransformerConfig::symmetric(
            self.d_model,
            self.d_k,
            self.n_heads,
            self.max_len,
            self.vocab_size,
            self.vocab_size,
            self.n_layers,
            self.dropout,
        )
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.batch_size > 0, "batch_size must be positive");
        ensure!(
            self.train_fraction > 0.0 && self.train_fraction <= 1.0,
            "train_fraction must be in (0, 1], got {}",
            self.train_fraction
        );
        ensure!(
            self.max_input_len <= self.max_len && self.max_target_len <= self.max_len,
            "max_input_len ({}) and max_target_len ({}) must not exceed max_len ({})",
            self.max_input_len,
            self.max_target_len,
            self.max_len
        );
        ensure!(
            self.max_input_len > 0 && self.max_target_len > 0,
            "max_input_len and max_target_len must be positive"
        );
        self.tokens
            .validate(self.vocab_size)
            .map_err(anyhow::Error::msg)?;
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<LossHistory> {
        let mut cfg = self.config.clone();

        // ── Step 1: Load sentence pairs ───────────────────────────────────────
        tracing::info!("Loading corpus from '{}'", cfg.corpus_path);
        let pairs = TsvCorpusLoader::new(&cfg.corpus_path)
            .with_max_pairs(cfg.max_pairs)
            .load_pairs()?;
        ensure!(!pairs.is_empty(), "corpus '{}' contains no sentence pairs", cfg.corpus_path);
        tracing::info!("Loaded {} sentence pairs", pairs.len());

        // ── Step 2: Build / load tokenizer ────────────────────────────────────
        let texts: Vec<String> = pairs
            .iter()
            .flat_map(|p| [p.source.clone(), p.target.clone()])
            .collect();
        let tok_store = TokenizerStore::new(&cfg.checkpoint_dir);
        let tokenizer = tok_store.load_or_build(&texts, cfg.vocab_size)?;
        cfg.vocab_size = tokenizer.get_vocab_size(false);
        cfg.validate()?;

        // ── Step 3: Encode samples ────────────────────────────────────────────
        let samples = build_samples(&pairs, &tokenizer, &cfg)?;

        // ── Step 4: Train / validation split ──────────────────────────────────
        let (train_samples, val_samples) = split_train_val(samples, cfg.train_fraction, cfg.split_seed);
        tracing::info!("Split: {} train, {} validation", train_samples.len(), val_samples.len());

        // ── Step 5: Save config for inference ─────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(&cfg)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;

        // ── Step 6: Run training loop (Layer 5) ───────────────────────────────
        run_training(
            &cfg,
            Seq2SeqDataset::new(train_samples),
            Seq2SeqDataset::new(val_samples),
            &ckpt_manager,
            &metrics,
        )
    }
}

/// Tokenise every pair into (input_ids, labels), each ending in `</s>`
/// and truncated to the configured maximum lengths.
pub fn build_samples(
    pairs:     &[SentencePair],
    tokenizer: &Tokenizer,
    cfg:       &TrainConfig,
) -> Result<Vec<Seq2SeqSample>> {
    pairs
        .iter()
        .map(|pair| {
            let input_ids = encode_sentence(tokenizer, &pair.source, cfg.max_input_len)?;
            let labels = encode_sentence(tokenizer, &pair.target, cfg.max_target_len)?
                .into_iter()
                .map(i64::from)
                .collect();
            Ok(Seq2SeqSample::new(input_ids, labels))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid_for_large_vocab() {
        let cfg = TrainConfig::default();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_rejects_input_longer_than_max_len() {
        let cfg = TrainConfig { max_input_len: 600, ..TrainConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_start_token_outside_vocab() {
        let cfg = TrainConfig { vocab_size: 3, ..TrainConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_build_samples_appends_eos() {
        let dir = tempfile::tempdir().unwrap();
        let tok = TokenizerStore::new(dir.path())
            .load_or_build(&["go now".to_string(), "ve ahora".to_string()], 50)
            .unwrap();
        let cfg = TrainConfig { max_target_len: 2, ..TrainConfig::default() };

        let samples = build_samples(&[SentencePair::new("go now", "ve ahora")], &tok, &cfg).unwrap();
        assert_eq!(samples[0].input_ids.len(), 3);
        assert_eq!(samples[0].labels.len(), 2);
        assert_eq!(samples[0].labels[1], tokenizer_store::EOS_ID as i64);
    }

    #[test]
    fn test_config_json_round_trip_keeps_tokens() {
        let cfg  = TrainConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tokens, cfg.tokens);
        assert_eq!(back.d_model, cfg.d_model);
    }
}
