// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Three subcommands: `train`, `translate` and `shape-check`.
// Defaults mirror TrainConfig::default() and
// ShapeCheckConfig::default().

use clap::{Args, Subcommand};
use crate::application::{
    shape_check_use_case::ShapeCheckConfig,
    train_use_case::TrainConfig,
};
use crate::infra::tokenizer_store;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the translation model on a tab-separated corpus
    Train(TrainArgs),

    /// Translate one sentence with a trained checkpoint
    Translate(TranslateArgs),

    /// Run one random batch through a fresh model and print the output shape
    ShapeCheck(ShapeCheckArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Tab-separated file: source<TAB>target per line
    #[arg(long, default_value = "data/spa.txt")]
    pub corpus: String,

    /// Directory for checkpoints, tokenizer, config and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Read at most this many pairs from the corpus
    #[arg(long, default_value_t = 30_000)]
    pub max_pairs: usize,

    /// Share of pairs used for training, the rest is validation
    #[arg(long, default_value_t = 0.7)]
    pub train_fraction: f64,

    #[arg(long, default_value_t = 42)]
    pub split_seed: u64,

    /// Source sentences are truncated to this many tokens (incl. </s>)
    #[arg(long, default_value_t = 128)]
    pub max_input_len: usize,

    /// Target sentences are truncated to this many tokens (incl. </s>)
    #[arg(long, default_value_t = 128)]
    pub max_target_len: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 15)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// AdamW decoupled weight decay
    #[arg(long, default_value_t = 1e-2)]
    pub weight_decay: f32,

    /// Width of the residual stream
    #[arg(long, default_value_t = 64)]
    pub d_model: usize,

    /// Per-head width
    #[arg(long, default_value_t = 16)]
    pub d_k: usize,

    #[arg(long, default_value_t = 4)]
    pub n_heads: usize,

    /// Blocks in each of the encoder and decoder stacks
    #[arg(long, default_value_t = 4)]
    pub n_layers: usize,

    /// Longest sequence the model accepts
    #[arg(long, default_value_t = 512)]
    pub max_len: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Maximum tokenizer vocabulary size
    #[arg(long, default_value_t = 20_000)]
    pub vocab_size: usize,

    /// Label value excluded from the loss
    #[arg(long, default_value_t = -100, allow_hyphen_values = true)]
    pub ignore_index: i64,

    /// Train on the CPU (NdArray) instead of the GPU (WGPU)
    #[arg(long)]
    pub cpu: bool,
}

/// Layer 1 → Layer 2 boundary; the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            corpus_path:    a.corpus,
            checkpoint_dir: a.checkpoint_dir,
            max_pairs:      a.max_pairs,
            train_fraction: a.train_fraction,
            split_seed:     a.split_seed,
            max_input_len:  a.max_input_len,
            max_target_len: a.max_target_len,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            weight_decay:   a.weight_decay,
            d_model:        a.d_model,
            d_k:            a.d_k,
            n_heads:        a.n_heads,
            n_layers:       a.n_layers,
            max_len:        a.max_len,
            dropout:        a.dropout,
            vocab_size:     a.vocab_size,
            tokens:         tokenizer_store::special_tokens().with_ignore_index(a.ignore_index),
            cpu:            a.cpu,
        }
    }
}

#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// Source-language sentence
    #[arg(long)]
    pub sentence: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Stop after this many generated tokens if </s> never appears
    #[arg(long, default_value_t = 64)]
    pub max_new_tokens: usize,
}

#[derive(Args, Debug)]
pub struct ShapeCheckArgs {
    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 512)]
    pub enc_len: usize,

    /// Unpadded prefix length of every encoder row
    #[arg(long, default_value_t = 256)]
    pub enc_valid: usize,

    #[arg(long, default_value_t = 256)]
    pub dec_len: usize,

    /// Unpadded prefix length of every decoder row
    #[arg(long, default_value_t = 128)]
    pub dec_valid: usize,

    #[arg(long, default_value_t = 20_000)]
    pub enc_vocab_size: usize,

    #[arg(long, default_value_t = 10_000)]
    pub dec_vocab_size: usize,
}

impl From<ShapeCheckArgs> for ShapeCheckConfig {
    fn from(a: ShapeCheckArgs) -> Self {
        ShapeCheckConfig {
            batch_size:     a.batch_size,
            enc_len:        a.enc_len,
            enc_valid:      a.enc_valid,
            dec_len:        a.dec_len,
            dec_valid:      a.dec_valid,
            enc_vocab_size: a.enc_vocab_size,
            dec_vocab_size: a.dec_vocab_size,
            ..ShapeCheckConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cli::Cli;
    use super::*;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["seq2seq-translate", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        let def = TrainConfig::default();

        assert_eq!(cfg.d_model, def.d_model);
        assert_eq!(cfg.n_layers, def.n_layers);
        assert_eq!(cfg.batch_size, def.batch_size);
        assert_eq!(cfg.tokens, def.tokens);
        assert!(!cfg.cpu);
    }

    #[test]
    fn test_negative_ignore_index_parses() {
        let cli = Cli::try_parse_from(["seq2seq-translate", "train", "--ignore-index", "-1", "--cpu"])
            .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.tokens.ignore_index, -1);
        assert!(cfg.cpu);
    }

    #[test]
    fn test_d_model_independent_of_head_width() {
        let cli = Cli::try_parse_from(["seq2seq-translate", "train", "--d-model", "48"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.d_model, 48);
        assert_ne!(cfg.d_model, cfg.n_heads * cfg.d_k);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_translate_requires_sentence() {
        assert!(Cli::try_parse_from(["seq2seq-translate", "translate"]).is_err());
    }

    #[test]
    fn test_shape_check_overrides() {
        let cli = Cli::try_parse_from(["seq2seq-translate", "shape-check", "--batch-size", "2"]).unwrap();
        let Commands::ShapeCheck(args) = cli.command else { panic!("expected shape-check") };
        let cfg: ShapeCheckConfig = args.into();
        assert_eq!(cfg.batch_size, 2);
        assert_eq!(cfg.enc_len, 512);
    }
}
