// ============================================================
// Layer 5 - Teacher-Forced Training Loop
// ============================================================
// Per epoch:
//
//   training phase   (Mode::Train, autodiff backend)
//     for each batch:
//       decoder input = shift_right(labels)
//       logits        = model(enc_ids, dec_ids, enc_mask, dec_mask)
//       loss          = masked cross-entropy vs. unshifted labels
//       backward + AdamW step
//
//   validation phase (Mode::Eval, model.valid() on the inner
//                     backend, no parameter updates)
//
// Batches and epochs run strictly in order. Any error in a
// batch aborts the whole run and is returned to the caller.
//
// Reference: Burn Book §5, Loshchilov & Hutter (2019) AdamW

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::time::Instant;

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{Seq2SeqBatch, Seq2SeqBatcher},
    dataset::Seq2SeqDataset,
};
use crate::domain::special_tokens::SpecialTokens;
use crate::infra::{checkpoint::CheckpointManager, metrics::{EpochMetrics, MetricsLogger}};
use crate::ml::{
    error::ModelResult,
    loss::masked_cross_entropy,
    mode::Mode,
    shift::shift_right,
    transformer::Transformer,
};

type WgpuTrainBackend   = burn::backend::Autodiff<burn::backend::Wgpu>;
type NdArrayTrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;

/// Mean loss per epoch, index 0 = epoch 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LossHistory {
    pub train: Vec<f64>,
    pub valid: Vec<f64>,
}

/// Loss for one batch: shift labels into decoder inputs, run the
/// model, score against the unshifted labels.
pub fn batch_loss<B: Backend>(
    model:  &Transformer<B>,
    batch:  Seq2SeqBatch<B>,
    tokens: &SpecialTokens,
    mode:   Mode,
) -> ModelResult<Tensor<B, 1>> {
    let dec = shift_right(batch.labels.clone(), tokens)?;
    let logits = model.forward(
        batch.input_ids,
        dec.input_ids,
        Some(batch.attention_mask),
        Some(dec.mask),
        mode,
    )?;
    masked_cross_entropy(logits, batch.labels, tokens.ignore_index)
}

/// Pick the backend from the config, train, checkpoint every epoch.
pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: Seq2SeqDataset,
    val_dataset:   Seq2SeqDataset,
    ckpt_manager:  &CheckpointManager,
    metrics:       &MetricsLogger,
) -> Result<LossHistory> {
    let on_epoch = |m: &EpochMetrics| -> Result<()> { metrics.log(m) };

    if cfg.cpu {
        let device = burn::backend::ndarray::NdArrayDevice::default();
        tracing::info!("Using NdArray CPU device");
        let (_, history) = train_loop::<NdArrayTrainBackend>(
            cfg, train_dataset, val_dataset, device,
            |m, model| { ckpt_manager.save_model(model, m.epoch)?; on_epoch(m) },
        )?;
        Ok(history)
    } else {
        let device = burn::backend::wgpu::WgpuDevice::default();
        tracing::info!("Using WGPU device: {:?}", device);
        let (_, history) = train_loop::<WgpuTrainBackend>(
            cfg, train_dataset, val_dataset, device,
            |m, model| { ckpt_manager.save_model(model, m.epoch)?; on_epoch(m) },
        )?;
        Ok(history)
    }
}

/// Build a fresh model and train it for `cfg.epochs` epochs.
///
/// `on_epoch` runs after every epoch with that epoch's metrics and
/// the current model (checkpointing, CSV logging).
pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: Seq2SeqDataset,
    val_dataset:   Seq2SeqDataset,
    device:        B::Device,
    mut on_epoch:  impl FnMut(&EpochMetrics, &Transformer<B>) -> Result<()>,
) -> Result<(Transformer<B>, LossHistory)> {
    let tokens = cfg.tokens;

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: Transformer<B> = cfg.model_config().init(&device)?;
    tracing::info!(
        "Model ready: {} layers, d_model={}, vocab={}",
        cfg.n_layers, cfg.d_model, cfg.vocab_size
    );

    let mut optim = AdamWConfig::new()
        .with_weight_decay(cfg.weight_decay)
        .init();

    // ── Data loaders ──────────────────────────────────────────────────────────
    let train_loader = DataLoaderBuilder::new(Seq2SeqBatcher::<B>::new(device.clone(), tokens))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.split_seed)
        .num_workers(1)
        .build(train_dataset);

    // Validation runs on the inner backend: no autodiff overhead
    let val_loader = DataLoaderBuilder::new(Seq2SeqBatcher::<B::InnerBackend>::new(device.clone(), tokens))
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let mut history  = LossHistory::default();
    let mut best_val = f64::INFINITY;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        let started = Instant::now();

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_losses = Vec::new();
        for batch in train_loader.iter() {
            let loss = batch_loss(&model, batch, &tokens, Mode::Train)?;
            train_losses.push(loss.clone().into_scalar().elem::<f64>());

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(cfg.lr, model, grads);
        }

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();
        let mut val_losses = Vec::new();
        for batch in val_loader.iter() {
            let loss = batch_loss(&model_valid, batch, &tokens, Mode::Eval)?;
            val_losses.push(loss.into_scalar().elem::<f64>());
        }

        let metrics = EpochMetrics::new(epoch, mean(&train_losses), mean(&val_losses));
        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | duration={:.1?}",
            epoch, cfg.epochs, metrics.train_loss, metrics.val_loss, started.elapsed(),
        );

        if metrics.is_improvement(best_val) {
            best_val = metrics.val_loss;
            tracing::info!("New best validation loss {:.4} at epoch {}", best_val, epoch);
        }

        history.train.push(metrics.train_loss);
        history.valid.push(metrics.val_loss);
        on_epoch(&metrics, &model)?;
    }

    tracing::info!("Training complete!");
    Ok((model, history))
}

/// NaN for an empty slice, so an empty split shows up in the log
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        f64::NAN
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::Seq2SeqSample;
    use burn::backend::{Autodiff, NdArray};
    use burn::data::dataloader::batcher::Batcher;

    type TestBackend = Autodiff<NdArray>;

    fn tiny_config() -> TrainConfig {
        TrainConfig {
            batch_size: 2,
            epochs:     5,
            lr:         1e-2,
            d_model:    16,
            d_k:        4,
            n_heads:    2,
            n_layers:   1,
            max_len:    16,
            dropout:    0.0,
            vocab_size: 12,
            ..TrainConfig::default()
        }
    }

    /// Copy task: the target is the source sentence
    fn copy_samples() -> Vec<Seq2SeqSample> {
        [[4, 5, 6], [7, 8, 9], [10, 11, 4], [5, 7, 11]]
            .iter()
            .map(|ids| {
                let mut input: Vec<u32> = ids.to_vec();
                input.push(1);
                let labels = input.iter().map(|&id| id as i64).collect();
                Seq2SeqSample::new(input, labels)
            })
            .collect()
    }

    #[test]
    fn test_batch_loss_is_finite() {
        let device = Default::default();
        let cfg = tiny_config();
        let model: Transformer<NdArray> = cfg.model_config().init(&device).unwrap();

        let batch = Seq2SeqBatcher::<NdArray>::new(device, cfg.tokens).batch(copy_samples());
        let loss: f32 = batch_loss(&model, batch, &cfg.tokens, Mode::Eval)
            .unwrap()
            .into_scalar();
        assert!(loss.is_finite());
        // untrained model should be close to uniform over 12 classes
        assert!(loss > 0.5 && loss < 10.0);
    }

    #[test]
    fn test_batch_loss_finite_when_first_label_ignored() {
        let device = Default::default();
        let cfg = tiny_config();
        let model: Transformer<NdArray> = cfg.model_config().init(&device).unwrap();

        let batch = Seq2SeqBatch {
            input_ids:      Tensor::from_ints([[4, 5, 1], [6, 7, 1]], &device),
            attention_mask: Tensor::ones([2, 3], &device),
            labels:         Tensor::from_ints([[-100, 5, 1], [6, 7, 1]], &device),
        };
        let loss: f32 = batch_loss(&model, batch, &cfg.tokens, Mode::Eval)
            .unwrap()
            .into_scalar();
        assert!(loss.is_finite(), "loss = {loss}");
    }

    #[test]
    fn test_train_loop_records_history_and_learns() {
        let cfg = tiny_config();
        let mut seen_epochs = Vec::new();

        let (_, history) = train_loop::<TestBackend>(
            &cfg,
            Seq2SeqDataset::new(copy_samples()),
            Seq2SeqDataset::new(copy_samples()),
            Default::default(),
            |m, _| {
                seen_epochs.push(m.epoch);
                Ok(())
            },
        )
        .unwrap();

        assert_eq!(seen_epochs, vec![1, 2, 3, 4, 5]);
        assert_eq!(history.train.len(), 5);
        assert_eq!(history.valid.len(), 5);
        assert!(history.train.iter().chain(&history.valid).all(|l| l.is_finite()));
        assert!(history.valid[4] < history.valid[0]);
    }

    #[test]
    fn test_empty_validation_split_gives_nan() {
        let cfg = TrainConfig { epochs: 1, ..tiny_config() };
        let (_, history) = train_loop::<TestBackend>(
            &cfg,
            Seq2SeqDataset::new(copy_samples()),
            Seq2SeqDataset::new(Vec::new()),
            Default::default(),
            |_, _| Ok(()),
        )
        .unwrap();
        assert!(history.valid[0].is_nan());
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
        assert!(mean(&[]).is_nan());
    }
}
