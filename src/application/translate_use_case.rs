// ============================================================
// Layer 2 - Translate Use Case
// ============================================================
// Rebuilds the trained model from its saved config + weights,
// tokenises a source sentence and greedy-decodes a translation.

use anyhow::Result;
use burn::{prelude::*, tensor::TensorData};
use tokenizers::Tokenizer;

use crate::domain::{special_tokens::SpecialTokens, traits::Translator};
use crate::infra::{
    checkpoint::CheckpointManager,
    tokenizer_store::{decode_ids, encode_sentence, TokenizerStore},
};
use crate::ml::{decoding::greedy_decode, transformer::Transformer};

type InferBackend = burn::backend::NdArray;

pub struct TranslateUseCase {
    model:          Transformer<InferBackend>,
    tokenizer:      Tokenizer,
    tokens:         SpecialTokens,
    max_input_len:  usize,
    max_new_tokens: usize,
    device:         burn::backend::ndarray::NdArrayDevice,
}

impl TranslateUseCase {
    pub fn new(checkpoint_dir: &str, max_new_tokens: usize) -> Result<Self> {
        let device    = Default::default();
        let tokenizer = TokenizerStore::new(checkpoint_dir).load()?;
        let ckpt      = CheckpointManager::new(checkpoint_dir);
        let cfg       = ckpt.load_config()?;

        let model: Transformer<InferBackend> = cfg.model_config().init(&device)?;
        let model = ckpt.load_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint");

        Ok(Self {
            model,
            tokenizer,
            tokens: cfg.tokens,
            max_input_len: cfg.max_input_len,
            max_new_tokens,
            device,
        })
    }
}

impl Translator for TranslateUseCase {
    fn translate(&self, sentence: &str) -> Result<String> {
        let ids: Vec<i64> = encode_sentence(&self.tokenizer, sentence, self.max_input_len)?
            .into_iter()
            .map(i64::from)
            .collect();
        let len = ids.len();

        let enc_ids = Tensor::<InferBackend, 2, Int>::from_data(
            TensorData::new(ids, [1, len]),
            &self.device,
        );
        let enc_mask = Tensor::<InferBackend, 2, Int>::ones([1, len], &self.device);

        let generated = greedy_decode(&self.model, enc_ids, Some(enc_mask), &self.tokens, self.max_new_tokens)?;
        tracing::debug!("Generated ids: {:?}", generated);

        decode_ids(&self.tokenizer, &generated)
    }
}
