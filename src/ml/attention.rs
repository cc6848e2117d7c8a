// ============================================================
// Layer 5 - Multi-Head Scaled Dot-Product Attention
// ============================================================
// Built directly from Burn tensor primitives rather than
// burn::nn::attention so every masking step is explicit.
//
// Shapes (B = batch, H = heads, Tq/Tk = query/key length):
//
//   query/key/value sources      [B, T, d_model]
//        │  Linear (independent per source)
//        ▼
//   projected                    [B, T, H * d_k]
//        │  reshape + swap_dims(1, 2)
//        ▼
//   per-head Q, K, V             [B, H, T, d_k]
//        │  Q · Kᵀ / √d_k
//        ▼
//   scores                       [B, H, Tq, Tk]
//        │  padding mask (key axis), causal mask, softmax
//        ▼
//   weights · V                  [B, H, Tq, d_k]
//        │  swap_dims + reshape, output Linear
//        ▼
//   context                      [B, Tq, d_model]
//
// A query row whose every key is masked yields NaN weights;
// nothing here replaces them.
//
// Reference: Vaswani et al. (2017) Attention Is All You Need §3.2

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::{activation, TensorData},
};

use crate::ml::error::{require_dim, require_positive, ModelError, ModelResult};

#[derive(Config, Debug)]
pub struct MultiHeadAttentionConfig {
    /// Width of the residual stream entering and leaving the layer
    pub d_model: usize,
    /// Per-head query/key/value width
    pub d_k: usize,
    pub n_heads: usize,
    /// Upper bound on sequence length; sizes the causal mask
    pub max_len: usize,
    /// Restrict each query position to keys at or before it
    #[config(default = false)]
    pub causal: bool,
}

impl MultiHeadAttentionConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ModelResult<MultiHeadAttention<B>> {
        require_positive("d_model", self.d_model)?;
        require_positive("d_k", self.d_k)?;
        require_positive("n_heads", self.n_heads)?;
        require_positive("max_len", self.max_len)?;

        let width = self.n_heads * self.d_k;
        let causal_mask = self
            .causal
            .then(|| causal_mask_table::<B>(self.max_len, device));

        Ok(MultiHeadAttention {
            query:   LinearConfig::new(self.d_model, width).init(device),
            key:     LinearConfig::new(self.d_model, width).init(device),
            value:   LinearConfig::new(self.d_model, width).init(device),
            output:  LinearConfig::new(width, self.d_model).init(device),
            causal_mask,
            d_model: self.d_model,
            d_k:     self.d_k,
            n_heads: self.n_heads,
            max_len: self.max_len,
        })
    }
}

/// Lower-triangular [max_len, max_len] table of ones, computed once.
/// Entry (i, j) is 1.0 when query i may see key j (j <= i).
fn causal_mask_table<B: Backend>(max_len: usize, device: &B::Device) -> Tensor<B, 2> {
    let mut values = vec![0.0f32; max_len * max_len];
    for i in 0..max_len {
        for j in 0..=i {
            values[i * max_len + j] = 1.0;
        }
    }
    Tensor::from_data(TensorData::new(values, [max_len, max_len]), device)
}

#[derive(Module, Debug)]
pub struct MultiHeadAttention<B: Backend> {
    pub query:  Linear<B>,
    pub key:    Linear<B>,
    pub value:  Linear<B>,
    pub output: Linear<B>,
    /// Present only in causal mode; read-only after construction
    causal_mask: Option<Tensor<B, 2>>,
    d_model: usize,
    d_k:     usize,
    n_heads: usize,
    max_len: usize,
}

/// Inputs to one attention call.
///
/// `pad_mask` is [batch, key_len] with 1 = real token, 0 = padding.
/// It only ever hides key positions.
#[derive(Debug, Clone)]
pub struct AttentionInput<B: Backend> {
    pub query:    Tensor<B, 3>,
    pub key:      Tensor<B, 3>,
    pub value:    Tensor<B, 3>,
    pub pad_mask: Option<Tensor<B, 2, Int>>,
}

impl<B: Backend> AttentionInput<B> {
    /// Self-attention: the same sequence is query, key and value.
    pub fn self_attn(x: Tensor<B, 3>) -> Self {
        Self { query: x.clone(), key: x.clone(), value: x, pad_mask: None }
    }

    /// Cross-attention: queries from one sequence, keys/values from `memory`.
    pub fn cross(query: Tensor<B, 3>, memory: Tensor<B, 3>) -> Self {
        Self { query, key: memory.clone(), value: memory, pad_mask: None }
    }

    pub fn pad_mask(mut self, mask: Option<Tensor<B, 2, Int>>) -> Self {
        self.pad_mask = mask;
        self
    }
}

#[derive(Debug, Clone)]
pub struct AttentionOutput<B: Backend> {
    /// [batch, query_len, d_model]
    pub context: Tensor<B, 3>,
    /// [batch, n_heads, query_len, key_len], rows sum to 1
    pub weights: Tensor<B, 4>,
}

impl<B: Backend> MultiHeadAttention<B> {
    pub fn is_causal(&self) -> bool {
        self.causal_mask.is_some()
    }

    pub fn forward(&self, input: AttentionInput<B>) -> ModelResult<AttentionOutput<B>> {
        let AttentionInput { query, key, value, pad_mask } = input;
        let [batch, q_len, q_dim] = query.dims();
        let [k_batch, k_len, k_dim] = key.dims();
        let [v_batch, v_len, v_dim] = value.dims();

        require_dim("query d_model", self.d_model, q_dim)?;
        require_dim("key d_model", self.d_model, k_dim)?;
        require_dim("value d_model", self.d_model, v_dim)?;
        require_dim("key batch", batch, k_batch)?;
        require_dim("value batch", batch, v_batch)?;
        require_dim("value length", k_len, v_len)?;

        if self.is_causal() {
            for len in [q_len, k_len] {
                if len > self.max_len {
                    return Err(ModelError::SequenceTooLong { len, max_len: self.max_len });
                }
            }
        }

        let q = self.split_heads(self.query.forward(query), batch, q_len);
        let k = self.split_heads(self.key.forward(key), batch, k_len);
        let v = self.split_heads(self.value.forward(value), batch, k_len);

        let mut scores = q
            .matmul(k.swap_dims(2, 3))
            .div_scalar((self.d_k as f64).sqrt()); // [B, H, Tq, Tk]

        if let Some(mask) = pad_mask {
            let dims = mask.dims();
            if dims != [batch, k_len] {
                return Err(ModelError::MaskShape { expected: [batch, k_len], actual: dims });
            }
            let hidden = mask
                .equal_elem(0)
                .reshape([batch, 1, 1, k_len])
                .expand([batch, self.n_heads, q_len, k_len]);
            scores = scores.mask_fill(hidden, f32::NEG_INFINITY);
        }

        if let Some(causal) = &self.causal_mask {
            let future = causal
                .clone()
                .slice([0..q_len, 0..k_len])
                .equal_elem(0.0)
                .reshape([1, 1, q_len, k_len])
                .expand([batch, self.n_heads, q_len, k_len]);
            scores = scores.mask_fill(future, f32::NEG_INFINITY);
        }

        let weights = activation::softmax(scores, 3);

        let context = weights
            .clone()
            .matmul(v)                 // [B, H, Tq, d_k]
            .swap_dims(1, 2)           // [B, Tq, H, d_k]
            .reshape([batch, q_len, self.n_heads * self.d_k]);

        Ok(AttentionOutput { context: self.output.forward(context), weights })
    }

    /// [B, T, H * d_k] → [B, H, T, d_k]
    fn split_heads(&self, x: Tensor<B, 3>, batch: usize, len: usize) -> Tensor<B, 4> {
        x.reshape([batch, len, self.n_heads, self.d_k]).swap_dims(1, 2)
    }
}
