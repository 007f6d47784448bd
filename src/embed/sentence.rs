//! Sentence-transformers embeddings with candle.
//!
//! Loads a BERT checkpoint from the Hugging Face Hub and produces mean-pooled,
//! L2-normalized sentence vectors. Only built with the `sentence` feature.

use super::Embedder;
use crate::error::{FaqError, Result};
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use hf_hub::{Repo, RepoType, api::sync::Api};
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::info;

/// Sentence-transformers model with mean pooling and L2 normalization.
pub struct SentenceEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    model_id: String,
    dimension: usize,
}

#[derive(Deserialize)]
struct HiddenSize {
    hidden_size: usize,
}

fn embedding_error(context: &str) -> impl Fn(candle_core::Error) -> FaqError + '_ {
    move |e| FaqError::Embedding(format!("{}: {}", context, e))
}

impl SentenceEmbedder {
    /// Download (or reuse cached) weights from the Hugging Face Hub and load them.
    pub fn load(model_id: &str) -> Result<Self> {
        let device = Device::Cpu;

        let api = Api::new()
            .map_err(|e| FaqError::Embedding(format!("Failed to create HF Hub API: {}", e)))?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let fetch = |name: &str| {
            repo.get(name)
                .map_err(|e| FaqError::Embedding(format!("Failed to get {}: {}", name, e)))
        };
        let config_path = fetch("config.json")?;
        let tokenizer_path = fetch("tokenizer.json")?;
        let weights_path = fetch("model.safetensors")?;

        let raw_config =
            std::fs::read_to_string(&config_path).map_err(|e| FaqError::io(&config_path, e))?;
        let config: BertConfig = serde_json::from_str(&raw_config)?;
        let HiddenSize { hidden_size } = serde_json::from_str(&raw_config)?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| FaqError::Embedding(format!("Failed to load tokenizer: {}", e)))?;

        // SAFETY: the weights file is owned by the hub cache and not modified while mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)
                .map_err(embedding_error("Failed to load model weights"))?
        };
        let model = BertModel::load(vb, &config).map_err(embedding_error("Failed to load BERT"))?;

        info!(model = model_id, dimension = hidden_size, "loaded sentence embedder");

        Ok(Self {
            model,
            tokenizer,
            device,
            model_id: model_id.to_string(),
            dimension: hidden_size,
        })
    }

    fn forward(&self, texts: &[&str]) -> candle_core::Result<Vec<Vec<f32>>> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| candle_core::Error::Msg(format!("Tokenization failed: {}", e)))?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut input_ids = Vec::with_capacity(texts.len() * max_len);
        let mut attention_mask = Vec::with_capacity(texts.len() * max_len);
        for encoding in &encodings {
            let mut ids = encoding.get_ids().to_vec();
            let mut mask = encoding.get_attention_mask().to_vec();
            ids.resize(max_len, 0);
            mask.resize(max_len, 0);
            input_ids.extend(ids);
            attention_mask.extend(mask);
        }

        let shape = (texts.len(), max_len);
        let input_ids = Tensor::from_vec(input_ids, shape, &self.device)?;
        let attention_mask = Tensor::from_vec(attention_mask, shape, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;

        let output = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // mean pooling over non-padding tokens
        let mask = attention_mask
            .unsqueeze(2)?
            .to_dtype(output.dtype())?
            .broadcast_as(output.shape())?;
        let summed = (output * &mask)?.sum(1)?;
        let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;
        let pooled = (summed / counts)?;

        let norms = pooled.sqr()?.sum_keepdim(1)?.sqrt()?;
        let normalized = pooled.broadcast_div(&norms)?;

        normalized.to_vec2::<f32>()
    }
}

impl Embedder for SentenceEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.forward(texts).map_err(embedding_error("Forward pass failed"))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
