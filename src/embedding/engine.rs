//! Local sentence encoder - multilingual MiniLM via Candle
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use tokenizers::{Tokenizer, TruncationParams};

use crate::embedding::encoder::TextEncoder;
use crate::errors::SiteError;

pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2";
pub const DEFAULT_DIMENSION: usize = 384;

/// Longest token sequence the model was trained on
const MAX_SEQUENCE_LENGTH: usize = 128;

/// BERT-family sentence encoder with mean pooling
pub struct SentenceEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dimension: usize,
}

impl SentenceEncoder {
    /// Download (or reuse the cached) model from the HuggingFace Hub
    pub fn from_hub(model_id: &str) -> crate::errors::Result<Self> {
        Self::load(model_id).map_err(|e| SiteError::EncodingFailure(format!("{:#}", e)))
    }

    fn load(model_id: &str) -> Result<Self> {
        let device = Device::Cpu;

        let api = Api::new().context("Failed to create HuggingFace API client")?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo.get("config.json")
            .context("Failed to download model config")?;
        let tokenizer_path = repo.get("tokenizer.json")
            .context("Failed to download tokenizer")?;
        let weights_path = repo.get("model.safetensors")
            .context("Failed to download model weights")?;

        let config_contents = std::fs::read_to_string(config_path)
            .context("Failed to read config file")?;
        let raw_config: serde_json::Value = serde_json::from_str(&config_contents)
            .context("Failed to parse model config")?;
        let dimension = raw_config
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .map(|d| d as usize)
            .unwrap_or(DEFAULT_DIMENSION);
        let config: Config = serde_json::from_value(raw_config)
            .context("Failed to parse model config")?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;
        tokenizer.with_padding(None);

        // SAFETY: the safetensors file is owned by the hub cache and not mutated while mapped
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .context("Failed to load model weights")?
        };

        let model = BertModel::load(vb, &config)
            .context("Failed to create BERT model")?;

        Ok(Self {
            model,
            tokenizer,
            device,
            dimension,
        })
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let encodings = self.tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
        let batch_size = encodings.len();

        // Right-pad ids and mask to the longest sequence in the batch
        let mut flat_ids = vec![0u32; batch_size * max_len];
        let mut flat_mask = vec![0u32; batch_size * max_len];
        for (i, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            flat_ids[i * max_len..i * max_len + ids.len()].copy_from_slice(ids);
            flat_mask[i * max_len..i * max_len + mask.len()].copy_from_slice(mask);
        }

        let token_ids = Tensor::from_vec(flat_ids, (batch_size, max_len), &self.device)?;
        let attention_mask = Tensor::from_vec(flat_mask, (batch_size, max_len), &self.device)?;
        let token_type_ids = token_ids.zeros_like()?;

        let hidden = self.model.forward(&token_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = Self::mean_pool(&hidden, &attention_mask)?;

        Ok(pooled.to_vec2::<f32>()?)
    }

    /// Mean pooling with attention mask
    fn mean_pool(embeddings: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let mask_expanded = attention_mask
            .unsqueeze(2)?
            .expand(embeddings.shape())?
            .to_dtype(embeddings.dtype())?;

        let sum_embeddings = (embeddings * &mask_expanded)?.sum(1)?;
        let sum_mask = mask_expanded.sum(1)?.clamp(1e-9, f64::MAX)?;

        Ok(sum_embeddings.broadcast_div(&sum_mask)?)
    }
}

impl TextEncoder for SentenceEncoder {
    fn encode_batch(&self, texts: &[String]) -> crate::errors::Result<Vec<Vec<f32>>> {
        self.embed(texts)
            .map_err(|e| SiteError::EncodingFailure(format!("{:#}", e)))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore]  // Integration test - requires model download
    fn test_embedding_dimension() {
        let encoder = SentenceEncoder::from_hub(DEFAULT_MODEL_ID).expect("Failed to create encoder");
        assert_eq!(encoder.dimension(), DEFAULT_DIMENSION);
    }

    #[test]
    #[ignore]  // Integration test - requires model download
    fn test_encode_batch_including_empty_text() {
        let encoder = SentenceEncoder::from_hub(DEFAULT_MODEL_ID).expect("Failed to create encoder");
        let texts = vec!["Привет".to_string(), String::new(), "Hello world".to_string()];
        let vectors = encoder.encode_batch(&texts).expect("Failed to encode");
        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|v| v.len() == DEFAULT_DIMENSION));
    }

    #[test]
    #[ignore]  // Integration test - requires model download
    fn test_paraphrases_score_higher() {
        let encoder = SentenceEncoder::from_hub(DEFAULT_MODEL_ID).expect("Failed to create encoder");
        let texts = vec![
            "We build chat bots for retailers".to_string(),
            "Our company makes chatbots for retail".to_string(),
            "The weather is cold in winter".to_string(),
        ];
        let vectors: Vec<Vec<f32>> = encoder
            .encode_batch(&texts)
            .unwrap()
            .into_iter()
            .map(|v| crate::embedding::l2_normalize(v).unwrap())
            .collect();
        let dot = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
        assert!(dot(&vectors[0], &vectors[1]) > dot(&vectors[0], &vectors[2]));
    }
}
