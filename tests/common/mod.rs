//! Shared test doubles: a deterministic keyword encoder and a scripted model
#![allow(dead_code)]

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use sitebuddy::corpus::CorpusRecord;
use sitebuddy::embedding::{Embedder, TextEncoder};
use sitebuddy::llm::{ChatMessage, ChatModel, GenerationParams};
use sitebuddy::{Result, SiteError};

pub const VOCABULARY: &[&str] = &["alpha", "beta", "gamma", "services", "products", "clients"];

/// Bag-of-words encoder over a fixed vocabulary plus a small bias dimension
///
/// The bias keeps every vector non-zero; unrelated texts score close to 0.
#[derive(Default)]
pub struct KeywordEncoder {
    pub calls: AtomicUsize,
    pub texts_encoded: AtomicUsize,
}

impl KeywordEncoder {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; VOCABULARY.len() + 1];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            if let Some(slot) = VOCABULARY.iter().position(|v| *v == word) {
                vector[slot] += 1.0;
            }
        }
        vector[VOCABULARY.len()] = 0.1;
        vector
    }
}

impl TextEncoder for KeywordEncoder {
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts_encoded.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimension(&self) -> usize {
        VOCABULARY.len() + 1
    }
}

/// Encoder that always fails
pub struct BrokenEncoder;

impl TextEncoder for BrokenEncoder {
    fn encode_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(SiteError::EncodingFailure("model unavailable".to_string()))
    }

    fn dimension(&self) -> usize {
        VOCABULARY.len() + 1
    }
}

pub fn keyword_embedder() -> (Arc<KeywordEncoder>, Embedder) {
    let encoder = Arc::new(KeywordEncoder::default());
    let embedder = Embedder::new(encoder.clone(), 2, 2);
    (encoder, embedder)
}

/// Chat model that replays a fixed answer and records every request
pub struct ScriptedModel {
    reply: std::result::Result<String, String>,
    pub requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    pub fn answering(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(reason: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(reason.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn last_request(&self) -> Vec<ChatMessage> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, messages: &[ChatMessage], _params: &GenerationParams) -> Result<String> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.reply.clone().map_err(SiteError::ModelCallFailure)
    }
}

pub fn sample_records() -> Vec<CorpusRecord> {
    vec![
        CorpusRecord::new("https://site.test/alpha", "Alpha services for retail"),
        CorpusRecord::new("https://site.test/beta", "Beta products for banks"),
        CorpusRecord::new("https://site.test/gamma", "Gamma clients list"),
    ]
}

pub fn write_corpus(path: &Path, records: &[CorpusRecord]) {
    std::fs::write(path, serde_json::to_string_pretty(records).unwrap()).unwrap();
}
