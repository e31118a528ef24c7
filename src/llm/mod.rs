//! Language model boundary
//!
//! The pipeline only knows `ChatModel::complete`: ordered role-tagged
//! messages plus sampling parameters in, raw text out. Retries, streaming
//! and auth belong to the implementation.

pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

pub use openai::OpenAiChatClient;

/// Message author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Sampling parameters for one completion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl GenerationParams {
    /// Temperature and top_p rounded to two decimals, as sent on the wire
    pub fn rounded(&self) -> Self {
        let round2 = |v: f32| (v * 100.0).round() / 100.0;
        Self {
            max_tokens: self.max_tokens,
            temperature: round2(self.temperature),
            top_p: round2(self.top_p),
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 300,
            temperature: 0.5,
            top_p: 0.8,
        }
    }
}

/// Black-box chat completion
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Return the raw text of the first completion choice
    async fn complete(&self, messages: &[ChatMessage], params: &GenerationParams) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = ChatMessage::system("rules");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"rules"}"#);
    }

    #[test]
    fn test_params_rounding() {
        let params = GenerationParams {
            max_tokens: 10,
            temperature: 0.456,
            top_p: 0.8049,
        }
        .rounded();
        assert!((params.temperature - 0.46).abs() < 1e-6);
        assert!((params.top_p - 0.80).abs() < 1e-6);
        assert_eq!(params.max_tokens, 10);
    }
}
