//! Question answering facade
//!
//! `Assistant::answer` is the single operation exposed to transports:
//! retrieve -> assemble -> complete -> parse. Encoder, index and model
//! failures propagate; a malformed model answer degrades to its raw text.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::embedding::Embedder;
use crate::errors::Result;
use crate::llm::{ChatModel, GenerationParams};
use crate::rag::{
    AnswerParser, KnowledgeBase, ParsedAnswer, PromptAssembler, RetrievedPassage, SearchParams,
};

/// Full result of one answered question
#[derive(Debug, Clone)]
pub struct Reply {
    /// User-facing text
    pub text: String,
    /// Passages the prompt was grounded on, best first
    pub passages: Vec<RetrievedPassage>,
    /// True when the model output was not schema-valid
    pub fallback: bool,
}

/// Retrieval-augmented assistant
pub struct Assistant {
    knowledge: RwLock<Arc<KnowledgeBase>>,
    embedder: Embedder,
    model: Arc<dyn ChatModel>,
    prompt: PromptAssembler,
    parser: AnswerParser,
    search: SearchParams,
    generation: GenerationParams,
}

impl Assistant {
    /// Create assistant with default prompt, parser and parameters
    pub fn new(knowledge: KnowledgeBase, embedder: Embedder, model: Arc<dyn ChatModel>) -> Self {
        Self {
            knowledge: RwLock::new(Arc::new(knowledge)),
            embedder,
            model,
            prompt: PromptAssembler::default(),
            parser: AnswerParser::default(),
            search: SearchParams::default(),
            generation: GenerationParams::default(),
        }
    }

    /// Create assistant wired from configuration
    pub fn from_config(
        config: &Config,
        knowledge: KnowledgeBase,
        embedder: Embedder,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        Self::new(knowledge, embedder, model)
            .with_prompt(PromptAssembler::from_config(&config.assistant))
            .with_parser(AnswerParser::new(config.assistant.citation_style))
            .with_search(config.search_params())
            .with_generation(config.generation_params())
    }

    pub fn with_prompt(mut self, prompt: PromptAssembler) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_parser(mut self, parser: AnswerParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_search(mut self, search: SearchParams) -> Self {
        self.search = search;
        self
    }

    pub fn with_generation(mut self, generation: GenerationParams) -> Self {
        self.generation = generation;
        self
    }

    pub fn search_params(&self) -> SearchParams {
        self.search
    }

    /// Answer a question with the configured search parameters
    pub async fn answer(&self, question: &str) -> Result<String> {
        Ok(self.respond(question).await?.text)
    }

    /// Answer a question and keep the grounding details
    pub async fn respond(&self, question: &str) -> Result<Reply> {
        self.respond_with(question, &self.search).await
    }

    /// Answer with explicit search parameters for this call only
    pub async fn respond_with(&self, question: &str, search: &SearchParams) -> Result<Reply> {
        tracing::info!(question = question, "question received");

        let knowledge = self.knowledge().await;
        let passages = knowledge.retrieve(&self.embedder, question, search).await?;
        for (rank, passage) in passages.iter().enumerate() {
            tracing::info!(
                rank = rank + 1,
                url = %passage.url,
                score = passage.score,
                "context passage"
            );
        }
        tracing::debug!(context = ?passages, "retrieved context");

        let messages = self.prompt.assemble(question, &passages);
        let raw = self.model.complete(&messages, &self.generation).await?;
        tracing::info!(raw_answer = %raw, "model answered");

        let parsed = ParsedAnswer::parse(&raw);
        let fallback = parsed.is_fallback();
        if fallback {
            tracing::warn!("model answer is not valid structured output, returning raw text");
        }

        Ok(Reply {
            text: parsed.render(self.parser.style()),
            passages,
            fallback,
        })
    }

    /// Current knowledge snapshot
    pub async fn knowledge(&self) -> Arc<KnowledgeBase> {
        self.knowledge.read().await.clone()
    }

    /// Swap in a freshly built snapshot; in-flight answers keep the old one
    pub async fn replace_knowledge(&self, knowledge: KnowledgeBase) {
        let rows = knowledge.len();
        *self.knowledge.write().await = Arc::new(knowledge);
        tracing::info!(rows = rows, "knowledge base replaced");
    }
}

/// Greeting shown when a conversation starts
pub fn greeting(company: &str) -> String {
    format!(
        "Hi! I'm the {} bot. Ask me about the company's services, projects and clients, \
         and I'll answer with links to the sources.",
        company
    )
}
