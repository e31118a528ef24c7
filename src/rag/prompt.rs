//! Prompt assembly for grounded answers
//!
//! Message layout is fixed: system instruction, the raw question, then one
//! user message per passage in retrieval order. Each passage message starts
//! with its source URL so the model can cite it.

use crate::config::AssistantConfig;
use crate::llm::ChatMessage;
use crate::rag::retriever::RetrievedPassage;

/// Builds the message sequence sent to the model
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    system_prompt: String,
}

impl PromptAssembler {
    /// Instruction for a given company, site and answer language
    pub fn new(company: &str, site_url: &str, language: &str) -> Self {
        Self {
            system_prompt: system_prompt(company, site_url, language),
        }
    }

    pub fn from_config(config: &AssistantConfig) -> Self {
        Self::new(&config.company, &config.site_url, &config.language)
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Assemble the full message sequence
    pub fn assemble(&self, question: &str, passages: &[RetrievedPassage]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(passages.len() + 2);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        messages.push(ChatMessage::user(question));
        messages.extend(passages.iter().map(passage_message));
        messages
    }
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::from_config(&AssistantConfig::default())
    }
}

/// User message carrying one retrieved passage
pub fn passage_message(passage: &RetrievedPassage) -> ChatMessage {
    ChatMessage::user(format!("Content from source {}:\n{}", passage.url, passage.text))
}

fn system_prompt(company: &str, site_url: &str, language: &str) -> String {
    format!(
        r#"You are an expert on the company {company} ({site_url}): its products, services, projects and clients.
Your job is to answer questions from potential clients about {company}.
Answer in {language}.
Base the answer on the user's question and the context messages that follow it. Each context message starts with the URL of its source.
The context may be unordered.
No speculation, no general musings, nothing that the sources do not confirm.

Answer schema:
{{
    "content": string,
    "urls": [{{"<number>": "<url>"}}, ...]
}}

Example answer to "What can you do for retailers?":
{{
    "content": "For example, we built an HR bot for a retail chain [1] and image search for an online marketplace [2]",
    "urls": [
        {{"1": "{site_url}cases/hr-bot"}},
        {{"2": "{site_url}cases/image-search"}}
    ]
}}

IMPORTANT:
- The answer is a single JSON object with the keys "content" and "urls".
- "urls" lists ONLY the numbers that actually appear in "content" as [n], each number once, in ascending order. Links may repeat.
- If the context holds nothing relevant, answer from your general knowledge of {company} ({site_url}) and return "urls": [].
- No text, comments or explanations outside the JSON.
- The JSON must parse."#
    )
}
