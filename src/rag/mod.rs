//! Retrieval-augmented answering
//!
//! - `retriever`: query -> scored passages
//! - `knowledge`: corpus/index snapshot and its build/load lifecycle
//! - `prompt`: message sequence for the model
//! - `answer`: structured answer decoding and citation rewrite

pub mod answer;
pub mod knowledge;
pub mod prompt;
pub mod retriever;

pub use answer::{AnswerParser, Citation, CitationStyle, ParsedAnswer};
pub use knowledge::{KnowledgeBase, KnowledgePaths};
pub use prompt::PromptAssembler;
pub use retriever::{retrieve, RetrievedPassage, SearchParams};
