//! SiteBuddy - grounded question answering over a company website
//!
//! # Architecture
//!
//! - **embedding**: sentence encoder, unit-norm vectors
//! - **index**: flat inner-product index and its on-disk form
//! - **rag**: retrieval, prompt assembly, answer parsing
//! - **llm**: chat model boundary and an OpenAI-compatible client
//! - **assistant**: `answer(question)` for transports

pub mod errors;
pub mod corpus;
pub mod embedding;
pub mod index;
pub mod llm;
pub mod rag;
pub mod assistant;

// Re-export commonly used types
pub use errors::{Result, SiteError};
pub use assistant::{Assistant, Reply};

pub mod cli;
pub mod config;
pub mod logging;
