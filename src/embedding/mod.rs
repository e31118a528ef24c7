//! Sentence embeddings
//!
//! - `TextEncoder`: the model seam (blocking, batch in / vectors out)
//! - `Embedder`: async front that offloads encoding to the blocking pool
//!   and guarantees unit-norm output
//! - `SentenceEncoder`: local multilingual MiniLM via candle

pub mod encoder;
pub mod engine;

pub use encoder::{l2_normalize, Embedder, TextEncoder};
pub use engine::{SentenceEncoder, DEFAULT_DIMENSION, DEFAULT_MODEL_ID};
