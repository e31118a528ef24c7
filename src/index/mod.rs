//! Exact inner-product vector index
//!
//! Rows are identified purely by position. The index is built once from
//! the corpus, persisted as a single binary file and loaded read-only.

pub mod flat;
pub mod storage;

pub use flat::{FlatIndex, SearchHit};
pub use storage::{load, load_async, persist, persist_async};
