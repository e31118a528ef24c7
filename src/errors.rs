//! Error types for SiteBuddy
//!
//! One taxonomy for the whole pipeline. Encoder, index and corpus failures
//! propagate to the caller; malformed model answers are not errors at all
//! (see `rag::answer`).

use thiserror::Error;

/// Main error type for the retrieval and answering pipeline
#[derive(Error, Debug)]
pub enum SiteError {
    /// Embedding computation failed (bad model state, tokenizer, worker crash)
    #[error("Encoding failed: {0}")]
    EncodingFailure(String),

    /// Persisted index missing or corrupt
    #[error("Failed to load index from {path}: {reason}")]
    IndexLoadFailure { path: String, reason: String },

    /// Persisted corpus missing or corrupt
    #[error("Failed to load corpus from {path}: {reason}")]
    CorpusLoadFailure { path: String, reason: String },

    /// Row identity between corpus and index is broken
    #[error("Corpus has {corpus_rows} records but index has {index_rows} rows")]
    CorpusIndexMismatch {
        corpus_rows: usize,
        index_rows: usize,
    },

    /// Vectors of different widths met in the same index
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The external language model did not return an answer
    #[error("Model call failed: {0}")]
    ModelCallFailure(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, SiteError>;

/// Convert anyhow errors to SiteError
impl From<anyhow::Error> for SiteError {
    fn from(err: anyhow::Error) -> Self {
        SiteError::Generic(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_display() {
        let err = SiteError::CorpusIndexMismatch {
            corpus_rows: 3,
            index_rows: 2,
        };
        let text = err.to_string();
        assert!(text.contains('3'));
        assert!(text.contains('2'));
    }

    #[test]
    fn test_index_load_failure_names_path() {
        let err = SiteError::IndexLoadFailure {
            path: "data/index.bin".to_string(),
            reason: "bad magic".to_string(),
        };
        assert!(err.to_string().contains("data/index.bin"));
        assert!(err.to_string().contains("bad magic"));
    }

    #[test]
    fn test_anyhow_conversion_keeps_context() {
        let err: SiteError = anyhow::anyhow!("root cause").context("outer").into();
        let text = err.to_string();
        assert!(text.contains("outer"));
        assert!(text.contains("root cause"));
    }
}
