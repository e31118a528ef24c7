//! Scraped page corpus
//!
//! The corpus is produced elsewhere (the scraper) as a JSON array of
//! `{url, text}` records. Position in the array is the row identity used
//! by the vector index, so the record order is never changed after load.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{Result, SiteError};

/// One scraped source page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub url: String,
    pub text: String,
}

impl CorpusRecord {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
        }
    }
}

/// Immutable, cheaply clonable sequence of corpus records
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    records: Arc<[CorpusRecord]>,
}

impl Corpus {
    pub fn from_records(records: Vec<CorpusRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Load a corpus from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| SiteError::CorpusLoadFailure {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let records: Vec<CorpusRecord> =
            serde_json::from_str(&contents).map_err(|e| SiteError::CorpusLoadFailure {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self::from_records(records))
    }

    /// Load on the blocking pool
    pub async fn load_async(path: PathBuf) -> Result<Self> {
        let display = path.display().to_string();
        tokio::task::spawn_blocking(move || Self::load(&path))
            .await
            .map_err(|e| SiteError::CorpusLoadFailure {
                path: display,
                reason: e.to_string(),
            })?
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record stored at a given index row
    pub fn get(&self, row: usize) -> Option<&CorpusRecord> {
        self.records.get(row)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CorpusRecord> {
        self.records.iter()
    }

    /// Texts in row order, ready for the encoder
    pub fn texts(&self) -> Vec<String> {
        self.records.iter().map(|r| r.text.clone()).collect()
    }
}
