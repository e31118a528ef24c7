//! Paired corpus + index snapshot and its build/load lifecycle
//!
//! A `KnowledgeBase` is only ever constructed with matching row counts and
//! is never mutated afterwards. Rebuilding produces a new value that the
//! owner swaps in as a whole.

use std::path::PathBuf;

use crate::config::Config;
use crate::corpus::Corpus;
use crate::embedding::Embedder;
use crate::errors::Result;
use crate::index::{self, FlatIndex};
use crate::rag::retriever::{self, ensure_aligned, RetrievedPassage, SearchParams};

/// Where the corpus is read from and the index is kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgePaths {
    pub content: PathBuf,
    pub index: PathBuf,
}

impl KnowledgePaths {
    pub fn from_config(config: &Config) -> Self {
        Self {
            content: config.content_path(),
            index: config.index_path(),
        }
    }
}

/// Immutable corpus/index pair
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    corpus: Corpus,
    index: FlatIndex,
}

impl KnowledgeBase {
    /// Pair a corpus with its index, enforcing row identity
    pub fn new(corpus: Corpus, index: FlatIndex) -> Result<Self> {
        ensure_aligned(&index, &corpus)?;
        Ok(Self { corpus, index })
    }

    /// Encode every record and build a fresh in-memory index
    pub async fn build(corpus: Corpus, embedder: &Embedder, default_dimension: usize) -> Result<Self> {
        let vectors = embedder.encode(corpus.texts()).await?;
        let index = FlatIndex::build(&vectors, default_dimension)?;
        Self::new(corpus, index)
    }

    /// Load corpus, build and persist the index if it is absent, then load it
    ///
    /// The index file only appears once a build has been fully written, so
    /// a loaded snapshot always comes from a complete build.
    pub async fn open_or_build(paths: &KnowledgePaths, embedder: &Embedder, default_dimension: usize) -> Result<Self> {
        let corpus = Corpus::load_async(paths.content.clone()).await?;

        if !paths.index.exists() {
            tracing::info!(
                index = %paths.index.display(),
                records = corpus.len(),
                "index not found, building"
            );
            Self::build_and_persist(corpus.clone(), paths, embedder, default_dimension).await?;
        }

        let index = index::load_async(paths.index.clone()).await?;
        let knowledge = Self::new(corpus, index)?;
        tracing::info!(rows = knowledge.len(), "knowledge base loaded");
        Ok(knowledge)
    }

    /// Rebuild unconditionally from the corpus on disk
    pub async fn rebuild(paths: &KnowledgePaths, embedder: &Embedder, default_dimension: usize) -> Result<Self> {
        let corpus = Corpus::load_async(paths.content.clone()).await?;
        Self::build_and_persist(corpus, paths, embedder, default_dimension).await
    }

    async fn build_and_persist(
        corpus: Corpus,
        paths: &KnowledgePaths,
        embedder: &Embedder,
        default_dimension: usize,
    ) -> Result<Self> {
        let built = Self::build(corpus, embedder, default_dimension).await?;
        let Self { corpus, index } = built;

        let index = index::persist_async(index, paths.index.clone()).await?;
        tracing::info!(
            index = %paths.index.display(),
            rows = index.len(),
            dimension = index.dimension(),
            "index built"
        );
        Self::new(corpus, index)
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    /// Number of rows (records == index rows)
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Retrieve passages for a query from this snapshot
    pub async fn retrieve(
        &self,
        embedder: &Embedder,
        query: &str,
        params: &SearchParams,
    ) -> Result<Vec<RetrievedPassage>> {
        retriever::retrieve(&self.index, &self.corpus, embedder, query, params).await
    }
}
