//! Retriever: query -> scored passages with their source URLs
use serde::{Deserialize, Serialize};

use crate::corpus::Corpus;
use crate::embedding::Embedder;
use crate::errors::{Result, SiteError};
use crate::index::FlatIndex;

/// Search parameters for retrieval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Maximum number of results to retrieve
    pub top_k: usize,
    /// Minimum similarity; scores below are dropped, equal is kept.
    /// `None` accepts every hit, negative scores included.
    pub min_score: Option<f32>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            top_k: 2,
            min_score: Some(0.3),
        }
    }
}

impl SearchParams {
    /// Same `top_k`, no threshold
    pub fn unfiltered(top_k: usize) -> Self {
        Self {
            top_k,
            min_score: None,
        }
    }

    fn accepts(&self, score: f32) -> bool {
        match self.min_score {
            Some(min) => score >= min,
            None => true,
        }
    }
}

/// Retrieved passage with its similarity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub url: String,
    pub text: String,
    pub score: f32,
}

/// Fail unless every index row has exactly one corpus record
pub fn ensure_aligned(index: &FlatIndex, corpus: &Corpus) -> Result<()> {
    if index.len() != corpus.len() {
        return Err(SiteError::CorpusIndexMismatch {
            corpus_rows: corpus.len(),
            index_rows: index.len(),
        });
    }
    Ok(())
}

/// Rank corpus passages against an already encoded query
pub fn select_passages(
    index: &FlatIndex,
    corpus: &Corpus,
    query_vector: &[f32],
    params: &SearchParams,
) -> Result<Vec<RetrievedPassage>> {
    ensure_aligned(index, corpus)?;

    let hits = index.search(query_vector, params.top_k)?;

    let mut passages = Vec::with_capacity(hits.len());
    for hit in hits.into_iter().filter(|h| params.accepts(h.score)) {
        let record = corpus.get(hit.row).ok_or(SiteError::CorpusIndexMismatch {
            corpus_rows: corpus.len(),
            index_rows: index.len(),
        })?;
        passages.push(RetrievedPassage {
            url: record.url.clone(),
            text: record.text.clone(),
            score: hit.score,
        });
    }

    Ok(passages)
}

/// Encode `query` and return the best passages under `params`
pub async fn retrieve(
    index: &FlatIndex,
    corpus: &Corpus,
    embedder: &Embedder,
    query: &str,
    params: &SearchParams,
) -> Result<Vec<RetrievedPassage>> {
    ensure_aligned(index, corpus)?;
    if index.is_empty() || params.top_k == 0 {
        return Ok(Vec::new());
    }

    let query_vector = embedder.encode_one(query).await?;
    let passages = select_passages(index, corpus, &query_vector, params)?;

    tracing::debug!(
        query = query,
        hits = passages.len(),
        top_k = params.top_k,
        min_score = ?params.min_score,
        "retrieved passages"
    );

    Ok(passages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusRecord;

    fn corpus(n: usize) -> Corpus {
        Corpus::from_records(
            (0..n)
                .map(|i| CorpusRecord::new(format!("u{}", i), format!("text {}", i)))
                .collect(),
        )
    }

    fn index() -> FlatIndex {
        // scores against [1, 0]: 0.3, 1.0, -0.5
        FlatIndex::build(&[vec![0.3, 0.9539392], vec![1.0, 0.0], vec![-0.5, 0.8660254]], 2).unwrap()
    }

    #[test]
    fn test_search_params_default() {
        let params = SearchParams::default();
        assert_eq!(params.top_k, 2);
        assert_eq!(params.min_score, Some(0.3));
    }

    #[test]
    fn test_threshold_keeps_equal_score() {
        let params = SearchParams {
            top_k: 3,
            min_score: Some(0.3),
        };
        let passages = select_passages(&index(), &corpus(3), &[1.0, 0.0], &params).unwrap();

        let urls: Vec<&str> = passages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["u1", "u0"]);
        assert_eq!(passages[1].score, 0.3);
    }

    #[test]
    fn test_threshold_drops_lower_score() {
        let params = SearchParams {
            top_k: 3,
            min_score: Some(0.30001),
        };
        let passages = select_passages(&index(), &corpus(3), &[1.0, 0.0], &params).unwrap();
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].url, "u1");
    }

    #[test]
    fn test_no_threshold_keeps_negative_scores() {
        let passages =
            select_passages(&index(), &corpus(3), &[1.0, 0.0], &SearchParams::unfiltered(3)).unwrap();
        assert_eq!(passages.len(), 3);
        assert_eq!(passages[2].url, "u2");
        assert!(passages[2].score < 0.0);
    }

    #[test]
    fn test_mismatch_fails_fast() {
        let small = FlatIndex::build(&[vec![1.0, 0.0], vec![0.0, 1.0]], 2).unwrap();
        let err = select_passages(&small, &corpus(3), &[1.0, 0.0], &SearchParams::unfiltered(5))
            .unwrap_err();
        assert!(matches!(
            err,
            SiteError::CorpusIndexMismatch {
                corpus_rows: 3,
                index_rows: 2
            }
        ));
    }

    #[test]
    fn test_empty_index_yields_nothing() {
        let empty = FlatIndex::empty(2);
        let passages =
            select_passages(&empty, &corpus(0), &[1.0, 0.0], &SearchParams::unfiltered(5)).unwrap();
        assert!(passages.is_empty());
    }
}
