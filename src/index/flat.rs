//! Brute-force inner-product index over row-major f32 storage
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::errors::{Result, SiteError};

/// One search result: index row and its inner product with the query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub row: usize,
    pub score: f32,
}

/// Flat index holding every vector contiguously in row order
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Empty index of a given width
    pub fn empty(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Build from vectors in row order
    ///
    /// Width comes from the first vector; `default_dimension` is only used
    /// when there are no vectors at all.
    pub fn build(vectors: &[Vec<f32>], default_dimension: usize) -> Result<Self> {
        let dimension = vectors.first().map(Vec::len).unwrap_or(default_dimension);

        let mut data = Vec::with_capacity(vectors.len() * dimension);
        for vector in vectors {
            if vector.len() != dimension {
                return Err(SiteError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            data.extend_from_slice(vector);
        }

        Ok(Self { dimension, data })
    }

    /// Rebuild from raw row-major storage (used by the loader)
    pub(crate) fn from_raw(dimension: usize, data: Vec<f32>) -> Result<Self> {
        if (dimension == 0 && !data.is_empty()) || (dimension > 0 && data.len() % dimension != 0) {
            return Err(SiteError::DimensionMismatch {
                expected: dimension,
                actual: data.len(),
            });
        }
        Ok(Self { dimension, data })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector stored at a row
    pub fn row(&self, row: usize) -> Option<&[f32]> {
        if row >= self.len() {
            return None;
        }
        let start = row * self.dimension;
        Some(&self.data[start..start + self.dimension])
    }

    pub(crate) fn raw(&self) -> &[f32] {
        &self.data
    }

    /// Top-k rows by descending inner product, ties by ascending row
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        if self.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(SiteError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if query.iter().any(|v| !v.is_finite()) {
            return Err(SiteError::EncodingFailure(
                "query vector contains non-finite values".to_string(),
            ));
        }

        let mut hits: Vec<SearchHit> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(row, vector)| SearchHit {
                row,
                score: dot(vector, query),
            })
            .collect();

        hits.sort_by(rank);
        hits.truncate(top_k);
        Ok(hits)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

// partial_cmp keeps 0.0 and -0.0 equal so they tie on row
fn rank(a: &SearchHit, b: &SearchHit) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then(a.row.cmp(&b.row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn unit(v: &[f32]) -> Vec<f32> {
        let n = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        v.iter().map(|x| x / n).collect()
    }

    #[test]
    fn test_build_infers_dimension() {
        let index = FlatIndex::build(&[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]], 384).unwrap();
        assert_eq!(index.dimension(), 3);
        assert_eq!(index.len(), 2);
        assert_eq!(index.row(1), Some(&[0.0, 1.0, 0.0][..]));
        assert_eq!(index.row(2), None);
    }

    #[test]
    fn test_build_empty_uses_default_dimension() {
        let index = FlatIndex::build(&[], 384).unwrap();
        assert_eq!(index.dimension(), 384);
        assert!(index.is_empty());
        assert!(index.search(&vec![0.0; 384], 5).unwrap().is_empty());
    }

    #[test]
    fn test_build_rejects_ragged_vectors() {
        let err = FlatIndex::build(&[vec![1.0, 0.0], vec![1.0]], 2).unwrap_err();
        assert!(matches!(
            err,
            SiteError::DimensionMismatch { expected: 2, actual: 1 }
        ));
    }

    #[test]
    fn test_search_orders_by_score() {
        let index = FlatIndex::build(
            &[unit(&[1.0, 0.0]), unit(&[0.6, 0.8]), unit(&[-1.0, 0.0])],
            2,
        )
        .unwrap();

        let hits = index.search(&[1.0, 0.0], 10).unwrap();
        let rows: Vec<usize> = hits.iter().map(|h| h.row).collect();
        assert_eq!(rows, vec![0, 1, 2]);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        assert!(hits[2].score < 0.0);
    }

    #[test]
    fn test_search_ties_break_by_row() {
        let index = FlatIndex::build(
            &[vec![0.0, 1.0], vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]],
            2,
        )
        .unwrap();

        let hits = index.search(&[1.0, 0.0], 3).unwrap();
        let rows: Vec<usize> = hits.iter().map(|h| h.row).collect();
        assert_eq!(rows, vec![1, 3, 0]);
    }

    #[test]
    fn test_search_truncates_to_top_k() {
        let index = FlatIndex::build(&[vec![1.0], vec![0.5], vec![0.25]], 1).unwrap();
        assert_eq!(index.search(&[1.0], 2).unwrap().len(), 2);
        assert!(index.search(&[1.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_search_rejects_wrong_query_width() {
        let index = FlatIndex::build(&[vec![1.0, 0.0]], 2).unwrap();
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 1),
            Err(SiteError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_each_row_finds_itself_first() {
        let vectors: Vec<Vec<f32>> = vec![
            unit(&[1.0, 2.0, 3.0]),
            unit(&[-3.0, 1.0, 0.5]),
            unit(&[0.0, -1.0, 4.0]),
            unit(&[2.0, 2.0, -2.0]),
        ];
        let index = FlatIndex::build(&vectors, 3).unwrap();

        for (row, vector) in vectors.iter().enumerate() {
            let hits = index.search(vector, 1).unwrap();
            assert_eq!(hits[0].row, row);
            assert!((hits[0].score - 1.0).abs() < 1e-5);
        }
    }

    #[quickcheck]
    fn prop_search_is_sorted(rows: Vec<(i8, i8)>, query: (i8, i8), top_k: u8) -> bool {
        let vectors: Vec<Vec<f32>> = rows.iter().map(|&(a, b)| vec![a as f32, b as f32]).collect();
        let index = FlatIndex::build(&vectors, 2).unwrap();
        let hits = index.search(&[query.0 as f32, query.1 as f32], top_k as usize).unwrap();

        hits.len() == vectors.len().min(top_k as usize)
            && hits.windows(2).all(|w| {
                w[0].score > w[1].score || (w[0].score == w[1].score && w[0].row < w[1].row)
            })
    }
}
