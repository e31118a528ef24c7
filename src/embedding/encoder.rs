//! Async embedding front
//!
//! Encoding is CPU bound, so every batch runs on tokio's blocking pool.
//! A semaphore caps how many batches are in flight at once so a burst of
//! queries cannot starve the pool used for index and corpus I/O.

use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::errors::{Result, SiteError};

/// Blocking text encoder (one vector per input, input order preserved)
pub trait TextEncoder: Send + Sync {
    /// Encode a batch of texts
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Output vector width
    fn dimension(&self) -> usize;
}

/// Scale a vector to unit L2 norm
pub fn l2_normalize(mut vector: Vec<f32>) -> Result<Vec<f32>> {
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(SiteError::EncodingFailure(
            "encoder produced non-finite values".to_string(),
        ));
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        return Err(SiteError::EncodingFailure(
            "encoder produced a zero vector".to_string(),
        ));
    }

    for v in vector.iter_mut() {
        *v /= norm;
    }
    Ok(vector)
}

/// Shared embedder used by index builds and queries
#[derive(Clone)]
pub struct Embedder {
    encoder: Arc<dyn TextEncoder>,
    permits: Arc<Semaphore>,
    batch_size: usize,
}

impl Embedder {
    /// Create an embedder with `workers` concurrent batches of `batch_size`
    pub fn new(encoder: Arc<dyn TextEncoder>, workers: usize, batch_size: usize) -> Self {
        Self {
            encoder,
            permits: Arc::new(Semaphore::new(workers.max(1))),
            batch_size: batch_size.max(1),
        }
    }

    /// Encode texts into unit-norm vectors, preserving order
    pub async fn encode(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let permit = Arc::clone(&self.permits)
                .acquire_owned()
                .await
                .map_err(|e| SiteError::EncodingFailure(e.to_string()))?;

            let encoder = Arc::clone(&self.encoder);
            let batch = batch.to_vec();
            let expected = batch.len();

            let encoded = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                encoder.encode_batch(&batch)
            })
            .await
            .map_err(|e| SiteError::EncodingFailure(format!("encoder worker failed: {}", e)))??;

            if encoded.len() != expected {
                return Err(SiteError::EncodingFailure(format!(
                    "encoder returned {} vectors for {} texts",
                    encoded.len(),
                    expected
                )));
            }

            for vector in encoded {
                vectors.push(l2_normalize(vector)?);
            }
        }

        Ok(vectors)
    }

    /// Encode a single text
    pub async fn encode_one(&self, text: &str) -> Result<Vec<f32>> {
        self.encode(vec![text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| SiteError::EncodingFailure("encoder returned no vector".to_string()))
    }

    /// Output vector width
    pub fn dimension(&self) -> usize {
        self.encoder.dimension()
    }
}
