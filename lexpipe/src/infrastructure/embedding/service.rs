// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `HashEmbeddingService`: a deterministic, CPU-only stand-in for the real
//! embedding accelerator, which is explicitly out of scope. It exists so
//! the binary has a working default end to end; real deployments are
//! expected to swap in an adapter that calls an actual model server.
//!
//! Deterministic by design (same text always yields the same vector) so
//! the embedding cache and concept assignment can be exercised in tests
//! without a real accelerator.

use async_trait::async_trait;
use lexpipe_domain::value_objects::EmbeddingVector;
use lexpipe_domain::services::EmbeddingService;
use lexpipe_domain::PipelineError;
use sha2::{Digest, Sha256};

pub struct HashEmbeddingService {
    dimension: usize,
    /// Batches larger than this trigger `PipelineError::AcceleratorOom`,
    /// exercising the embedder worker's batch-halving retry policy the
    /// same way a real accelerator's OOM response would.
    max_batch_size: usize,
}

impl HashEmbeddingService {
    pub fn new(dimension: usize, max_batch_size: usize) -> Self {
        Self { dimension, max_batch_size }
    }
}

fn embed_one(dimension: usize, text: &str) -> EmbeddingVector {
    let mut values = Vec::with_capacity(dimension);
    let mut counter: u32 = 0;
    while values.len() < dimension {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.update(counter.to_le_bytes());
        let digest = hasher.finalize();
        for chunk in digest.chunks_exact(4) {
            if values.len() == dimension {
                break;
            }
            let bits = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            // Maps into [-1.0, 1.0] so cosine similarity behaves
            // sensibly rather than every vector being near-orthogonal
            // noise in the positive-only quadrant.
            let normalized = ((bits as f64) / (u32::MAX as f64)) * 2.0 - 1.0;
            values.push(normalized as f32);
        }
        counter += 1;
    }
    let vector = EmbeddingVector::new(values).expect("hash-derived vector is always finite and non-empty");
    let norm = vector.l2_norm();
    let normalized = if norm == 0.0 {
        vector.into_vec()
    } else {
        vector.into_vec().into_iter().map(|v| v / norm).collect()
    };
    EmbeddingVector::new(normalized).expect("normalized vector is always finite and non-empty")
}

#[async_trait]
impl EmbeddingService for HashEmbeddingService {
    async fn embed(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>, PipelineError> {
        if texts.len() > self.max_batch_size {
            return Err(PipelineError::AcceleratorOom(format!(
                "batch of {} exceeds accelerator capacity of {}",
                texts.len(),
                self.max_batch_size
            )));
        }

        // The hash computation is CPU-bound; offloading it to the blocking
        // pool keeps a slow/large batch from stalling the executor's other
        // async tasks, the same idiom a real accelerator call would use.
        let dimension = self.dimension;
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || texts.iter().map(|t| embed_one(dimension, t)).collect())
            .await
            .map_err(|e| PipelineError::internal(format!("embedding task panicked: {e}")))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embeddings_are_deterministic() {
        let service = HashEmbeddingService::new(16, 256);
        let a = service.embed(&["cat".to_string()]).await.unwrap();
        let b = service.embed(&["cat".to_string()]).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn different_text_yields_different_embedding() {
        let service = HashEmbeddingService::new(16, 256);
        let a = service.embed(&["cat".to_string()]).await.unwrap();
        let b = service.embed(&["dog".to_string()]).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn oversized_batch_reports_oom() {
        let service = HashEmbeddingService::new(16, 2);
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let result = service.embed(&texts).await;
        assert!(matches!(result, Err(PipelineError::AcceleratorOom(_))));
    }

    #[tokio::test]
    async fn embeddings_are_l2_normalized() {
        let service = HashEmbeddingService::new(16, 256);
        let embeddings = service.embed(&["cat".to_string(), "dog".to_string()]).await.unwrap();
        for v in &embeddings {
            assert!((v.l2_norm() - 1.0).abs() < 1e-4);
        }
    }

    #[tokio::test]
    async fn embeddings_have_the_configured_dimension() {
        let service = HashEmbeddingService::new(32, 256);
        let embeddings = service.embed(&["cat".to_string()]).await.unwrap();
        assert_eq!(embeddings[0].dim(), 32);
        assert_eq!(service.dimension(), 32);
    }
}
