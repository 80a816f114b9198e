// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Nearest-centroid concept assignment.
//!
//! Grounded on `ConceptAligner.batch_assign` from the original
//! implementation: `distances = 1 - cosine_similarity(embeddings,
//! centroids)`, `argmin` per row. Concept discovery (clustering raw
//! embeddings into centroids) is out of scope; `ConceptAssigner` only
//! consumes a precomputed catalog.
//!
//! Implemented as a flat `Vec<f32>`-backed loop rather than a matmul
//! crate: the catalog (`K` concepts) and batch (`M` embeddings) are both
//! modest in size, and `rayon` already gives us batch-level parallelism
//! without an extra linear-algebra dependency.

use crate::entities::Concept;
use crate::value_objects::{ ConceptId, EmbeddingVector };
use rayon::prelude::*;

/// Sentinel id returned for every query when the catalog is empty.
const UNASSIGNED: &str = "unassigned";

/// Holds the concept catalog's centroids in a dense, contiguous layout for
/// cache-friendly dot products.
pub struct ConceptAssigner {
    ids: Vec<ConceptId>,
    dim: usize,
    /// Row-major K x D matrix of centroids.
    centroids: Vec<f32>,
    /// Precomputed L2 norms, one per centroid row.
    norms: Vec<f32>,
}

impl ConceptAssigner {
    /// Builds an assigner from a loaded catalog. All centroids must share
    /// the same dimensionality; the first concept's dimension becomes the
    /// expected dimension for every subsequent centroid and every query.
    pub fn new(catalog: &[Concept]) -> Self {
        let dim = catalog.first().map(|c| c.centroid().dim()).unwrap_or(0);
        let mut centroids = Vec::with_capacity(catalog.len() * dim);
        let mut norms = Vec::with_capacity(catalog.len());
        let mut ids = Vec::with_capacity(catalog.len());

        for concept in catalog {
            ids.push(concept.id().clone());
            centroids.extend_from_slice(concept.centroid().as_slice());
            norms.push(concept.centroid().l2_norm());
        }

        Self { ids, dim, centroids, norms }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn unassigned(&self) -> (ConceptId, f32) {
        (ConceptId::new(UNASSIGNED).expect("sentinel id is non-empty"), 1.0)
    }

    /// Assigns the single nearest concept by cosine similarity and its
    /// confidence (`1 - cosine distance`). Ties break toward the lower
    /// catalog index (mirrors `np.argmin`'s stable first-match behavior).
    /// An empty catalog, or a dimension mismatch, yields the sentinel
    /// "unassigned" id with confidence 1.0.
    pub fn assign(&self, embedding: &EmbeddingVector) -> (ConceptId, f32) {
        if self.is_empty() || embedding.dim() != self.dim {
            return self.unassigned();
        }

        let query = embedding.as_slice();
        let query_norm = embedding.l2_norm();
        if query_norm == 0.0 {
            return (self.ids[0].clone(), 0.0);
        }

        let mut best_idx = 0usize;
        let mut best_similarity = f32::NEG_INFINITY;

        for (k, row) in self.centroids.chunks_exact(self.dim).enumerate() {
            let centroid_norm = self.norms[k];
            let similarity = if centroid_norm == 0.0 {
                0.0
            } else {
                let dot: f32 = query.iter().zip(row.iter()).map(|(a, b)| a * b).sum();
                dot / (query_norm * centroid_norm)
            };
            if similarity > best_similarity {
                best_similarity = similarity;
                best_idx = k;
            }
        }

        // confidence = 1 - distance = 1 - (1 - similarity) = similarity
        let confidence = best_similarity.clamp(0.0, 1.0);
        (self.ids[best_idx].clone(), confidence)
    }

    /// Assigns concepts to a whole batch in parallel. One dense pass per
    /// embedding rather than a per-query loop dispatched through the
    /// public `assign` API, since this is the hot path invoked once per
    /// embedded batch by the orchestrator.
    pub fn assign_batch(&self, embeddings: &[EmbeddingVector]) -> Vec<(ConceptId, f32)> {
        embeddings
            .par_iter()
            .map(|embedding| self.assign(embedding))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::EmbeddingVector;

    fn concept(id: &str, centroid: Vec<f32>) -> Concept {
        Concept::new(ConceptId::new(id).unwrap(), id.to_string(), EmbeddingVector::new(centroid).unwrap())
    }

    #[test]
    fn empty_catalog_assigns_the_unassigned_sentinel() {
        let assigner = ConceptAssigner::new(&[]);
        let embedding = EmbeddingVector::new(vec![1.0, 0.0]).unwrap();
        let (id, confidence) = assigner.assign(&embedding);
        assert_eq!(id.as_str(), "unassigned");
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn assigns_nearest_centroid_by_cosine_similarity() {
        let catalog = vec![concept("animal", vec![1.0, 0.0]), concept("plant", vec![0.0, 1.0])];
        let assigner = ConceptAssigner::new(&catalog);

        let close_to_animal = EmbeddingVector::new(vec![0.9, 0.1]).unwrap();
        let (id, confidence) = assigner.assign(&close_to_animal);
        assert_eq!(id.as_str(), "animal");
        assert!(confidence > 0.9);

        let close_to_plant = EmbeddingVector::new(vec![0.1, 0.9]).unwrap();
        assert_eq!(assigner.assign(&close_to_plant).0.as_str(), "plant");
    }

    #[test]
    fn mismatched_dimension_assigns_the_unassigned_sentinel() {
        let catalog = vec![concept("animal", vec![1.0, 0.0, 0.0])];
        let assigner = ConceptAssigner::new(&catalog);
        let embedding = EmbeddingVector::new(vec![1.0, 0.0]).unwrap();
        let (id, confidence) = assigner.assign(&embedding);
        assert_eq!(id.as_str(), "unassigned");
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn batch_assignment_matches_per_item_assignment() {
        let catalog = vec![concept("animal", vec![1.0, 0.0]), concept("plant", vec![0.0, 1.0])];
        let assigner = ConceptAssigner::new(&catalog);
        let embeddings = vec![
            EmbeddingVector::new(vec![0.9, 0.1]).unwrap(),
            EmbeddingVector::new(vec![0.1, 0.9]).unwrap()
        ];
        let results = assigner.assign_batch(&embeddings);
        assert_eq!(results[0].0.as_str(), "animal");
        assert_eq!(results[1].0.as_str(), "plant");
    }
}
