// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Dense embedding vector value object.
//!
//! Wraps a `Vec<f32>` of fixed dimensionality `D`, validated to be free of
//! NaN/infinite components. `D` is a run-time parameter (the catalog and
//! every embedding produced in a run must agree on it) rather than a const
//! generic, since it is read from configuration, not known at compile time.

use crate::PipelineError;
use serde::{ Deserialize, Serialize };

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    /// Validates and wraps a raw vector. Rejects empty vectors and any
    /// NaN/infinite component, both of which would silently corrupt the
    /// nearest-centroid matmul in `ConceptAssigner`.
    pub fn new(values: Vec<f32>) -> Result<Self, PipelineError> {
        if values.is_empty() {
            return Err(PipelineError::validation("embedding vector cannot be empty"));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::validation("embedding vector contains NaN or infinite component"));
        }
        Ok(Self(values))
    }

    /// Validates that this vector has the expected dimensionality.
    pub fn expect_dim(&self, expected: usize) -> Result<(), PipelineError> {
        if self.0.len() != expected {
            return Err(
                PipelineError::validation(
                    format!("embedding has dimension {}, expected {}", self.0.len(), expected)
                )
            );
        }
        Ok(())
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.0
    }

    pub fn l2_norm(&self) -> f32 {
        self.0.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    pub fn dot(&self, other: &EmbeddingVector) -> f32 {
        self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum()
    }

    /// Cosine similarity against another vector of equal dimension.
    /// Returns 0.0 if either vector has zero magnitude.
    pub fn cosine_similarity(&self, other: &EmbeddingVector) -> f32 {
        let denom = self.l2_norm() * other.l2_norm();
        if denom == 0.0 { 0.0 } else { self.dot(other) / denom }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_nan() {
        assert!(EmbeddingVector::new(vec![]).is_err());
        assert!(EmbeddingVector::new(vec![1.0, f32::NAN]).is_err());
        assert!(EmbeddingVector::new(vec![1.0, f32::INFINITY]).is_err());
    }

    #[test]
    fn expect_dim_checks_length() {
        let v = EmbeddingVector::new(vec![1.0, 2.0, 3.0]).unwrap();
        assert!(v.expect_dim(3).is_ok());
        assert!(v.expect_dim(4).is_err());
    }

    #[test]
    fn identical_vectors_have_cosine_similarity_one() {
        let v = EmbeddingVector::new(vec![1.0, 2.0, 3.0]).unwrap();
        assert!((v.cosine_similarity(&v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_have_zero_similarity() {
        let a = EmbeddingVector::new(vec![1.0, 0.0]).unwrap();
        let b = EmbeddingVector::new(vec![0.0, 1.0]).unwrap();
        assert!(a.cosine_similarity(&b).abs() < 1e-6);
    }
}
