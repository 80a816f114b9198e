// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `Concept`: one entry of the precomputed concept catalog.
//!
//! Concept discovery (clustering embeddings into concepts, labeling them)
//! is explicitly out of scope; a `Concept` here is just a centroid and a
//! human-readable label, loaded once from an external catalog file at
//! orchestrator startup and used read-only by `ConceptAssigner`.

use crate::value_objects::{ ConceptId, EmbeddingVector };
use serde::{ Deserialize, Serialize };

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    id: ConceptId,
    label: String,
    centroid: EmbeddingVector,
}

impl Concept {
    pub fn new(id: ConceptId, label: String, centroid: EmbeddingVector) -> Self {
        Self { id, label, centroid }
    }

    pub fn id(&self) -> &ConceptId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn centroid(&self) -> &EmbeddingVector {
        &self.centroid
    }
}
