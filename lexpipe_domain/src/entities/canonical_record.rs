// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `CanonicalRecord`: a cleaned, validated dictionary entry ready for
//! embedding, concept assignment, and bulk upsert.

use crate::entities::TransformStep;
use crate::value_objects::{ CanonicalRecordId, ConceptId, EmbeddingVector, LanguageCode, SourceId };
use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };

/// A cleaned dictionary entry, addressable by a deterministic id derived
/// from `(headword, language, definition)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    id: CanonicalRecordId,
    source_id: SourceId,
    headword: String,
    ipa: Option<String>,
    language: LanguageCode,
    definition: String,
    etymology: Option<String>,
    pos_tag: Option<String>,
    embedding: Option<EmbeddingVector>,
    concept_id: Option<ConceptId>,
    data_quality: f32,
    transform_history: Vec<TransformStep>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CanonicalRecord {
    /// Builds a canonical record from already-cleaned fields. Callers are
    /// expected to have run the cleaning pipeline and quality gate first;
    /// this constructor only derives the id and stamps timestamps.
    /// `data_quality` is a placeholder until `with_concept` overwrites it
    /// with the concept-assignment confidence.
    pub fn new(
        source_id: SourceId,
        headword: String,
        ipa: Option<String>,
        language: LanguageCode,
        definition: String,
        etymology: Option<String>,
        pos_tag: Option<String>,
        data_quality: f32
    ) -> Self {
        let id = CanonicalRecordId::derive(&headword, language.as_str(), &definition);
        let now = Utc::now();
        Self {
            id,
            source_id,
            headword,
            ipa,
            language,
            definition,
            etymology,
            pos_tag,
            embedding: None,
            concept_id: None,
            data_quality,
            transform_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &CanonicalRecordId {
        &self.id
    }

    pub fn source_id(&self) -> SourceId {
        self.source_id
    }

    pub fn headword(&self) -> &str {
        &self.headword
    }

    pub fn ipa(&self) -> Option<&str> {
        self.ipa.as_deref()
    }

    pub fn language(&self) -> &LanguageCode {
        &self.language
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn etymology(&self) -> Option<&str> {
        self.etymology.as_deref()
    }

    pub fn pos_tag(&self) -> Option<&str> {
        self.pos_tag.as_deref()
    }

    pub fn embedding(&self) -> Option<&EmbeddingVector> {
        self.embedding.as_ref()
    }

    pub fn concept_id(&self) -> Option<&ConceptId> {
        self.concept_id.as_ref()
    }

    pub fn data_quality(&self) -> f32 {
        self.data_quality
    }

    pub fn transform_history(&self) -> &[TransformStep] {
        &self.transform_history
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Records that a cleaner ran against this entry, for audit/debugging.
    pub fn record_transform(&mut self, step: TransformStep) {
        self.transform_history.push(step);
    }

    /// Attaches an embedding computed by the Embedding Engine.
    pub fn with_embedding(mut self, embedding: EmbeddingVector) -> Self {
        self.embedding = Some(embedding);
        self.updated_at = Utc::now();
        self
    }

    /// Attaches a concept assignment computed by the Concept Assigner.
    /// `confidence` (`1 - cosine distance` to the chosen centroid) becomes
    /// this record's `data_quality`.
    pub fn with_concept(mut self, concept_id: ConceptId, confidence: f32) -> Self {
        self.concept_id = Some(concept_id);
        self.data_quality = confidence;
        self.updated_at = Utc::now();
        self
    }
}
