// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Value objects: small, immutable, self-validating types used throughout
//! the domain model in place of bare `String`/`Vec<f32>`/`u64`.

mod checksum;
mod concept_id;
mod embedding_vector;
mod language_code;
mod raw_record_id;
mod record_id;
mod source_id;
mod worker_count;

pub use checksum::Checksum;
pub use concept_id::ConceptId;
pub use embedding_vector::EmbeddingVector;
pub use language_code::LanguageCode;
pub use raw_record_id::RawRecordId;
pub use record_id::CanonicalRecordId;
pub use source_id::SourceId;
pub use worker_count::WorkerCount;
