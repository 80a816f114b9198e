// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Port for the embedding cache fronting the Embedding Engine.
//!
//! TTL is fixed at 604800 seconds (7 days), mirroring the original
//! implementation's `cache.py`. Cache unavailability degrades gracefully:
//! implementations should treat a backend error as an all-miss result
//! rather than failing the batch (§7 error taxonomy: cache errors are
//! never fatal).

use crate::value_objects::EmbeddingVector;
use crate::PipelineError;
use async_trait::async_trait;

/// Default cache entry lifetime: 7 days, matching the original service.
pub const DEFAULT_TTL_SECS: u64 = 604_800;

/// Result of a batched cache lookup: hits in encounter order, paired with
/// the keys that missed.
pub struct CacheLookup {
    pub hits: Vec<(String, EmbeddingVector)>,
    pub misses: Vec<String>,
}

#[async_trait]
pub trait EmbeddingCache: Send + Sync {
    /// Looks up a batch of cache keys (typically a checksum of the
    /// cleaned text) in one round trip.
    async fn get_many(&self, keys: &[String]) -> Result<CacheLookup, PipelineError>;

    /// Writes a batch of freshly computed embeddings with the default
    /// TTL. Implementations should log and continue (not propagate) a
    /// backend failure here: a cache write failure must never fail the
    /// batch that produced the embeddings.
    async fn set_many(&self, entries: &[(String, EmbeddingVector)]) -> Result<(), PipelineError>;
}
