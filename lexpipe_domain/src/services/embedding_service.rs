// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Port for the embedding accelerator used by the Embedding Engine stage.

use crate::value_objects::EmbeddingVector;
use crate::PipelineError;
use async_trait::async_trait;

#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embeds a batch of texts in one call. The caller (the Embedding
    /// Engine worker) owns the GPU-OOM batch-halving retry policy: this
    /// trait just reports `PipelineError::AcceleratorOom` when the
    /// accelerator rejects a batch as too large.
    async fn embed(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>, PipelineError>;

    /// The dimensionality this service produces, used to validate the
    /// concept catalog and every embedding against a single consistent
    /// `D`.
    fn dimension(&self) -> usize;
}
