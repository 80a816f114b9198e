// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Ports for bulk-writing and bulk-deleting canonical records: a
//! staging-table-then-upsert protocol for idempotent bulk writes, plus
//! targeted embedding-only updates and id/source-scoped deletes.

use crate::entities::CanonicalRecord;
use crate::value_objects::{ CanonicalRecordId, SourceId };
use crate::PipelineError;
use async_trait::async_trait;

#[async_trait]
pub trait BulkWriter: Send + Sync {
    /// Inserts records that are known not to exist yet. Used when the
    /// caller has already deduplicated against the target table.
    async fn bulk_insert(&self, records: &[CanonicalRecord]) -> Result<u64, PipelineError>;

    /// Inserts-or-updates records by id via the staging-table protocol
    /// (§9 Decision 1): copy into a temporary table, then
    /// `INSERT ... SELECT ... ON CONFLICT (id) DO UPDATE SET ...`. Returns
    /// the number of rows affected.
    async fn bulk_upsert(&self, records: &[CanonicalRecord]) -> Result<u64, PipelineError>;

    /// Updates only the `embedding`/`concept_id` columns for an existing
    /// set of ids, used by the Writer stage when a record's text fields
    /// were already persisted by an earlier run and only the embedding is
    /// new.
    async fn bulk_update_embeddings(
        &self,
        updates: &[(CanonicalRecordId, Vec<f32>)]
    ) -> Result<u64, PipelineError>;
}

#[async_trait]
pub trait BulkDeleter: Send + Sync {
    /// Deletes records by id, returning the number of rows removed.
    async fn bulk_delete_by_ids(&self, ids: &[CanonicalRecordId]) -> Result<u64, PipelineError>;

    /// Deletes every record that came from one ingestion source, used for
    /// source retraction and test teardown.
    async fn bulk_delete_by_source(&self, source_id: SourceId) -> Result<u64, PipelineError>;
}
