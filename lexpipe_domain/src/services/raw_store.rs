// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Port for the append-only raw record store that backs the Reader stage.

use crate::entities::RawRecord;
use crate::value_objects::{ RawRecordId, SourceId };
use crate::PipelineError;
use async_trait::async_trait;

/// A page of raw records plus the cursor to resume from, used by both the
/// `ingest-raw` append path and the `process-pipeline` Reader's
/// `paged_scan`.
pub struct RawRecordPage {
    pub records: Vec<RawRecord>,
    pub next_cursor: Option<RawRecordId>,
}

#[async_trait]
pub trait RawStore: Send + Sync {
    /// Appends a batch of already-parsed raw records. Ingestion never
    /// mutates or deletes existing rows.
    async fn bulk_append(&self, records: Vec<RawRecord>) -> Result<(), PipelineError>;

    /// Reads one page of raw records in ID order, optionally resuming
    /// after `after` (used by `--resume-after` on `process-pipeline`).
    async fn paged_scan(&self, after: Option<RawRecordId>, limit: usize) -> Result<RawRecordPage, PipelineError>;

    /// Reads every raw record belonging to one ingestion source, used by
    /// the `reprocess` command.
    async fn scan_by_source(&self, source_id: SourceId, after: Option<RawRecordId>, limit: usize) -> Result<
        RawRecordPage,
        PipelineError
    >;
}
