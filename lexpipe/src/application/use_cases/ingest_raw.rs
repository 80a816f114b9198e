// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `ingest-raw`: loads source files from a directory into the raw store.
//!
//! Source-specific parsing (CSV, XML, PDF scrapers) is out of scope; the
//! one format this use case reads concretely is JSONL, the shape every
//! other component (cleaning pipeline, tests) already assumes. Any other
//! `--format` value is rejected up front rather than silently
//! misinterpreted.

use lexpipe_domain::entities::RawRecord;
use lexpipe_domain::services::RawStore;
use lexpipe_domain::value_objects::SourceId;
use lexpipe_domain::PipelineError;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub files_scanned: u64,
    pub lines_read: u64,
    pub records_ingested: u64,
    pub lines_skipped: u64,
}

/// Runs one `ingest-raw` invocation: reads every file in `source_dir`
/// (non-recursive, processed in sorted order for reproducibility) as
/// JSON Lines and appends the parsed records to `raw_store` in batches of
/// `batch_size`.
pub async fn run(
    raw_store: &Arc<dyn RawStore>,
    source_dir: &Path,
    source_id: &str,
    format: &str,
    batch_size: usize,
) -> Result<IngestSummary, PipelineError> {
    if !format.eq_ignore_ascii_case("jsonl") {
        return Err(PipelineError::InvalidConfiguration(format!(
            "unsupported source format '{format}': only 'jsonl' is implemented, source-specific parsers are out of scope"
        )));
    }

    let source_id = SourceId::from_string(source_id)?;

    let mut entries: Vec<_> = std::fs::read_dir(source_dir)?
        .collect::<Result<Vec<_>, std::io::Error>>()?
        .into_iter()
        .filter(|e| e.path().is_file())
        .collect();
    entries.sort_by_key(|e| e.path());

    let mut summary = IngestSummary { files_scanned: 0, lines_read: 0, records_ingested: 0, lines_skipped: 0 };
    let mut pending = Vec::with_capacity(batch_size);

    for entry in entries {
        summary.files_scanned += 1;
        let contents = std::fs::read_to_string(entry.path())?;
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            summary.lines_read += 1;

            match serde_json::from_str::<serde_json::Value>(line) {
                Ok(payload) => pending.push(RawRecord::new(source_id, payload)),
                Err(e) => {
                    tracing::warn!(file = %entry.path().display(), error = %e, "skipping malformed JSONL line");
                    summary.lines_skipped += 1;
                    continue;
                }
            }

            if pending.len() >= batch_size {
                let n = pending.len() as u64;
                raw_store.bulk_append(std::mem::take(&mut pending)).await?;
                summary.records_ingested += n;
            }
        }
    }

    if !pending.is_empty() {
        summary.records_ingested += pending.len() as u64;
        raw_store.bulk_append(pending).await?;
    }

    tracing::info!(
        files = summary.files_scanned,
        lines = summary.lines_read,
        ingested = summary.records_ingested,
        skipped = summary.lines_skipped,
        "ingest-raw complete",
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lexpipe_domain::services::RawRecordPage;
    use lexpipe_domain::value_objects::RawRecordId;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingRawStore {
        appended: Mutex<Vec<RawRecord>>,
    }

    #[async_trait]
    impl RawStore for RecordingRawStore {
        async fn bulk_append(&self, records: Vec<RawRecord>) -> Result<(), PipelineError> {
            self.appended.lock().unwrap().extend(records);
            Ok(())
        }

        async fn paged_scan(&self, _after: Option<RawRecordId>, _limit: usize) -> Result<RawRecordPage, PipelineError> {
            unimplemented!("not exercised by ingest-raw tests")
        }

        async fn scan_by_source(
            &self,
            _source_id: SourceId,
            _after: Option<RawRecordId>,
            _limit: usize,
        ) -> Result<RawRecordPage, PipelineError> {
            unimplemented!("not exercised by ingest-raw tests")
        }
    }

    #[tokio::test]
    async fn ingests_well_formed_lines_and_skips_malformed_ones() {
        let dir = tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("dump.jsonl")).unwrap();
        writeln!(file, r#"{{"word": "cat", "lang_code": "en"}}"#).unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(file, r#"{{"word": "dog", "lang_code": "en"}}"#).unwrap();
        drop(file);

        let store: Arc<dyn RawStore> = Arc::new(RecordingRawStore::default());
        let source_id = SourceId::new().to_string();
        let summary = run(&store, dir.path(), &source_id, "jsonl", 10).await.unwrap();

        assert_eq!(summary.lines_read, 3);
        assert_eq!(summary.records_ingested, 2);
        assert_eq!(summary.lines_skipped, 1);
    }

    #[tokio::test]
    async fn rejects_unsupported_formats() {
        let dir = tempdir().unwrap();
        let store: Arc<dyn RawStore> = Arc::new(RecordingRawStore::default());
        let source_id = SourceId::new().to_string();
        let result = run(&store, dir.path(), &source_id, "csv", 10).await;
        assert!(matches!(result, Err(PipelineError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn flushes_batches_at_the_configured_size() {
        let dir = tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("dump.jsonl")).unwrap();
        for i in 0..5 {
            writeln!(file, r#"{{"word": "w{i}", "lang_code": "en"}}"#).unwrap();
        }
        drop(file);

        let store = Arc::new(RecordingRawStore::default());
        let dyn_store: Arc<dyn RawStore> = store.clone();
        let source_id = SourceId::new().to_string();
        let summary = run(&dyn_store, dir.path(), &source_id, "jsonl", 2).await.unwrap();

        assert_eq!(summary.records_ingested, 5);
        assert_eq!(store.appended.lock().unwrap().len(), 5);
    }
}
