// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `retract-source`: removes every canonical record that came from one
//! ingestion source, via `BulkDeleter::bulk_delete_by_source`. Leaves the
//! raw store untouched — re-ingesting the same source is what repopulates
//! it.

use lexpipe_domain::services::BulkDeleter;
use lexpipe_domain::value_objects::SourceId;
use lexpipe_domain::PipelineError;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct RetractSummary {
    pub source_id: String,
    pub records_deleted: u64,
}

pub async fn run(bulk_deleter: &Arc<dyn BulkDeleter>, source_id: &str) -> Result<RetractSummary, PipelineError> {
    let parsed = SourceId::from_string(source_id)?;
    let records_deleted = bulk_deleter.bulk_delete_by_source(parsed).await?;

    tracing::info!(source_id, records_deleted, "retract-source complete");

    Ok(RetractSummary { source_id: source_id.to_string(), records_deleted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lexpipe_domain::value_objects::CanonicalRecordId;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingDeleter {
        deleted_sources: Mutex<Vec<SourceId>>,
    }

    #[async_trait]
    impl BulkDeleter for RecordingDeleter {
        async fn bulk_delete_by_ids(&self, _ids: &[CanonicalRecordId]) -> Result<u64, PipelineError> {
            unimplemented!("not exercised by retract-source tests")
        }

        async fn bulk_delete_by_source(&self, source_id: SourceId) -> Result<u64, PipelineError> {
            self.deleted_sources.lock().unwrap().push(source_id);
            Ok(3)
        }
    }

    #[tokio::test]
    async fn deletes_by_source_and_reports_count() {
        let deleter = Arc::new(RecordingDeleter::default());
        let dyn_deleter: Arc<dyn BulkDeleter> = deleter.clone();
        let source_id = SourceId::new().to_string();

        let summary = run(&dyn_deleter, &source_id).await.unwrap();

        assert_eq!(summary.records_deleted, 3);
        assert_eq!(deleter.deleted_sources.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_malformed_source_id() {
        let deleter: Arc<dyn BulkDeleter> = Arc::new(RecordingDeleter::default());
        let result = run(&deleter, "not a valid source id").await;
        assert!(result.is_err());
    }
}
