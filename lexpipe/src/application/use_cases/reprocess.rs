// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `reprocess`: re-runs the transform stage over raw rows that already
//! exist in the raw store, without re-ingesting. Unlike `process-pipeline`,
//! a source is effectively required — reprocessing the entire raw store
//! with no scope is just `process-pipeline` without a checkpoint, so an
//! absent `--source-id` falls back to a full unscoped rescan rather than
//! being treated as an error.

use crate::application::orchestrator::{Orchestrator, OrchestratorConfig, OrchestratorPorts, ReadScope};
use crate::infrastructure::config::PipelineConfig;
use lexpipe_bootstrap::shutdown::CancellationToken;
use lexpipe_domain::entities::RunMetrics;
use lexpipe_domain::value_objects::SourceId;
use lexpipe_domain::PipelineError;

pub async fn run(
    source_id: Option<String>,
    defaults: &PipelineConfig,
    ports: OrchestratorPorts,
    shutdown: CancellationToken,
) -> Result<RunMetrics, PipelineError> {
    let scope = match source_id {
        Some(ref id) => ReadScope::BySource { source_id: SourceId::from_string(id)?, resume_after: None },
        None => ReadScope::All { resume_after: None },
    };

    let config = OrchestratorConfig {
        scope,
        db_fetch_batch: defaults.db_fetch_batch,
        embedding_batch: defaults.embedding_batch,
        write_flush_threshold: defaults.db_write_batch,
        channel_capacity: defaults.channel_capacity,
        num_cleaners: defaults.num_cleaners,
        num_embedders: defaults.num_embedders,
        num_writers: defaults.num_writers,
        quality_min_chars: defaults.quality_threshold_chars,
        skip_duplicate_headwords: true,
    };

    Orchestrator::new(config, ports, shutdown).run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::orchestrator::OrchestratorPorts;
    use crate::infrastructure::embedding::{HashEmbeddingService, SqliteEmbeddingCache};
    use crate::infrastructure::repositories::{initialize_database, SqliteBulkWriter, SqliteRawStore};
    use crate::infrastructure::runtime::{GlobalResourceManager, ResourceConfig};
    use lexpipe_bootstrap::shutdown::ShutdownCoordinator;
    use lexpipe_domain::entities::RawRecord;
    use lexpipe_domain::services::RawStore;
    use lexpipe_domain::ConceptAssigner;
    use serde_json::json;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Duration;

    fn token() -> CancellationToken {
        ShutdownCoordinator::new(Duration::from_secs(5)).token()
    }

    async fn ports(pool: sqlx::SqlitePool) -> OrchestratorPorts {
        OrchestratorPorts {
            raw_store: Arc::new(SqliteRawStore::new(pool.clone())),
            bulk_writer: Arc::new(SqliteBulkWriter::new(pool.clone())),
            embedding_service: Arc::new(HashEmbeddingService::new(8, 1_000)),
            embedding_cache: Arc::new(SqliteEmbeddingCache::new(pool)),
            concept_assigner: Arc::new(ConceptAssigner::new(&[])),
            resource_manager: Arc::new(GlobalResourceManager::new(ResourceConfig::default()).unwrap()),
            metrics: None,
            abrupt_shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    #[tokio::test]
    async fn no_source_id_rescans_the_whole_raw_store() {
        let pool = initialize_database("sqlite::memory:", 1, 30).await.unwrap();
        let raw_store = SqliteRawStore::new(pool.clone());
        raw_store
            .bulk_append(vec![
                RawRecord::new(SourceId::new(), json!({"word": "cat", "lang_code": "en", "senses": [{"glosses": ["a small feline"]}]})),
                RawRecord::new(SourceId::new(), json!({"word": "dog", "lang_code": "en", "senses": [{"glosses": ["a domesticated carnivore"]}]})),
            ])
            .await
            .unwrap();

        let metrics = run(None, &PipelineConfig::default(), ports(pool).await, token()).await.unwrap();
        assert_eq!(metrics.records_read(), 2);
    }

    #[tokio::test]
    async fn source_id_rescans_only_that_source_with_no_checkpoint() {
        let pool = initialize_database("sqlite::memory:", 1, 30).await.unwrap();
        let raw_store = SqliteRawStore::new(pool.clone());
        let wanted = SourceId::new();
        raw_store
            .bulk_append(vec![
                RawRecord::new(wanted, json!({"word": "cat", "lang_code": "en", "senses": [{"glosses": ["a small feline"]}]})),
                RawRecord::new(SourceId::new(), json!({"word": "dog", "lang_code": "en", "senses": [{"glosses": ["a domesticated carnivore"]}]})),
            ])
            .await
            .unwrap();

        let metrics = run(Some(wanted.to_string()), &PipelineConfig::default(), ports(pool).await, token()).await.unwrap();
        assert_eq!(metrics.records_read(), 1);
    }

    #[tokio::test]
    async fn malformed_source_id_is_rejected_before_any_scan() {
        let pool = initialize_database("sqlite::memory:", 1, 30).await.unwrap();
        let result = run(Some("not-a-ulid".to_string()), &PipelineConfig::default(), ports(pool).await, token()).await;
        assert!(result.is_err());
    }
}
