// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `process-pipeline`: runs the clean → embed → assign → upsert pipeline
//! over the raw store, optionally restricted to one source and/or
//! resumed from a checkpoint.

use crate::application::orchestrator::{Orchestrator, OrchestratorConfig, OrchestratorPorts, ReadScope};
use crate::infrastructure::config::PipelineConfig;
use lexpipe_bootstrap::shutdown::CancellationToken;
use lexpipe_domain::entities::RunMetrics;
use lexpipe_domain::value_objects::{RawRecordId, SourceId};
use lexpipe_domain::PipelineError;

/// Arguments carried over from `ValidatedCommand::ProcessPipeline`,
/// already security-validated by the bootstrap CLI layer.
pub struct ProcessPipelineArgs {
    pub source_id: Option<String>,
    pub resume_from: Option<String>,
    pub db_fetch_batch: Option<usize>,
    pub embedding_batch: Option<usize>,
    pub db_write_batch: Option<usize>,
    pub num_cleaners: Option<usize>,
    pub num_writers: Option<usize>,
    pub quality_threshold: Option<usize>,
}

pub async fn run(
    args: ProcessPipelineArgs,
    defaults: &PipelineConfig,
    ports: OrchestratorPorts,
    shutdown: CancellationToken,
) -> Result<RunMetrics, PipelineError> {
    let resume_after = args.resume_from.map(|s| RawRecordId::from_string(&s)).transpose()?;

    let scope = match args.source_id {
        Some(ref id) => ReadScope::BySource { source_id: SourceId::from_string(id)?, resume_after },
        None => ReadScope::All { resume_after },
    };

    let config = OrchestratorConfig {
        scope,
        db_fetch_batch: args.db_fetch_batch.unwrap_or(defaults.db_fetch_batch),
        embedding_batch: args.embedding_batch.unwrap_or(defaults.embedding_batch),
        write_flush_threshold: args.db_write_batch.unwrap_or(defaults.db_write_batch),
        channel_capacity: defaults.channel_capacity,
        num_cleaners: args.num_cleaners.unwrap_or(defaults.num_cleaners),
        num_embedders: defaults.num_embedders,
        num_writers: args.num_writers.unwrap_or(defaults.num_writers),
        quality_min_chars: args.quality_threshold.unwrap_or(defaults.quality_threshold_chars),
        skip_duplicate_headwords: true,
    };

    Orchestrator::new(config, ports, shutdown).run().await
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn bare_args() -> ProcessPipelineArgs {
        ProcessPipelineArgs {
            source_id: None,
            resume_from: None,
            db_fetch_batch: None,
            embedding_batch: None,
            db_write_batch: None,
            num_cleaners: None,
            num_writers: None,
            quality_threshold: None,
        }
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
    async fn absent_source_id_scans_the_whole_raw_store() {
        let pool = initialize_database("sqlite::memory:", 1, 30).await.unwrap();
        let raw_store = SqliteRawStore::new(pool.clone());
        raw_store
            .bulk_append(vec![
                RawRecord::new(SourceId::new(), json!({"word": "cat", "lang_code": "en", "senses": [{"glosses": ["a small feline"]}]})),
                RawRecord::new(SourceId::new(), json!({"word": "dog", "lang_code": "en", "senses": [{"glosses": ["a domesticated carnivore"]}]})),
            ])
            .await
            .unwrap();

        let metrics = run(bare_args(), &PipelineConfig::default(), ports(pool).await, token()).await.unwrap();
        assert_eq!(metrics.records_read(), 2);
    }

    #[tokio::test]
    async fn source_id_restricts_the_scan_to_one_source() {
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

        let mut args = bare_args();
        args.source_id = Some(wanted.to_string());
        let metrics = run(args, &PipelineConfig::default(), ports(pool).await, token()).await.unwrap();
        assert_eq!(metrics.records_read(), 1);
    }

    #[tokio::test]
    async fn malformed_source_id_is_rejected_before_any_scan() {
        let pool = initialize_database("sqlite::memory:", 1, 30).await.unwrap();
        let mut args = bare_args();
        args.source_id = Some("not-a-ulid".to_string());
        let result = run(args, &PipelineConfig::default(), ports(pool).await, token()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn malformed_resume_cursor_is_rejected_before_any_scan() {
        let pool = initialize_database("sqlite::memory:", 1, 30).await.unwrap();
        let mut args = bare_args();
        args.resume_from = Some("not-a-ulid".to_string());
        let result = run(args, &PipelineConfig::default(), ports(pool).await, token()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn per_run_overrides_take_precedence_over_defaults() {
        let pool = initialize_database("sqlite::memory:", 1, 30).await.unwrap();
        let raw_store = SqliteRawStore::new(pool.clone());
        for i in 0..3 {
            raw_store
                .bulk_append(vec![RawRecord::new(
                    SourceId::new(),
                    json!({"word": format!("w{i}"), "lang_code": "en", "senses": [{"glosses": ["a test entry with enough characters"]}]}),
                )])
                .await
                .unwrap();
        }

        let mut args = bare_args();
        args.quality_threshold = Some(1_000); // unreachable threshold: every record should be rejected
        let metrics = run(args, &PipelineConfig::default(), ports(pool).await, token()).await.unwrap();
        assert_eq!(metrics.records_read(), 3);
        assert_eq!(metrics.records_rejected(), 3);
        assert_eq!(metrics.records_written(), 0);
    }
}
