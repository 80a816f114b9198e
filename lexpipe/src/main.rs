// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Composition root: wires the bootstrap CLI layer to the application use
//! cases and runs them to completion, mapping the result to a process exit
//! code.

use lexpipe::application::orchestrator::OrchestratorPorts;
use lexpipe::application::use_cases::{ingest_raw, process_pipeline, reprocess, retract_source};
use lexpipe::infrastructure::concept_catalog::load_concept_catalog;
use lexpipe::infrastructure::config::LexPipeConfig;
use lexpipe::infrastructure::embedding::{HashEmbeddingService, SqliteEmbeddingCache};
use lexpipe::infrastructure::logging::init_logging;
use lexpipe::infrastructure::metrics::{MetricsEndpoint, MetricsService};
use lexpipe::infrastructure::repositories::{initialize_database, SqliteBulkWriter, SqliteRawStore};
use lexpipe::infrastructure::runtime::{AcceleratorProfile, GlobalResourceManager, ResourceConfig};
use lexpipe::infrastructure::sources_catalog::load_sources_catalog;
use lexpipe::{ConceptAssigner, PipelineError};
use lexpipe_bootstrap::shutdown::ShutdownCoordinator;
use lexpipe_bootstrap::{bootstrap_cli, result_to_exit_code, signals, ValidatedCommand};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const METRICS_ADDR: &str = "127.0.0.1:9898";

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = match bootstrap_cli() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("argument error: {e}");
            return std::process::ExitCode::from(65);
        }
    };

    init_logging(cli.verbose);

    let signal_count = Arc::new(AtomicUsize::new(0));
    let result = run(cli, signal_count.clone()).await;
    if let Err(ref e) = result {
        tracing::error!(error = %e, "run failed");
    }
    let cancelled = signal_count.load(Ordering::SeqCst) > 0;
    result_to_exit_code(result, cancelled)
}

async fn run(cli: lexpipe_bootstrap::ValidatedCli, signal_count: Arc<AtomicUsize>) -> Result<(), PipelineError> {
    let mut config = LexPipeConfig::load(cli.config.as_deref())?;
    config.pipeline.channel_capacity = cli.channel_depth;

    if let Some(ref backend) = cli.storage_type {
        if !backend.eq_ignore_ascii_case("sqlite") {
            tracing::warn!(%backend, "only the sqlite storage backend is implemented, ignoring override");
        }
    }

    let resource_config = ResourceConfig {
        cpu_tokens: cli.cpu_threads,
        io_tokens: cli.io_threads,
        accelerator: AcceleratorProfile::SingleDevice,
        memory_limit: None,
    };
    let resource_manager = Arc::new(GlobalResourceManager::new(resource_config)?);

    let pool = initialize_database(&config.database.url, config.database.max_connections, config.database.command_timeout_secs)
        .await
        .map_err(|e| PipelineError::internal(format!("database init: {e}")))?;

    let metrics = Arc::new(MetricsService::new()?);
    {
        let metrics = metrics.clone();
        tokio::spawn(async move {
            if let Err(e) = MetricsEndpoint::new((*metrics).clone()).serve(METRICS_ADDR).await {
                tracing::warn!(error = %e, "metrics endpoint exited");
            }
        });
    }

    let shutdown_coordinator = ShutdownCoordinator::default();
    signals::install(shutdown_coordinator.clone(), signal_count.clone());
    let abrupt_shutdown = Arc::new(AtomicBool::new(false));
    {
        let signal_count = signal_count.clone();
        let abrupt_shutdown = abrupt_shutdown.clone();
        tokio::spawn(async move {
            loop {
                if signal_count.load(Ordering::SeqCst) >= 2 {
                    abrupt_shutdown.store(true, Ordering::SeqCst);
                    break;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        });
    }
    let shutdown = shutdown_coordinator.token();

    let result = match cli.command {
        ValidatedCommand::IngestRaw { source_dir, source_id, format } => {
            if let Some(ref path) = config.sources_catalog_path {
                match load_sources_catalog(Path::new(path)) {
                    Ok(sources) if !sources.contains_key(&source_id) => {
                        tracing::warn!(%source_id, catalog = %path, "source-id not present in sources catalog");
                    }
                    Err(e) => tracing::warn!(error = %e, catalog = %path, "failed to load sources catalog"),
                    _ => {}
                }
            }

            let raw_store: Arc<dyn lexpipe_domain::services::RawStore> = Arc::new(SqliteRawStore::new(pool.clone()));
            ingest_raw::run(&raw_store, &source_dir, &source_id, &format, config.pipeline.db_write_batch)
                .await
                .map(|s| tracing::info!(?s, "ingest-raw finished"))
        }
        ValidatedCommand::ProcessPipeline {
            source_id,
            resume_from,
            db_fetch_batch,
            embedding_batch,
            db_write_batch,
            num_cleaners,
            num_writers,
            quality_threshold,
        } => {
            let ports = build_orchestrator_ports(&config, &pool, resource_manager.clone(), metrics.clone(), abrupt_shutdown.clone())?;
            let args = process_pipeline::ProcessPipelineArgs {
                source_id,
                resume_from,
                db_fetch_batch,
                embedding_batch,
                db_write_batch,
                num_cleaners,
                num_writers,
                quality_threshold,
            };
            process_pipeline::run(args, &config.pipeline, ports, shutdown.clone())
                .await
                .map(|m| tracing::info!(?m, "process-pipeline finished"))
        }
        ValidatedCommand::Reprocess { source_id } => {
            let ports = build_orchestrator_ports(&config, &pool, resource_manager.clone(), metrics.clone(), abrupt_shutdown.clone())?;
            reprocess::run(source_id, &config.pipeline, ports, shutdown.clone())
                .await
                .map(|m| tracing::info!(?m, "reprocess finished"))
        }
        ValidatedCommand::RetractSource { source_id } => {
            let bulk_deleter: Arc<dyn lexpipe_domain::services::BulkDeleter> = Arc::new(SqliteBulkWriter::new(pool.clone()));
            retract_source::run(&bulk_deleter, &source_id)
                .await
                .map(|s| tracing::info!(?s, "retract-source finished"))
        }
    };

    shutdown_coordinator.complete_shutdown();
    result
}

fn build_orchestrator_ports(
    config: &LexPipeConfig,
    pool: &sqlx::SqlitePool,
    resource_manager: Arc<GlobalResourceManager>,
    metrics: Arc<MetricsService>,
    abrupt_shutdown: Arc<AtomicBool>,
) -> Result<OrchestratorPorts, PipelineError> {
    let catalog = match &config.concept_catalog_path {
        Some(path) => load_concept_catalog(Path::new(path), config.embedding.dimension)?,
        None => Vec::new(),
    };

    let concept_assigner = ConceptAssigner::new(&catalog);
    if concept_assigner.is_empty() {
        tracing::warn!("concept catalog is empty, every record will be assigned the unassigned sentinel concept");
    }

    Ok(OrchestratorPorts {
        raw_store: Arc::new(SqliteRawStore::new(pool.clone())),
        bulk_writer: Arc::new(SqliteBulkWriter::new(pool.clone())),
        embedding_service: Arc::new(HashEmbeddingService::new(config.embedding.dimension, config.pipeline.embedding_batch)),
        embedding_cache: Arc::new(SqliteEmbeddingCache::with_ttl_secs(pool.clone(), config.embedding.cache_ttl_secs)),
        concept_assigner: Arc::new(concept_assigner),
        resource_manager,
        metrics: Some(metrics),
        abrupt_shutdown,
    })
}
