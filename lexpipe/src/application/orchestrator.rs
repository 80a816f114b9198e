// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The pipeline orchestrator: a Reader, N Cleaners, M Embedders, and K
//! Writers connected by bounded `tokio::sync::mpsc` channels, terminated
//! by a sentinel-propagation protocol rather than closing the channels
//! directly (closing would race with in-flight data batches).
//!
//! Termination protocol:
//! 1. The Reader exhausts its scan, sends one `Batch::Sentinel` per
//!    cleaner onto `raw_q`, then exits.
//! 2. Each Cleaner competes for items on the shared `raw_q` receiver.
//!    Since exactly N sentinels are sent for N cleaners, and a cleaner
//!    keeps pulling until it personally receives one, every cleaner gets
//!    exactly one. On receipt it forwards one `Batch::Sentinel` onto
//!    `cleaned_q` and exits.
//! 3. Each Embedder also competes on the shared `cleaned_q` receiver. A
//!    shared atomic counter tracks how many of the N cleaned-sentinels
//!    have been observed across *all* embedders (not just the one that
//!    received each one), since other cleaners' data may still be
//!    in-flight behind an already-received sentinel. Whichever embedder's
//!    receipt makes the counter reach N sends K sentinels onto
//!    `embedded_q` and exits; every other embedder keeps processing data
//!    until `cleaned_q` closes (its last sender, held by a cleaner,
//!    dropped) and `recv()` returns `None`.
//! 4. Each Writer competes on the shared `embedded_q` receiver; K
//!    sentinels for K writers means each gets exactly one, flushes its
//!    buffer via `bulk_upsert`, and exits — the same simple pattern as
//!    step 2.

use crate::application::cleaning_pipeline::{clean_record, CleaningPipelines};
use crate::infrastructure::metrics::MetricsService;
use crate::infrastructure::runtime::GlobalResourceManager;
use lexpipe_bootstrap::shutdown::CancellationToken;
use lexpipe_domain::cleaning::DedupBuffer;
use lexpipe_domain::entities::{CanonicalRecord, RawRecord, RunMetrics};
use lexpipe_domain::quality_gate::{MinDefinitionLength, QualityGate, RequiredHeadword};
use lexpipe_domain::services::{BulkWriter, CacheLookup, EmbeddingCache, EmbeddingService, RawStore};
use lexpipe_domain::value_objects::{Checksum, EmbeddingVector, RawRecordId, SourceId};
use lexpipe_domain::{ConceptAssigner, PipelineError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex as AsyncMutex};

/// One item flowing through an inter-stage channel: either a batch of
/// records or a termination marker.
enum Batch<T> {
    Data(Vec<T>),
    Sentinel,
}

/// What subset of raw records the Reader scans. `process-pipeline` scans
/// everything (optionally resuming); `reprocess` scans one source.
#[derive(Clone)]
pub enum ReadScope {
    All { resume_after: Option<RawRecordId> },
    BySource { source_id: SourceId, resume_after: Option<RawRecordId> },
}

pub struct OrchestratorConfig {
    pub scope: ReadScope,
    pub db_fetch_batch: usize,
    pub embedding_batch: usize,
    pub write_flush_threshold: usize,
    pub channel_capacity: usize,
    pub num_cleaners: usize,
    pub num_embedders: usize,
    pub num_writers: usize,
    pub quality_min_chars: usize,
    pub skip_duplicate_headwords: bool,
}

/// The I/O-bound collaborators the orchestrator wires together. All are
/// behind `Arc` so every worker task can hold a clone.
pub struct OrchestratorPorts {
    pub raw_store: Arc<dyn RawStore>,
    pub bulk_writer: Arc<dyn BulkWriter>,
    pub embedding_service: Arc<dyn EmbeddingService>,
    pub embedding_cache: Arc<dyn EmbeddingCache>,
    pub concept_assigner: Arc<ConceptAssigner>,
    pub resource_manager: Arc<GlobalResourceManager>,
    pub metrics: Option<Arc<MetricsService>>,
    /// Flipped by the caller on a second stop signal. A graceful shutdown
    /// (the `shutdown` token alone) still flushes writer buffers before
    /// exiting; an abrupt one skips the final flush.
    pub abrupt_shutdown: Arc<AtomicBool>,
}

#[derive(Default)]
struct AtomicCounters {
    read: AtomicUsize,
    cleaned: AtomicUsize,
    rejected: AtomicUsize,
    embedded: AtomicUsize,
    written: AtomicUsize,
    oom_halvings: AtomicUsize,
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
}

impl AtomicCounters {
    fn to_run_metrics(&self) -> RunMetrics {
        let mut metrics = RunMetrics::new();
        metrics.record_read(self.read.load(Ordering::Relaxed) as u64);
        metrics.record_cleaned(self.cleaned.load(Ordering::Relaxed) as u64);
        metrics.record_rejected(self.rejected.load(Ordering::Relaxed) as u64);
        metrics.record_embedded(self.embedded.load(Ordering::Relaxed) as u64);
        metrics.record_written(self.written.load(Ordering::Relaxed) as u64);
        for _ in 0..self.oom_halvings.load(Ordering::Relaxed) {
            metrics.record_oom_halving();
        }
        metrics.record_cache_hit(
            self.cache_hits.load(Ordering::Relaxed) as u64,
            self.cache_misses.load(Ordering::Relaxed) as u64,
        );
        metrics.finish();
        metrics
    }
}

/// Shared fault-propagation state: the first worker to fail stashes its
/// error here and flips `stop`, which every stage checks between queue
/// operations so the whole pipeline winds down promptly instead of
/// draining to completion on bad input.
struct FaultCell {
    stop: AtomicBool,
    error: AsyncMutex<Option<PipelineError>>,
}

impl FaultCell {
    fn new() -> Self {
        Self { stop: AtomicBool::new(false), error: AsyncMutex::new(None) }
    }

    fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    async fn fail(&self, err: PipelineError, metrics: &Option<Arc<MetricsService>>) {
        if let Some(metrics) = metrics {
            metrics.record_error(err.category().as_str());
        }
        self.stop.store(true, Ordering::SeqCst);
        let mut guard = self.error.lock().await;
        if guard.is_none() {
            *guard = Some(err);
        }
    }
}

type SharedReceiver<T> = Arc<AsyncMutex<mpsc::Receiver<Batch<T>>>>;

pub struct Orchestrator {
    config: OrchestratorConfig,
    ports: OrchestratorPorts,
    shutdown: CancellationToken,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig, ports: OrchestratorPorts, shutdown: CancellationToken) -> Self {
        Self { config, ports, shutdown }
    }

    pub async fn run(self) -> Result<RunMetrics, PipelineError> {
        let Self { config, ports, shutdown } = self;
        let counters = Arc::new(AtomicCounters::default());
        let faults = Arc::new(FaultCell::new());
        let pipelines = Arc::new(CleaningPipelines::new());
        let quality_gate = Arc::new(
            QualityGate::new()
                .with_rule(Box::new(RequiredHeadword))
                .with_rule(Box::new(MinDefinitionLength { min_chars: config.quality_min_chars })),
        );

        if let Some(metrics) = &ports.metrics {
            metrics.active_pipelines.inc();
        }

        let (raw_tx, raw_rx) = mpsc::channel::<Batch<RawRecord>>(config.channel_capacity);
        let (cleaned_tx, cleaned_rx) = mpsc::channel::<Batch<CanonicalRecord>>(config.channel_capacity);
        let (embedded_tx, embedded_rx) = mpsc::channel::<Batch<CanonicalRecord>>(config.channel_capacity);

        let raw_rx: SharedReceiver<RawRecord> = Arc::new(AsyncMutex::new(raw_rx));
        let cleaned_rx: SharedReceiver<CanonicalRecord> = Arc::new(AsyncMutex::new(cleaned_rx));
        let embedded_rx: SharedReceiver<CanonicalRecord> = Arc::new(AsyncMutex::new(embedded_rx));

        let mut handles = Vec::new();

        handles.push(tokio::spawn(Self::reader_task(
            ports.raw_store.clone(),
            config.db_fetch_batch,
            config.num_cleaners,
            config.scope.clone(),
            raw_tx,
            counters.clone(),
            faults.clone(),
            ports.metrics.clone(),
            shutdown.clone(),
        )));

        for _ in 0..config.num_cleaners {
            handles.push(tokio::spawn(Self::cleaner_task(
                raw_rx.clone(),
                cleaned_tx.clone(),
                pipelines.clone(),
                quality_gate.clone(),
                counters.clone(),
                faults.clone(),
                ports.metrics.clone(),
            )));
        }
        drop(cleaned_tx);

        let cleaned_sentinels_seen = Arc::new(AtomicUsize::new(0));
        for _ in 0..config.num_embedders {
            handles.push(tokio::spawn(Self::embedder_task(
                cleaned_rx.clone(),
                embedded_tx.clone(),
                ports.embedding_service.clone(),
                ports.embedding_cache.clone(),
                ports.concept_assigner.clone(),
                ports.resource_manager.clone(),
                config.num_cleaners,
                config.num_writers,
                config.embedding_batch,
                cleaned_sentinels_seen.clone(),
                counters.clone(),
                faults.clone(),
                ports.metrics.clone(),
            )));
        }
        drop(embedded_tx);

        for _ in 0..config.num_writers {
            handles.push(tokio::spawn(Self::writer_task(
                embedded_rx.clone(),
                ports.bulk_writer.clone(),
                config.write_flush_threshold,
                config.skip_duplicate_headwords,
                counters.clone(),
                faults.clone(),
                ports.metrics.clone(),
                ports.abrupt_shutdown.clone(),
            )));
        }

        let progress_handle = tokio::spawn(Self::progress_task(counters.clone()));

        for handle in handles {
            let _ = handle.await;
        }
        progress_handle.abort();

        if let Some(metrics) = &ports.metrics {
            metrics.active_pipelines.dec();
        }

        let fault = faults.error.lock().await.take();
        let metrics = counters.to_run_metrics();

        match fault {
            Some(err) => Err(err),
            None => Ok(metrics),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn reader_task(
        raw_store: Arc<dyn RawStore>,
        page_size: usize,
        num_cleaners: usize,
        scope: ReadScope,
        raw_tx: mpsc::Sender<Batch<RawRecord>>,
        counters: Arc<AtomicCounters>,
        faults: Arc<FaultCell>,
        metrics: Option<Arc<MetricsService>>,
        shutdown: CancellationToken,
    ) {
        let mut cursor = match &scope {
            ReadScope::All { resume_after } => *resume_after,
            ReadScope::BySource { resume_after, .. } => *resume_after,
        };

        loop {
            if shutdown.is_cancelled() || faults.is_stopped() {
                break;
            }

            let page = match &scope {
                ReadScope::All { .. } => raw_store.paged_scan(cursor, page_size).await,
                ReadScope::BySource { source_id, .. } => {
                    raw_store.scan_by_source(*source_id, cursor, page_size).await
                }
            };

            let page = match page {
                Ok(page) => page,
                Err(e) => {
                    faults.fail(e, &metrics).await;
                    break;
                }
            };

            if page.records.is_empty() {
                break;
            }

            cursor = page.next_cursor;
            let n = page.records.len();
            counters.read.fetch_add(n, Ordering::Relaxed);
            if let Some(metrics) = &metrics {
                metrics.records_read_total.inc_by(n as u64);
            }
            if raw_tx.send(Batch::Data(page.records)).await.is_err() {
                break;
            }
        }

        for _ in 0..num_cleaners {
            let _ = raw_tx.send(Batch::Sentinel).await;
        }
    }

    async fn cleaner_task(
        raw_rx: SharedReceiver<RawRecord>,
        cleaned_tx: mpsc::Sender<Batch<CanonicalRecord>>,
        pipelines: Arc<CleaningPipelines>,
        quality_gate: Arc<QualityGate>,
        counters: Arc<AtomicCounters>,
        faults: Arc<FaultCell>,
        metrics: Option<Arc<MetricsService>>,
    ) {
        loop {
            if faults.is_stopped() {
                break;
            }

            let item = { raw_rx.lock().await.recv().await };
            match item {
                Some(Batch::Data(batch)) => {
                    let mut cleaned = Vec::with_capacity(batch.len());
                    let mut rejected = 0u64;
                    for raw in &batch {
                        match clean_record(raw, &pipelines) {
                            Ok(Some(record)) => match quality_gate.check(&record) {
                                Ok(()) => cleaned.push(record),
                                Err((_rule, reason)) => {
                                    tracing::debug!(reason = %reason, "record rejected by quality gate");
                                    rejected += 1;
                                }
                            },
                            Ok(None) => rejected += 1,
                            Err(e) => {
                                tracing::debug!(error = %e, "record failed cleaning");
                                rejected += 1;
                            }
                        }
                    }
                    counters.cleaned.fetch_add(cleaned.len(), Ordering::Relaxed);
                    counters.rejected.fetch_add(rejected as usize, Ordering::Relaxed);
                    if let Some(metrics) = &metrics {
                        metrics.records_cleaned_total.inc_by(cleaned.len() as u64);
                        metrics.records_rejected_total.inc_by(rejected);
                    }
                    if !cleaned.is_empty() && cleaned_tx.send(Batch::Data(cleaned)).await.is_err() {
                        break;
                    }
                }
                Some(Batch::Sentinel) => {
                    let _ = cleaned_tx.send(Batch::Sentinel).await;
                    break;
                }
                None => break,
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn embedder_task(
        cleaned_rx: SharedReceiver<CanonicalRecord>,
        embedded_tx: mpsc::Sender<Batch<CanonicalRecord>>,
        embedding_service: Arc<dyn EmbeddingService>,
        embedding_cache: Arc<dyn EmbeddingCache>,
        concept_assigner: Arc<ConceptAssigner>,
        resource_manager: Arc<GlobalResourceManager>,
        num_cleaners: usize,
        num_writers: usize,
        sub_batch_size: usize,
        cleaned_sentinels_seen: Arc<AtomicUsize>,
        counters: Arc<AtomicCounters>,
        faults: Arc<FaultCell>,
        metrics: Option<Arc<MetricsService>>,
    ) {
        loop {
            if faults.is_stopped() {
                break;
            }

            let item = { cleaned_rx.lock().await.recv().await };
            match item {
                Some(Batch::Data(batch)) => {
                    match Self::embed_and_assign(
                        &embedding_service,
                        &embedding_cache,
                        &concept_assigner,
                        &resource_manager,
                        batch,
                        sub_batch_size,
                        &counters,
                        &metrics,
                    )
                    .await
                    {
                        Ok(embedded) => {
                            let n = embedded.len();
                            counters.embedded.fetch_add(n, Ordering::Relaxed);
                            if let Some(metrics) = &metrics {
                                metrics.records_embedded_total.inc_by(n as u64);
                            }
                            if !embedded.is_empty() && embedded_tx.send(Batch::Data(embedded)).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            faults.fail(e, &metrics).await;
                            break;
                        }
                    }
                }
                Some(Batch::Sentinel) => {
                    let seen = cleaned_sentinels_seen.fetch_add(1, Ordering::SeqCst) + 1;
                    if seen == num_cleaners {
                        for _ in 0..num_writers {
                            let _ = embedded_tx.send(Batch::Sentinel).await;
                        }
                        break;
                    }
                    // Not the last cleaner's sentinel; other cleaners may
                    // still have data in flight behind it, so keep pulling.
                }
                None => break,
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn embed_and_assign(
        embedding_service: &Arc<dyn EmbeddingService>,
        embedding_cache: &Arc<dyn EmbeddingCache>,
        concept_assigner: &Arc<ConceptAssigner>,
        resource_manager: &Arc<GlobalResourceManager>,
        batch: Vec<CanonicalRecord>,
        sub_batch_size: usize,
        counters: &Arc<AtomicCounters>,
        metrics: &Option<Arc<MetricsService>>,
    ) -> Result<Vec<CanonicalRecord>, PipelineError> {
        let keys: Vec<String> = batch
            .iter()
            .map(|r| {
                Checksum::of_fields(&[r.headword(), r.language().as_str(), r.definition()]).as_str().to_string()
            })
            .collect();

        let lookup = match embedding_cache.get_many(&keys).await {
            Ok(lookup) => lookup,
            Err(e) => {
                tracing::debug!(error = %e, "embedding cache lookup failed, treating as all-miss");
                CacheLookup { hits: Vec::new(), misses: keys.clone() }
            }
        };
        counters.cache_hits.fetch_add(lookup.hits.len(), Ordering::Relaxed);
        counters.cache_misses.fetch_add(lookup.misses.len(), Ordering::Relaxed);
        if let Some(metrics) = metrics {
            metrics.cache_hits_total.inc_by(lookup.hits.len() as u64);
            metrics.cache_misses_total.inc_by(lookup.misses.len() as u64);
        }

        let mut resolved: HashMap<String, EmbeddingVector> = lookup.hits.into_iter().collect();

        let mut miss_indices = Vec::new();
        let mut miss_texts = Vec::new();
        for (idx, key) in keys.iter().enumerate() {
            if !resolved.contains_key(key) {
                miss_indices.push(idx);
                miss_texts.push(batch[idx].definition().to_string());
            }
        }

        if !miss_texts.is_empty() {
            let _permit = resource_manager.acquire_gpu().await?;
            let fresh =
                Self::embed_with_oom_halving(embedding_service, &miss_texts, sub_batch_size, counters, metrics)
                    .await?;

            let mut new_entries = Vec::with_capacity(fresh.len());
            for (offset, idx) in miss_indices.into_iter().enumerate() {
                let key = keys[idx].clone();
                let embedding = fresh[offset].clone();
                new_entries.push((key.clone(), embedding.clone()));
                resolved.insert(key, embedding);
            }
            if let Err(e) = embedding_cache.set_many(&new_entries).await {
                tracing::debug!(error = %e, "embedding cache write failed, continuing");
            } else if let Some(metrics) = metrics {
                metrics.cache_writes_total.inc_by(new_entries.len() as u64);
            }
        }

        let mut embedded = Vec::with_capacity(batch.len());
        let mut vectors = Vec::with_capacity(batch.len());
        for (record, key) in batch.into_iter().zip(keys.into_iter()) {
            let embedding = resolved
                .get(&key)
                .cloned()
                .ok_or_else(|| PipelineError::internal("embedding missing for resolved cache key"))?;
            vectors.push(embedding.clone());
            embedded.push(record.with_embedding(embedding));
        }

        let assignments = concept_assigner.assign_batch(&vectors);
        let records = embedded
            .into_iter()
            .zip(assignments)
            .map(|(record, (concept_id, confidence))| record.with_concept(concept_id, confidence))
            .collect();

        Ok(records)
    }

    async fn embed_with_oom_halving(
        embedding_service: &Arc<dyn EmbeddingService>,
        texts: &[String],
        initial_batch_size: usize,
        counters: &Arc<AtomicCounters>,
        metrics: &Option<Arc<MetricsService>>,
    ) -> Result<Vec<EmbeddingVector>, PipelineError> {
        let mut results = Vec::with_capacity(texts.len());
        let mut offset = 0;
        let mut batch_size = initial_batch_size.max(1);

        while offset < texts.len() {
            let end = (offset + batch_size).min(texts.len());
            let sub_batch = &texts[offset..end];

            let timer = metrics.as_ref().map(|m| m.embedding_batch_duration.start_timer());
            let outcome = embedding_service.embed(sub_batch).await;
            if let Some(timer) = timer {
                timer.observe_duration();
            }

            match outcome {
                Ok(embeddings) => {
                    results.extend(embeddings);
                    offset = end;
                }
                Err(PipelineError::AcceleratorOom(_)) if batch_size > 1 => {
                    batch_size = (batch_size / 2).max(1);
                    counters.oom_halvings.fetch_add(1, Ordering::Relaxed);
                    if let Some(metrics) = metrics {
                        metrics.oom_halvings_total.inc();
                    }
                    tracing::warn!(new_batch_size = batch_size, "accelerator OOM, halving sub-batch size");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(results)
    }

    #[allow(clippy::too_many_arguments)]
    async fn writer_task(
        embedded_rx: SharedReceiver<CanonicalRecord>,
        bulk_writer: Arc<dyn BulkWriter>,
        flush_threshold: usize,
        skip_duplicate_headwords: bool,
        counters: Arc<AtomicCounters>,
        faults: Arc<FaultCell>,
        metrics: Option<Arc<MetricsService>>,
        abrupt_shutdown: Arc<AtomicBool>,
    ) {
        let mut buffer: Vec<CanonicalRecord> = Vec::with_capacity(flush_threshold);
        let mut seen: DedupBuffer<(String, String)> = DedupBuffer::new();

        loop {
            if faults.is_stopped() {
                break;
            }

            let item = { embedded_rx.lock().await.recv().await };
            match item {
                Some(Batch::Data(batch)) => {
                    for record in batch {
                        let key = (record.headword().to_string(), record.language().as_str().to_string());
                        if skip_duplicate_headwords && !seen.is_new(key) {
                            continue;
                        }
                        buffer.push(record);
                    }
                    if buffer.len() >= flush_threshold {
                        if let Err(e) = Self::flush(&bulk_writer, &mut buffer, &counters, &metrics).await {
                            faults.fail(e, &metrics).await;
                            break;
                        }
                    }
                }
                Some(Batch::Sentinel) => {
                    Self::final_flush(&bulk_writer, &mut buffer, &counters, &faults, &metrics, &abrupt_shutdown).await;
                    break;
                }
                None => {
                    Self::final_flush(&bulk_writer, &mut buffer, &counters, &faults, &metrics, &abrupt_shutdown).await;
                    break;
                }
            }
        }
    }

    /// Flushes the writer's remaining buffer on termination, unless a
    /// second stop signal has already requested an abrupt shutdown, in
    /// which case the buffered records are dropped unwritten.
    async fn final_flush(
        bulk_writer: &Arc<dyn BulkWriter>,
        buffer: &mut Vec<CanonicalRecord>,
        counters: &Arc<AtomicCounters>,
        faults: &Arc<FaultCell>,
        metrics: &Option<Arc<MetricsService>>,
        abrupt_shutdown: &Arc<AtomicBool>,
    ) {
        if abrupt_shutdown.load(Ordering::SeqCst) {
            if !buffer.is_empty() {
                tracing::warn!(dropped = buffer.len(), "abrupt shutdown, discarding unflushed records");
            }
            buffer.clear();
            return;
        }
        if let Err(e) = Self::flush(bulk_writer, buffer, counters, metrics).await {
            faults.fail(e, metrics).await;
        }
    }

    async fn flush(
        bulk_writer: &Arc<dyn BulkWriter>,
        buffer: &mut Vec<CanonicalRecord>,
        counters: &Arc<AtomicCounters>,
        metrics: &Option<Arc<MetricsService>>,
    ) -> Result<(), PipelineError> {
        if buffer.is_empty() {
            return Ok(());
        }
        let timer = metrics.as_ref().map(|m| m.upsert_duration.start_timer());
        let written = bulk_writer.bulk_upsert(buffer.as_slice()).await?;
        if let Some(timer) = timer {
            timer.observe_duration();
        }
        counters.written.fetch_add(written as usize, Ordering::Relaxed);
        if let Some(metrics) = metrics {
            metrics.records_written_total.inc_by(written);
        }
        buffer.clear();
        Ok(())
    }

    async fn progress_task(counters: Arc<AtomicCounters>) {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(10));
        interval.tick().await; // first tick fires immediately; skip it
        loop {
            interval.tick().await;
            tracing::info!(
                read = counters.read.load(Ordering::Relaxed),
                cleaned = counters.cleaned.load(Ordering::Relaxed),
                embedded = counters.embedded.load(Ordering::Relaxed),
                written = counters.written.load(Ordering::Relaxed),
                "pipeline progress",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::embedding::{HashEmbeddingService, SqliteEmbeddingCache};
    use crate::infrastructure::repositories::{initialize_database, SqliteBulkWriter, SqliteRawStore};
    use crate::infrastructure::runtime::ResourceConfig;
    use lexpipe_bootstrap::shutdown::ShutdownCoordinator;
    use serde_json::json;
    use std::time::Duration;

    fn token() -> CancellationToken {
        ShutdownCoordinator::new(Duration::from_secs(5)).token()
    }

    async fn seed(raw_store: &SqliteRawStore, source: SourceId, payloads: Vec<serde_json::Value>) {
        let records = payloads.into_iter().map(|p| RawRecord::new(source, p)).collect();
        raw_store.bulk_append(records).await.unwrap();
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

    fn config(scope: ReadScope) -> OrchestratorConfig {
        OrchestratorConfig {
            scope,
            db_fetch_batch: 100,
            embedding_batch: 8,
            write_flush_threshold: 2,
            channel_capacity: 4,
            num_cleaners: 2,
            num_embedders: 2,
            num_writers: 2,
            quality_min_chars: 5,
            skip_duplicate_headwords: true,
        }
    }

    #[tokio::test]
    async fn good_and_bad_records_are_counted_correctly() {
        let pool = initialize_database("sqlite::memory:", 1, 30).await.unwrap();
        let source = SourceId::new();
        seed(
            &SqliteRawStore::new(pool.clone()),
            source,
            vec![
                json!({"word": "water", "lang_code": "en", "senses": [{"glosses": ["a clear liquid essential for life"]}]}),
                json!({"word": "cat", "lang_code": "en", "senses": [{"glosses": ["a small domesticated feline"]}]}),
                json!({"word": "dog", "lang_code": "en", "senses": [{"glosses": ["a domesticated carnivore"]}]}),
                json!({"word": "", "lang_code": "en", "senses": [{"glosses": ["a test entry"]}]}),
                json!({"word": "ab", "lang_code": "en", "senses": [{"glosses": ["no"]}]}),
            ],
        )
        .await;

        let orchestrator = Orchestrator::new(
            config(ReadScope::All { resume_after: None }),
            ports(pool).await,
            token(),
        );

        let metrics = orchestrator.run().await.unwrap();
        assert_eq!(metrics.records_read(), 5);
        assert_eq!(metrics.records_rejected(), 2);
        assert_eq!(metrics.records_written(), 3);
    }

    #[tokio::test]
    async fn by_source_scope_only_processes_the_named_source() {
        let pool = initialize_database("sqlite::memory:", 1, 30).await.unwrap();
        let wanted = SourceId::new();
        let other = SourceId::new();

        seed(
            &SqliteRawStore::new(pool.clone()),
            wanted,
            vec![json!({"word": "cat", "lang_code": "en", "senses": [{"glosses": ["a small domesticated feline"]}]})],
        )
        .await;
        seed(
            &SqliteRawStore::new(pool.clone()),
            other,
            vec![json!({"word": "dog", "lang_code": "en", "senses": [{"glosses": ["a domesticated carnivore"]}]})],
        )
        .await;

        let orchestrator = Orchestrator::new(
            config(ReadScope::BySource { source_id: wanted, resume_after: None }),
            ports(pool).await,
            token(),
        );

        let metrics = orchestrator.run().await.unwrap();
        assert_eq!(metrics.records_read(), 1);
        assert_eq!(metrics.records_written(), 1);
    }

    #[tokio::test]
    async fn empty_raw_store_produces_a_zeroed_run() {
        let pool = initialize_database("sqlite::memory:", 1, 30).await.unwrap();
        let orchestrator = Orchestrator::new(
            config(ReadScope::All { resume_after: None }),
            ports(pool).await,
            token(),
        );

        let metrics = orchestrator.run().await.unwrap();
        assert_eq!(metrics.records_read(), 0);
        assert_eq!(metrics.records_written(), 0);
    }

    #[tokio::test]
    async fn abrupt_shutdown_discards_the_final_flush() {
        let pool = initialize_database("sqlite::memory:", 1, 30).await.unwrap();
        let source = SourceId::new();
        seed(
            &SqliteRawStore::new(pool.clone()),
            source,
            vec![json!({"word": "cat", "lang_code": "en", "senses": [{"glosses": ["a small domesticated feline"]}]})],
        )
        .await;

        let mut ports = ports(pool).await;
        ports.abrupt_shutdown.store(true, Ordering::SeqCst);

        let mut cfg = config(ReadScope::All { resume_after: None });
        cfg.write_flush_threshold = 1_000; // never hit mid-stream, only the final flush matters
        let orchestrator = Orchestrator::new(cfg, ports, token());

        let metrics = orchestrator.run().await.unwrap();
        assert_eq!(metrics.records_read(), 1);
        assert_eq!(metrics.records_written(), 0);
    }
}
