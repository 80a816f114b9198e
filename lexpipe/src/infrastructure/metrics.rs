// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Process-wide Prometheus metrics and the bare HTTP endpoint that serves
//! them: per-stage pipeline throughput, queue depths, cache hit/miss, OOM
//! halvings, and upsert rates.
//!
//! Distinct from `lexpipe_domain::RunMetrics`, which is a per-run summary
//! handed back to the caller; these counters are process-wide and sampled
//! continuously by whatever scrapes `/metrics`.

use lexpipe_domain::PipelineError;
use prometheus::{
    Gauge, GaugeVec, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const NAMESPACE: &str = "lexpipe";

#[derive(Clone)]
pub struct MetricsService {
    registry: Arc<Registry>,
    pub records_read_total: IntCounter,
    pub records_cleaned_total: IntCounter,
    pub records_rejected_total: IntCounter,
    pub records_embedded_total: IntCounter,
    pub records_written_total: IntCounter,
    pub oom_halvings_total: IntCounter,
    pub cache_hits_total: IntCounter,
    pub cache_misses_total: IntCounter,
    pub cache_writes_total: IntCounter,
    pub pipeline_errors_total: IntCounterVec,
    pub embedding_batch_duration: Histogram,
    pub upsert_duration: Histogram,
    pub throughput_records_per_sec: Gauge,
    pub active_pipelines: IntGauge,
    pub queue_depth: GaugeVec,
}

impl MetricsService {
    pub fn new() -> Result<Self, PipelineError> {
        let registry = Registry::new();

        macro_rules! counter {
            ($name:literal, $help:literal) => {{
                let c = IntCounter::with_opts(Opts::new($name, $help).namespace(NAMESPACE))
                    .map_err(|e| PipelineError::internal(format!("metric '{}': {}", $name, e)))?;
                registry
                    .register(Box::new(c.clone()))
                    .map_err(|e| PipelineError::internal(format!("metric '{}': {}", $name, e)))?;
                c
            }};
        }

        let records_read_total = counter!("records_read_total", "Raw records scanned by the reader stage");
        let records_cleaned_total = counter!("records_cleaned_total", "Records that survived cleaning and the quality gate");
        let records_rejected_total = counter!("records_rejected_total", "Records rejected by the quality gate or a malformed-input error");
        let records_embedded_total = counter!("records_embedded_total", "Records successfully embedded by the accelerator");
        let records_written_total = counter!("records_written_total", "Records upserted by the writer stage");
        let oom_halvings_total = counter!("oom_halvings_total", "Times an embedding sub-batch was halved after an accelerator OOM");
        let cache_hits_total = counter!("embedding_cache_hits_total", "Embedding cache hits");
        let cache_misses_total = counter!("embedding_cache_misses_total", "Embedding cache misses");
        let cache_writes_total = counter!("embedding_cache_writes_total", "Embedding cache entries written");

        let pipeline_errors_total = IntCounterVec::new(
            Opts::new("pipeline_errors_total", "Errors by category").namespace(NAMESPACE),
            &["category"],
        )
        .map_err(|e| PipelineError::internal(e.to_string()))?;
        registry
            .register(Box::new(pipeline_errors_total.clone()))
            .map_err(|e| PipelineError::internal(e.to_string()))?;

        let embedding_batch_duration = Histogram::with_opts(
            HistogramOpts::new("embedding_batch_duration_seconds", "Time to embed one sub-batch").namespace(NAMESPACE),
        )
        .map_err(|e| PipelineError::internal(e.to_string()))?;
        registry
            .register(Box::new(embedding_batch_duration.clone()))
            .map_err(|e| PipelineError::internal(e.to_string()))?;

        let upsert_duration = Histogram::with_opts(
            HistogramOpts::new("upsert_duration_seconds", "Time to bulk-upsert one writer buffer").namespace(NAMESPACE),
        )
        .map_err(|e| PipelineError::internal(e.to_string()))?;
        registry
            .register(Box::new(upsert_duration.clone()))
            .map_err(|e| PipelineError::internal(e.to_string()))?;

        let throughput_records_per_sec = Gauge::with_opts(
            Opts::new("throughput_records_per_second", "Rolling write throughput").namespace(NAMESPACE),
        )
        .map_err(|e| PipelineError::internal(e.to_string()))?;
        registry
            .register(Box::new(throughput_records_per_sec.clone()))
            .map_err(|e| PipelineError::internal(e.to_string()))?;

        let active_pipelines = IntGauge::with_opts(
            Opts::new("active_pipelines", "Number of process-pipeline runs currently executing").namespace(NAMESPACE),
        )
        .map_err(|e| PipelineError::internal(e.to_string()))?;
        registry
            .register(Box::new(active_pipelines.clone()))
            .map_err(|e| PipelineError::internal(e.to_string()))?;

        let queue_depth = GaugeVec::new(
            Opts::new("queue_depth", "Approximate depth of an inter-stage channel").namespace(NAMESPACE),
            &["queue"],
        )
        .map_err(|e| PipelineError::internal(e.to_string()))?;
        registry
            .register(Box::new(queue_depth.clone()))
            .map_err(|e| PipelineError::internal(e.to_string()))?;

        Ok(Self {
            registry: Arc::new(registry),
            records_read_total,
            records_cleaned_total,
            records_rejected_total,
            records_embedded_total,
            records_written_total,
            oom_halvings_total,
            cache_hits_total,
            cache_misses_total,
            cache_writes_total,
            pipeline_errors_total,
            embedding_batch_duration,
            upsert_duration,
            throughput_records_per_sec,
            active_pipelines,
            queue_depth,
        })
    }

    pub fn record_error(&self, category: &str) {
        self.pipeline_errors_total.with_label_values(&[category]).inc();
    }

    fn render(&self) -> String {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        let _ = encoder.encode(&metric_families, &mut buf);
        String::from_utf8(buf).unwrap_or_default()
    }
}

/// Minimal HTTP server exposing `/metrics` (Prometheus text format) and
/// `/health` (plain `200 OK`), built on a raw `TcpListener` rather than a
/// web framework — avoids pulling in axum/warp for two static routes.
pub struct MetricsEndpoint {
    service: MetricsService,
}

impl MetricsEndpoint {
    pub fn new(service: MetricsService) -> Self {
        Self { service }
    }

    /// Serves forever on `addr`, one task per connection. Intended to be
    /// spawned as a background tokio task; the caller's `ShutdownCoordinator`
    /// aborts it on process shutdown.
    pub async fn serve(&self, addr: &str) -> Result<(), PipelineError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| PipelineError::transient_io(format!("binding metrics endpoint on {addr}: {e}")))?;
        tracing::info!(%addr, "metrics endpoint listening");

        loop {
            let (mut stream, _peer) = match listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(error = %e, "metrics endpoint accept failed");
                    continue;
                }
            };
            let rendered = self.service.render();

            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let n = match stream.read(&mut buf).await {
                    Ok(n) => n,
                    Err(_) => return,
                };
                let request = String::from_utf8_lossy(&buf[..n]);
                let response = if request.starts_with("GET /health") {
                    "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nContent-Type: text/plain\r\n\r\nOK".to_string()
                } else if request.starts_with("GET /metrics") {
                    format!(
                        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nContent-Type: text/plain; version=0.0.4\r\n\r\n{}",
                        rendered.len(),
                        rendered
                    )
                } else {
                    "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n".to_string()
                };
                let _ = stream.write_all(response.as_bytes()).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_constructs_and_renders_without_panicking() {
        let service = MetricsService::new().unwrap();
        service.records_read_total.inc();
        service.record_error("validation");
        let rendered = service.render();
        assert!(rendered.contains("lexpipe_records_read_total"));
        assert!(rendered.contains("lexpipe_pipeline_errors_total"));
    }
}
