// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `EmbeddingCache` backed by the `embedding_cache` table. TTL is enforced
//! at read time by comparing `cached_at` against `DEFAULT_TTL_SECS`, since
//! SQLite has no native row expiry.
//!
//! Cache unavailability must degrade gracefully (every failure here is
//! logged and treated as an all-miss/no-op rather than propagated), so a
//! transient database hiccup never fails an embedding batch.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lexpipe_domain::services::{CacheLookup, EmbeddingCache, DEFAULT_TTL_SECS};
use lexpipe_domain::value_objects::EmbeddingVector;
use lexpipe_domain::PipelineError;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashMap;

/// SQLite binds a statement's parameters with a single `u16`, so a
/// multi-row `IN (...)` or `INSERT ... VALUES` has to stay under that
/// count. Chunking here keeps each round-trip a single statement while
/// never risking a "too many SQL variables" error on huge batches.
const MAX_BOUND_KEYS_PER_STATEMENT: usize = 500;

pub struct SqliteEmbeddingCache {
    pool: SqlitePool,
    ttl_secs: i64,
}

impl SqliteEmbeddingCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool, ttl_secs: DEFAULT_TTL_SECS as i64 }
    }

    pub fn with_ttl_secs(pool: SqlitePool, ttl_secs: u64) -> Self {
        Self { pool, ttl_secs: ttl_secs as i64 }
    }

    fn is_expired(&self, cached_at: DateTime<Utc>) -> bool {
        (Utc::now() - cached_at).num_seconds() > self.ttl_secs
    }
}

#[async_trait]
impl EmbeddingCache for SqliteEmbeddingCache {
    async fn get_many(&self, keys: &[String]) -> Result<CacheLookup, PipelineError> {
        if keys.is_empty() {
            return Ok(CacheLookup { hits: Vec::new(), misses: Vec::new() });
        }

        let mut found: HashMap<String, (Vec<u8>, DateTime<Utc>)> = HashMap::with_capacity(keys.len());

        for chunk in keys.chunks(MAX_BOUND_KEYS_PER_STATEMENT) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("SELECT cache_key, embedding, cached_at FROM embedding_cache WHERE cache_key IN (");
            let mut separated = builder.separated(", ");
            for key in chunk {
                separated.push_bind(key);
            }
            separated.push_unseparated(")");

            let rows = match builder.build().fetch_all(&self.pool).await {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::warn!(error = %e, "embedding cache lookup failed, treating chunk as all-miss");
                    continue;
                }
            };

            for row in rows {
                let key: String = row.try_get("cache_key").unwrap_or_default();
                let blob: Vec<u8> = row.try_get("embedding").unwrap_or_default();
                let cached_at_raw: String = row.try_get("cached_at").unwrap_or_default();
                let cached_at = DateTime::parse_from_rfc3339(&cached_at_raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now());
                found.insert(key, (blob, cached_at));
            }
        }

        let mut hits = Vec::new();
        let mut misses = Vec::new();
        for key in keys {
            match found.get(key) {
                Some((blob, cached_at)) if !self.is_expired(*cached_at) => {
                    let values: Vec<f32> =
                        blob.chunks_exact(4).map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect();
                    match EmbeddingVector::new(values) {
                        Ok(vector) => hits.push((key.clone(), vector)),
                        Err(_) => misses.push(key.clone()),
                    }
                }
                _ => misses.push(key.clone()),
            }
        }

        Ok(CacheLookup { hits, misses })
    }

    async fn set_many(&self, entries: &[(String, EmbeddingVector)]) -> Result<(), PipelineError> {
        if entries.is_empty() {
            return Ok(());
        }

        let now = Utc::now().to_rfc3339();
        for chunk in entries.chunks(MAX_BOUND_KEYS_PER_STATEMENT) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("INSERT INTO embedding_cache (cache_key, embedding, cached_at) ");
            builder.push_values(chunk, |mut row, (key, embedding)| {
                let blob: Vec<u8> = embedding.as_slice().iter().flat_map(|f| f.to_le_bytes()).collect();
                row.push_bind(key).push_bind(blob).push_bind(&now);
            });
            builder.push(
                " ON CONFLICT (cache_key) DO UPDATE SET embedding = excluded.embedding, cached_at = excluded.cached_at",
            );

            if let Err(e) = builder.build().execute(&self.pool).await {
                tracing::warn!(error = %e, "embedding cache write failed, continuing without caching");
            }
        }
        Ok(())
    }
}
