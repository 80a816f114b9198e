// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `RawStore` backed by the `raw_records` table. Append is idempotent via
//! the table's `UNIQUE(checksum)` index: re-ingesting an identical payload
//! is a silent no-op rather than a duplicate row.

use crate::infrastructure::error::map_sqlx_err;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lexpipe_domain::value_objects::{RawRecordId, SourceId};
use lexpipe_domain::{
    entities::RawRecord,
    services::{RawStore, RawRecordPage},
    PipelineError,
};
use sqlx::{Row, SqlitePool};

pub struct SqliteRawStore {
    pool: SqlitePool,
}

impl SqliteRawStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// `RawRecord::new` derives a fresh id/checksum/timestamp, which would
    /// break round-tripping through storage; reconstructing field by field
    /// via serde keeps the stored identity intact.
    fn row_to_record(
        id: String,
        source_id: String,
        payload: String,
        checksum: String,
        ingested_at: DateTime<Utc>,
    ) -> Result<RawRecord, PipelineError> {
        let payload: serde_json::Value = serde_json::from_str(&payload)?;
        let reconstructed = serde_json::json!({
            "id": id,
            "source_id": source_id,
            "payload": payload,
            "checksum": checksum,
            "ingested_at": ingested_at,
        });
        serde_json::from_value(reconstructed).map_err(PipelineError::from)
    }
}

#[async_trait]
impl RawStore for SqliteRawStore {
    async fn bulk_append(&self, records: Vec<RawRecord>) -> Result<(), PipelineError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        for record in &records {
            sqlx::query(
                "INSERT OR IGNORE INTO raw_records (id, source_id, payload, checksum, ingested_at) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(record.id().to_string())
            .bind(record.source_id().to_string())
            .bind(record.payload().to_string())
            .bind(record.checksum().as_str())
            .bind(record.ingested_at().to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        }
        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn paged_scan(&self, after: Option<RawRecordId>, limit: usize) -> Result<RawRecordPage, PipelineError> {
        let rows = match after {
            Some(cursor) => {
                sqlx::query(
                    "SELECT id, source_id, payload, checksum, ingested_at FROM raw_records \
                     WHERE id > ? ORDER BY id ASC LIMIT ?",
                )
                .bind(cursor.to_string())
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, source_id, payload, checksum, ingested_at FROM raw_records \
                     ORDER BY id ASC LIMIT ?",
                )
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_sqlx_err)?;

        to_page(rows)
    }

    async fn scan_by_source(
        &self,
        source_id: SourceId,
        after: Option<RawRecordId>,
        limit: usize,
    ) -> Result<RawRecordPage, PipelineError> {
        let rows = match after {
            Some(cursor) => {
                sqlx::query(
                    "SELECT id, source_id, payload, checksum, ingested_at FROM raw_records \
                     WHERE source_id = ? AND id > ? ORDER BY id ASC LIMIT ?",
                )
                .bind(source_id.to_string())
                .bind(cursor.to_string())
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, source_id, payload, checksum, ingested_at FROM raw_records \
                     WHERE source_id = ? ORDER BY id ASC LIMIT ?",
                )
                .bind(source_id.to_string())
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_sqlx_err)?;

        to_page(rows)
    }
}

fn to_page(rows: Vec<sqlx::sqlite::SqliteRow>) -> Result<RawRecordPage, PipelineError> {
    let mut records = Vec::with_capacity(rows.len());
    let mut next_cursor = None;
    for row in rows {
        let id: String = row.try_get("id").map_err(map_sqlx_err)?;
        let source_id: String = row.try_get("source_id").map_err(map_sqlx_err)?;
        let payload: String = row.try_get("payload").map_err(map_sqlx_err)?;
        let checksum: String = row.try_get("checksum").map_err(map_sqlx_err)?;
        let ingested_at: String = row.try_get("ingested_at").map_err(map_sqlx_err)?;
        let ingested_at = DateTime::parse_from_rfc3339(&ingested_at)
            .map_err(|e| PipelineError::Structural(format!("bad ingested_at timestamp: {e}")))?
            .with_timezone(&Utc);

        let record_id = RawRecordId::from_string(&id)?;
        let record = SqliteRawStore::row_to_record(id, source_id, payload, checksum, ingested_at)?;
        next_cursor = Some(record_id);
        records.push(record);
    }
    Ok(RawRecordPage { records, next_cursor })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::schema::initialize_database;
    use serde_json::json;

    async fn store() -> SqliteRawStore {
        let pool = initialize_database("sqlite::memory:", 1, 30).await.unwrap();
        SqliteRawStore::new(pool)
    }

    #[tokio::test]
    async fn append_and_scan_round_trips() {
        let store = store().await;
        let source = SourceId::new();
        let record = RawRecord::new(source, json!({"headword": "cat"}));
        store.bulk_append(vec![record.clone()]).await.unwrap();

        let page = store.paged_scan(None, 10).await.unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].payload(), record.payload());
    }

    #[tokio::test]
    async fn duplicate_append_is_idempotent() {
        let store = store().await;
        let source = SourceId::new();
        let payload = json!({"headword": "cat"});
        store.bulk_append(vec![RawRecord::new(source, payload.clone())]).await.unwrap();
        store.bulk_append(vec![RawRecord::new(source, payload)]).await.unwrap();

        let page = store.paged_scan(None, 10).await.unwrap();
        assert_eq!(page.records.len(), 1);
    }

    #[tokio::test]
    async fn scan_by_source_filters_other_sources() {
        let store = store().await;
        let a = SourceId::new();
        let b = SourceId::new();
        store.bulk_append(vec![RawRecord::new(a, json!({"headword": "cat"}))]).await.unwrap();
        store.bulk_append(vec![RawRecord::new(b, json!({"headword": "dog"}))]).await.unwrap();

        let page = store.scan_by_source(a, None, 10).await.unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].source_id(), a);
    }
}
