// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `BulkWriter`/`BulkDeleter` backed by the `records` table, using the
//! staging-table-then-upsert protocol (a session-scoped `TEMPORARY TABLE`
//! plus `INSERT ... SELECT ... ON CONFLICT DO UPDATE`) since SQLite has no
//! native bulk-copy command.

use crate::infrastructure::error::map_sqlx_err;
use async_trait::async_trait;
use lexpipe_domain::entities::CanonicalRecord;
use lexpipe_domain::services::{BulkDeleter, BulkWriter};
use lexpipe_domain::value_objects::{CanonicalRecordId, SourceId};
use lexpipe_domain::PipelineError;
use sqlx::SqlitePool;

pub struct SqliteBulkWriter {
    pool: SqlitePool,
}

impl SqliteBulkWriter {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn embedding_blob(record: &CanonicalRecord) -> Option<Vec<u8>> {
    record.embedding().map(|e| {
        e.as_slice()
            .iter()
            .flat_map(|f| f.to_le_bytes())
            .collect::<Vec<u8>>()
    })
}

#[async_trait]
impl BulkWriter for SqliteBulkWriter {
    async fn bulk_insert(&self, records: &[CanonicalRecord]) -> Result<u64, PipelineError> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        let mut affected = 0u64;
        for record in records {
            let result = sqlx::query(
                "INSERT INTO records (id, source_id, headword, ipa, language, definition, etymology, \
                 pos_tag, embedding, concept_id, data_quality, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(record.id().as_str())
            .bind(record.source_id().to_string())
            .bind(record.headword())
            .bind(record.ipa())
            .bind(record.language().as_str())
            .bind(record.definition())
            .bind(record.etymology())
            .bind(record.pos_tag())
            .bind(embedding_blob(record))
            .bind(record.concept_id().map(|c| c.as_str()))
            .bind(record.data_quality())
            .bind(record.created_at().to_rfc3339())
            .bind(record.updated_at().to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
            affected += result.rows_affected();
        }
        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(affected)
    }

    async fn bulk_upsert(&self, records: &[CanonicalRecord]) -> Result<u64, PipelineError> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        sqlx::query(
            "CREATE TEMPORARY TABLE IF NOT EXISTS records_staging ( \
                id TEXT NOT NULL, source_id TEXT NOT NULL, headword TEXT NOT NULL, ipa TEXT, \
                language TEXT NOT NULL, definition TEXT NOT NULL, etymology TEXT, pos_tag TEXT, \
                embedding BLOB, concept_id TEXT, data_quality REAL NOT NULL, \
                created_at TEXT NOT NULL, updated_at TEXT NOT NULL)",
        )
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        sqlx::query("DELETE FROM records_staging").execute(&mut *tx).await.map_err(map_sqlx_err)?;

        for record in records {
            sqlx::query(
                "INSERT INTO records_staging (id, source_id, headword, ipa, language, definition, \
                 etymology, pos_tag, embedding, concept_id, data_quality, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(record.id().as_str())
            .bind(record.source_id().to_string())
            .bind(record.headword())
            .bind(record.ipa())
            .bind(record.language().as_str())
            .bind(record.definition())
            .bind(record.etymology())
            .bind(record.pos_tag())
            .bind(embedding_blob(record))
            .bind(record.concept_id().map(|c| c.as_str()))
            .bind(record.data_quality())
            .bind(record.created_at().to_rfc3339())
            .bind(record.updated_at().to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        }

        let result = sqlx::query(
            "INSERT INTO records (id, source_id, headword, ipa, language, definition, etymology, \
             pos_tag, embedding, concept_id, data_quality, created_at, updated_at) \
             SELECT id, source_id, headword, ipa, language, definition, etymology, pos_tag, \
                    embedding, concept_id, data_quality, created_at, updated_at \
             FROM records_staging \
             ON CONFLICT (id) DO UPDATE SET \
                source_id = excluded.source_id, \
                headword = excluded.headword, \
                ipa = excluded.ipa, \
                language = excluded.language, \
                definition = excluded.definition, \
                etymology = excluded.etymology, \
                pos_tag = excluded.pos_tag, \
                embedding = excluded.embedding, \
                concept_id = excluded.concept_id, \
                data_quality = excluded.data_quality, \
                updated_at = excluded.updated_at",
        )
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        sqlx::query("DELETE FROM records_staging").execute(&mut *tx).await.map_err(map_sqlx_err)?;
        tx.commit().await.map_err(map_sqlx_err)?;

        Ok(result.rows_affected())
    }

    async fn bulk_update_embeddings(
        &self,
        updates: &[(CanonicalRecordId, Vec<f32>)],
    ) -> Result<u64, PipelineError> {
        if updates.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        let mut affected = 0u64;
        for (id, embedding) in updates {
            let blob: Vec<u8> = embedding.iter().flat_map(|f| f.to_le_bytes()).collect();
            let result = sqlx::query("UPDATE records SET embedding = ?, updated_at = ? WHERE id = ?")
                .bind(blob)
                .bind(chrono::Utc::now().to_rfc3339())
                .bind(id.as_str())
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_err)?;
            affected += result.rows_affected();
        }
        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(affected)
    }
}

#[async_trait]
impl BulkDeleter for SqliteBulkWriter {
    async fn bulk_delete_by_ids(&self, ids: &[CanonicalRecordId]) -> Result<u64, PipelineError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        let mut affected = 0u64;
        for id in ids {
            let result = sqlx::query("DELETE FROM records WHERE id = ?")
                .bind(id.as_str())
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_err)?;
            affected += result.rows_affected();
        }
        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(affected)
    }

    async fn bulk_delete_by_source(&self, source_id: SourceId) -> Result<u64, PipelineError> {
        let result = sqlx::query("DELETE FROM records WHERE source_id = ?")
            .bind(source_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::schema::initialize_database;
    use lexpipe_domain::value_objects::{EmbeddingVector, LanguageCode};

    async fn writer() -> SqliteBulkWriter {
        let pool = initialize_database("sqlite::memory:", 1, 30).await.unwrap();
        SqliteBulkWriter::new(pool)
    }

    fn record() -> CanonicalRecord {
        CanonicalRecord::new(
            SourceId::new(),
            "cat".to_string(),
            Some("/kæt/".to_string()),
            LanguageCode::new("en").unwrap(),
            "a small domesticated feline".to_string(),
            None,
            Some("noun".to_string()),
            0.9,
        )
        .with_embedding(EmbeddingVector::new(vec![0.1, 0.2, 0.3]).unwrap())
    }

    #[tokio::test]
    async fn upsert_is_idempotent_by_id() {
        let writer = writer().await;
        let record = record();
        let first = writer.bulk_upsert(&[record.clone()]).await.unwrap();
        assert_eq!(first, 1);
        let second = writer.bulk_upsert(&[record]).await.unwrap();
        assert_eq!(second, 1);

        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM records").fetch_one(&writer.pool).await.unwrap();
        assert_eq!(row.0, 1);
    }

    #[tokio::test]
    async fn delete_by_source_removes_matching_rows() {
        let writer = writer().await;
        let record = record();
        let source = record.source_id();
        writer.bulk_upsert(&[record]).await.unwrap();

        let deleted = writer.bulk_delete_by_source(source).await.unwrap();
        assert_eq!(deleted, 1);
    }
}
