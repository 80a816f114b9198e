// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `RawRecord`: an as-ingested dictionary entry, before any cleaning.
//!
//! Source-specific parsing (JSONL, CSV, XML, PDF scrapers) is out of scope;
//! a `RawRecord` is the already-parsed, still-unvalidated payload that the
//! cleaning pipeline consumes.

use crate::value_objects::{ Checksum, RawRecordId, SourceId };
use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };
use serde_json::Value;

/// A record exactly as it arrived from its source, prior to cleaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    id: RawRecordId,
    source_id: SourceId,
    /// Opaque source payload, shape depends entirely on the source format.
    payload: Value,
    checksum: Checksum,
    ingested_at: DateTime<Utc>,
}

impl RawRecord {
    /// Builds a raw record, deriving its content checksum from the
    /// canonical JSON serialization of `payload`. Ingestion is append-only,
    /// so the checksum is what downstream dedup compares.
    pub fn new(source_id: SourceId, payload: Value) -> Self {
        let checksum = Checksum::of_bytes(payload.to_string().as_bytes());
        Self {
            id: RawRecordId::new(),
            source_id,
            payload,
            checksum,
            ingested_at: Utc::now(),
        }
    }

    pub fn id(&self) -> RawRecordId {
        self.id
    }

    pub fn source_id(&self) -> SourceId {
        self.source_id
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    pub fn ingested_at(&self) -> DateTime<Utc> {
        self.ingested_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_payloads_yield_identical_checksums() {
        let source = SourceId::new();
        let a = RawRecord::new(source, json!({"headword": "cat"}));
        let b = RawRecord::new(source, json!({"headword": "cat"}));
        assert_eq!(a.checksum(), b.checksum());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn different_payloads_yield_different_checksums() {
        let source = SourceId::new();
        let a = RawRecord::new(source, json!({"headword": "cat"}));
        let b = RawRecord::new(source, json!({"headword": "dog"}));
        assert_ne!(a.checksum(), b.checksum());
    }
}
