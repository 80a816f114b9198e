// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Identifier for an ingestion source (one "batch" handed to `ingest-raw`,
//! e.g. a particular dictionary dump). Used for source-scoped retraction
//! (`bulk_delete_by_source`) and for provenance on every record.

use crate::PipelineError;
use serde::{ Deserialize, Serialize };
use std::fmt;
use ulid::Ulid;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct SourceId(Ulid);

impl SourceId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    pub fn from_string(s: &str) -> Result<Self, PipelineError> {
        Ulid::from_string(s)
            .map(Self)
            .map_err(|e| PipelineError::validation(format!("invalid source id '{}': {}", s, e)))
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SourceId {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_string() {
        let id = SourceId::new();
        let parsed: SourceId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
