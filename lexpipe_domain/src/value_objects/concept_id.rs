// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Identifier for a precomputed concept catalog entry.
//!
//! Concept discovery (clustering embeddings into concepts) is out of scope;
//! concepts are a fixed, externally supplied catalog loaded at orchestrator
//! startup, so this id is simply a validated opaque string key rather than a
//! generated ULID.

use crate::PipelineError;
use serde::{ Deserialize, Serialize };
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConceptId(String);

impl ConceptId {
    pub fn new(value: &str) -> Result<Self, PipelineError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(PipelineError::validation("concept id cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty() {
        assert!(ConceptId::new("").is_err());
        assert!(ConceptId::new("   ").is_err());
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(ConceptId::new("  animal  ").unwrap().as_str(), "animal");
    }
}
