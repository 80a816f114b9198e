// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Loads the precomputed concept catalog (centroid id, label, vector) from
//! a TOML file at orchestrator startup. Concept discovery itself — how
//! the centroids were produced — is out of scope; this module only reads
//! the finished catalog.

use lexpipe_domain::entities::Concept;
use lexpipe_domain::value_objects::{ConceptId, EmbeddingVector};
use lexpipe_domain::PipelineError;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(rename = "concept")]
    concepts: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    id: String,
    label: String,
    centroid: Vec<f32>,
}

/// Loads and validates a concept catalog, enforcing that every centroid
/// shares the same dimensionality as `expected_dimension`.
pub fn load_concept_catalog(path: &Path, expected_dimension: usize) -> Result<Vec<Concept>, PipelineError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| PipelineError::InvalidConfiguration(format!("reading concept catalog {path:?}: {e}")))?;
    let parsed: CatalogFile = toml::from_str(&raw)
        .map_err(|e| PipelineError::InvalidConfiguration(format!("parsing concept catalog {path:?}: {e}")))?;

    parsed
        .concepts
        .into_iter()
        .map(|entry| {
            let id = ConceptId::new(&entry.id)?;
            let centroid = EmbeddingVector::new(entry.centroid)?;
            centroid.expect_dim(expected_dimension)?;
            Ok(Concept::new(id, entry.label, centroid))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_a_valid_catalog() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[[concept]]
id = "animal"
label = "Animals"
centroid = [1.0, 0.0]

[[concept]]
id = "plant"
label = "Plants"
centroid = [0.0, 1.0]
"#
        )
        .unwrap();

        let catalog = load_concept_catalog(file.path(), 2).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].label(), "Animals");
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[[concept]]
id = "animal"
label = "Animals"
centroid = [1.0, 0.0, 0.0]
"#
        )
        .unwrap();

        assert!(load_concept_catalog(file.path(), 2).is_err());
    }
}
