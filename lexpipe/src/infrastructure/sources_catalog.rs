// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Loads the sources catalog: provenance metadata about each ingestion
//! source (name, format, license, quality) consulted by `ingest-raw` when
//! validating a `--source-id` against known sources.

use lexpipe_domain::PipelineError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct SourceDescriptor {
    pub id: String,
    pub name: String,
    pub format: String,
    pub languages: Vec<String>,
    pub license: Option<String>,
    pub quality: Option<f32>,
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SourcesFile {
    #[serde(rename = "source")]
    sources: Vec<SourceDescriptor>,
}

pub fn load_sources_catalog(path: &Path) -> Result<HashMap<String, SourceDescriptor>, PipelineError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| PipelineError::InvalidConfiguration(format!("reading sources catalog {path:?}: {e}")))?;
    let parsed: SourcesFile = toml::from_str(&raw)
        .map_err(|e| PipelineError::InvalidConfiguration(format!("parsing sources catalog {path:?}: {e}")))?;

    Ok(parsed.sources.into_iter().map(|s| (s.id.clone(), s)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_sources_keyed_by_id() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[[source]]
id = "wiktionary-en"
name = "English Wiktionary"
format = "jsonl"
languages = ["en"]
license = "CC-BY-SA-3.0"
quality = 0.8
"#
        )
        .unwrap();

        let sources = load_sources_catalog(file.path()).unwrap();
        assert!(sources.contains_key("wiktionary-en"));
        assert_eq!(sources["wiktionary-en"].format, "jsonl");
    }
}
