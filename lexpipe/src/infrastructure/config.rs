// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Layered configuration: defaults, an optional config file (TOML/YAML/
//! JSON, detected by extension), then `LEXPIPE_*` environment variable
//! overrides, via the `config` crate.

use crate::infrastructure::error::map_config_err;
use lexpipe_domain::PipelineError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Database connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `sqlx` connection URL, e.g. `sqlite://lexpipe.db`.
    pub url: String,
    pub command_timeout_secs: u64,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://lexpipe.db".to_string(),
            command_timeout_secs: 300,
            max_connections: 10,
        }
    }
}

/// Embedding accelerator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Vector dimensionality `D`. Every embedding and every concept
    /// centroid in a run must agree on this value.
    pub dimension: usize,
    /// Opaque model identifier, passed through to whatever accelerator
    /// adapter is configured; unused by the placeholder adapter.
    pub model_id: String,
    /// "cpu", "cuda", "mps", ... — device preference hint.
    pub device: String,
    pub cache_ttl_secs: u64,
    pub cache_operation_timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: 256,
            model_id: "placeholder-hash-embedder-v1".to_string(),
            device: "cpu".to_string(),
            cache_ttl_secs: lexpipe_domain::services::DEFAULT_TTL_SECS,
            cache_operation_timeout_secs: 5,
        }
    }
}

/// Pipeline worker/queue sizing defaults, overridable per-run by CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub db_fetch_batch: usize,
    pub embedding_batch: usize,
    pub db_write_batch: usize,
    pub num_cleaners: usize,
    pub num_embedders: usize,
    pub num_writers: usize,
    pub channel_capacity: usize,
    pub write_flush_threshold: usize,
    pub quality_threshold_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            db_fetch_batch: 5_000,
            embedding_batch: 256,
            db_write_batch: 1_000,
            num_cleaners: 4,
            num_embedders: 1,
            num_writers: 2,
            channel_capacity: 8,
            write_flush_threshold: 10_000,
            quality_threshold_chars: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LexPipeConfig {
    pub database: DatabaseConfig,
    pub embedding: EmbeddingConfig,
    pub pipeline: PipelineConfig,
    /// Path to the TOML concept catalog; `None` disables concept
    /// assignment (every record gets `concept_id = None`).
    pub concept_catalog_path: Option<String>,
    /// Path to the TOML sources catalog consulted by `ingest-raw`.
    pub sources_catalog_path: Option<String>,
}

impl LexPipeConfig {
    /// Loads configuration from (in increasing precedence): built-in
    /// defaults, an optional config file, then `LEXPIPE_*` environment
    /// variables (`LEXPIPE_DATABASE__URL`, `LEXPIPE_EMBEDDING__DIMENSION`,
    /// ...).
    pub fn load(config_path: Option<&Path>) -> Result<Self, PipelineError> {
        let defaults = LexPipeConfig::default();
        let mut builder = ::config::Config::builder().add_source(
            ::config::Config::try_from(&defaults).map_err(map_config_err)?,
        );

        if let Some(path) = config_path {
            builder = builder.add_source(::config::File::from(path));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("LEXPIPE")
                .separator("__")
                .try_parsing(true),
        );

        let merged = builder.build().map_err(map_config_err)?;
        merged.try_deserialize().map_err(map_config_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_a_file() {
        let config = LexPipeConfig::load(None).unwrap();
        assert_eq!(config.embedding.dimension, 256);
        assert_eq!(config.pipeline.num_cleaners, 4);
    }

    #[test]
    fn env_override_takes_precedence() {
        std::env::set_var("LEXPIPE_EMBEDDING__DIMENSION", "384");
        let config = LexPipeConfig::load(None).unwrap();
        assert_eq!(config.embedding.dimension, 384);
        std::env::remove_var("LEXPIPE_EMBEDDING__DIMENSION");
    }
}
