// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Structure
//!
//! `clap`-derived argument surface for the pipeline subcommands:
//! `ingest-raw`, `process-pipeline`, `reprocess`, and `retract-source`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lexpipe", version, about = "GPU-batched ingestion pipeline for dictionary and lexical data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a configuration file (TOML, YAML, or JSON), layered over
    /// defaults and environment variables.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the auto-detected CPU worker token count.
    #[arg(long, global = true)]
    pub cpu_threads: Option<usize>,

    /// Override the auto-detected I/O worker token count.
    #[arg(long, global = true)]
    pub io_threads: Option<usize>,

    /// Storage backend identifier (defaults to the configured database).
    #[arg(long, global = true)]
    pub storage_type: Option<String>,

    /// Bounded queue capacity, in batches, for each inter-stage channel.
    #[arg(long, global = true, default_value_t = 8)]
    pub channel_depth: usize,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load raw source files into the raw staging store.
    IngestRaw {
        /// Directory containing the source files to load.
        source_dir: PathBuf,

        /// Identifier of the upstream source (foreign key into the sources
        /// catalog).
        #[arg(long)]
        source_id: String,

        /// Source file format (e.g. `jsonl`, `csv`, `xml`, `pdf`, `toml`).
        #[arg(long)]
        format: String,
    },

    /// Run the accelerated clean → embed → assign → upsert pipeline.
    ProcessPipeline {
        /// Restrict the run to raw records from this source.
        #[arg(long)]
        source_id: Option<String>,

        /// Resume scanning raw records after this row key (checkpoint).
        #[arg(long)]
        resume_from: Option<String>,

        /// Raw-store page size per reader fetch.
        #[arg(long)]
        db_fetch_batch: Option<usize>,

        /// Sub-batch size for accelerator embedding calls.
        #[arg(long)]
        embedding_batch: Option<usize>,

        /// Writer flush threshold (records buffered before `bulk_upsert`).
        #[arg(long)]
        db_write_batch: Option<usize>,

        /// Number of concurrent cleaner workers (`N`).
        #[arg(long)]
        num_cleaners: Option<usize>,

        /// Number of concurrent writer workers (`K`).
        #[arg(long)]
        num_writers: Option<usize>,

        /// Minimum definition length (in characters) for quality-gate admission.
        #[arg(long)]
        quality_threshold: Option<usize>,
    },

    /// Re-run the transform stage over existing raw rows without re-ingesting.
    Reprocess {
        /// Restrict reprocessing to raw records from this source.
        #[arg(long)]
        source_id: Option<String>,
    },

    /// Delete every canonical record that came from one ingestion source.
    RetractSource {
        /// Identifier of the source to retract.
        #[arg(long)]
        source_id: String,
    },
}

/// Parses CLI arguments with clap, exiting the process on `--help`/`--version`
/// or a parse error (clap's standard behavior).
pub fn parse_cli() -> Cli {
    Cli::parse()
}
