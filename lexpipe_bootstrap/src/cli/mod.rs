// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling with security-first design.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  1. parser::parse()                 │  Parse CLI with clap
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  2. validator::validate()           │  Security validation
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  3. ValidatedCli                    │  Safe, validated config
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `parser` - CLI structure and clap parsing
//! - `validator` - Security validation layer

pub mod parser;
pub mod validator;

pub use parser::{parse_cli, Cli, Commands};
pub use validator::{ParseError, SecureArgParser};

use std::path::PathBuf;

/// Validated CLI configuration.
///
/// Holds all CLI arguments after security validation: paths that must
/// exist have been canonicalized, and all values are range-checked.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub verbose: bool,
    pub config: Option<PathBuf>,
    pub cpu_threads: Option<usize>,
    pub io_threads: Option<usize>,
    pub storage_type: Option<String>,
    pub channel_depth: usize,
}

/// Validated command variants, one per pipeline subcommand.
#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    IngestRaw {
        source_dir: PathBuf,
        source_id: String,
        format: String,
    },
    ProcessPipeline {
        source_id: Option<String>,
        resume_from: Option<String>,
        db_fetch_batch: Option<usize>,
        embedding_batch: Option<usize>,
        db_write_batch: Option<usize>,
        num_cleaners: Option<usize>,
        num_writers: Option<usize>,
        quality_threshold: Option<usize>,
    },
    Reprocess {
        source_id: Option<String>,
    },
    RetractSource {
        source_id: String,
    },
}

/// Parses and validates CLI arguments:
/// 1. Parse CLI with clap.
/// 2. Validate all paths with `SecureArgParser`.
/// 3. Validate all numeric values.
/// 4. Return `ValidatedCli` on success.
///
/// # Errors
///
/// Returns `ParseError` if any validation fails.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    let cli = parse_cli();
    validate_cli(cli)
}

/// Applies security validation to parsed CLI arguments.
fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    let config = if let Some(ref path) = cli.config {
        SecureArgParser::validate_argument(&path.to_string_lossy())?;
        Some(path.clone())
    } else {
        None
    };

    if cli.channel_depth == 0 {
        return Err(ParseError::InvalidValue {
            arg: "channel-depth".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    if let Some(threads) = cli.cpu_threads {
        if threads == 0 || threads > 128 {
            return Err(ParseError::InvalidValue {
                arg: "cpu-threads".to_string(),
                reason: "must be between 1 and 128".to_string(),
            });
        }
    }

    if let Some(threads) = cli.io_threads {
        if threads == 0 || threads > 256 {
            return Err(ParseError::InvalidValue {
                arg: "io-threads".to_string(),
                reason: "must be between 1 and 256".to_string(),
            });
        }
    }

    let command = match cli.command {
        Commands::IngestRaw {
            source_dir,
            source_id,
            format,
        } => {
            let validated_dir = SecureArgParser::validate_path(&source_dir.to_string_lossy())?;
            SecureArgParser::validate_argument(&source_id)?;
            SecureArgParser::validate_argument(&format)?;

            ValidatedCommand::IngestRaw {
                source_dir: validated_dir,
                source_id,
                format,
            }
        }
        Commands::ProcessPipeline {
            source_id,
            resume_from,
            db_fetch_batch,
            embedding_batch,
            db_write_batch,
            num_cleaners,
            num_writers,
            quality_threshold,
        } => {
            if let Some(ref id) = source_id {
                SecureArgParser::validate_argument(id)?;
            }
            if let Some(ref key) = resume_from {
                SecureArgParser::validate_argument(key)?;
            }

            if let Some(n) = db_fetch_batch {
                if n == 0 || n > 1_000_000 {
                    return Err(ParseError::InvalidValue {
                        arg: "db-fetch-batch".to_string(),
                        reason: "must be between 1 and 1000000".to_string(),
                    });
                }
            }
            if let Some(n) = embedding_batch {
                if n == 0 || n > 1_000_000 {
                    return Err(ParseError::InvalidValue {
                        arg: "embedding-batch".to_string(),
                        reason: "must be between 1 and 1000000".to_string(),
                    });
                }
            }
            if let Some(n) = db_write_batch {
                if n == 0 || n > 1_000_000 {
                    return Err(ParseError::InvalidValue {
                        arg: "db-write-batch".to_string(),
                        reason: "must be between 1 and 1000000".to_string(),
                    });
                }
            }
            if let Some(n) = num_cleaners {
                if n == 0 || n > 128 {
                    return Err(ParseError::InvalidValue {
                        arg: "num-cleaners".to_string(),
                        reason: "must be between 1 and 128".to_string(),
                    });
                }
            }
            if let Some(n) = num_writers {
                if n == 0 || n > 128 {
                    return Err(ParseError::InvalidValue {
                        arg: "num-writers".to_string(),
                        reason: "must be between 1 and 128".to_string(),
                    });
                }
            }
            if let Some(t) = quality_threshold {
                if t == 0 || t > 10_000 {
                    return Err(ParseError::InvalidValue {
                        arg: "quality-threshold".to_string(),
                        reason: "must be between 1 and 10000 characters".to_string(),
                    });
                }
            }

            ValidatedCommand::ProcessPipeline {
                source_id,
                resume_from,
                db_fetch_batch,
                embedding_batch,
                db_write_batch,
                num_cleaners,
                num_writers,
                quality_threshold,
            }
        }
        Commands::Reprocess { source_id } => {
            if let Some(ref id) = source_id {
                SecureArgParser::validate_argument(id)?;
            }
            ValidatedCommand::Reprocess { source_id }
        }
        Commands::RetractSource { source_id } => {
            SecureArgParser::validate_argument(&source_id)?;
            ValidatedCommand::RetractSource { source_id }
        }
    };

    Ok(ValidatedCli {
        command,
        verbose: cli.verbose,
        config,
        cpu_threads: cli.cpu_threads,
        io_threads: cli.io_threads,
        storage_type: cli.storage_type,
        channel_depth: cli.channel_depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli(command: Commands) -> Cli {
        Cli {
            command,
            verbose: false,
            config: None,
            cpu_threads: None,
            io_threads: None,
            storage_type: None,
            channel_depth: 8,
        }
    }

    #[test]
    fn test_rejects_zero_channel_depth() {
        let mut cli = base_cli(Commands::Reprocess { source_id: None });
        cli.channel_depth = 0;
        assert!(validate_cli(cli).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_cpu_threads() {
        let mut cli = base_cli(Commands::Reprocess { source_id: None });
        cli.cpu_threads = Some(0);
        assert!(validate_cli(cli).is_err());
    }

    #[test]
    fn test_reprocess_passes_through() {
        let cli = base_cli(Commands::Reprocess {
            source_id: Some("wiktionary-en".to_string()),
        });
        let validated = validate_cli(cli).unwrap();
        match validated.command {
            ValidatedCommand::Reprocess { source_id } => {
                assert_eq!(source_id.as_deref(), Some("wiktionary-en"));
            }
            _ => panic!("expected Reprocess"),
        }
    }

    #[test]
    fn test_process_pipeline_rejects_bad_quality_threshold() {
        let cli = base_cli(Commands::ProcessPipeline {
            source_id: None,
            resume_from: None,
            db_fetch_batch: None,
            embedding_batch: None,
            db_write_batch: None,
            num_cleaners: None,
            num_writers: None,
            quality_threshold: Some(0),
        });
        assert!(validate_cli(cli).is_err());
    }

    #[test]
    fn test_retract_source_passes_through() {
        let cli = base_cli(Commands::RetractSource { source_id: "wiktionary-en".to_string() });
        let validated = validate_cli(cli).unwrap();
        match validated.command {
            ValidatedCommand::RetractSource { source_id } => assert_eq!(source_id, "wiktionary-en"),
            _ => panic!("expected RetractSource"),
        }
    }

    #[test]
    fn test_ingest_raw_rejects_missing_source_dir() {
        let cli = base_cli(Commands::IngestRaw {
            source_dir: PathBuf::from("/nonexistent/source/dir/for/tests"),
            source_id: "wiktionary-en".to_string(),
            format: "jsonl".to_string(),
        });
        assert!(validate_cli(cli).is_err());
    }
}
