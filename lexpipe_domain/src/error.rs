// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Domain error type for the lexical ingestion pipeline.
//!
//! `PipelineError` is the single error type threaded through the domain
//! layer. It is deliberately infrastructure-agnostic: no `sqlx::Error`, no
//! `tokio::io::Error` appear here directly, only the categories the domain
//! cares about. The infrastructure crate converts its own error types into
//! this one at the port boundary.

use thiserror::Error;

/// Coarse error categories used for metrics labeling and retry policy.
///
/// Mirrors the taxonomy from the design notes: validation errors are never
/// retried, transient-IO and resource errors are retried with backoff,
/// structural and stage errors abort the batch that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Validation,
    TransientIo,
    Resource,
    Structural,
    Stage,
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::TransientIo => "transient_io",
            ErrorCategory::Resource => "resource",
            ErrorCategory::Structural => "structural",
            ErrorCategory::Stage => "stage",
            ErrorCategory::Internal => "internal",
        }
    }
}

/// Errors produced anywhere in the ingestion pipeline's domain logic.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A record failed a quality gate rule or a value object's invariant.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A required field was absent from a record.
    #[error("missing required field '{0}'")]
    MissingField(String),

    /// A cleaner or parser encountered malformed input it cannot recover
    /// from (distinct from a quality-gate rejection: this is a bug-shaped
    /// failure, the record is simply unreadable).
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// Upstream dependency (database, embedding service, cache) reported
    /// a transient failure. Recoverable with retry/backoff.
    #[error("transient I/O error: {0}")]
    TransientIo(String),

    /// A resource (semaphore permit, GPU device, channel) could not be
    /// acquired, or acquisition timed out.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Embedding accelerator reported an out-of-memory condition after
    /// the batch-halving retry already failed once.
    #[error("accelerator out of memory: {0}")]
    AcceleratorOom(String),

    /// Structural/invariant violation in the pipeline's own bookkeeping
    /// (e.g. sentinel-count mismatch, duplicate ID collision). Indicates a
    /// bug, not bad input.
    #[error("structural invariant violated: {0}")]
    Structural(String),

    /// A pipeline stage (cleaner, embedder, writer) failed in a way that
    /// should abort only the batch it was processing.
    #[error("stage '{stage}' failed: {reason}")]
    StageFailed { stage: String, reason: String },

    /// Configuration is invalid or incomplete.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Operation was cancelled via shutdown signal.
    #[error("operation cancelled")]
    Cancelled,

    /// Catch-all for invariant violations that indicate a bug rather than
    /// bad input or a bad environment.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        PipelineError::Validation(msg.into())
    }

    pub fn missing_field<S: Into<String>>(field: S) -> Self {
        PipelineError::MissingField(field.into())
    }

    pub fn transient_io<S: Into<String>>(msg: S) -> Self {
        PipelineError::TransientIo(msg.into())
    }

    pub fn resource_exhausted<S: Into<String>>(msg: S) -> Self {
        PipelineError::ResourceExhausted(msg.into())
    }

    pub fn stage_failed<S1: Into<String>, S2: Into<String>>(stage: S1, reason: S2) -> Self {
        PipelineError::StageFailed { stage: stage.into(), reason: reason.into() }
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        PipelineError::Internal(msg.into())
    }

    /// Category used for metrics labels and retry policy decisions.
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::Validation(_)
            | PipelineError::MissingField(_)
            | PipelineError::MalformedRecord(_) => ErrorCategory::Validation,
            PipelineError::TransientIo(_) => ErrorCategory::TransientIo,
            PipelineError::ResourceExhausted(_) | PipelineError::AcceleratorOom(_) => {
                ErrorCategory::Resource
            }
            PipelineError::Structural(_) => ErrorCategory::Structural,
            PipelineError::StageFailed { .. } => ErrorCategory::Stage,
            PipelineError::InvalidConfiguration(_)
            | PipelineError::Cancelled
            | PipelineError::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Whether a retry with backoff is worth attempting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::TransientIo(_) | PipelineError::ResourceExhausted(_)
        )
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        PipelineError::TransientIo(e.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        PipelineError::MalformedRecord(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorizes_validation_errors() {
        assert_eq!(PipelineError::validation("bad").category(), ErrorCategory::Validation);
        assert_eq!(PipelineError::missing_field("headword").category(), ErrorCategory::Validation);
    }

    #[test]
    fn only_transient_and_resource_errors_are_recoverable() {
        assert!(PipelineError::transient_io("timeout").is_recoverable());
        assert!(PipelineError::resource_exhausted("no permits").is_recoverable());
        assert!(!PipelineError::validation("bad").is_recoverable());
        assert!(!PipelineError::Internal("bug".into()).is_recoverable());
    }
}
