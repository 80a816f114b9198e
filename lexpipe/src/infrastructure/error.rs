// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Error adaptation at the infrastructure boundary.
//!
//! `PipelineError` lives in `lexpipe_domain` and `sqlx::Error` lives in the
//! `sqlx` crate, so neither type is local to this crate: a `From<sqlx::Error>
//! for PipelineError` impl would violate the orphan rule. These free
//! functions do the same job as a `From` impl without trying to own a type
//! it doesn't.

use lexpipe_domain::PipelineError;

/// Maps a `sqlx` error to the domain error taxonomy. Connection and I/O
/// failures are transient (worth retrying); everything else (constraint
/// violations, bad SQL, missing rows where one was expected) is treated as
/// structural, since it indicates a bug in the calling code rather than an
/// environment hiccup.
pub fn map_sqlx_err(e: sqlx::Error) -> PipelineError {
    match &e {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            PipelineError::transient_io(e.to_string())
        }
        sqlx::Error::RowNotFound => PipelineError::validation(e.to_string()),
        _ => PipelineError::Structural(e.to_string()),
    }
}

/// Maps a `config` crate error to the domain taxonomy; configuration
/// problems are never retryable.
pub fn map_config_err(e: ::config::ConfigError) -> PipelineError {
    PipelineError::InvalidConfiguration(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_is_a_validation_error() {
        let mapped = map_sqlx_err(sqlx::Error::RowNotFound);
        assert_eq!(mapped.category(), lexpipe_domain::ErrorCategory::Validation);
    }
}
