// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Code Mapping
//!
//! Maps application results to process exit codes. A successful run exits
//! `0`; an unrecoverable error exits `1`; a user-initiated cancellation
//! (SIGINT/SIGTERM observed at the top level) exits `130` (128 + SIGINT),
//! matching the POSIX convention and the CLI contract.

use std::process::ExitCode as StdExitCode;

/// Process exit codes produced by the top-level application runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Run completed successfully.
    Success,
    /// Run failed with an unrecoverable error.
    Failure,
    /// Run was cancelled by the user (SIGINT/SIGTERM).
    Cancelled,
}

impl ExitCode {
    /// The raw numeric exit code.
    pub fn code(self) -> u8 {
        match self {
            ExitCode::Success => 0,
            ExitCode::Failure => 1,
            ExitCode::Cancelled => 130,
        }
    }
}

impl From<ExitCode> for StdExitCode {
    fn from(code: ExitCode) -> Self {
        StdExitCode::from(code.code())
    }
}

/// Maps a top-level error to an exit code, given no other information.
/// Cancellation takes priority over this and is handled separately by
/// `result_to_exit_code`, since a cancelled run can surface either as
/// `Ok` (graceful shutdown finished its flush) or as an `Err` from
/// whatever in-flight operation the shutdown interrupted.
pub fn map_error_to_exit_code<E>(_error: &E) -> ExitCode {
    ExitCode::Failure
}

/// Converts an application `Result` into a process exit code. `cancelled`
/// should reflect whether a termination signal was observed during the
/// run (e.g. the signal counter installed by
/// [`crate::signals::install`] having counted at least one) — when set,
/// it takes priority over both `Ok` and `Err`, since either can result
/// from a shutdown that was requested rather than a normal completion.
pub fn result_to_exit_code<E>(result: Result<(), E>, cancelled: bool) -> StdExitCode {
    if cancelled {
        return ExitCode::Cancelled.into();
    }
    match result {
        Ok(()) => ExitCode::Success.into(),
        Err(ref e) => map_error_to_exit_code(e).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::Failure.code(), 1);
        assert_eq!(ExitCode::Cancelled.code(), 130);
    }

    #[test]
    fn test_result_to_exit_code_success() {
        let result: Result<(), String> = Ok(());
        let code = result_to_exit_code(result, false);
        assert_eq!(format!("{code:?}"), format!("{:?}", StdExitCode::from(0)));
    }

    #[test]
    fn test_result_to_exit_code_failure() {
        let result: Result<(), String> = Err("boom".to_string());
        let code = result_to_exit_code(result, false);
        assert_eq!(format!("{code:?}"), format!("{:?}", StdExitCode::from(1)));
    }

    #[test]
    fn test_result_to_exit_code_cancelled_overrides_success() {
        let result: Result<(), String> = Ok(());
        let code = result_to_exit_code(result, true);
        assert_eq!(format!("{code:?}"), format!("{:?}", StdExitCode::from(130)));
    }

    #[test]
    fn test_result_to_exit_code_cancelled_overrides_failure() {
        let result: Result<(), String> = Err("boom".to_string());
        let code = result_to_exit_code(result, true);
        assert_eq!(format!("{code:?}"), format!("{:?}", StdExitCode::from(130)));
    }
}
