// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Secure Argument Validation
//!
//! A security validation pass applied to every CLI argument after clap
//! parsing: path traversal rejection, null-byte rejection, and shell
//! metacharacter rejection on plain string arguments (source ids, format
//! names, storage type). Paths that must already exist are canonicalized;
//! paths that are write targets are checked as strings only.

use std::path::PathBuf;
use thiserror::Error;

/// Error produced by CLI parsing or security validation.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid value for --{arg}: {reason}")]
    InvalidValue { arg: String, reason: String },

    #[error("path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("path traversal rejected: {0}")]
    PathTraversal(String),

    #[error("argument contains disallowed characters: {0}")]
    DisallowedCharacters(String),
}

/// Characters that must never appear in a plain string argument (source id,
/// format name, storage backend name): shell metacharacters and control
/// characters that could be used for command or log injection.
const DISALLOWED_CHARS: &[char] = &[
    ';', '|', '&', '$', '`', '\n', '\r', '\0', '<', '>', '(', ')', '{', '}',
];

pub struct SecureArgParser;

impl SecureArgParser {
    /// Validates a path argument that must refer to an existing file or
    /// directory: checks it exists, then canonicalizes it (which also
    /// resolves and rejects any unresolvable `..` traversal).
    pub fn validate_path(raw: &str) -> Result<PathBuf, ParseError> {
        Self::validate_argument(raw)?;

        let path = PathBuf::from(raw);
        if !path.exists() {
            return Err(ParseError::PathNotFound(path));
        }

        path.canonicalize().map_err(|_| ParseError::PathTraversal(raw.to_string()))
    }

    /// Validates a plain string argument (or an output path that need not
    /// exist yet): rejects null bytes, shell metacharacters, and suspicious
    /// `..` traversal segments.
    pub fn validate_argument(raw: &str) -> Result<(), ParseError> {
        if raw.is_empty() {
            return Err(ParseError::DisallowedCharacters("empty argument".to_string()));
        }

        if raw.contains(DISALLOWED_CHARS) {
            return Err(ParseError::DisallowedCharacters(raw.to_string()));
        }

        if raw.split('/').any(|segment| segment == "..") {
            return Err(ParseError::PathTraversal(raw.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_argument_rejects_shell_metacharacters() {
        assert!(SecureArgParser::validate_argument("wikt; rm -rf /").is_err());
        assert!(SecureArgParser::validate_argument("wikt$(whoami)").is_err());
    }

    #[test]
    fn test_validate_argument_rejects_traversal() {
        assert!(SecureArgParser::validate_argument("../../etc/passwd").is_err());
    }

    #[test]
    fn test_validate_argument_accepts_plain_identifiers() {
        assert!(SecureArgParser::validate_argument("wiktionary-en").is_ok());
        assert!(SecureArgParser::validate_argument("jsonl").is_ok());
    }

    #[test]
    fn test_validate_path_rejects_missing_file() {
        let result = SecureArgParser::validate_path("/nonexistent/path/for/tests");
        assert!(result.is_err());
    }
}
