// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SHA-256 checksum value object used for raw-record content addressing and
//! deterministic ID derivation.

use crate::PipelineError;
use serde::{ Deserialize, Serialize };
use sha2::{ Digest, Sha256 };
use std::fmt;

/// A SHA-256 digest, stored as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Computes the checksum of raw bytes (e.g. a serialized raw payload).
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hex::encode(hasher.finalize()))
    }

    /// Computes the checksum of a sequence of fields joined by `\u{1}`
    /// (matches the `headword \u{1} language \u{1} definition` convention
    /// used for deterministic canonical-record IDs).
    pub fn of_fields(fields: &[&str]) -> Self {
        let joined = fields.join("\u{1}");
        Self::of_bytes(joined.as_bytes())
    }

    /// Parses an existing hex digest, validating its shape.
    pub fn from_hex(s: &str) -> Result<Self, PipelineError> {
        let trimmed = s.trim();
        if trimmed.len() != 64 || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(
                PipelineError::validation(format!("'{}' is not a valid SHA-256 hex digest", s))
            );
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `n` hex characters, used for the `entry_<prefix>`-style short
    /// identifiers mirrored from the original Python implementation.
    pub fn short(&self, n: usize) -> &str {
        &self.0[..n.min(self.0.len())]
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_produces_same_checksum() {
        let a = Checksum::of_bytes(b"hello");
        let b = Checksum::of_bytes(b"hello");
        assert_eq!(a, b);
    }

    #[test]
    fn different_input_produces_different_checksum() {
        assert_ne!(Checksum::of_bytes(b"hello"), Checksum::of_bytes(b"world"));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(Checksum::from_hex("not-hex").is_err());
        assert!(Checksum::from_hex("abcd").is_err());
    }

    #[test]
    fn of_fields_is_order_sensitive() {
        let a = Checksum::of_fields(&["cat", "en", "a feline"]);
        let b = Checksum::of_fields(&["en", "cat", "a feline"]);
        assert_ne!(a, b);
    }
}
