// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Deterministic identifier for a `CanonicalRecord`.
//!
//! Derived from `sha256(headword \u{1} language \u{1} definition)`: the
//! same logical entry always maps to the same ID, which is what makes the
//! upsert-by-id protocol in the Bulk Writer idempotent.

use crate::value_objects::Checksum;
use crate::PipelineError;
use serde::{ Deserialize, Serialize };
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalRecordId(String);

impl CanonicalRecordId {
    const PREFIX: &'static str = "entry_";
    const SUFFIX_LEN: usize = 16;

    /// Derives the canonical ID from the fields that define entry identity.
    pub fn derive(headword: &str, language: &str, definition: &str) -> Self {
        let checksum = Checksum::of_fields(&[headword, language, definition]);
        Self(format!("{}{}", Self::PREFIX, checksum.short(Self::SUFFIX_LEN)))
    }

    /// Parses an already-formatted id (e.g. read back from storage).
    pub fn from_string(s: &str) -> Result<Self, PipelineError> {
        if !s.starts_with(Self::PREFIX) || s.len() != Self::PREFIX.len() + Self::SUFFIX_LEN {
            return Err(PipelineError::validation(format!("'{}' is not a valid canonical record id", s)));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_deterministic() {
        let a = CanonicalRecordId::derive("cat", "en", "a feline");
        let b = CanonicalRecordId::derive("cat", "en", "a feline");
        assert_eq!(a, b);
    }

    #[test]
    fn differs_on_any_field_change() {
        let base = CanonicalRecordId::derive("cat", "en", "a feline");
        assert_ne!(base, CanonicalRecordId::derive("dog", "en", "a feline"));
        assert_ne!(base, CanonicalRecordId::derive("cat", "fr", "a feline"));
        assert_ne!(base, CanonicalRecordId::derive("cat", "en", "a small feline"));
    }

    #[test]
    fn has_stable_prefix_and_length() {
        let id = CanonicalRecordId::derive("cat", "en", "a feline");
        assert!(id.as_str().starts_with("entry_"));
        assert_eq!(id.as_str().len(), "entry_".len() + 16);
    }
}
