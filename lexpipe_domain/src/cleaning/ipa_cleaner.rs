// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Normalizes IPA (International Phonetic Alphabet) transcriptions.

use crate::cleaning::StringCleaner;
use crate::PipelineError;
use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

fn bracket_or_slash() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\[\]/]").expect("static regex is valid"))
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex is valid"))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IpaCleaner;

impl StringCleaner for IpaCleaner {
    fn name(&self) -> &'static str {
        "ipa_cleaner"
    }

    fn clean(&self, input: &str) -> Result<String, PipelineError> {
        let normalized: String = input.trim().nfc().collect();
        let stripped = bracket_or_slash().replace_all(&normalized, "");
        let collapsed = whitespace().replace_all(&stripped, " ");
        Ok(collapsed.trim().to_string())
    }

    fn validate(&self, input: &str) -> bool {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return false;
        }
        let opens = trimmed.matches('[').count();
        let closes = trimmed.matches(']').count();
        if opens != closes {
            return false;
        }
        trimmed.matches('/').count() % 2 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_brackets_and_slashes() {
        let cleaner = IpaCleaner;
        assert_eq!(cleaner.clean("/kæt/").unwrap(), "kæt");
        assert_eq!(cleaner.clean("[ˈkæt]").unwrap(), "ˈkæt");
    }

    #[test]
    fn collapses_whitespace() {
        let cleaner = IpaCleaner;
        assert_eq!(cleaner.clean("  k  æ  t  ").unwrap(), "k æ t");
    }

    #[test]
    fn is_idempotent() {
        let cleaner = IpaCleaner;
        let once = cleaner.clean("/ˈkæt/").unwrap();
        let twice = cleaner.clean(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn rejects_unbalanced_brackets() {
        let cleaner = IpaCleaner;
        assert!(!cleaner.validate("[ˈkæt"));
        assert!(!cleaner.validate("ˈkæt]"));
        assert!(!cleaner.validate("/ˈkæt"));
    }

    #[test]
    fn accepts_balanced_brackets_or_slashes() {
        let cleaner = IpaCleaner;
        assert!(cleaner.validate("[ˈkæt]"));
        assert!(cleaner.validate("/ˈkæt/"));
        assert!(cleaner.validate("ˈkæt"));
    }

    #[test]
    fn rejects_empty_input() {
        let cleaner = IpaCleaner;
        assert!(!cleaner.validate("   "));
    }
}
