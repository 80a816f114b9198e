// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Cleans dictionary definitions: strips citation markers and HTML tags,
//! collapses whitespace, and optionally truncates to a maximum length.

use crate::cleaning::StringCleaner;
use crate::PipelineError;
use regex::Regex;
use std::sync::OnceLock;

fn citation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\d+\]").expect("static regex is valid"))
}

fn html_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("static regex is valid"))
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex is valid"))
}

#[derive(Debug, Clone, Copy)]
pub struct DefinitionCleaner {
    pub remove_citations: bool,
    pub max_length: Option<usize>,
}

impl Default for DefinitionCleaner {
    fn default() -> Self {
        Self { remove_citations: true, max_length: None }
    }
}

impl StringCleaner for DefinitionCleaner {
    fn name(&self) -> &'static str {
        "definition_cleaner"
    }

    fn clean(&self, input: &str) -> Result<String, PipelineError> {
        let mut cleaned = input.to_string();

        if self.remove_citations {
            cleaned = citation().replace_all(&cleaned, "").into_owned();
        }
        cleaned = html_tag().replace_all(&cleaned, "").into_owned();
        cleaned = whitespace().replace_all(cleaned.trim(), " ").into_owned();

        if let Some(max_len) = self.max_length {
            if cleaned.chars().count() > max_len {
                let truncated: String = cleaned.chars().take(max_len).collect();
                let truncated = match truncated.rsplit_once(' ') {
                    Some((head, _)) => head.to_string(),
                    None => truncated,
                };
                cleaned = format!("{}...", truncated);
            }
        }

        Ok(cleaned)
    }

    fn validate(&self, input: &str) -> bool {
        input.trim().chars().count() >= 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_citations_and_html() {
        let cleaner = DefinitionCleaner::default();
        assert_eq!(cleaner.clean("a feline[1] <i>animal</i>").unwrap(), "a feline animal");
    }

    #[test]
    fn truncates_at_word_boundary() {
        let cleaner = DefinitionCleaner { remove_citations: true, max_length: Some(10) };
        let result = cleaner.clean("a small domesticated feline").unwrap();
        assert!(result.ends_with("..."));
        assert!(result.len() <= 14);
    }

    #[test]
    fn validate_rejects_too_short() {
        let cleaner = DefinitionCleaner::default();
        assert!(!cleaner.validate("a"));
        assert!(cleaner.validate("cat"));
    }
}
