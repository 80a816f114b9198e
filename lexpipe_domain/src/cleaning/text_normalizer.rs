// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Configurable general-purpose text normalization: Unicode form, case
//! folding, punctuation stripping, and whitespace collapsing.

use crate::cleaning::StringCleaner;
use crate::PipelineError;
use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnicodeForm {
    Nfc,
    Nfd,
    Nfkc,
    Nfkd,
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex is valid"))
}

fn non_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]").expect("static regex is valid"))
}

#[derive(Debug, Clone, Copy)]
pub struct TextNormalizer {
    pub lowercase: bool,
    pub remove_punctuation: bool,
    pub normalize_whitespace: bool,
    pub unicode_form: UnicodeForm,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self {
            lowercase: true,
            remove_punctuation: false,
            normalize_whitespace: true,
            unicode_form: UnicodeForm::Nfc,
        }
    }
}

impl StringCleaner for TextNormalizer {
    fn name(&self) -> &'static str {
        "text_normalizer"
    }

    fn clean(&self, input: &str) -> Result<String, PipelineError> {
        let mut result: String = match self.unicode_form {
            UnicodeForm::Nfc => input.nfc().collect(),
            UnicodeForm::Nfd => input.nfd().collect(),
            UnicodeForm::Nfkc => input.nfkc().collect(),
            UnicodeForm::Nfkd => input.nfkd().collect(),
        };

        if self.lowercase {
            result = result.to_lowercase();
        }

        if self.remove_punctuation {
            result = non_word().replace_all(&result, "").into_owned();
        }

        if self.normalize_whitespace {
            result = whitespace().replace_all(result.trim(), " ").into_owned();
        }

        Ok(result)
    }

    fn validate(&self, input: &str) -> bool {
        !input.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_lowercases_and_collapses_whitespace() {
        let cleaner = TextNormalizer::default();
        assert_eq!(cleaner.clean("  A   Cat  ").unwrap(), "a cat");
    }

    #[test]
    fn can_remove_punctuation() {
        let cleaner = TextNormalizer { remove_punctuation: true, ..Default::default() };
        assert_eq!(cleaner.clean("hello, world!").unwrap(), "hello world");
    }

    #[test]
    fn preserves_case_when_disabled() {
        let cleaner = TextNormalizer { lowercase: false, ..Default::default() };
        assert_eq!(cleaner.clean("Cat").unwrap(), "Cat");
    }
}
