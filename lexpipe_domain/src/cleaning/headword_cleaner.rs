// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Cleans dictionary headwords: strips dictionary markers and
//! parenthetical alternate forms, then normalizes Unicode and whitespace.

use crate::cleaning::StringCleaner;
use crate::PipelineError;
use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

fn markers() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[*†‡§¶]").expect("static regex is valid"))
}

fn parentheticals() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\([^)]*\)").expect("static regex is valid"))
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex is valid"))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HeadwordCleaner;

impl StringCleaner for HeadwordCleaner {
    fn name(&self) -> &'static str {
        "headword_cleaner"
    }

    fn clean(&self, input: &str) -> Result<String, PipelineError> {
        let no_markers = markers().replace_all(input, "");
        let no_parens = parentheticals().replace_all(&no_markers, "");
        let normalized: String = no_parens.nfc().collect();
        let collapsed = whitespace().replace_all(normalized.trim(), " ");
        Ok(collapsed.into_owned())
    }

    fn validate(&self, input: &str) -> bool {
        !input.trim().is_empty()
    }
}
