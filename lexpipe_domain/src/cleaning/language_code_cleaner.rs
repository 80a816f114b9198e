// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Normalizes free-text language names and loose codes to ISO 639 codes.

use crate::cleaning::StringCleaner;
use crate::PipelineError;
use regex::Regex;
use std::sync::OnceLock;

fn iso_code() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z]{2,3}$").expect("static regex is valid"))
}

fn mappings() -> &'static [(&'static str, &'static str)] {
    &[
        ("english", "en"),
        ("german", "de"),
        ("french", "fr"),
        ("spanish", "es"),
        ("italian", "it"),
        ("portuguese", "pt"),
        ("russian", "ru"),
        ("polish", "pl"),
        ("latin", "la"),
        ("greek", "grc"),
        ("ancient greek", "grc"),
        ("sanskrit", "sa"),
        ("hindi", "hi"),
        ("persian", "fa"),
        ("dutch", "nl"),
        ("swedish", "sv"),
        ("norwegian", "no"),
        ("danish", "da"),
        ("icelandic", "is"),
        ("proto-indo-european", "pie"),
    ]
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LanguageCodeCleaner;

impl StringCleaner for LanguageCodeCleaner {
    fn name(&self) -> &'static str {
        "language_code_cleaner"
    }

    fn clean(&self, input: &str) -> Result<String, PipelineError> {
        let lowered = input.trim().to_lowercase();
        if let Some((_, code)) = mappings().iter().find(|(name, _)| *name == lowered) {
            return Ok((*code).to_string());
        }
        Ok(lowered)
    }

    fn validate(&self, input: &str) -> bool {
        let lowered = input.trim().to_lowercase();
        if lowered.is_empty() {
            return false;
        }
        mappings().iter().any(|(name, _)| *name == lowered) || iso_code().is_match(&lowered)
    }
}
