// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! ISO 639-1/639-3-shaped language code value object.
//!
//! Validation is deliberately permissive on the registry side (no hardcoded
//! list of "known" languages is maintained in the domain) but strict on
//! shape: lowercase, 2-3 alphabetic characters, optionally followed by a
//! `-REGION` subtag (`pt-br`, `zh-hant`).

use crate::PipelineError;
use regex::Regex;
use serde::{ Deserialize, Serialize };
use std::fmt;
use std::sync::OnceLock;

fn pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z]{2,3}(-[a-z]{2,8})?$").expect("static regex is valid"))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn new(value: &str) -> Result<Self, PipelineError> {
        let normalized = value.trim().to_lowercase();
        if !pattern().is_match(&normalized) {
            return Err(
                PipelineError::validation(
                    format!("'{}' is not a valid language code (expected e.g. 'en', 'pt-br')", value)
                )
            );
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The primary subtag, ignoring any region (`pt-br` -> `pt`).
    pub fn primary(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
