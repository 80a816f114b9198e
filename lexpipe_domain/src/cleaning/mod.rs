// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Composable, single-purpose text cleaners and the pipeline that chains
//! them over a `CanonicalRecord`'s fields.

mod dedup;
mod definition_cleaner;
mod headword_cleaner;
mod ipa_cleaner;
mod language_code_cleaner;
mod text_normalizer;

pub use dedup::{ dedup, detect_duplicates, DedupBuffer };
pub use definition_cleaner::DefinitionCleaner;
pub use headword_cleaner::HeadwordCleaner;
pub use ipa_cleaner::IpaCleaner;
pub use language_code_cleaner::LanguageCodeCleaner;
pub use text_normalizer::TextNormalizer;

use crate::PipelineError;

/// A single-purpose, named text transformation.
///
/// Every cleaner is a pure function of its input: no I/O, no shared state,
/// so the same batch run twice produces byte-identical output (invariant:
/// cleaning is idempotent and order-independent within the name/version it
/// reports).
pub trait StringCleaner: Send + Sync {
    /// Stable name used in `TransformStep::cleaner_name` and metrics
    /// labels.
    fn name(&self) -> &'static str;

    /// Applies the transformation, returning the cleaned value.
    fn clean(&self, input: &str) -> Result<String, PipelineError>;

    /// Whether `input` is acceptable *before* cleaning is applied. Cleaners
    /// that can't meaningfully validate (most of them) default to `true`.
    fn validate(&self, _input: &str) -> bool {
        true
    }
}

/// An ordered chain of cleaners applied to a single field.
///
/// Mirrors the "each cleaner is single-purpose, testable, and composable"
/// design from the source cleaning module, generalized to a `Vec` of
/// trait objects instead of a fixed dataclass-per-field.
pub struct Pipeline {
    steps: Vec<Box<dyn StringCleaner>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn with(mut self, cleaner: Box<dyn StringCleaner>) -> Self {
        self.steps.push(cleaner);
        self
    }

    /// Runs every cleaner in order, short-circuiting on the first error.
    /// Each step's `validate` gates its *pre-clean* value — a cleaner's
    /// own transform can destroy the signal validation depends on (e.g.
    /// the IPA cleaner strips the brackets it needs to check for balance),
    /// so validation has to see the value before that step touches it.
    /// Returns the final value together with the per-step before/after
    /// pairs for transform-history bookkeeping.
    pub fn run(&self, input: &str) -> Result<(String, Vec<(&'static str, String, String)>), PipelineError> {
        let mut current = input.to_string();
        let mut history = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let before = current.clone();
            if !step.validate(&before) {
                return Err(PipelineError::validation(format!("{} rejected value {:?}", step.name(), before)));
            }
            current = step.clean(&current)?;
            history.push((step.name(), before, current.clone()));
        }
        Ok((current, history))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;
    impl StringCleaner for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }
        fn clean(&self, input: &str) -> Result<String, PipelineError> {
            Ok(input.to_uppercase())
        }
    }

    struct Trim;
    impl StringCleaner for Trim {
        fn name(&self) -> &'static str {
            "trim"
        }
        fn clean(&self, input: &str) -> Result<String, PipelineError> {
            Ok(input.trim().to_string())
        }
    }

    #[test]
    fn runs_steps_in_order() {
        let pipeline = Pipeline::new().with(Box::new(Trim)).with(Box::new(Upper));
        let (out, history) = pipeline.run("  cat  ").unwrap();
        assert_eq!(out, "CAT");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].0, "trim");
        assert_eq!(history[1].0, "upper");
    }
}
