// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Composable quality-gate rules applied to a `CanonicalRecord` after
//! cleaning, before it becomes eligible for embedding and bulk upsert.

use crate::entities::CanonicalRecord;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// A single named rule. A rejected record carries the `reason` string for
/// logging/metrics; the gate itself does not short-circuit so callers can
/// surface every failing rule at once if they want to.
pub trait QualityRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn check(&self, record: &CanonicalRecord) -> Result<(), String>;
}

pub struct MinDefinitionLength {
    pub min_chars: usize,
}

impl QualityRule for MinDefinitionLength {
    fn name(&self) -> &'static str {
        "min_definition_length"
    }

    fn check(&self, record: &CanonicalRecord) -> Result<(), String> {
        if record.definition().trim().chars().count() < self.min_chars {
            return Err(format!("definition shorter than {} characters", self.min_chars));
        }
        Ok(())
    }
}

pub struct RequiredHeadword;

impl QualityRule for RequiredHeadword {
    fn name(&self) -> &'static str {
        "required_headword"
    }

    fn check(&self, record: &CanonicalRecord) -> Result<(), String> {
        if record.headword().trim().is_empty() {
            return Err("headword is empty".to_string());
        }
        Ok(())
    }
}

pub struct MaxDefinitionLength {
    pub max_chars: usize,
}

impl QualityRule for MaxDefinitionLength {
    fn name(&self) -> &'static str {
        "max_definition_length"
    }

    fn check(&self, record: &CanonicalRecord) -> Result<(), String> {
        if record.definition().chars().count() > self.max_chars {
            return Err(format!("definition longer than {} characters", self.max_chars));
        }
        Ok(())
    }
}

/// Which `CanonicalRecord` field a [`RegexMatch`] rule applies to.
#[derive(Debug, Clone, Copy)]
pub enum Field {
    Headword,
    Definition,
    Ipa,
    Language,
}

impl Field {
    fn label(&self) -> &'static str {
        match self {
            Field::Headword => "headword",
            Field::Definition => "definition",
            Field::Ipa => "ipa",
            Field::Language => "language",
        }
    }

    fn extract<'a>(&self, record: &'a CanonicalRecord) -> &'a str {
        match self {
            Field::Headword => record.headword(),
            Field::Definition => record.definition(),
            Field::Ipa => record.ipa().unwrap_or(""),
            Field::Language => record.language().as_str(),
        }
    }
}

/// Requires a field to match an arbitrary regex, for gates that need
/// something stricter than the built-in length/presence rules.
pub struct RegexMatch {
    pub field: Field,
    pub pattern: Regex,
}

impl QualityRule for RegexMatch {
    fn name(&self) -> &'static str {
        "regex_match"
    }

    fn check(&self, record: &CanonicalRecord) -> Result<(), String> {
        let value = self.field.extract(record);
        if self.pattern.is_match(value) {
            Ok(())
        } else {
            Err(format!("{} {:?} does not match {}", self.field.label(), value, self.pattern.as_str()))
        }
    }
}

fn ipa_symbol() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\p{L}\p{M}ˈˌːˑ.ʼʰʷʲ' ]+$").expect("static regex is valid"))
}

/// Rejects records whose `ipa` transcription, when present, is empty or
/// contains characters outside the accepted IPA symbol set. Records with
/// no transcription at all pass, since `ipa` is an optional field.
pub struct IpaWellFormed;

impl QualityRule for IpaWellFormed {
    fn name(&self) -> &'static str {
        "ipa_well_formed"
    }

    fn check(&self, record: &CanonicalRecord) -> Result<(), String> {
        match record.ipa() {
            None => Ok(()),
            Some(ipa) if ipa.trim().is_empty() => Err("ipa transcription is empty".to_string()),
            Some(ipa) if !ipa_symbol().is_match(ipa) => Err(format!("ipa transcription {:?} contains non-IPA characters", ipa)),
            Some(_) => Ok(()),
        }
    }
}

/// Requires a record's language code to be one of an explicit allowlist,
/// so a gate can be scoped to a known set of languages without code
/// changes.
pub struct LanguageCodeKnown {
    pub known_codes: HashSet<String>,
}

impl LanguageCodeKnown {
    pub fn new(codes: impl IntoIterator<Item = String>) -> Self {
        Self { known_codes: codes.into_iter().collect() }
    }
}

impl QualityRule for LanguageCodeKnown {
    fn name(&self) -> &'static str {
        "language_code_known"
    }

    fn check(&self, record: &CanonicalRecord) -> Result<(), String> {
        let code = record.language().as_str();
        if self.known_codes.contains(code) {
            Ok(())
        } else {
            Err(format!("language code {:?} is not in the known set", code))
        }
    }
}

/// A named, orderable list of rules. Every record is checked against every
/// rule; the first failure's reason is what gets recorded as the rejection
/// cause.
pub struct QualityGate {
    rules: Vec<Box<dyn QualityRule>>,
}

impl QualityGate {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: Box<dyn QualityRule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// The default gate: non-empty headword and a definition of at least
    /// 5 characters, the default `--quality-threshold`.
    pub fn default_gate() -> Self {
        Self::new().with_rule(Box::new(RequiredHeadword)).with_rule(Box::new(MinDefinitionLength { min_chars: 5 }))
    }

    /// Returns `Ok(())` if every rule passes, or `Err((rule_name, reason))`
    /// for the first rule that fails.
    pub fn check(&self, record: &CanonicalRecord) -> Result<(), (&'static str, String)> {
        for rule in &self.rules {
            if let Err(reason) = rule.check(record) {
                return Err((rule.name(), reason));
            }
        }
        Ok(())
    }
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::default_gate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{ LanguageCode, SourceId };

    fn record_with(headword: &str, definition: &str) -> CanonicalRecord {
        CanonicalRecord::new(
            SourceId::new(),
            headword.to_string(),
            None,
            LanguageCode::new("en").unwrap(),
            definition.to_string(),
            None,
            None,
            1.0
        )
    }

    fn record_with_ipa(language: &str, ipa: Option<&str>) -> CanonicalRecord {
        CanonicalRecord::new(
            SourceId::new(),
            "cat".to_string(),
            ipa.map(|s| s.to_string()),
            LanguageCode::new(language).unwrap(),
            "a small domesticated feline".to_string(),
            None,
            None,
            1.0
        )
    }

    #[test]
    fn default_gate_rejects_short_definitions() {
        let gate = QualityGate::default_gate();
        let record = record_with("cat", "ok");
        let result = gate.check(&record);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().0, "min_definition_length");
    }

    #[test]
    fn default_gate_accepts_valid_record() {
        let gate = QualityGate::default_gate();
        let record = record_with("cat", "a small domesticated feline");
        assert!(gate.check(&record).is_ok());
    }

    #[test]
    fn rejects_empty_headword() {
        let gate = QualityGate::default_gate();
        let record = record_with("", "a small domesticated feline");
        assert!(gate.check(&record).is_err());
    }

    #[test]
    fn regex_match_rejects_non_matching_field() {
        let rule = RegexMatch { field: Field::Headword, pattern: Regex::new(r"^[a-z]+$").unwrap() };
        let record = record_with("Cat1", "a small domesticated feline");
        assert!(rule.check(&record).is_err());
        let record = record_with("cat", "a small domesticated feline");
        assert!(rule.check(&record).is_ok());
    }

    #[test]
    fn ipa_well_formed_accepts_missing_transcription() {
        let record = record_with_ipa("en", None);
        assert!(IpaWellFormed.check(&record).is_ok());
    }

    #[test]
    fn ipa_well_formed_accepts_valid_symbols() {
        let record = record_with_ipa("en", Some("ˈkæt"));
        assert!(IpaWellFormed.check(&record).is_ok());
    }

    #[test]
    fn ipa_well_formed_rejects_empty_or_invalid_symbols() {
        let record = record_with_ipa("en", Some("   "));
        assert!(IpaWellFormed.check(&record).is_err());
        let record = record_with_ipa("en", Some("k3t"));
        assert!(IpaWellFormed.check(&record).is_err());
    }

    #[test]
    fn language_code_known_rejects_codes_outside_allowlist() {
        let rule = LanguageCodeKnown::new(["en".to_string(), "de".to_string()]);
        let record = record_with_ipa("en", None);
        assert!(rule.check(&record).is_ok());
        let record = record_with_ipa("xx", None);
        assert!(rule.check(&record).is_err());
    }
}
