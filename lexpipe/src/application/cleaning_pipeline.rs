// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Maps a source-agnostic raw JSON payload into a `CanonicalRecord`,
//! running each field through its cleaner pipeline and recording every
//! transform step for audit.
//!
//! Field shape: `{word, lang_code, senses: [{glosses: [...]}], sounds:
//! [{ipa}], etymology?, pos?}` — the shape produced by source-specific
//! parsers, which are out of scope.

use lexpipe_domain::cleaning::{DefinitionCleaner, HeadwordCleaner, IpaCleaner, LanguageCodeCleaner, Pipeline};
use lexpipe_domain::entities::{CanonicalRecord, RawRecord, TransformStep};
use lexpipe_domain::value_objects::LanguageCode;
use lexpipe_domain::PipelineError;
use serde_json::Value;

/// The cleaning pipelines for every field of a `CanonicalRecord`. Built
/// once at orchestrator startup and shared (read-only) across cleaner
/// workers.
pub struct CleaningPipelines {
    headword: Pipeline,
    definition: Pipeline,
    ipa: Pipeline,
    language: Pipeline,
}

impl CleaningPipelines {
    pub fn new() -> Self {
        Self {
            headword: Pipeline::new().with(Box::new(HeadwordCleaner)),
            definition: Pipeline::new().with(Box::new(DefinitionCleaner::default())),
            ipa: Pipeline::new().with(Box::new(IpaCleaner)),
            language: Pipeline::new().with(Box::new(LanguageCodeCleaner)),
        }
    }
}

impl Default for CleaningPipelines {
    fn default() -> Self {
        Self::new()
    }
}

fn extract_str<'a>(payload: &'a Value, field: &str) -> Option<&'a str> {
    payload.get(field).and_then(Value::as_str)
}

fn extract_definition(payload: &Value) -> Option<String> {
    payload
        .get("senses")
        .and_then(Value::as_array)
        .and_then(|senses| senses.first())
        .and_then(|sense| sense.get("glosses"))
        .and_then(Value::as_array)
        .and_then(|glosses| glosses.first())
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn extract_ipa(payload: &Value) -> Option<String> {
    payload
        .get("sounds")
        .and_then(Value::as_array)
        .and_then(|sounds| sounds.first())
        .and_then(|sound| sound.get("ipa"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Runs every field's cleaning pipeline over one raw record and builds the
/// resulting `CanonicalRecord`, with its transform history populated.
///
/// Returns `Ok(None)` for a raw payload missing a required field (treated
/// as a rejection, not an error — the reader's source parser is assumed to
/// have already handled structurally malformed records).
pub fn clean_record(
    raw: &RawRecord,
    pipelines: &CleaningPipelines,
) -> Result<Option<CanonicalRecord>, PipelineError> {
    let payload = raw.payload();

    let raw_headword = match extract_str(payload, "word") {
        Some(w) => w,
        None => return Ok(None),
    };
    let raw_language = match extract_str(payload, "lang_code") {
        Some(l) => l,
        None => return Ok(None),
    };
    let raw_definition = match extract_definition(payload) {
        Some(d) => d,
        None => return Ok(None),
    };
    let raw_ipa = extract_ipa(payload);
    let etymology = extract_str(payload, "etymology").map(str::to_string);
    let pos_tag = extract_str(payload, "pos").map(str::to_string);

    let (headword, headword_history) = pipelines.headword.run(raw_headword)?;
    if headword.trim().is_empty() {
        return Ok(None);
    }

    let (language_code, language_history) = pipelines.language.run(raw_language)?;
    let language = match LanguageCode::new(&language_code) {
        Ok(l) => l,
        Err(_) => return Ok(None),
    };

    let (definition, definition_history) = pipelines.definition.run(&raw_definition)?;

    let (ipa, ipa_history) = match raw_ipa {
        Some(ref raw) => {
            let (cleaned, history) = pipelines.ipa.run(raw)?;
            (Some(cleaned), history)
        }
        None => (None, Vec::new()),
    };

    let mut record = CanonicalRecord::new(
        raw.source_id(),
        headword,
        ipa,
        language,
        definition,
        etymology,
        pos_tag,
        1.0,
    );

    for (field, history) in [
        ("headword", &headword_history),
        ("language", &language_history),
        ("definition", &definition_history),
        ("ipa", &ipa_history),
    ] {
        for (cleaner_name, before, after) in history {
            record.record_transform(TransformStep::new(cleaner_name, field, Some(before.clone()), Some(after.clone())));
        }
    }

    Ok(Some(record))
}
