// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `TransformStep`: an audit record of one cleaner having run against a
//! record, recording what changed for debugging and reproducibility.

use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformStep {
    cleaner_name: String,
    field: String,
    before: Option<String>,
    after: Option<String>,
    applied_at: DateTime<Utc>,
}

impl TransformStep {
    pub fn new(cleaner_name: &str, field: &str, before: Option<String>, after: Option<String>) -> Self {
        Self {
            cleaner_name: cleaner_name.to_string(),
            field: field.to_string(),
            before,
            after,
            applied_at: Utc::now(),
        }
    }

    pub fn cleaner_name(&self) -> &str {
        &self.cleaner_name
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn before(&self) -> Option<&str> {
        self.before.as_deref()
    }

    pub fn after(&self) -> Option<&str> {
        self.after.as_deref()
    }

    /// Whether this step actually changed the field (distinct from a
    /// cleaner running and leaving the value unchanged).
    pub fn changed(&self) -> bool {
        self.before != self.after
    }

    pub fn applied_at(&self) -> DateTime<Utc> {
        self.applied_at
    }
}
