// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Identifier for a `RawRecord` row.
//!
//! Time-ordered via ULID so raw-store pagination (`paged_scan`) can use the
//! ID itself as a resumable cursor.

use crate::PipelineError;
use serde::{ Deserialize, Serialize };
use std::fmt;
use ulid::Ulid;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct RawRecordId(Ulid);

impl RawRecordId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    pub fn from_string(s: &str) -> Result<Self, PipelineError> {
        Ulid::from_string(s)
            .map(Self)
            .map_err(|e| PipelineError::validation(format!("invalid raw record id '{}': {}", s, e)))
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for RawRecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RawRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RawRecordId {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}
