// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed implementations of the domain's `RawStore`, `BulkWriter`,
//! and `BulkDeleter` ports.

pub mod schema;
pub mod sqlite_bulk_writer;
pub mod sqlite_raw_store;

pub use schema::{create_database_if_missing, ensure_schema, initialize_database};
pub use sqlite_bulk_writer::SqliteBulkWriter;
pub use sqlite_raw_store::SqliteRawStore;
