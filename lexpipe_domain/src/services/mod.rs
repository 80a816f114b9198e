// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Port traits: the domain's view of I/O-bound collaborators. The
//! infrastructure crate provides the concrete (sqlx, HTTP, Redis-backed...)
//! implementations; the domain only depends on these `async_trait`
//! interfaces, keeping the orchestration and business logic testable with
//! in-memory fakes.

mod bulk_writer;
mod embedding_cache;
mod embedding_service;
mod raw_store;

pub use bulk_writer::{ BulkDeleter, BulkWriter };
pub use embedding_cache::{ CacheLookup, EmbeddingCache, DEFAULT_TTL_SECS };
pub use embedding_service::EmbeddingService;
pub use raw_store::{ RawRecordPage, RawStore };
