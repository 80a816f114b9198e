// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Batch-shaped duplicate detection, used by the per-writer dedup buffer
//! (§4.6) and by the `reprocess` CLI path.
//!
//! Exposed as free functions rather than a `Cleaner` impl: duplicate
//! detection operates over a whole batch at once, not a single field of a
//! single record, so it doesn't fit the one-record-in, one-record-out
//! shape of `StringCleaner`.

use std::collections::HashMap;
use std::hash::Hash;

/// Finds duplicate entries based on a caller-supplied key. Returns
/// `(first_index, duplicate_index)` pairs in encounter order, keeping the
/// first occurrence of each key as the canonical one.
pub fn detect_duplicates<T, K, F>(entries: &[T], key_fn: F) -> Vec<(usize, usize)>
    where K: Eq + Hash, F: Fn(&T) -> K
{
    let mut seen: HashMap<K, usize> = HashMap::new();
    let mut duplicates = Vec::new();

    for (idx, entry) in entries.iter().enumerate() {
        let key = key_fn(entry);
        match seen.get(&key) {
            Some(&first_idx) => duplicates.push((first_idx, idx)),
            None => {
                seen.insert(key, idx);
            }
        }
    }

    duplicates
}

/// Removes duplicates, keeping the first occurrence of each key.
pub fn dedup<T: Clone, K, F>(entries: &[T], key_fn: F) -> Vec<T> where K: Eq + Hash, F: Fn(&T) -> K {
    let mut seen: std::collections::HashSet<K> = std::collections::HashSet::new();
    let mut unique = Vec::with_capacity(entries.len());

    for entry in entries {
        let key = key_fn(entry);
        if seen.insert(key) {
            unique.push(entry.clone());
        }
    }

    unique
}

/// A `HashSet<K>` wrapper that survives across batches, for the writer
/// stage's streaming dedup buffer: unlike [`dedup`], which only sees one
/// batch at a time, the writer needs to remember keys across every batch
/// it has flushed since the run started.
pub struct DedupBuffer<K> {
    seen: std::collections::HashSet<K>,
}

impl<K: Eq + Hash> DedupBuffer<K> {
    pub fn new() -> Self {
        Self { seen: std::collections::HashSet::new() }
    }

    /// Records `key`, returning `true` the first time it's seen and
    /// `false` on every subsequent call with an equal key.
    pub fn is_new(&mut self, key: K) -> bool {
        self.seen.insert(key)
    }
}

impl<K: Eq + Hash> Default for DedupBuffer<K> {
    fn default() -> Self {
        Self::new()
    }
}
