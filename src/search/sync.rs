//! Handle ↔ note-id synchronization for the vector index
//!
//! The vector index is append-only, so edits and deletes cannot touch
//! stored vectors directly. This module layers a generational mapping on
//! top: every indexed note owns exactly one live handle; superseded or
//! deleted mappings are marked stale and filtered at resolve time, and a
//! compaction rebuilds the index from live entries once stale mappings
//! pile up. A mapping moves `live → stale → removed at compact` and
//! never back; an edited note gets a fresh handle instead.

use std::collections::HashMap;

use super::error::{SearchError, SearchResult};
use super::index::VectorIndex;

/// Compact once stale entries exceed this fraction of live ones
const COMPACT_STALE_RATIO: f64 = 0.3;

struct HandleEntry {
    note_id: i64,
    stale: bool,
}

/// Vector index plus the mapping that makes its append-only handles safe
/// to expose as note search results.
///
/// Invariant: live handles ↔ indexed note ids is a bijection, and no
/// handle is ever reallocated (the counter only grows).
pub struct IndexSync {
    index: VectorIndex,
    by_handle: HashMap<u64, HandleEntry>,
    by_note: HashMap<i64, u64>,
    next_handle: u64,
    stale: usize,
}

impl IndexSync {
    pub fn new() -> Self {
        Self {
            index: VectorIndex::new(),
            by_handle: HashMap::new(),
            by_note: HashMap::new(),
            next_handle: 0,
            stale: 0,
        }
    }

    /// Record a fresh embedding for a note.
    ///
    /// If the note already had a handle, the old mapping is marked stale
    /// (superseded) rather than removed, so no rebuild happens on every
    /// edit.
    pub fn upsert(&mut self, note_id: i64, vector: Vec<f32>) -> SearchResult<()> {
        if let Some(old) = self.by_note.remove(&note_id) {
            self.mark_stale(old);
        }

        let handle = self.next_handle;
        self.index.add(vector, handle)?;
        self.next_handle += 1;

        self.by_handle.insert(
            handle,
            HandleEntry {
                note_id,
                stale: false,
            },
        );
        self.by_note.insert(note_id, handle);
        Ok(())
    }

    /// Mark a note's mapping stale. Returns whether the note was indexed.
    pub fn remove(&mut self, note_id: i64) -> bool {
        match self.by_note.remove(&note_id) {
            Some(handle) => {
                self.mark_stale(handle);
                true
            }
            None => false,
        }
    }

    fn mark_stale(&mut self, handle: u64) {
        if let Some(entry) = self.by_handle.get_mut(&handle) {
            if !entry.stale {
                entry.stale = true;
                self.stale += 1;
            }
        }
    }

    /// Resolve a search handle to its note id.
    ///
    /// Stale and unknown handles fail with [`SearchError::UnknownHandle`];
    /// callers treat this as "drop the hit", it is an expected race
    /// between concurrent edits and search.
    pub fn resolve(&self, handle: u64) -> SearchResult<i64> {
        match self.by_handle.get(&handle) {
            Some(entry) if !entry.stale => Ok(entry.note_id),
            _ => Err(SearchError::UnknownHandle(handle)),
        }
    }

    /// Nearest neighbors as raw `(handle, distance)` pairs
    pub fn search(&self, query: &[f32], k: usize) -> SearchResult<Vec<(u64, f32)>> {
        self.index.search(query, k)
    }

    /// Whether stale entries have piled up past the compaction threshold
    pub fn needs_compaction(&self) -> bool {
        self.stale > 0
            && (self.live_count() == 0
                || self.stale as f64 / self.live_count() as f64 > COMPACT_STALE_RATIO)
    }

    /// Rebuild the index from live mappings only, reclaiming the space
    /// held by stale entries. Handles survive unchanged.
    pub fn compact(&mut self) -> SearchResult<()> {
        let live: Vec<(u64, Vec<f32>)> = self
            .index
            .entries()
            .filter(|(handle, _)| {
                self.by_handle
                    .get(handle)
                    .map(|e| !e.stale)
                    .unwrap_or(false)
            })
            .map(|(handle, vector)| (handle, vector.to_vec()))
            .collect();

        self.index.rebuild(live)?;
        self.by_handle.retain(|_, entry| !entry.stale);
        self.stale = 0;
        Ok(())
    }

    pub fn live_count(&self) -> usize {
        self.by_note.len()
    }

    pub fn stale_count(&self) -> usize {
        self.stale
    }

    /// Vectors physically held by the index, stale included
    pub fn index_size(&self) -> usize {
        self.index.size()
    }
}

impl Default for IndexSync {
    fn default() -> Self {
        Self::new()
    }
}
