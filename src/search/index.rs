//! In-memory flat vector index
//!
//! Exhaustive L2 search over all stored vectors. This is O(n) per query
//! but exact, which is the right trade for personal note counts
//! (thousands, not millions). The structure is append-only: there is no
//! in-place delete, removal happens by excluding an entry from the next
//! `rebuild`.

use super::embedding::EMBEDDING_DIM;
use super::error::{SearchError, SearchResult};

/// Flat (exhaustive) L2 index over fixed-dimension vectors.
///
/// Each stored vector carries an opaque integer handle assigned by the
/// caller; `search` returns handles, never note ids.
pub struct VectorIndex {
    vectors: Vec<Vec<f32>>,
    handles: Vec<u64>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self {
            vectors: Vec::new(),
            handles: Vec::new(),
        }
    }

    /// Append a vector under the given handle.
    ///
    /// Fails with [`SearchError::DimensionMismatch`] if the vector is not
    /// `EMBEDDING_DIM` long.
    pub fn add(&mut self, vector: Vec<f32>, handle: u64) -> SearchResult<()> {
        check_dimension(&vector)?;
        self.vectors.push(vector);
        self.handles.push(handle);
        Ok(())
    }

    /// Exhaustive nearest-neighbor search.
    ///
    /// Returns up to `min(k, size)` results as `(handle, distance)`
    /// pairs in ascending L2 distance. An empty index yields an empty
    /// result, never an error.
    pub fn search(&self, query: &[f32], k: usize) -> SearchResult<Vec<(u64, f32)>> {
        check_dimension(query)?;

        let mut results: Vec<(u64, f32)> = self
            .handles
            .iter()
            .zip(self.vectors.iter())
            .map(|(&handle, vector)| (handle, l2_distance(query, vector)))
            .collect();

        results.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);

        Ok(results)
    }

    /// Replace the entire contents of the index with the given entries.
    ///
    /// This is the only way to remove vectors. The caller builds the new
    /// entry set (live mappings only) and swaps it in wholesale, so a
    /// reader never observes a half-populated index.
    pub fn rebuild(&mut self, entries: Vec<(u64, Vec<f32>)>) -> SearchResult<()> {
        let mut fresh = Self::new();
        for (handle, vector) in entries {
            fresh.add(vector, handle)?;
        }
        *self = fresh;
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.vectors.len()
    }

    /// Iterate current `(handle, vector)` pairs. Used to carry live
    /// vectors across a rebuild without re-embedding.
    pub fn entries(&self) -> impl Iterator<Item = (u64, &[f32])> {
        self.handles
            .iter()
            .zip(self.vectors.iter())
            .map(|(&h, v)| (h, v.as_slice()))
    }
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn check_dimension(vector: &[f32]) -> SearchResult<()> {
    if vector.len() != EMBEDDING_DIM {
        return Err(SearchError::DimensionMismatch {
            expected: EMBEDDING_DIM,
            actual: vector.len(),
        });
    }
    Ok(())
}

/// Euclidean (L2) distance between two equal-length vectors
fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
