//! notekeeper library
//!
//! Personal notes with hybrid retrieval: notes live in SQLite, an
//! in-memory vector index provides semantic search, and results from
//! both signals are fused into one ranked list.
//!
//! # Modules
//!
//! - `core`: note model and the SQLite store (system of record)
//! - `search`: embedding, vector index, sync manager, fusion, engine

pub mod core;
pub mod search;

// Re-exports for convenience
pub use core::note::{Note, NoteUpdate, DEFAULT_WORKSPACE};
pub use core::store::SqliteStore;
pub use search::embedding::{Embedder, HarmonicEmbedder, EMBEDDING_DIM};
pub use search::engine::{IndexStats, SearchEngine};
pub use search::error::SearchError;
pub use search::fusion::{HitSource, SearchHit};
