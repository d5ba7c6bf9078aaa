//! Hybrid search engine
//!
//! - `embedding`: deterministic HTP text embeddings
//! - `index`: in-memory flat L2 vector index
//! - `sync`: handle ↔ note-id mapping with stale tracking and compaction
//! - `keyword`: literal matching delegated to the store
//! - `fusion`: score normalization and merging of the two signals
//! - `engine`: the single search/reindex entry point
//! - `error`: typed failure taxonomy

pub mod embedding;
pub mod engine;
pub mod error;
pub mod fusion;
pub mod index;
pub mod keyword;
pub mod sync;
