//! CLI command handlers

pub mod add;
pub mod delete;
pub mod edit;
pub mod index;
pub mod list;
pub mod search;

use anyhow::Result;
use std::path::PathBuf;

use notekeeper::{SearchEngine, SqliteStore};

/// Database location: `NOTES_DB_PATH` if set, `./notes.db` otherwise
pub fn default_db_path() -> PathBuf {
    std::env::var_os("NOTES_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("notes.db"))
}

/// Open the store and bring up the engine (reconciles the vector index
/// against the store on the way)
pub fn open_engine() -> Result<SearchEngine> {
    let store = SqliteStore::open(&default_db_path())?;
    SearchEngine::new(store)
}
