//! Keyword search over note text
//!
//! Literal matching is the store's job (FTS5 when the query tokenizes,
//! substring LIKE otherwise); this wrapper only enforces the query
//! contract and shapes the result. The store's relevance score is
//! treated as an opaque total order, passed through for normalization
//! during fusion.

use anyhow::Result;

use crate::core::store::SqliteStore;

use super::error::SearchError;

/// A keyword match: note id plus the store's native relevance score,
/// when it exposes one (higher = better)
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordHit {
    pub note_id: i64,
    pub score: Option<f64>,
}

/// Case-insensitive keyword search, ranked by the store's native text
/// relevance. Empty queries are rejected with [`SearchError::EmptyInput`].
pub fn search(
    store: &SqliteStore,
    query: &str,
    workspace: Option<&str>,
    tags: &[String],
) -> Result<Vec<KeywordHit>> {
    if query.trim().is_empty() {
        return Err(SearchError::EmptyInput.into());
    }

    let hits = store.text_search(query, workspace, tags)?;
    Ok(hits
        .into_iter()
        .map(|(note_id, score)| KeywordHit { note_id, score })
        .collect())
}
