//! Error taxonomy for the search engine

use thiserror::Error;

/// Errors raised by the search engine and its components.
///
/// Recovery policy per variant:
/// - `EmptyInput`: caller error, reject at the boundary.
/// - `DimensionMismatch`: model-version bug, should never happen in
///   normal operation.
/// - `EmbedderUnavailable`: transient; callers degrade to keyword-only.
/// - `UnknownHandle`: expected race between edit and search; the hit is
///   dropped, never surfaced to the user.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Empty or whitespace-only text passed to embed/search
    #[error("empty input: nothing to embed or search for")]
    EmptyInput,

    /// Vector length does not match the index dimension
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Embedding backend failed or timed out
    #[error("embedder unavailable: {0}")]
    EmbedderUnavailable(String),

    /// Handle is stale or was never allocated
    #[error("unknown or stale index handle: {0}")]
    UnknownHandle(u64),
}

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;
