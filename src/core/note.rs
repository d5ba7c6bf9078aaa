//! Note data model
//!
//! Notes are owned by the store; the search engine only ever reads them.

use serde::{Deserialize, Serialize};

/// Default workspace for notes created without one
pub const DEFAULT_WORKSPACE: &str = "default";

/// A single note as recorded in the store.
///
/// `id` is assigned at creation and never changes. `updated_at` is
/// bumped on any edit; content-affecting edits (title or content) also
/// trigger re-embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    /// May be empty for voice notes pending transcription; such notes
    /// carry no embedding.
    pub content: String,
    pub tags: Vec<String>,
    pub workspace: String,
    /// Unix epoch milliseconds
    pub created_at: i64,
    /// Unix epoch milliseconds
    pub updated_at: i64,
}

impl Note {
    /// Whether this note carries indexable content
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// Whether the note carries every one of the given tags
    pub fn has_all_tags(&self, tags: &[String]) -> bool {
        tags.iter().all(|t| self.tags.iter().any(|own| own == t))
    }
}

/// Partial update for an existing note. `None` fields are left as-is.
#[derive(Debug, Default, Clone)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub workspace: Option<String>,
}

impl NoteUpdate {
    /// Title and content edits change what the note means and require
    /// re-embedding; tag and workspace edits are metadata only.
    pub fn is_content_affecting(&self) -> bool {
        self.title.is_some() || self.content.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.tags.is_none()
            && self.workspace.is_none()
    }
}
