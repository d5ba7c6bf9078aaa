//! Note store backed by SQLite
//!
//! The store is the system of record for notes. Keyword search is
//! delegated to SQLite itself: an FTS5 table over title and content
//! provides indexed BM25-ranked matching, with a plain substring LIKE
//! fallback when a query has no FTS tokens or no token matches.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use super::note::{Note, NoteUpdate, DEFAULT_WORKSPACE};

/// SQLite-backed note store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create database at path
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open note database at {}", db_path.display()))?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Open in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL DEFAULT '',
                tags TEXT NOT NULL DEFAULT '[]',  -- JSON array
                workspace TEXT NOT NULL DEFAULT 'default',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            -- FTS5 full-text index over title and content, kept in sync
            -- with the notes table by triggers (external content table)
            CREATE VIRTUAL TABLE IF NOT EXISTS notes_fts USING fts5(
                title,
                content,
                content='notes',
                content_rowid='id',
                tokenize='unicode61'
            );

            CREATE TRIGGER IF NOT EXISTS notes_ai AFTER INSERT ON notes BEGIN
                INSERT INTO notes_fts(rowid, title, content)
                VALUES (new.id, new.title, new.content);
            END;

            CREATE TRIGGER IF NOT EXISTS notes_ad AFTER DELETE ON notes BEGIN
                INSERT INTO notes_fts(notes_fts, rowid, title, content)
                VALUES ('delete', old.id, old.title, old.content);
            END;

            CREATE TRIGGER IF NOT EXISTS notes_au AFTER UPDATE ON notes BEGIN
                INSERT INTO notes_fts(notes_fts, rowid, title, content)
                VALUES ('delete', old.id, old.title, old.content);
                INSERT INTO notes_fts(rowid, title, content)
                VALUES (new.id, new.title, new.content);
            END;

            CREATE INDEX IF NOT EXISTS idx_notes_workspace ON notes(workspace);
            CREATE INDEX IF NOT EXISTS idx_notes_updated ON notes(updated_at);
            "#,
        )?;

        Ok(())
    }

    /// Insert a new note and return it with its assigned id
    pub fn add_note(
        &self,
        title: &str,
        content: &str,
        tags: Vec<String>,
        workspace: Option<&str>,
    ) -> Result<Note> {
        let workspace = workspace.unwrap_or(DEFAULT_WORKSPACE);
        let tags_json = serde_json::to_string(&tags)?;
        let now = now_ms();

        self.conn.execute(
            r#"
            INSERT INTO notes (title, content, tags, workspace, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
            params![title, content, tags_json, workspace, now],
        )?;

        Ok(Note {
            id: self.conn.last_insert_rowid(),
            title: title.to_string(),
            content: content.to_string(),
            tags,
            workspace: workspace.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Get note by id
    pub fn get(&self, id: i64) -> Result<Option<Note>> {
        let note = self
            .conn
            .query_row(
                "SELECT id, title, content, tags, workspace, created_at, updated_at
                 FROM notes WHERE id = ?1",
                params![id],
                note_from_row,
            )
            .optional()?;

        Ok(note)
    }

    /// All notes, optionally scoped to one workspace, ordered by id
    pub fn get_all(&self, workspace: Option<&str>) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, content, tags, workspace, created_at, updated_at
             FROM notes
             WHERE ?1 IS NULL OR workspace = ?1
             ORDER BY id",
        )?;

        let rows = stmt.query_map(params![workspace], note_from_row)?;

        let mut notes = Vec::new();
        for row in rows {
            notes.push(row?);
        }
        Ok(notes)
    }

    /// Apply a partial update and bump `updated_at`.
    ///
    /// Returns the updated note, or `None` if no note has this id.
    pub fn update_note(&self, id: i64, update: &NoteUpdate) -> Result<Option<Note>> {
        let Some(mut note) = self.get(id)? else {
            return Ok(None);
        };

        if let Some(title) = &update.title {
            note.title = title.clone();
        }
        if let Some(content) = &update.content {
            note.content = content.clone();
        }
        if let Some(tags) = &update.tags {
            note.tags = tags.clone();
        }
        if let Some(workspace) = &update.workspace {
            note.workspace = workspace.clone();
        }
        note.updated_at = now_ms();

        let tags_json = serde_json::to_string(&note.tags)?;
        self.conn.execute(
            "UPDATE notes
             SET title = ?2, content = ?3, tags = ?4, workspace = ?5, updated_at = ?6
             WHERE id = ?1",
            params![
                id,
                note.title,
                note.content,
                tags_json,
                note.workspace,
                note.updated_at
            ],
        )?;

        Ok(Some(note))
    }

    /// Delete note by id. Returns whether a row was removed.
    pub fn delete_note(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Number of stored notes
    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Native text search over title and content.
    ///
    /// Tries the FTS5 index first (terms OR-joined, BM25 rank returned
    /// as a higher-is-better score), then falls back to case-insensitive
    /// substring matching with no numeric score. Workspace and tag
    /// filters are applied here so ranking never wastes work on rows the
    /// caller would drop.
    pub fn text_search(
        &self,
        query: &str,
        workspace: Option<&str>,
        tags: &[String],
    ) -> Result<Vec<(i64, Option<f64>)>> {
        let match_expr = fts_match_expr(query);

        if let Some(expr) = match_expr {
            let hits = self.fts_search(&expr, workspace, tags)?;
            if !hits.is_empty() {
                return Ok(hits);
            }
        }

        self.substring_search(query, workspace, tags)
    }

    fn fts_search(
        &self,
        match_expr: &str,
        workspace: Option<&str>,
        tags: &[String],
    ) -> Result<Vec<(i64, Option<f64>)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT n.id, -notes_fts.rank, n.tags
            FROM notes_fts
            JOIN notes n ON n.id = notes_fts.rowid
            WHERE notes_fts MATCH ?1
              AND (?2 IS NULL OR n.workspace = ?2)
            ORDER BY notes_fts.rank, n.updated_at DESC, n.id
            "#,
        )?;

        let rows = stmt.query_map(params![match_expr, workspace], |row| {
            let id: i64 = row.get(0)?;
            let score: f64 = row.get(1)?;
            let tags_json: String = row.get(2)?;
            Ok((id, score, tags_json))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let (id, score, tags_json) = row?;
            if row_has_all_tags(&tags_json, tags) {
                hits.push((id, Some(score)));
            }
        }
        Ok(hits)
    }

    fn substring_search(
        &self,
        query: &str,
        workspace: Option<&str>,
        tags: &[String],
    ) -> Result<Vec<(i64, Option<f64>)>> {
        let pattern = format!("%{}%", escape_like(&query.trim().to_lowercase()));

        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, tags
            FROM notes
            WHERE (lower(title) LIKE ?1 ESCAPE '\' OR lower(content) LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR workspace = ?2)
            ORDER BY updated_at DESC, id
            "#,
        )?;

        let rows = stmt.query_map(params![pattern, workspace], |row| {
            let id: i64 = row.get(0)?;
            let tags_json: String = row.get(1)?;
            Ok((id, tags_json))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let (id, tags_json) = row?;
            if row_has_all_tags(&tags_json, tags) {
                hits.push((id, None));
            }
        }
        Ok(hits)
    }

    /// Overwrite a note's `updated_at` (test-only, for deterministic
    /// tie-break scenarios)
    #[cfg(test)]
    pub(crate) fn set_updated_at(&self, id: i64, updated_at: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE notes SET updated_at = ?2 WHERE id = ?1",
            params![id, updated_at],
        )?;
        Ok(())
    }
}

fn note_from_row(row: &Row) -> rusqlite::Result<Note> {
    let tags_json: String = row.get(3)?;
    let tags: Vec<String> = serde_json::from_str(&tags_json).unwrap_or_default();
    Ok(Note {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        tags,
        workspace: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn row_has_all_tags(tags_json: &str, wanted: &[String]) -> bool {
    if wanted.is_empty() {
        return true;
    }
    let tags: Vec<String> = serde_json::from_str(tags_json).unwrap_or_default();
    wanted.iter().all(|t| tags.iter().any(|own| own == t))
}

/// Build an FTS5 MATCH expression from free-form query text.
///
/// Terms are quoted (FTS5 string syntax, embedded quotes doubled) and
/// OR-joined so that a note matching any query word ranks; BM25 still
/// rewards notes matching more of them. Returns `None` when the query
/// has no indexable tokens.
fn fts_match_expr(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|s| !s.is_empty())
        .map(|s| format!("\"{}\"", s.replace('"', "\"\"")))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

/// Escape LIKE wildcards so query text matches literally
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_notes() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .add_note(
                "Meeting notes",
                "quarterly planning discussion",
                vec!["work".to_string()],
                Some("office"),
            )
            .unwrap();
        store
            .add_note(
                "Grocery list",
                "milk eggs flour",
                vec!["errands".to_string()],
                None,
            )
            .unwrap();
        store
    }

    #[test]
    fn test_add_and_get() {
        let store = SqliteStore::open_in_memory().unwrap();
        let note = store
            .add_note("Title", "body text", vec!["a".to_string()], None)
            .unwrap();

        let fetched = store.get(note.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Title");
        assert_eq!(fetched.content, "body text");
        assert_eq!(fetched.tags, vec!["a".to_string()]);
        assert_eq!(fetched.workspace, DEFAULT_WORKSPACE);
        assert_eq!(fetched.created_at, fetched.updated_at);

        assert!(store.get(note.id + 1).unwrap().is_none());
    }

    #[test]
    fn test_update_bumps_updated_at() {
        let store = SqliteStore::open_in_memory().unwrap();
        let note = store.add_note("Title", "body", vec![], None).unwrap();
        store.set_updated_at(note.id, 100).unwrap();

        let update = NoteUpdate {
            content: Some("new body".to_string()),
            ..Default::default()
        };
        let updated = store.update_note(note.id, &update).unwrap().unwrap();
        assert_eq!(updated.content, "new body");
        assert!(updated.updated_at > 100);

        assert!(store
            .update_note(9999, &NoteUpdate::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delete() {
        let store = store_with_notes();
        assert!(store.delete_note(1).unwrap());
        assert!(!store.delete_note(1).unwrap());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_text_search_fts_token_match() {
        let store = store_with_notes();

        let hits = store.text_search("planning", None, &[]).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 1);
        // FTS path carries a numeric score
        assert!(hits[0].1.is_some());
    }

    #[test]
    fn test_text_search_substring_fallback() {
        let store = store_with_notes();

        // "Groc" is not a full token, FTS finds nothing, LIKE does
        let hits = store.text_search("Groc", None, &[]).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 2);
        assert!(hits[0].1.is_none());
    }

    #[test]
    fn test_text_search_workspace_and_tag_filters() {
        let store = store_with_notes();

        let hits = store.text_search("Meeting", Some("office"), &[]).unwrap();
        assert_eq!(hits.len(), 1);

        let hits = store.text_search("Meeting", Some("default"), &[]).unwrap();
        assert!(hits.is_empty());

        let hits = store
            .text_search("Meeting", None, &["personal".to_string()])
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_text_search_survives_edit_and_delete() {
        let store = store_with_notes();

        let update = NoteUpdate {
            content: Some("rescheduled to friday".to_string()),
            ..Default::default()
        };
        store.update_note(1, &update).unwrap();

        // New content is findable, old content is not
        assert_eq!(store.text_search("rescheduled", None, &[]).unwrap().len(), 1);
        assert!(store.text_search("quarterly", None, &[]).unwrap().is_empty());

        store.delete_note(1).unwrap();
        assert!(store
            .text_search("rescheduled", None, &[])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_fts_match_expr() {
        assert_eq!(fts_match_expr("hello world"), Some("\"hello\" OR \"world\"".to_string()));
        assert_eq!(fts_match_expr("  ...  "), None);
        assert_eq!(fts_match_expr(""), None);
    }
}
