//! Search engine — ties the embedder, vector index, sync manager,
//! keyword searcher and fusion together behind one entry point
//!
//! The index and handle map form the single write domain, guarded by one
//! `RwLock`: mutations serialize, searches share a committed state, and
//! a rebuild swaps in a freshly built structure so readers never observe
//! it half-populated. The index is a derived, disposable cache; the
//! store stays authoritative and the whole index is reconciled from it
//! on startup.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::core::note::Note;
use crate::core::store::SqliteStore;

use super::embedding::{embedding_text, Embedder, HarmonicEmbedder};
use super::error::SearchError;
use super::fusion::{self, semantic_score, SearchHit};
use super::keyword;
use super::sync::IndexSync;

/// Live/stale accounting for the vector index
#[derive(Debug)]
pub struct IndexStats {
    /// Notes currently resolvable through the index
    pub live: usize,
    /// Superseded or deleted mappings awaiting compaction
    pub stale: usize,
    /// Vectors physically held, stale included
    pub vectors: usize,
}

/// Hybrid note search engine
pub struct SearchEngine {
    store: SqliteStore,
    embedder: Box<dyn Embedder>,
    sync: RwLock<IndexSync>,
}

impl SearchEngine {
    /// Create an engine over the given store with the default embedder
    /// and reconcile the index against the store's current contents.
    pub fn new(store: SqliteStore) -> Result<Self> {
        Self::with_embedder(store, Box::new(HarmonicEmbedder::new()))
    }

    /// Create an engine with a specific embedding backend.
    ///
    /// An unavailable embedder is fatal to semantic search only: the
    /// engine still comes up and serves keyword results.
    pub fn with_embedder(store: SqliteStore, embedder: Box<dyn Embedder>) -> Result<Self> {
        let engine = Self {
            store,
            embedder,
            sync: RwLock::new(IndexSync::new()),
        };

        if let Err(e) = engine.rebuild_index() {
            match e.downcast_ref::<SearchError>() {
                Some(SearchError::EmbedderUnavailable(_)) => {
                    eprintln!("Warning: semantic search disabled: {}", e);
                }
                _ => return Err(e),
            }
        }

        Ok(engine)
    }

    /// The underlying note store
    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    /// Hybrid search: keyword and semantic signals fused into one ranked
    /// list of at most `k` hits.
    ///
    /// Either signal failing on its own degrades to an empty
    /// contribution; the query only fails when both sides fail or the
    /// query is empty.
    pub fn search(
        &self,
        query: &str,
        k: usize,
        workspace: Option<&str>,
        tags: &[String],
    ) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyInput.into());
        }

        let keyword_hits = keyword::search(&self.store, query, workspace, tags);
        let semantic_hits = self.semantic_candidates(query, k, workspace, tags);

        let (semantic_hits, keyword_hits) = match (semantic_hits, keyword_hits) {
            (Err(semantic_err), Err(keyword_err)) => {
                return Err(anyhow!(
                    "search failed: keyword: {}; semantic: {}",
                    keyword_err,
                    semantic_err
                ));
            }
            (semantic, keyword) => (semantic.unwrap_or_default(), keyword.unwrap_or_default()),
        };

        let keyword_pairs: Vec<(i64, Option<f64>)> = keyword_hits
            .iter()
            .map(|h| (h.note_id, h.score))
            .collect();

        let fused = fusion::fuse(
            semantic_hits,
            fusion::normalize_keyword_scores(&keyword_pairs),
        );

        // Recency for tie-breaking; a note deleted mid-query drops out
        let mut updated_at: HashMap<i64, i64> = HashMap::new();
        let mut hits = Vec::with_capacity(fused.len());
        for hit in fused {
            if let Some(note) = self.store.get(hit.note_id)? {
                updated_at.insert(hit.note_id, note.updated_at);
                hits.push(hit);
            }
        }

        Ok(fusion::rank(
            hits,
            |id| updated_at.get(&id).copied().unwrap_or(i64::MIN),
            k,
        ))
    }

    /// Semantic candidates as `(note_id, normalized score)` pairs,
    /// filtered by workspace and tags before fusion.
    fn semantic_candidates(
        &self,
        query: &str,
        k: usize,
        workspace: Option<&str>,
        tags: &[String],
    ) -> Result<Vec<(i64, f64)>> {
        let query_vector = self.embedder.embed(query)?;

        let sync = self.read_sync();
        // Over-query by the stale count so dropped stale handles cannot
        // starve the top-k
        let fetch = k + sync.stale_count();

        let mut candidates = Vec::new();
        for (handle, distance) in sync.search(&query_vector, fetch)? {
            // Stale handle: an edit or delete raced this search, drop it
            let Ok(note_id) = sync.resolve(handle) else {
                continue;
            };
            let Some(note) = self.store.get(note_id)? else {
                continue;
            };
            if let Some(ws) = workspace {
                if note.workspace != ws {
                    continue;
                }
            }
            if !note.has_all_tags(tags) {
                continue;
            }

            candidates.push((note_id, semantic_score(distance)));
            if candidates.len() == k {
                break;
            }
        }

        Ok(candidates)
    }

    /// Re-embed a note after a content-affecting mutation.
    ///
    /// A note whose content became empty is dropped from the index
    /// instead.
    pub fn reindex_note(&self, note: &Note) -> Result<()> {
        if !note.has_content() {
            return self.remove_note(note.id);
        }

        let vector = match self
            .embedder
            .embed(&embedding_text(&note.title, &note.content))
        {
            Ok(vector) => vector,
            // Text with no embeddable tokens (e.g. punctuation only)
            // carries no embedding; the note stays keyword-searchable
            Err(SearchError::EmptyInput) => return self.remove_note(note.id),
            Err(e) => return Err(e.into()),
        };

        let mut sync = self.write_sync();
        sync.upsert(note.id, vector)?;
        if sync.needs_compaction() {
            sync.compact()?;
        }
        Ok(())
    }

    /// Drop a deleted note's mapping; compacts when stale entries have
    /// piled up past the threshold.
    pub fn remove_note(&self, note_id: i64) -> Result<()> {
        let mut sync = self.write_sync();
        sync.remove(note_id);
        if sync.needs_compaction() {
            sync.compact()?;
        }
        Ok(())
    }

    /// Rebuild the index from the store: every note with content is
    /// re-embedded, everything else is dropped. Idempotent; the new
    /// index is swapped in atomically from a reader's point of view.
    ///
    /// Returns the number of notes indexed.
    pub fn rebuild_index(&self) -> Result<usize> {
        let notes = self.store.get_all(None)?;

        let mut fresh = IndexSync::new();
        let mut indexed = 0;
        for note in &notes {
            if !note.has_content() {
                continue;
            }
            match self
                .embedder
                .embed(&embedding_text(&note.title, &note.content))
            {
                Ok(vector) => {
                    fresh.upsert(note.id, vector)?;
                    indexed += 1;
                }
                // No embeddable tokens: skip the note, keyword search
                // still covers it
                Err(SearchError::EmptyInput) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        *self.write_sync() = fresh;
        Ok(indexed)
    }

    /// Current index accounting
    pub fn stats(&self) -> IndexStats {
        let sync = self.read_sync();
        IndexStats {
            live: sync.live_count(),
            stale: sync.stale_count(),
            vectors: sync.index_size(),
        }
    }

    fn read_sync(&self) -> RwLockReadGuard<'_, IndexSync> {
        self.sync.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_sync(&self) -> RwLockWriteGuard<'_, IndexSync> {
        self.sync.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::error::SearchResult;
    use crate::search::fusion::HitSource;

    /// Embedding backend that is always down
    struct UnavailableEmbedder;

    impl Embedder for UnavailableEmbedder {
        fn embed(&self, _text: &str) -> SearchResult<Vec<f32>> {
            Err(SearchError::EmbedderUnavailable("backend offline".into()))
        }
    }

    fn engine() -> SearchEngine {
        SearchEngine::new(SqliteStore::open_in_memory().unwrap()).unwrap()
    }

    fn degraded_engine() -> SearchEngine {
        SearchEngine::with_embedder(
            SqliteStore::open_in_memory().unwrap(),
            Box::new(UnavailableEmbedder),
        )
        .unwrap()
    }

    fn add_note(engine: &SearchEngine, title: &str, content: &str) -> Note {
        let note = engine
            .store()
            .add_note(title, content, vec![], None)
            .unwrap();
        engine.reindex_note(&note).unwrap();
        note
    }

    fn hit_ids(hits: &[SearchHit]) -> Vec<i64> {
        hits.iter().map(|h| h.note_id).collect()
    }

    #[test]
    fn test_empty_query_rejected() {
        let engine = engine();
        let err = engine.search("  ", 5, None, &[]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SearchError>(),
            Some(SearchError::EmptyInput)
        ));
    }

    #[test]
    fn test_empty_index_returns_empty() {
        let engine = engine();
        let hits = engine.search("anything", 5, None, &[]).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_keyword_match_guarantee() {
        let engine = engine();
        let note = add_note(&engine, "Meeting", "quarterly planning with the team");
        add_note(&engine, "Grocery list", "milk eggs flour");

        let hits = engine.search("Meeting", 10, None, &[]).unwrap();
        assert!(hit_ids(&hits).contains(&note.id));
    }

    #[test]
    fn test_both_sources_tagged_and_boosted() {
        let engine = engine();
        let note = add_note(&engine, "Rust ownership", "borrow checker lifetimes");

        let hits = engine.search("Rust ownership", 5, None, &[]).unwrap();
        let hit = hits.iter().find(|h| h.note_id == note.id).unwrap();
        assert_eq!(hit.source, HitSource::Both);
        assert!(hit.score > 1.0);
    }

    #[test]
    fn test_startup_reconciliation() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.add_note("One", "first note body", vec![], None).unwrap();
        store.add_note("Two", "second note body", vec![], None).unwrap();
        store.add_note("Pending", "", vec![], None).unwrap();

        let engine = SearchEngine::new(store).unwrap();
        let stats = engine.stats();
        // The empty-content note carries no embedding
        assert_eq!(stats.live, 2);
        assert_eq!(stats.stale, 0);
    }

    #[test]
    fn test_deleted_note_filtered_before_compaction() {
        let engine = engine();
        let doomed = add_note(&engine, "Secret", "zanzibar flamingo protocol");
        for i in 0..4 {
            add_note(&engine, &format!("Filler {}", i), "ordinary note body");
        }

        let hits = engine.search("zanzibar flamingo", 10, None, &[]).unwrap();
        assert!(hit_ids(&hits).contains(&doomed.id));

        engine.store().delete_note(doomed.id).unwrap();
        engine.remove_note(doomed.id).unwrap();

        // 1 stale / 4 live is under the compaction threshold, so the
        // vector is still physically present and must be filtered at
        // resolve time
        let stats = engine.stats();
        assert_eq!(stats.stale, 1);
        assert_eq!(stats.vectors, 5);

        let hits = engine.search("zanzibar flamingo", 10, None, &[]).unwrap();
        assert!(!hit_ids(&hits).contains(&doomed.id));
    }

    #[test]
    fn test_auto_compaction_past_threshold() {
        let engine = engine();
        let notes: Vec<Note> = (0..3)
            .map(|i| add_note(&engine, &format!("Note {}", i), "some body text"))
            .collect();

        engine.store().delete_note(notes[0].id).unwrap();
        engine.remove_note(notes[0].id).unwrap();

        // 1 stale / 2 live = 50% exceeds the 30% threshold
        let stats = engine.stats();
        assert_eq!(stats.stale, 0);
        assert_eq!(stats.vectors, 2);
    }

    #[test]
    fn test_rebuild_size_accounting() {
        let engine = engine();
        let notes: Vec<Note> = (0..5)
            .map(|i| add_note(&engine, &format!("Note {}", i), "body text here"))
            .collect();

        for note in &notes[..2] {
            engine.store().delete_note(note.id).unwrap();
            engine.remove_note(note.id).unwrap();
        }

        let indexed = engine.rebuild_index().unwrap();
        assert_eq!(indexed, 3);

        let stats = engine.stats();
        assert_eq!(stats.live, 3);
        assert_eq!(stats.stale, 0);
        assert_eq!(stats.vectors, 3);
    }

    #[test]
    fn test_edit_to_empty_content_drops_embedding() {
        let engine = engine();
        let note = add_note(&engine, "Voice memo", "transcribed text");
        assert_eq!(engine.stats().live, 1);

        let mut emptied = note.clone();
        emptied.content = String::new();
        engine.reindex_note(&emptied).unwrap();

        assert_eq!(engine.stats().live, 0);
    }

    #[test]
    fn test_degraded_mode_keyword_only() {
        let engine = degraded_engine();
        engine
            .store()
            .add_note("Grocery list", "milk eggs flour", vec![], None)
            .unwrap();

        let hits = engine.search("milk", 5, None, &[]).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source, HitSource::Keyword);
        assert_eq!(hits[0].score, 1.0);
    }

    #[test]
    fn test_duplicate_titles_tie_break_by_recency() {
        // Keyword-only mode gives both notes identical scores, so the
        // tie must fall to updated_at
        let engine = degraded_engine();
        let older = engine
            .store()
            .add_note("Meeting", "about the budget", vec![], None)
            .unwrap();
        let newer = engine
            .store()
            .add_note("Meeting", "about the roadmap", vec![], None)
            .unwrap();
        engine.store().set_updated_at(older.id, 1_000).unwrap();
        engine.store().set_updated_at(newer.id, 2_000).unwrap();

        let hits = engine.search("Meeting", 1, None, &[]).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].note_id, newer.id);
    }

    #[test]
    fn test_punctuation_only_note_does_not_block_startup() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.add_note("!!!", "???", vec![], None).unwrap();
        let real = store
            .add_note("Real note", "useful body text", vec![], None)
            .unwrap();

        // Reconciliation skips the note with no embeddable tokens
        // instead of failing the whole engine
        let engine = SearchEngine::new(store).unwrap();
        assert_eq!(engine.stats().live, 1);
        assert_eq!(engine.rebuild_index().unwrap(), 1);

        let hits = engine.search("useful body", 5, None, &[]).unwrap();
        assert!(hit_ids(&hits).contains(&real.id));

        // The skipped note is still reachable through keyword search
        let hits = engine.search("!!!", 5, None, &[]).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source, HitSource::Keyword);
    }

    #[test]
    fn test_reindex_unembeddable_text_drops_mapping() {
        let engine = engine();
        let note = add_note(&engine, "Draft", "actual words here");
        assert_eq!(engine.stats().live, 1);

        let mut garbled = note.clone();
        garbled.title = "!!!".to_string();
        garbled.content = "???".to_string();
        engine.reindex_note(&garbled).unwrap();

        assert_eq!(engine.stats().live, 0);
    }

    #[test]
    fn test_tag_scoping() {
        let engine = engine();
        let work = engine
            .store()
            .add_note("Plan", "project milestones", vec!["work".to_string()], None)
            .unwrap();
        let home = engine
            .store()
            .add_note("Plan", "garden layout", vec!["home".to_string()], None)
            .unwrap();
        engine.reindex_note(&work).unwrap();
        engine.reindex_note(&home).unwrap();

        let hits = engine
            .search("Plan", 10, None, &["work".to_string()])
            .unwrap();
        assert_eq!(hit_ids(&hits), vec![work.id]);

        assert!(engine
            .search("Plan", 10, None, &["missing".to_string()])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_workspace_scoping() {
        let engine = engine();
        let work = engine
            .store()
            .add_note("Plan", "project milestones", vec![], Some("work"))
            .unwrap();
        let home = engine
            .store()
            .add_note("Plan", "garden layout", vec![], Some("home"))
            .unwrap();
        engine.reindex_note(&work).unwrap();
        engine.reindex_note(&home).unwrap();

        let hits = engine.search("Plan", 10, Some("work"), &[]).unwrap();
        assert_eq!(hit_ids(&hits), vec![work.id]);
    }
}
