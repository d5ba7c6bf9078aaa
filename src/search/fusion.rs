//! Result fusion — merging semantic and keyword hit lists
//!
//! The two signals live on incompatible scales (L2 distance vs. the
//! store's text relevance), so each is normalized into (0, 1]
//! independently before being summed per note id. A note found by both
//! searchers therefore always outranks the same note found by one.
//! All per-query scoring state is discarded after the pass; there is no
//! cross-query cache.

use std::collections::HashMap;

/// Which searcher(s) produced a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitSource {
    Semantic,
    Keyword,
    Both,
}

impl HitSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            HitSource::Semantic => "semantic",
            HitSource::Keyword => "keyword",
            HitSource::Both => "both",
        }
    }
}

/// One fused search result
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub note_id: i64,
    /// Fused relevance; per-source contributions are each in (0, 1]
    pub score: f64,
    pub source: HitSource,
}

/// Normalize an L2 distance into a (0, 1] score: closer vectors score
/// higher, an exact match scores 1.
pub fn semantic_score(distance: f32) -> f64 {
    1.0 / (1.0 + f64::from(distance.max(0.0)))
}

/// Normalize one batch of keyword hits into (0, 1].
///
/// Backends without a numeric relevance get a fixed 1.0 per hit. When a
/// numeric score is present (higher = better), the batch is min-max
/// scaled; the +1 shift keeps the worst hit strictly above zero while
/// the best maps to exactly 1.
pub fn normalize_keyword_scores(hits: &[(i64, Option<f64>)]) -> Vec<(i64, f64)> {
    let numeric: Vec<f64> = hits.iter().filter_map(|(_, s)| *s).collect();

    if numeric.len() != hits.len() || hits.is_empty() {
        return hits.iter().map(|(id, _)| (*id, 1.0)).collect();
    }

    let min = numeric.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = numeric.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    hits.iter()
        .map(|(id, s)| {
            let s = s.unwrap_or(min);
            (*id, (s - min + 1.0) / (range + 1.0))
        })
        .collect()
}

/// Merge normalized semantic and keyword hits by note id.
///
/// A note present in both lists gets the sum of its two scores and the
/// `both` tag. Duplicate ids within one list keep their best score.
pub fn fuse(semantic: Vec<(i64, f64)>, keyword: Vec<(i64, f64)>) -> Vec<SearchHit> {
    let mut merged: HashMap<i64, SearchHit> = HashMap::new();

    for (note_id, score) in semantic {
        merged
            .entry(note_id)
            .and_modify(|hit| hit.score = hit.score.max(score))
            .or_insert(SearchHit {
                note_id,
                score,
                source: HitSource::Semantic,
            });
    }

    for (note_id, score) in keyword {
        match merged.get_mut(&note_id) {
            Some(hit) if hit.source == HitSource::Semantic => {
                hit.score += score;
                hit.source = HitSource::Both;
            }
            Some(hit) => {
                // Duplicate keyword id: keep the better contribution
                if hit.source == HitSource::Keyword {
                    hit.score = hit.score.max(score);
                }
            }
            None => {
                merged.insert(
                    note_id,
                    SearchHit {
                        note_id,
                        score,
                        source: HitSource::Keyword,
                    },
                );
            }
        }
    }

    merged.into_values().collect()
}

/// Final deterministic ordering: fused score descending, then most
/// recently updated, then note id ascending.
pub fn rank(mut hits: Vec<SearchHit>, updated_at: impl Fn(i64) -> i64, k: usize) -> Vec<SearchHit> {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| updated_at(b.note_id).cmp(&updated_at(a.note_id)))
            .then_with(|| a.note_id.cmp(&b.note_id))
    });
    hits.truncate(k);
    hits
}
