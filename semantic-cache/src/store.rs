use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rerank::{token_overlap_score, SEMANTIC_WEIGHT, TOKEN_OVERLAP_WEIGHT};

/// One indexed query/response pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub chunk_id: Uuid,
    pub query: String,
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub query: String,
    pub chunk_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheHit {
    pub query: String,
    pub chunk_id: Uuid,
    pub response: String,
}

/// Similarity threshold below which `lookup` must return `None` (spec
/// default, overridable per instance).
pub const DEFAULT_THRESHOLD: f32 = 0.95;

/// A single model's indexed entries, protected by one lock so reads never
/// observe a torn state mid-refresh-swap.
#[derive(Default)]
struct ModelIndex {
    entries: Vec<CacheEntry>,
}

/// In-memory index over every model's cache, rebuilt wholesale by the
/// refresh job via `replace_model`. A stub for a real semantic retriever:
/// `semantic_score` here is itself a token-overlap measure, so "semantic"
/// and "rerank" scores are fused per the `score = semantic*0.7 +
/// overlap*0.3` policy decided for this cache (see the design ledger).
pub struct CacheIndex {
    models: RwLock<HashMap<Uuid, ModelIndex>>,
    threshold: f32,
}

impl CacheIndex {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_THRESHOLD)
    }

    pub fn with_threshold(threshold: f32) -> Self {
        Self { models: RwLock::new(HashMap::new()), threshold }
    }

    /// Best-effort top-5 suggestions ranked by fused score, unfiltered by
    /// threshold (suggestions are advisory, not cache hits).
    pub fn suggest(&self, model: Uuid, query: &str) -> Vec<Suggestion> {
        self.ranked(model, query)
            .into_iter()
            .take(5)
            .map(|(entry, _)| Suggestion { query: entry.query, chunk_id: entry.chunk_id })
            .collect()
    }

    /// Returns the best match if its fused score clears the threshold.
    pub fn lookup(&self, model: Uuid, query: &str) -> Option<CacheHit> {
        let (entry, score) = self.ranked(model, query).into_iter().next()?;
        if score < self.threshold {
            return None;
        }
        Some(CacheHit { query: entry.query, chunk_id: entry.chunk_id, response: entry.response })
    }

    fn ranked(&self, model: Uuid, query: &str) -> Vec<(CacheEntry, f32)> {
        let models = self.models.read().unwrap();
        let Some(index) = models.get(&model) else {
            return Vec::new();
        };
        let mut scored: Vec<(CacheEntry, f32)> = index
            .entries
            .iter()
            .map(|entry| (entry.clone(), fused_score(query, &entry.query)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(5);
        scored
    }

    /// Wholesale replacement used by the refresh job once it has replayed
    /// the buffered insert log onto a copy of the index.
    pub fn replace_model(&self, model: Uuid, entries: Vec<CacheEntry>) {
        self.models.write().unwrap().insert(model, ModelIndex { entries });
    }

    /// Drops a model's entries outright, independent of any pending
    /// refresh. Buffered inserts discarded since the last invalidation are
    /// the caller's responsibility (it must also clear the insert log).
    pub fn invalidate(&self, model: Uuid) {
        self.models.write().unwrap().remove(&model);
    }

    pub fn entry_count(&self, model: Uuid) -> usize {
        self.models.read().unwrap().get(&model).map(|i| i.entries.len()).unwrap_or(0)
    }
}

impl Default for CacheIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// A crude stand-in semantic score: normalized shared-character trigram
/// overlap. Real deployments plug in a retriever; this keeps the fusion
/// formula meaningful without one.
fn pseudo_semantic_score(a: &str, b: &str) -> f32 {
    token_overlap_score(a, b)
}

fn fused_score(query: &str, stored: &str) -> f32 {
    let semantic = pseudo_semantic_score(query, stored);
    let overlap = token_overlap_score(query, stored);
    semantic * SEMANTIC_WEIGHT + overlap * TOKEN_OVERLAP_WEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(query: &str, response: &str) -> CacheEntry {
        CacheEntry { chunk_id: Uuid::new_v4(), query: query.to_string(), response: response.to_string() }
    }

    #[test]
    fn lookup_misses_on_empty_index() {
        let index = CacheIndex::new();
        assert!(index.lookup(Uuid::new_v4(), "hello").is_none());
    }

    #[test]
    fn lookup_hits_on_exact_query_match() {
        let index = CacheIndex::new();
        let model = Uuid::new_v4();
        index.replace_model(model, vec![entry("what is the refund policy", "30 days")]);
        let hit = index.lookup(model, "what is the refund policy").unwrap();
        assert_eq!(hit.response, "30 days");
    }

    #[test]
    fn lookup_never_returns_below_threshold() {
        let index = CacheIndex::with_threshold(0.95);
        let model = Uuid::new_v4();
        index.replace_model(model, vec![entry("completely unrelated text", "x")]);
        assert!(index.lookup(model, "something else entirely").is_none());
    }

    #[test]
    fn suggest_returns_at_most_five() {
        let index = CacheIndex::new();
        let model = Uuid::new_v4();
        let entries: Vec<_> = (0..8).map(|i| entry(&format!("query number {i}"), "r")).collect();
        index.replace_model(model, entries);
        assert!(index.suggest(model, "query number").len() <= 5);
    }

    #[test]
    fn invalidate_drops_model_entries() {
        let index = CacheIndex::new();
        let model = Uuid::new_v4();
        index.replace_model(model, vec![entry("hello world", "hi")]);
        index.invalidate(model);
        assert!(index.lookup(model, "hello world").is_none());
        assert_eq!(index.entry_count(model), 0);
    }

    #[test]
    fn entries_are_scoped_per_model() {
        let index = CacheIndex::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        index.replace_model(a, vec![entry("shared question text", "a-answer")]);
        assert!(index.lookup(b, "shared question text").is_none());
    }
}
