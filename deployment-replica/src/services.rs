use std::sync::Arc;

use bazaar_catalog::AppError;
use chrono::Utc;
use r2e::prelude::*;
use replica_coordinator::{AsyncWriteQueue, Document, DocumentIndex, SearchResult, SourceInfo, WriteLog, WriteOp, WriteRecord};
use uuid::Uuid;

use crate::state::ReplicaConfig;

/// Applies and durably records the five mutating operations the write
/// coordinator quarantines behind permission checks. In dev mode
/// (single replica) a mutation is applied to the in-memory index before
/// acknowledging; in production mode it's appended to the queue for the
/// background consumer to apply, and acknowledged as accepted, not done.
#[derive(Clone)]
pub struct ReplicaWriteService {
    index: Arc<DocumentIndex>,
    write_log: Arc<WriteLog>,
    queue: Arc<AsyncWriteQueue>,
    production_mode: bool,
}

#[bean]
impl ReplicaWriteService {
    pub fn new(index: Arc<DocumentIndex>, write_log: Arc<WriteLog>, queue: Arc<AsyncWriteQueue>, replica: ReplicaConfig) -> Self {
        Self { index, write_log, queue, production_mode: replica.production_mode }
    }

    fn record(&self, op: WriteOp, caller: Uuid, payload: serde_json::Value) -> WriteRecord {
        WriteRecord { op, timestamp: Utc::now(), caller, payload }
    }

    /// Returns `true` if the write was applied synchronously (dev mode,
    /// 200) or `false` if it was only durably queued (production mode,
    /// 202) — the controller maps this straight to the response status.
    fn accept(&self, record: WriteRecord) -> Result<bool, AppError> {
        if self.production_mode {
            self.queue.enqueue(record).map_err(|_| AppError::Transient("failed to append to write log".into()))?;
            Ok(false)
        } else {
            self.write_log.append(&record).map_err(|_| AppError::Transient("failed to append to write log".into()))?;
            self.apply(&record);
            Ok(true)
        }
    }

    fn apply(&self, record: &WriteRecord) {
        match record.op {
            WriteOp::Insert => {
                if let (Some(source_id), Some(source_name), Some(docs)) =
                    (record.payload.get("source_id").and_then(|v| v.as_str()).and_then(|s| Uuid::parse_str(s).ok()), record.payload.get("source_name").and_then(|v| v.as_str()), record.payload.get("documents"))
                {
                    let documents: Vec<Document> = serde_json::from_value(docs.clone()).unwrap_or_default();
                    self.index.insert(source_id, source_name, documents);
                }
            }
            WriteOp::Delete => {
                if let Some(ids) = record.payload.get("source_ids") {
                    let source_ids: Vec<Uuid> = serde_json::from_value(ids.clone()).unwrap_or_default();
                    self.index.delete(&source_ids);
                }
            }
            WriteOp::Upvote => {
                if let Some(pairs) = record.payload.get("text_id_pairs") {
                    let pairs: Vec<(String, Uuid)> = serde_json::from_value(pairs.clone()).unwrap_or_default();
                    self.index.upvote(&pairs);
                }
            }
            WriteOp::Associate => {
                if let Some(pairs) = record.payload.get("text_pairs") {
                    let pairs: Vec<(String, String)> = serde_json::from_value(pairs.clone()).unwrap_or_default();
                    self.index.associate(&pairs);
                }
            }
            WriteOp::Save | WriteOp::ImplicitFeedback => {}
        }
    }

    /// Applies every record a background consumer has drained from the
    /// queue, in FIFO order — called by the production-mode consumer
    /// loop spawned in `main`, never by request handlers directly.
    pub fn apply_drained(&self, records: Vec<WriteRecord>) {
        for record in &records {
            self.apply(record);
        }
    }

    pub async fn insert(&self, caller: Uuid, source_name: &str, documents: Vec<Document>) -> Result<(bool, SourceInfo), AppError> {
        let source_id = Uuid::new_v4();
        let documents: Vec<Document> = documents.into_iter().map(|doc| Document { source_id, ..doc }).collect();
        let payload = serde_json::json!({
            "source_id": source_id,
            "source_name": source_name,
            "documents": documents,
        });
        let applied = self.accept(self.record(WriteOp::Insert, caller, payload))?;
        let info = if applied {
            self.index.sources().into_iter().find(|s| s.source_id == source_id).unwrap_or(SourceInfo { source_id, source_name: source_name.to_string() })
        } else {
            SourceInfo { source_id, source_name: source_name.to_string() }
        };
        Ok((applied, info))
    }

    pub async fn delete(&self, caller: Uuid, source_ids: Vec<Uuid>) -> Result<bool, AppError> {
        let payload = serde_json::json!({ "source_ids": source_ids });
        self.accept(self.record(WriteOp::Delete, caller, payload))
    }

    pub async fn upvote(&self, caller: Uuid, text_id_pairs: Vec<(String, Uuid)>) -> Result<bool, AppError> {
        let payload = serde_json::json!({ "text_id_pairs": text_id_pairs });
        self.accept(self.record(WriteOp::Upvote, caller, payload))
    }

    pub async fn associate(&self, caller: Uuid, text_pairs: Vec<(String, String)>) -> Result<bool, AppError> {
        let payload = serde_json::json!({ "text_pairs": text_pairs });
        self.accept(self.record(WriteOp::Associate, caller, payload))
    }

    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchResult> {
        self.index.search(query, top_k)
    }

    pub fn predict(&self, text: &str, top_k: usize) -> Vec<SearchResult> {
        self.index.predict(text, top_k)
    }

    /// `save` is the one write op this replica cannot fully apply on its
    /// own: registering a new Model row belongs to the control plane's
    /// catalog, which this replica only has a permission-check channel
    /// to, not a write channel. The log still records the intent (per
    /// spec §4.5's log-format contract); the new model id is generated
    /// here and the caller is responsible for completing registration
    /// against the control plane out of band.
    pub async fn save(&self, caller: Uuid, override_in_place: bool, model_name: Option<String>) -> Result<Option<Uuid>, AppError> {
        let new_model_id = if override_in_place { None } else { Some(Uuid::new_v4()) };
        let payload = serde_json::json!({ "override": override_in_place, "model_name": model_name, "new_model_id": new_model_id });
        self.write_log.append(&self.record(WriteOp::Save, caller, payload)).map_err(|_| AppError::Transient("failed to append to write log".into()))?;
        Ok(new_model_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(production_mode: bool) -> (ReplicaWriteService, Arc<DocumentIndex>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let index = Arc::new(DocumentIndex::new());
        let write_log = Arc::new(WriteLog::new(tmp.path().join("writes.jsonl")));
        let queue = Arc::new(AsyncWriteQueue::new(WriteLog::new(tmp.path().join("writes.jsonl"))));
        let replica = ReplicaConfig { model_id: Uuid::new_v4(), production_mode };
        (ReplicaWriteService::new(index.clone(), write_log, queue, replica), index, tmp)
    }

    #[tokio::test]
    async fn dev_mode_insert_is_applied_immediately_and_searchable() {
        let (service, index, _tmp) = service(false);
        let (applied, info) = service
            .insert(Uuid::new_v4(), "docs.zip", vec![Document { doc_id: Uuid::new_v4(), source_id: Uuid::nil(), text: "refund policy".into() }])
            .await
            .unwrap();
        assert!(applied);
        assert_eq!(index.document_count(), 1);
        assert_eq!(info.source_name, "docs.zip");
    }

    #[tokio::test]
    async fn production_mode_insert_is_only_queued_not_applied() {
        let (service, index, _tmp) = service(true);
        let (applied, _info) = service
            .insert(Uuid::new_v4(), "docs.zip", vec![Document { doc_id: Uuid::new_v4(), source_id: Uuid::nil(), text: "refund policy".into() }])
            .await
            .unwrap();
        assert!(!applied);
        assert_eq!(index.document_count(), 0);
    }

    #[tokio::test]
    async fn save_without_override_generates_a_new_model_id() {
        let (service, _index, _tmp) = service(false);
        let new_id = service.save(Uuid::new_v4(), false, Some("fork".into())).await.unwrap();
        assert!(new_id.is_some());
    }

    #[tokio::test]
    async fn save_with_override_keeps_the_existing_model_id() {
        let (service, _index, _tmp) = service(false);
        let new_id = service.save(Uuid::new_v4(), true, None).await.unwrap();
        assert!(new_id.is_none());
    }

    #[tokio::test]
    async fn delete_in_dev_mode_removes_the_named_source_from_the_index() {
        let (service, index, _tmp) = service(false);
        let (_, info) = service.insert(Uuid::new_v4(), "docs.zip", vec![Document { doc_id: Uuid::new_v4(), source_id: Uuid::nil(), text: "hello".into() }]).await.unwrap();
        assert_eq!(index.document_count(), 1);
        service.delete(Uuid::new_v4(), vec![info.source_id]).await.unwrap();
        assert_eq!(index.document_count(), 0);
    }
}
