use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bazaar_identity::TokenService;
use r2e::prelude::*;
use r2e::r2e_observability::{Observability, ObservabilityConfig};
use r2e::r2e_prometheus::Prometheus;
use replica_coordinator::{AsyncWriteQueue, DocumentIndex, RebuildLease, ReplicaPermissionCache, WriteLog};
use uuid::Uuid;

mod control_plane;
mod controllers;
mod dto;
mod identity;
mod services;
mod state;

use control_plane::ControlPlaneClient;
use controllers::ReplicaController;
use services::ReplicaWriteService;
use state::{AppState, ReplicaConfig};

/// Replays the durable write log into a freshly constructed index —
/// run once at startup before the queue starts accepting drains, so a
/// restarted replica never serves a query against a half-rebuilt index.
fn rebuild_index_from_log(index: &DocumentIndex, log: &WriteLog) {
    let records = log.replay().expect("write log replay failed");
    for record in &records {
        apply_replayed(index, record);
    }
}

fn apply_replayed(index: &DocumentIndex, record: &replica_coordinator::WriteRecord) {
    use replica_coordinator::{Document, WriteOp};
    match record.op {
        WriteOp::Insert => {
            if let (Some(source_id), Some(source_name), Some(docs)) = (
                record.payload.get("source_id").and_then(|v| v.as_str()).and_then(|s| Uuid::parse_str(s).ok()),
                record.payload.get("source_name").and_then(|v| v.as_str()),
                record.payload.get("documents"),
            ) {
                let documents: Vec<Document> = serde_json::from_value(docs.clone()).unwrap_or_default();
                index.insert(source_id, source_name, documents);
            }
        }
        WriteOp::Delete => {
            if let Some(ids) = record.payload.get("source_ids") {
                let source_ids: Vec<Uuid> = serde_json::from_value(ids.clone()).unwrap_or_default();
                index.delete(&source_ids);
            }
        }
        WriteOp::Upvote => {
            if let Some(pairs) = record.payload.get("text_id_pairs") {
                let pairs: Vec<(String, Uuid)> = serde_json::from_value(pairs.clone()).unwrap_or_default();
                index.upvote(&pairs);
            }
        }
        WriteOp::Associate => {
            if let Some(pairs) = record.payload.get("text_pairs") {
                let pairs: Vec<(String, String)> = serde_json::from_value(pairs.clone()).unwrap_or_default();
                index.associate(&pairs);
            }
        }
        WriteOp::Save | WriteOp::ImplicitFeedback => {}
    }
}

#[tokio::main]
async fn main() {
    r2e::init_tracing();

    let config = R2eConfig::load("dev").unwrap_or_else(|_| R2eConfig::empty());

    let model_id = std::env::var("REPLICA_MODEL_ID")
        .ok()
        .and_then(|s| Uuid::parse_str(&s).ok())
        .expect("REPLICA_MODEL_ID must be a valid model id");
    let production_mode = std::env::var("REPLICA_PRODUCTION_MODE").map(|v| v == "true").unwrap_or(false);
    let replica = ReplicaConfig { model_id, production_mode };

    let data_dir = std::env::var("REPLICA_DATA_DIR").unwrap_or_else(|_| format!("./data/replica/{model_id}"));
    std::fs::create_dir_all(&data_dir).expect("failed to create replica data directory");
    let data_dir = PathBuf::from(data_dir);

    let write_log = Arc::new(WriteLog::new(data_dir.join("writes.jsonl")));
    let index = Arc::new(DocumentIndex::new());
    rebuild_index_from_log(&index, &write_log);

    let queue = Arc::new(AsyncWriteQueue::new(WriteLog::new(data_dir.join("writes.jsonl"))));
    queue.mark_ready();

    let lease = Arc::new(RebuildLease::new(data_dir.join("rebuild.lease"), Duration::from_secs(5 * 60)));
    let permission_cache = Arc::new(ReplicaPermissionCache::new());

    let token_secret = std::env::var("BAZAAR_TOKEN_SECRET").unwrap_or_else(|_| "bazaar-dev-secret-change-in-production".into());
    let tokens = Arc::new(TokenService::new(token_secret.into_bytes()));

    let control_plane_url = std::env::var("CONTROL_PLANE_URL").unwrap_or_else(|_| "http://localhost:8080".into());
    let control_plane = Arc::new(ControlPlaneClient::new(control_plane_url));

    if production_mode {
        let queue = Arc::clone(&queue);
        let index = Arc::clone(&index);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            loop {
                ticker.tick().await;
                for record in queue.drain() {
                    apply_replayed(&index, &record);
                }
            }
        });
    }

    AppBuilder::new()
        .provide(config.clone())
        .provide(index)
        .provide(write_log)
        .provide(queue)
        .provide(lease)
        .provide(permission_cache)
        .provide(tokens)
        .provide(control_plane)
        .provide(replica)
        .with_bean::<ReplicaWriteService>()
        .build_state::<AppState, _, _>()
        .await
        .with_config(config)
        .with(Health)
        .with(Prometheus::builder().endpoint("/metrics").namespace("deployment_replica").exclude_path("/health").exclude_path("/metrics").build())
        .with(SecureHeaders::default())
        .with(Observability::new(ObservabilityConfig::new("deployment-replica").with_service_version(env!("CARGO_PKG_VERSION"))))
        .with(ErrorHandling)
        .register_controller::<ReplicaController>()
        .with(NormalizePath)
        .serve("0.0.0.0:8090")
        .await
        .unwrap();
}
