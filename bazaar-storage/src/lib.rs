//! Artifact Store: chunk-addressed resumable upload/download over large
//! opaque blobs. The contract is intentionally narrow so a remote
//! object-storage backend could implement it later; only the local
//! filesystem implementation ships here.

mod local;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

pub use local::LocalArtifactStore;

#[derive(Debug)]
pub enum StorageError {
    NotReserved,
    MissingChunks(Vec<u64>),
    Io(std::io::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::NotReserved => write!(f, "model directory was never reserved"),
            StorageError::MissingChunks(chunks) => write!(f, "missing chunks: {chunks:?}"),
            StorageError::Io(e) => write!(f, "storage io error: {e}"),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

/// The artifact kind segment of the stored filename (`model.<kind>.zip`),
/// distinct from the catalog's `Model::kind`/`sub_kind` classification.
pub type ArtifactKind = str;

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Idempotent: ensures a dedicated directory exists for `model_id`.
    async fn reserve(&self, model_id: Uuid) -> Result<(), StorageError>;

    /// Writes chunk `index` (1-based) for `model_id`. Out-of-order and
    /// retried writes are legal; a retried index replaces the prior bytes
    /// atomically via write-then-rename.
    async fn put_chunk(&self, model_id: Uuid, kind: &ArtifactKind, index: u64, bytes: Bytes) -> Result<(), StorageError>;

    /// Requires all of chunks `1..=total_chunks` to exist; concatenates
    /// them in order into the final artifact and removes the chunk files.
    /// This is the only step that makes the artifact visible to readers.
    async fn commit(&self, model_id: Uuid, kind: &ArtifactKind, total_chunks: u64) -> Result<(), StorageError>;

    /// If `compressed` and the compressed form is absent, creates it from
    /// the stored form; otherwise a no-op.
    async fn prepare_download(&self, model_id: Uuid, kind: &ArtifactKind, compressed: bool) -> Result<(), StorageError>;

    /// Path to the committed artifact (plain or compressed), for streaming.
    fn artifact_path(&self, model_id: Uuid, kind: &ArtifactKind, compressed: bool) -> std::path::PathBuf;

    async fn exists(&self, model_id: Uuid, kind: &ArtifactKind) -> bool;

    /// Removes all artifacts and the per-model data directory.
    async fn delete(&self, model_id: Uuid) -> Result<(), StorageError>;

    /// Zips every `*.log` file under the model's directory for download —
    /// an operator/debug affordance carried over from the original
    /// storage backend's `logs()` contract.
    async fn logs_zip(&self, model_id: Uuid) -> Result<Bytes, StorageError>;
}
