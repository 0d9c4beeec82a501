use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::{ArtifactKind, ArtifactStore, StorageError};

/// Local-filesystem artifact store, grounded in the platform's original
/// storage backend path convention: `models/<id>/model.<kind>.zip` for the
/// committed artifact, `models/<id>/model.<kind>.zip.part<N>` for
/// in-flight chunks.
pub struct LocalArtifactStore {
    base_dir: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    fn model_dir(&self, model_id: Uuid) -> PathBuf {
        self.base_dir.join("models").join(model_id.to_string())
    }

    fn chunk_path(&self, model_id: Uuid, kind: &ArtifactKind, index: u64) -> PathBuf {
        self.model_dir(model_id).join(format!("model.{kind}.zip.part{index}"))
    }

    fn committed_path(&self, model_id: Uuid, kind: &ArtifactKind) -> PathBuf {
        self.model_dir(model_id).join(format!("model.{kind}.zip"))
    }

    fn plain_path(&self, model_id: Uuid, kind: &ArtifactKind) -> PathBuf {
        self.model_dir(model_id).join(format!("model.{kind}"))
    }
}

#[async_trait::async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn reserve(&self, model_id: Uuid) -> Result<(), StorageError> {
        fs::create_dir_all(self.model_dir(model_id)).await?;
        Ok(())
    }

    async fn put_chunk(&self, model_id: Uuid, kind: &ArtifactKind, index: u64, bytes: Bytes) -> Result<(), StorageError> {
        let dir = self.model_dir(model_id);
        if !fs::try_exists(&dir).await.unwrap_or(false) {
            return Err(StorageError::NotReserved);
        }

        let final_path = self.chunk_path(model_id, kind, index);
        let mut tmp_name = final_path.file_name().expect("chunk path always has a file name").to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = final_path.with_file_name(tmp_name);
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        fs::rename(&tmp_path, &final_path).await?;
        Ok(())
    }

    async fn commit(&self, model_id: Uuid, kind: &ArtifactKind, total_chunks: u64) -> Result<(), StorageError> {
        let mut missing = Vec::new();
        for n in 1..=total_chunks {
            if !fs::try_exists(self.chunk_path(model_id, kind, n)).await.unwrap_or(false) {
                missing.push(n);
            }
        }
        if !missing.is_empty() {
            return Err(StorageError::MissingChunks(missing));
        }

        let final_path = self.committed_path(model_id, kind);
        let tmp_path = final_path.with_extension("zip.committing");
        let mut out = fs::File::create(&tmp_path).await?;
        for n in 1..=total_chunks {
            let chunk_path = self.chunk_path(model_id, kind, n);
            let data = fs::read(&chunk_path).await?;
            out.write_all(&data).await?;
        }
        out.flush().await?;
        drop(out);
        fs::rename(&tmp_path, &final_path).await?;

        for n in 1..=total_chunks {
            let _ = fs::remove_file(self.chunk_path(model_id, kind, n)).await;
        }
        Ok(())
    }

    async fn prepare_download(&self, model_id: Uuid, kind: &ArtifactKind, compressed: bool) -> Result<(), StorageError> {
        if !compressed {
            return Ok(());
        }
        let zip_path = self.committed_path(model_id, kind);
        if fs::try_exists(&zip_path).await.unwrap_or(false) {
            return Ok(());
        }

        let plain_path = self.plain_path(model_id, kind);
        let data = fs::read(&plain_path).await?;
        let zip_path_clone = zip_path.clone();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let file = std::fs::File::create(&zip_path_clone)?;
            let mut writer = zip::ZipWriter::new(file);
            let options: zip::write::FileOptions<()> =
                zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
            writer.start_file("model", options)?;
            writer.write_all(&data)?;
            writer.finish()?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;
        Ok(())
    }

    fn artifact_path(&self, model_id: Uuid, kind: &ArtifactKind, compressed: bool) -> PathBuf {
        if compressed {
            self.committed_path(model_id, kind)
        } else {
            self.plain_path(model_id, kind)
        }
    }

    async fn exists(&self, model_id: Uuid, kind: &ArtifactKind) -> bool {
        fs::try_exists(self.committed_path(model_id, kind)).await.unwrap_or(false)
            || fs::try_exists(self.plain_path(model_id, kind)).await.unwrap_or(false)
    }

    async fn delete(&self, model_id: Uuid) -> Result<(), StorageError> {
        let dir = self.model_dir(model_id);
        if fs::try_exists(&dir).await.unwrap_or(false) {
            fs::remove_dir_all(dir).await?;
        }
        Ok(())
    }

    async fn logs_zip(&self, model_id: Uuid) -> Result<Bytes, StorageError> {
        let dir = self.model_dir(model_id);
        let mut log_files = Vec::new();
        collect_log_files(&dir, &mut log_files).await?;

        tokio::task::spawn_blocking(move || -> std::io::Result<Bytes> {
            let mut buf = Vec::new();
            {
                let cursor = std::io::Cursor::new(&mut buf);
                let mut writer = zip::ZipWriter::new(cursor);
                let options: zip::write::FileOptions<()> =
                    zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
                for path in &log_files {
                    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("log").to_string();
                    let data = std::fs::read(path)?;
                    writer.start_file(name, options)?;
                    writer.write_all(&data)?;
                }
                writer.finish()?;
            }
            Ok(Bytes::from(buf))
        })
        .await
        .map_err(|e| StorageError::Io(std::io::Error::other(e)))?
        .map_err(StorageError::Io)
    }
}

async fn collect_log_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), StorageError> {
    if !fs::try_exists(dir).await.unwrap_or(false) {
        return Ok(());
    }
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_dir() {
            Box::pin(collect_log_files(&path, out)).await?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("log") {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_chunk_without_reserve_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(tmp.path());
        let model_id = Uuid::new_v4();
        let result = store.put_chunk(model_id, "ndb", 1, Bytes::from_static(b"hi")).await;
        assert!(matches!(result, Err(StorageError::NotReserved)));
    }

    #[tokio::test]
    async fn commit_requires_all_chunks() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(tmp.path());
        let model_id = Uuid::new_v4();
        store.reserve(model_id).await.unwrap();
        store.put_chunk(model_id, "ndb", 1, Bytes::from_static(b"a")).await.unwrap();
        let result = store.commit(model_id, "ndb", 2).await;
        assert!(matches!(result, Err(StorageError::MissingChunks(_))));
    }

    #[tokio::test]
    async fn commit_concatenates_chunks_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(tmp.path());
        let model_id = Uuid::new_v4();
        store.reserve(model_id).await.unwrap();
        store.put_chunk(model_id, "ndb", 1, Bytes::from_static(b"hello ")).await.unwrap();
        store.put_chunk(model_id, "ndb", 2, Bytes::from_static(b"world")).await.unwrap();
        store.commit(model_id, "ndb", 2).await.unwrap();

        let path = store.artifact_path(model_id, "ndb", true);
        let data = fs::read(path).await.unwrap();
        assert_eq!(data, b"hello world");
        assert!(store.exists(model_id, "ndb").await);

        for n in 1..=2u64 {
            assert!(!fs::try_exists(store.chunk_path(model_id, "ndb", n)).await.unwrap());
        }
    }

    #[tokio::test]
    async fn retried_chunk_write_replaces_prior_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(tmp.path());
        let model_id = Uuid::new_v4();
        store.reserve(model_id).await.unwrap();
        store.put_chunk(model_id, "ndb", 1, Bytes::from_static(b"first")).await.unwrap();
        store.put_chunk(model_id, "ndb", 1, Bytes::from_static(b"second")).await.unwrap();
        let data = fs::read(store.chunk_path(model_id, "ndb", 1)).await.unwrap();
        assert_eq!(data, b"second");
    }

    #[tokio::test]
    async fn delete_removes_model_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(tmp.path());
        let model_id = Uuid::new_v4();
        store.reserve(model_id).await.unwrap();
        store.delete(model_id).await.unwrap();
        assert!(!fs::try_exists(store.model_dir(model_id)).await.unwrap());
    }
}
