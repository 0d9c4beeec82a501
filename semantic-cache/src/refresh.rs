use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::insert_log::{InsertLog, InsertLogError};
use crate::store::{CacheEntry, CacheIndex};

#[derive(Debug)]
pub enum RefreshError {
    Io(std::io::Error),
    Log(InsertLogError),
}

impl From<std::io::Error> for RefreshError {
    fn from(e: std::io::Error) -> Self {
        RefreshError::Io(e)
    }
}

impl From<InsertLogError> for RefreshError {
    fn from(e: InsertLogError) -> Self {
        RefreshError::Log(e)
    }
}

fn snapshot_path(store_dir: &Path, model: Uuid) -> PathBuf {
    store_dir.join(format!("{model}.cache.jsonl"))
}

fn load_snapshot(path: &Path) -> Result<Vec<CacheEntry>, RefreshError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let data = std::fs::read_to_string(path)?;
    Ok(data.lines().filter(|l| !l.trim().is_empty()).filter_map(|l| serde_json::from_str(l).ok()).collect())
}

fn save_snapshot(path: &Path, entries: &[CacheEntry]) -> Result<(), RefreshError> {
    let mut body = String::new();
    for entry in entries {
        body.push_str(&serde_json::to_string(entry).expect("CacheEntry always serializes"));
        body.push('\n');
    }
    let tmp_path = path.with_extension("cache.jsonl.tmp");
    std::fs::write(&tmp_path, body)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Consolidates a model's buffered insert log into its persisted snapshot:
/// load the live snapshot, replay the log onto it in memory, write the
/// result to a temp file, then atomically rename it over the original.
/// The in-process index is updated last so readers never observe a
/// partially-merged state; a reader mid-refresh keeps serving the
/// pre-refresh entries until this call returns.
pub fn refresh_model(index: &CacheIndex, log: &InsertLog, store_dir: &Path, model: Uuid) -> Result<usize, RefreshError> {
    std::fs::create_dir_all(store_dir)?;
    let path = snapshot_path(store_dir, model);
    let mut entries = load_snapshot(&path)?;

    let pending = log.read(model)?;
    for record in &pending {
        entries.push(CacheEntry { chunk_id: Uuid::new_v4(), query: record.query.clone(), response: record.response.clone() });
    }

    save_snapshot(&path, &entries)?;
    log.clear(model)?;
    index.replace_model(model, entries.clone());
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insert_log::InsertRecord;

    #[test]
    fn refresh_merges_pending_inserts_into_index() {
        let tmp = tempfile::tempdir().unwrap();
        let log = InsertLog::new(tmp.path().join("insertions"));
        let index = CacheIndex::new();
        let model = Uuid::new_v4();

        log.append(&InsertRecord { model, query: "refund window".into(), response: "30 days".into() }).unwrap();

        let count = refresh_model(&index, &log, &tmp.path().join("store"), model).unwrap();
        assert_eq!(count, 1);
        assert!(index.lookup(model, "refund window").is_some());
    }

    #[test]
    fn refresh_clears_the_insert_log() {
        let tmp = tempfile::tempdir().unwrap();
        let log = InsertLog::new(tmp.path().join("insertions"));
        let index = CacheIndex::new();
        let model = Uuid::new_v4();
        log.append(&InsertRecord { model, query: "q".into(), response: "r".into() }).unwrap();

        refresh_model(&index, &log, &tmp.path().join("store"), model).unwrap();
        assert!(log.read(model).unwrap().is_empty());
    }

    #[test]
    fn repeated_refresh_accumulates_snapshot_across_runs() {
        let tmp = tempfile::tempdir().unwrap();
        let log = InsertLog::new(tmp.path().join("insertions"));
        let index = CacheIndex::new();
        let store_dir = tmp.path().join("store");
        let model = Uuid::new_v4();

        log.append(&InsertRecord { model, query: "first question".into(), response: "a".into() }).unwrap();
        refresh_model(&index, &log, &store_dir, model).unwrap();

        log.append(&InsertRecord { model, query: "second question".into(), response: "b".into() }).unwrap();
        let count = refresh_model(&index, &log, &store_dir, model).unwrap();
        assert_eq!(count, 2);
    }
}
