use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertRecord {
    pub model: Uuid,
    pub query: String,
    pub response: String,
}

#[derive(Debug)]
pub enum InsertLogError {
    Io(std::io::Error),
}

impl From<std::io::Error> for InsertLogError {
    fn from(e: std::io::Error) -> Self {
        InsertLogError::Io(e)
    }
}

/// Append-only log of buffered cache insertions, one JSONL file per
/// model, consolidated into the indexed store by the refresh job — the
/// write path described for the llm cache's insertion folder.
pub struct InsertLog {
    dir: PathBuf,
}

impl InsertLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, model: Uuid) -> PathBuf {
        self.dir.join(format!("{model}.jsonl"))
    }

    pub fn append(&self, record: &InsertRecord) -> Result<(), InsertLogError> {
        std::fs::create_dir_all(&self.dir)?;
        let mut line = serde_json::to_string(record).expect("InsertRecord always serializes");
        line.push('\n');
        let mut file = std::fs::OpenOptions::new().create(true).append(true).open(self.path_for(record.model))?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Reads every well-formed record buffered for a model. A truncated
    /// trailing line (partial write) is discarded, mirroring the
    /// write-coordinator's log replay.
    pub fn read(&self, model: Uuid) -> Result<Vec<InsertRecord>, InsertLogError> {
        let path = self.path_for(model);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = std::fs::File::open(&path)?;
        let reader = std::io::BufReader::new(file);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<InsertRecord>(&line) {
                Ok(record) => records.push(record),
                Err(_) => break,
            }
        }
        Ok(records)
    }

    /// Removes a model's buffered log after its entries have been merged
    /// into the index, or on invalidation.
    pub fn clear(&self, model: Uuid) -> Result<(), InsertLogError> {
        let path = self.path_for(model);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(model: Uuid) -> InsertRecord {
        InsertRecord { model, query: "q".into(), response: "r".into() }
    }

    #[test]
    fn read_of_missing_log_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let log = InsertLog::new(tmp.path());
        assert!(log.read(Uuid::new_v4()).unwrap().is_empty());
    }

    #[test]
    fn append_then_read_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let log = InsertLog::new(tmp.path());
        let model = Uuid::new_v4();
        log.append(&record(model)).unwrap();
        log.append(&record(model)).unwrap();
        assert_eq!(log.read(model).unwrap().len(), 2);
    }

    #[test]
    fn logs_are_isolated_per_model() {
        let tmp = tempfile::tempdir().unwrap();
        let log = InsertLog::new(tmp.path());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        log.append(&record(a)).unwrap();
        assert_eq!(log.read(a).unwrap().len(), 1);
        assert!(log.read(b).unwrap().is_empty());
    }

    #[test]
    fn clear_removes_buffered_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let log = InsertLog::new(tmp.path());
        let model = Uuid::new_v4();
        log.append(&record(model)).unwrap();
        log.clear(model).unwrap();
        assert!(log.read(model).unwrap().is_empty());
    }
}
