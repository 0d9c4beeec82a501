use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOp {
    Insert,
    Delete,
    Upvote,
    Associate,
    ImplicitFeedback,
    Save,
}

/// One record in the per-operation write log — one JSON line per write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteRecord {
    pub op: WriteOp,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub caller: Uuid,
    pub payload: serde_json::Value,
}

#[derive(Debug)]
pub enum WriteLogError {
    Io(std::io::Error),
}

impl From<std::io::Error> for WriteLogError {
    fn from(e: std::io::Error) -> Self {
        WriteLogError::Io(e)
    }
}

/// Append-only JSONL write log for one deployed replica. Each record is
/// written in full (one `write` + `flush`) before the caller is
/// acknowledged, so a crash mid-write leaves at most one truncated
/// trailing line, which `replay` detects and discards.
pub struct WriteLog {
    path: PathBuf,
}

impl WriteLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &WriteRecord) -> Result<(), WriteLogError> {
        let mut line = serde_json::to_string(record).expect("WriteRecord always serializes");
        line.push('\n');

        let mut file = std::fs::OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Reads every complete record in log order. A trailing line without a
    /// terminating newline (a crash mid-write) is truncated and discarded
    /// rather than surfaced as an error — invariant: replaying the same
    /// prefix twice yields the same final state (spec §8 invariant 10).
    pub fn replay(&self) -> Result<Vec<WriteRecord>, WriteLogError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = std::fs::File::open(&self.path)?;
        let reader = std::io::BufReader::new(file);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<WriteRecord>(&line) {
                Ok(record) => records.push(record),
                Err(_) => break, // partial trailing line from a crash mid-write
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(op: WriteOp) -> WriteRecord {
        WriteRecord {
            op,
            timestamp: chrono::Utc::now(),
            caller: Uuid::new_v4(),
            payload: serde_json::json!({"source_id": "abc"}),
        }
    }

    #[test]
    fn replay_of_empty_log_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let log = WriteLog::new(tmp.path().join("log.jsonl"));
        assert!(log.replay().unwrap().is_empty());
    }

    #[test]
    fn append_then_replay_preserves_order() {
        let tmp = tempfile::tempdir().unwrap();
        let log = WriteLog::new(tmp.path().join("log.jsonl"));
        log.append(&record(WriteOp::Insert)).unwrap();
        log.append(&record(WriteOp::Delete)).unwrap();
        log.append(&record(WriteOp::Upvote)).unwrap();
        let records = log.replay().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].op, WriteOp::Insert);
        assert_eq!(records[1].op, WriteOp::Delete);
        assert_eq!(records[2].op, WriteOp::Upvote);
    }

    #[test]
    fn truncated_trailing_line_is_discarded() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("log.jsonl");
        let log = WriteLog::new(&path);
        log.append(&record(WriteOp::Insert)).unwrap();

        let mut full_line = serde_json::to_string(&record(WriteOp::Delete)).unwrap();
        full_line.truncate(full_line.len() / 2);
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(full_line.as_bytes()).unwrap(); // no trailing newline: partial record

        let records = log.replay().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].op, WriteOp::Insert);
    }

    #[test]
    fn replaying_same_prefix_twice_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let log = WriteLog::new(tmp.path().join("log.jsonl"));
        log.append(&record(WriteOp::Insert)).unwrap();
        let first = log.replay().unwrap();
        let second = log.replay().unwrap();
        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].op, second[0].op);
    }
}
