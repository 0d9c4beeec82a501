use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct LeaseRecord {
    holder: Uuid,
    acquired_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug)]
pub enum LeaseError {
    Held,
    Io(std::io::Error),
}

impl From<std::io::Error> for LeaseError {
    fn from(e: std::io::Error) -> Self {
        LeaseError::Io(e)
    }
}

/// Enforces the single-writer invariant over a rebuild log: at most one
/// rebuild process consumes a given log at a time, via an expiring lease
/// file. A stale lease (held past twice the lease period) is reclaimable
/// by anyone — a crashed rebuild worker cannot wedge the log forever.
pub struct RebuildLease {
    path: PathBuf,
    period: Duration,
}

impl RebuildLease {
    pub fn new(path: impl Into<PathBuf>, period: Duration) -> Self {
        Self { path: path.into(), period }
    }

    fn read(&self) -> Option<LeaseRecord> {
        let data = std::fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&data).ok()
    }

    fn is_stale(&self, record: &LeaseRecord) -> bool {
        let age = chrono::Utc::now() - record.acquired_at;
        let stale_after = chrono::Duration::from_std(self.period * 2)
            .unwrap_or_else(|_| chrono::Duration::seconds(i64::MAX / 1000));
        age > stale_after
    }

    /// Attempts to acquire the lease for `holder`. Succeeds if the lease
    /// file is absent or its existing holder's lease has gone stale.
    pub fn acquire(&self, holder: Uuid) -> Result<(), LeaseError> {
        if let Some(existing) = self.read() {
            if existing.holder != holder && !self.is_stale(&existing) {
                return Err(LeaseError::Held);
            }
        }

        let record = LeaseRecord {
            holder,
            acquired_at: chrono::Utc::now(),
        };
        let tmp_path = self.path.with_extension("lease.tmp");
        std::fs::write(&tmp_path, serde_json::to_vec(&record).expect("LeaseRecord always serializes"))?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    pub fn release(&self, holder: Uuid) -> Result<(), LeaseError> {
        if let Some(existing) = self.read() {
            if existing.holder == holder {
                let _ = std::fs::remove_file(&self.path);
            }
        }
        Ok(())
    }

    pub fn current_holder(&self) -> Option<Uuid> {
        self.read().map(|r| r.holder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_acquire_succeeds() {
        let tmp = tempfile::tempdir().unwrap();
        let lease = RebuildLease::new(tmp.path().join("lease.json"), Duration::from_secs(300));
        assert!(lease.acquire(Uuid::new_v4()).is_ok());
    }

    #[test]
    fn second_holder_denied_while_lease_is_fresh() {
        let tmp = tempfile::tempdir().unwrap();
        let lease = RebuildLease::new(tmp.path().join("lease.json"), Duration::from_secs(300));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        lease.acquire(a).unwrap();
        assert!(matches!(lease.acquire(b), Err(LeaseError::Held)));
    }

    #[test]
    fn release_lets_another_holder_acquire() {
        let tmp = tempfile::tempdir().unwrap();
        let lease = RebuildLease::new(tmp.path().join("lease.json"), Duration::from_secs(300));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        lease.acquire(a).unwrap();
        lease.release(a).unwrap();
        assert!(lease.acquire(b).is_ok());
    }

    #[test]
    fn same_holder_can_reacquire() {
        let tmp = tempfile::tempdir().unwrap();
        let lease = RebuildLease::new(tmp.path().join("lease.json"), Duration::from_secs(300));
        let a = Uuid::new_v4();
        lease.acquire(a).unwrap();
        assert!(lease.acquire(a).is_ok());
    }
}
