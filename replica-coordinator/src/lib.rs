//! Write coordination primitives shared by every deployed model replica:
//! a durable per-replica write log, a single-writer lease over rebuild
//! jobs, an async write queue for production-mode replicas, and a
//! TTL-backed cache of permission lookups against the control plane.

mod index;
mod lease;
mod permission_cache;
mod queue;
mod writelog;

pub use index::{Document, DocumentIndex, SearchResult, SourceInfo};
pub use lease::{LeaseError, RebuildLease};
pub use permission_cache::ReplicaPermissionCache;
pub use queue::AsyncWriteQueue;
pub use writelog::{WriteLog, WriteLogError, WriteOp, WriteRecord};
