//! Per-model semantic response cache: a fused semantic/token-overlap
//! ranked index, a buffered insert log, and the copy-replay-rename
//! refresh job that consolidates buffered inserts into the index.

mod insert_log;
mod refresh;
mod rerank;
mod store;

pub use insert_log::{InsertLog, InsertLogError, InsertRecord};
pub use refresh::{refresh_model, RefreshError};
pub use rerank::token_overlap_score;
pub use store::{CacheEntry, CacheHit, CacheIndex, Suggestion, DEFAULT_THRESHOLD};
