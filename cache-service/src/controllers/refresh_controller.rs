use r2e::prelude::*;
use uuid::Uuid;

use crate::state::AppState;

/// Runs the copy-aside/replay/atomic-rename refresh job on a fixed
/// interval, the only continuously-running work in this service (every
/// other route is request-driven). Known models are discovered by
/// scanning the insert log's directory for per-model JSONL files rather
/// than tracked in a separate registry, since the log directory is
/// already the durable source of truth for "this model has buffered
/// inserts."
#[derive(Controller)]
#[controller(state = AppState)]
pub struct RefreshJob {
    #[inject]
    index: std::sync::Arc<semantic_cache::CacheIndex>,
    #[inject]
    insert_log: std::sync::Arc<semantic_cache::InsertLog>,
    #[inject]
    service: crate::state::CacheServiceConfig,
}

#[routes]
impl RefreshJob {
    #[scheduled(every = 30)]
    async fn refresh(&self) {
        let models = known_models(&self.insert_log);
        for model in models {
            match semantic_cache::refresh_model(&self.index, &self.insert_log, &self.service.store_dir, model) {
                Ok(count) => tracing::debug!(%model, entries = count, "refreshed semantic cache"),
                Err(_) => tracing::warn!(%model, "semantic cache refresh failed"),
            }
        }
    }
}

fn known_models(insert_log: &semantic_cache::InsertLog) -> Vec<Uuid> {
    let Ok(entries) = std::fs::read_dir(insert_log.dir()) else {
        return Vec::new();
    };
    entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.path().file_stem().and_then(|s| s.to_str()).and_then(|s| Uuid::parse_str(s).ok()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use semantic_cache::InsertRecord;

    #[test]
    fn known_models_reflects_logs_that_have_been_appended_to() {
        let tmp = tempfile::tempdir().unwrap();
        let log = semantic_cache::InsertLog::new(tmp.path());
        let model = Uuid::new_v4();
        log.append(&InsertRecord { model, query: "q".into(), response: "r".into() }).unwrap();

        let models = known_models(&log);
        assert_eq!(models, vec![model]);
    }

    #[test]
    fn known_models_is_empty_when_the_log_directory_does_not_exist_yet() {
        let tmp = tempfile::tempdir().unwrap();
        let log = semantic_cache::InsertLog::new(tmp.path().join("not-created"));
        assert!(known_models(&log).is_empty());
    }
}
