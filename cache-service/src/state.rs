use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bazaar_identity::TokenService;
use r2e::prelude::*;
use r2e_cache::TtlCache;
use semantic_cache::{CacheIndex, InsertLog};
use uuid::Uuid;

use crate::control_plane::ControlPlaneClient;

#[derive(Clone)]
pub struct CacheServiceConfig {
    pub store_dir: PathBuf,
}

#[derive(Clone, BeanState)]
pub struct AppState {
    pub index: Arc<CacheIndex>,
    pub insert_log: Arc<InsertLog>,
    pub permission_cache: Arc<TtlCache<(Uuid, Uuid), bool>>,
    pub tokens: Arc<TokenService>,
    pub control_plane: Arc<ControlPlaneClient>,
    pub service: CacheServiceConfig,
    pub config: R2eConfig,
}

/// Default TTL for the per-(caller, model) "may read this model" cache
/// gating `/cache/token` issuance — same 5-minute window the deployed
/// replica's permission cache uses.
pub fn default_permission_cache() -> TtlCache<(Uuid, Uuid), bool> {
    TtlCache::new(Duration::from_secs(5 * 60))
}
