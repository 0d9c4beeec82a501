use std::sync::Arc;

use bazaar_identity::TokenService;
use r2e::prelude::*;
use replica_coordinator::{AsyncWriteQueue, DocumentIndex, RebuildLease, ReplicaPermissionCache, WriteLog};
use uuid::Uuid;

use crate::control_plane::ControlPlaneClient;
use crate::services::ReplicaWriteService;

/// Per-replica configuration resolved once at startup — which model this
/// process serves and whether it runs alongside sibling replicas.
#[derive(Clone)]
pub struct ReplicaConfig {
    pub model_id: Uuid,
    pub production_mode: bool,
}

#[derive(Clone, BeanState)]
pub struct AppState {
    pub index: Arc<DocumentIndex>,
    pub write_log: Arc<WriteLog>,
    pub queue: Arc<AsyncWriteQueue>,
    pub lease: Arc<RebuildLease>,
    pub permission_cache: Arc<ReplicaPermissionCache>,
    pub tokens: Arc<TokenService>,
    pub control_plane: Arc<ControlPlaneClient>,
    pub write_service: ReplicaWriteService,
    pub replica: ReplicaConfig,
    pub config: R2eConfig,
}
