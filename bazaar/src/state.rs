use std::sync::Arc;

use bazaar_catalog::repository::{JobMessageRepository, ModelRepository, UserRepository};
use bazaar_identity::TokenService;
use bazaar_orchestrator::runner::JobRunner;
use bazaar_storage::ArtifactStore;
use r2e::prelude::*;

#[derive(Clone, BeanState)]
pub struct AppState {
    pub user_repo: UserRepository,
    pub model_repo: ModelRepository,
    pub job_message_repo: JobMessageRepository,
    pub tokens: Arc<TokenService>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub runner: Arc<dyn JobRunner>,
    pub pool: sqlx::PgPool,
    pub config: R2eConfig,
}
