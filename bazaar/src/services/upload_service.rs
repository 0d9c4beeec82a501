use std::sync::Arc;

use bazaar_catalog::models::{AccessLevel, Model};
use bazaar_catalog::repository::ModelRepository;
use bazaar_catalog::AppError;
use bazaar_identity::{Claims, TokenService};
use bazaar_permissions::Principal;
use bazaar_storage::ArtifactStore;
use bytes::Bytes;
use r2e::prelude::*;
use uuid::Uuid;

use crate::services::model_service::ModelService;

const PLACEHOLDER_KIND: &str = "unknown";

#[derive(Clone)]
pub struct UploadService {
    models: ModelRepository,
    model_service: ModelService,
    artifacts: Arc<dyn ArtifactStore>,
    tokens: Arc<TokenService>,
}

#[bean]
impl UploadService {
    pub fn new(models: ModelRepository, model_service: ModelService, artifacts: Arc<dyn ArtifactStore>, tokens: Arc<TokenService>) -> Self {
        Self { models, model_service, artifacts, tokens }
    }

    /// Reserves the (owner, name) pair and issues a size-scaled upload
    /// token bound to the resulting model id.
    pub async fn issue_upload_token(&self, owner_id: Uuid, model_name: &str, size_bytes: u64) -> Result<(Uuid, String), AppError> {
        let model = self.models.reserve(owner_id, model_name, PLACEHOLDER_KIND, None, None, None).await?;
        self.artifacts.reserve(model.id).await.map_err(|e| AppError::Transient(e.to_string()))?;
        let token = self.tokens.issue_upload_token(owner_id, model.id, model_name, size_bytes);
        Ok((model.id, token))
    }

    fn verify_upload_claims(&self, token: &str) -> Result<Claims, AppError> {
        self.tokens.verify_upload(token).map_err(|e| AppError::AuthInvalid(format!("{e:?}")))
    }

    pub async fn put_chunk(&self, token: &str, index: u64, bytes: Bytes) -> Result<(), AppError> {
        let claims = self.verify_upload_claims(token)?;
        let model_id = claims.model_id.ok_or_else(|| AppError::AuthInvalid("upload token missing model_id".into()))?;
        self.artifacts
            .put_chunk(model_id, PLACEHOLDER_KIND, index, bytes)
            .await
            .map_err(|e| AppError::Transient(e.to_string()))
    }

    /// Invariant 6 & 7 in spec §8: the commit only ever assembles the
    /// chunks belonging to the model id carried by this exact token.
    /// `artifact_kind` names the `ArtifactStore`'s filename segment (always
    /// [`PLACEHOLDER_KIND`] today, since it is fixed at `put_chunk` time
    /// before the caller's catalog `kind` classification is known); `kind`
    /// is the catalog classification recorded on the Model row.
    pub async fn commit(
        &self,
        token: &str,
        total_chunks: u64,
        kind: &str,
        sub_kind: Option<&str>,
        access_level: AccessLevel,
        domain: Option<&str>,
    ) -> Result<Model, AppError> {
        let claims = self.verify_upload_claims(token)?;
        let model_id = claims.model_id.ok_or_else(|| AppError::AuthInvalid("upload token missing model_id".into()))?;

        self.artifacts
            .commit(model_id, PLACEHOLDER_KIND, total_chunks)
            .await
            .map_err(|e| AppError::Transient(e.to_string()))?;

        self.models.finalize_upload(model_id, kind, sub_kind, access_level, domain).await
    }

    pub async fn download(&self, principal: &Principal, identifier: &str, public: bool) -> Result<std::path::PathBuf, AppError> {
        let model = self.model_service.by_identifier(identifier).await?;
        if public {
            if model.access_level != AccessLevel::Public {
                return Err(AppError::Forbidden("model is not public".into()));
            }
        } else {
            self.model_service.require_read(principal, &model).await?;
        }
        if !self.artifacts.exists(model.id, PLACEHOLDER_KIND).await {
            return Err(AppError::NotFound("artifact not committed".into()));
        }
        self.artifacts.prepare_download(model.id, PLACEHOLDER_KIND, true).await.map_err(|e| AppError::Transient(e.to_string()))?;
        self.models.record_download(model.id).await?;
        Ok(self.artifacts.artifact_path(model.id, PLACEHOLDER_KIND, true))
    }
}
