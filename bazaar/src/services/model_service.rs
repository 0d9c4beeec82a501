use bazaar_catalog::models::{AccessLevel, Model, Permission};
use bazaar_catalog::repository::{ModelRepository, UserRepository};
use bazaar_catalog::AppError;
use bazaar_permissions::{resolve, EffectivePermission, Principal};
use r2e::prelude::*;
use uuid::Uuid;

#[derive(Clone)]
pub struct ModelService {
    models: ModelRepository,
    users: UserRepository,
}

#[bean]
impl ModelService {
    pub fn new(models: ModelRepository, users: UserRepository) -> Self {
        Self { models, users }
    }

    pub async fn list_visible(&self, principal: &Principal, name_filter: Option<&str>) -> Result<Vec<Model>, AppError> {
        let Some(user_id) = principal.user_id else {
            return self.models.list_public(name_filter).await;
        };
        self.models.list_visible(user_id, principal.is_global_admin, name_filter).await
    }

    pub async fn list_public(&self, name_filter: Option<&str>) -> Result<Vec<Model>, AppError> {
        self.models.list_public(name_filter).await
    }

    /// Split "owner/name" (or a bare model id) into a resolved Model row.
    pub async fn by_identifier(&self, identifier: &str) -> Result<Model, AppError> {
        if let Ok(id) = Uuid::parse_str(identifier) {
            return self.models.by_id(id).await;
        }
        let (owner, name) = identifier
            .split_once('/')
            .ok_or_else(|| AppError::Validation("model identifier must be '<owner>/<name>' or a model id".into()))?;
        let owner = self
            .users
            .by_username(owner)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no such user '{owner}'")))?;
        self.models
            .by_owner_and_name(owner.id, name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("model '{identifier}' not found")))
    }

    pub async fn info(&self, principal: &Principal, model_id: Uuid) -> Result<Model, AppError> {
        let model = self.models.by_id(model_id).await?;
        self.require_read(principal, &model).await?;
        Ok(model)
    }

    pub async fn name_check(&self, principal: &Principal, name: &str) -> Result<bool, AppError> {
        let Some(user_id) = principal.user_id else {
            return Err(AppError::AuthMissing);
        };
        Ok(self.models.by_owner_and_name(user_id, name).await?.is_none())
    }

    pub async fn update_access_level(
        &self,
        principal: &Principal,
        model_identifier: &str,
        access_level: AccessLevel,
        team_id: Option<Uuid>,
    ) -> Result<Model, AppError> {
        let model = self.by_identifier(model_identifier).await?;
        self.require_write(principal, &model).await?;
        self.models.set_access_level(model.id, access_level, team_id).await
    }

    pub async fn update_default_permission(
        &self,
        principal: &Principal,
        model_id: Uuid,
        permission: Permission,
    ) -> Result<Model, AppError> {
        let model = self.models.by_id(model_id).await?;
        self.require_write(principal, &model).await?;
        self.models.set_default_permission(model_id, permission).await
    }

    pub async fn update_model_permission(
        &self,
        principal: &Principal,
        model_id: Uuid,
        grantee_email: &str,
        permission: Permission,
    ) -> Result<(), AppError> {
        let model = self.models.by_id(model_id).await?;
        self.require_write(principal, &model).await?;
        let grantee = self
            .users
            .by_email(grantee_email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no such user '{grantee_email}'")))?;
        self.models.upsert_permission(grantee.id, model_id, permission).await
    }

    async fn effective(&self, principal: &Principal, model: &Model) -> Result<EffectivePermission, AppError> {
        let explicit = match principal.user_id {
            Some(user_id) => self.models.explicit_permission(user_id, model.id).await?,
            None => None,
        };
        Ok(resolve(principal, model, explicit))
    }

    pub async fn require_read(&self, principal: &Principal, model: &Model) -> Result<(), AppError> {
        if self.effective(principal, model).await? == EffectivePermission::None {
            return Err(AppError::Forbidden("read access required".into()));
        }
        Ok(())
    }

    pub async fn require_write(&self, principal: &Principal, model: &Model) -> Result<(), AppError> {
        if self.effective(principal, model).await? != EffectivePermission::Write {
            return Err(AppError::Forbidden("write access required".into()));
        }
        Ok(())
    }

    /// Lets a deployed replica verify a caller's effective permission
    /// against the control plane (spec §1: "permission verification
    /// against the control plane") without forwarding the full
    /// permission-resolution algorithm to every replica.
    pub async fn check_permission(&self, principal: &Principal, model_identifier: &str, required: Permission) -> Result<bool, AppError> {
        let model = self.by_identifier(model_identifier).await?;
        let effective = self.effective(principal, &model).await?;
        Ok(effective >= EffectivePermission::from(required))
    }
}
