use r2e::prelude::*;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    AccessLevel, JobStatus, Model, ModelAttribute, ModelDependency, ModelMetadata, ModelPermission,
    Permission,
};

const MODEL_COLUMNS: &str = "id, name, kind, sub_kind, train_status, deploy_status, \
    access_level, default_permission, downloads, domain, published_at, parent_id, user_id, team_id";

#[derive(Clone)]
pub struct ModelRepository {
    pool: PgPool,
}

#[bean]
impl ModelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Reserves the (owner, name) pair by creating the Model row in
    /// `not_started`. Fails with a conflict if the pair is already taken —
    /// this makes reservation and row-creation the same atomic step the
    /// upload-token issuance and the train-request handler both rely on.
    pub async fn reserve(
        &self,
        owner_id: Uuid,
        name: &str,
        kind: &str,
        sub_kind: Option<&str>,
        domain: Option<&str>,
        parent_id: Option<Uuid>,
    ) -> Result<Model, AppError> {
        sqlx::query_as::<_, Model>(&format!(
            "INSERT INTO models (name, kind, sub_kind, domain, parent_id, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {MODEL_COLUMNS}"
        ))
        .bind(name)
        .bind(kind)
        .bind(sub_kind)
        .bind(domain)
        .bind(parent_id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(format!("model '{name}' already exists for this owner"))
            }
            other => other.into(),
        })
    }

    pub async fn by_id(&self, id: Uuid) -> Result<Model, AppError> {
        sqlx::query_as::<_, Model>(&format!("SELECT {MODEL_COLUMNS} FROM models WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("model {id} not found")))
    }

    pub async fn by_owner_and_name(&self, owner_id: Uuid, name: &str) -> Result<Option<Model>, AppError> {
        sqlx::query_as::<_, Model>(&format!(
            "SELECT {MODEL_COLUMNS} FROM models WHERE user_id = $1 AND name = $2"
        ))
        .bind(owner_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// The `list_visible(caller)` disjunction from the resolver spec,
    /// executed as one query rather than filtered row by row: public, OR
    /// (protected AND member of team), OR owner, OR explicit grant, OR
    /// global-admin.
    pub async fn list_visible(
        &self,
        caller_id: Uuid,
        is_global_admin: bool,
        name_filter: Option<&str>,
    ) -> Result<Vec<Model>, AppError> {
        if is_global_admin {
            return sqlx::query_as::<_, Model>(&format!(
                "SELECT {MODEL_COLUMNS} FROM models WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%') \
                 ORDER BY name"
            ))
            .bind(name_filter)
            .fetch_all(&self.pool)
            .await
            .map_err(Into::into);
        }

        sqlx::query_as::<_, Model>(&format!(
            "SELECT DISTINCT {MODEL_COLUMNS} FROM models m WHERE \
             ($2::text IS NULL OR m.name ILIKE '%' || $2 || '%') AND ( \
               m.access_level = 'public' \
               OR m.user_id = $1 \
               OR (m.access_level = 'protected' AND EXISTS ( \
                     SELECT 1 FROM user_teams ut WHERE ut.team_id = m.team_id AND ut.user_id = $1)) \
               OR EXISTS (SELECT 1 FROM model_permissions mp WHERE mp.model_id = m.id AND mp.user_id = $1) \
             ) ORDER BY m.name"
        ))
        .bind(caller_id)
        .bind(name_filter)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list_public(&self, name_filter: Option<&str>) -> Result<Vec<Model>, AppError> {
        sqlx::query_as::<_, Model>(&format!(
            "SELECT {MODEL_COLUMNS} FROM models WHERE access_level = 'public' \
             AND ($1::text IS NULL OR name ILIKE '%' || $1 || '%') ORDER BY name"
        ))
        .bind(name_filter)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn explicit_permission(&self, user_id: Uuid, model_id: Uuid) -> Result<Option<Permission>, AppError> {
        let row: Option<(Permission,)> = sqlx::query_as(
            "SELECT permission FROM model_permissions WHERE user_id = $1 AND model_id = $2",
        )
        .bind(user_id)
        .bind(model_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(p,)| p))
    }

    pub async fn team_role(&self, user_id: Uuid, team_id: Uuid) -> Result<Option<crate::models::TeamRole>, AppError> {
        let row: Option<(crate::models::TeamRole,)> = sqlx::query_as(
            "SELECT role FROM user_teams WHERE user_id = $1 AND team_id = $2",
        )
        .bind(user_id)
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(r,)| r))
    }

    pub async fn permissions_for_model(&self, model_id: Uuid) -> Result<Vec<ModelPermission>, AppError> {
        sqlx::query_as::<_, ModelPermission>(
            "SELECT user_id, model_id, permission FROM model_permissions WHERE model_id = $1",
        )
        .bind(model_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn upsert_permission(&self, user_id: Uuid, model_id: Uuid, permission: Permission) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO model_permissions (user_id, model_id, permission) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, model_id) DO UPDATE SET permission = $3",
        )
        .bind(user_id)
        .bind(model_id)
        .bind(permission)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fills in the kind/sub_kind/access_level/domain that weren't known
    /// yet at `reserve` time and marks the train job complete — the last
    /// step of the chunked-upload commit path (spec §4.3).
    pub async fn finalize_upload(
        &self,
        model_id: Uuid,
        kind: &str,
        sub_kind: Option<&str>,
        access_level: AccessLevel,
        domain: Option<&str>,
    ) -> Result<Model, AppError> {
        sqlx::query_as::<_, Model>(&format!(
            "UPDATE models SET kind = $1, sub_kind = $2, access_level = $3, domain = $4, \
             train_status = 'complete', published_at = NOW() WHERE id = $5 RETURNING {MODEL_COLUMNS}"
        ))
        .bind(kind)
        .bind(sub_kind)
        .bind(access_level)
        .bind(domain)
        .bind(model_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("model {model_id} not found")))
    }

    pub async fn set_access_level(
        &self,
        model_id: Uuid,
        access_level: AccessLevel,
        team_id: Option<Uuid>,
    ) -> Result<Model, AppError> {
        sqlx::query_as::<_, Model>(&format!(
            "UPDATE models SET access_level = $1, team_id = COALESCE($2, team_id) \
             WHERE id = $3 RETURNING {MODEL_COLUMNS}"
        ))
        .bind(access_level)
        .bind(team_id)
        .bind(model_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("model {model_id} not found")))
    }

    pub async fn set_default_permission(&self, model_id: Uuid, permission: Permission) -> Result<Model, AppError> {
        sqlx::query_as::<_, Model>(&format!(
            "UPDATE models SET default_permission = $1 WHERE id = $2 RETURNING {MODEL_COLUMNS}"
        ))
        .bind(permission)
        .bind(model_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("model {model_id} not found")))
    }

    pub async fn transition_train_status(
        &self,
        model_id: Uuid,
        from: &[JobStatus],
        to: JobStatus,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE models SET train_status = $1 WHERE id = $2 AND train_status = ANY($3)",
        )
        .bind(to)
        .bind(model_id)
        .bind(from)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn transition_deploy_status(
        &self,
        model_id: Uuid,
        from: &[JobStatus],
        to: JobStatus,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE models SET deploy_status = $1 WHERE id = $2 AND deploy_status = ANY($3)",
        )
        .bind(to)
        .bind(model_id)
        .bind(from)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn merge_metadata(&self, model_id: Uuid, general: Option<serde_json::Value>, train: Option<serde_json::Value>) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO metadata (model_id, general, train) VALUES ($1, $2, $3) \
             ON CONFLICT (model_id) DO UPDATE SET \
               general = COALESCE($2, metadata.general), \
               train = COALESCE($3, metadata.train)",
        )
        .bind(model_id)
        .bind(general)
        .bind(train)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn metadata(&self, model_id: Uuid) -> Result<ModelMetadata, AppError> {
        Ok(sqlx::query_as::<_, ModelMetadata>(
            "SELECT model_id, general, train FROM metadata WHERE model_id = $1",
        )
        .bind(model_id)
        .fetch_optional(&self.pool)
        .await?
        .unwrap_or(ModelMetadata {
            model_id,
            general: None,
            train: None,
        }))
    }

    pub async fn set_attribute(&self, model_id: Uuid, key: &str, value: Option<&str>) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO model_attributes (model_id, key, value) VALUES ($1, $2, $3) \
             ON CONFLICT (model_id, key) DO UPDATE SET value = $3",
        )
        .bind(model_id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn attributes(&self, model_id: Uuid) -> Result<Vec<ModelAttribute>, AppError> {
        sqlx::query_as::<_, ModelAttribute>(
            "SELECT model_id, key, value FROM model_attributes WHERE model_id = $1",
        )
        .bind(model_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn add_dependency(&self, model_id: Uuid, dependency_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO model_dependencies (model_id, dependency_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(model_id)
        .bind(dependency_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn dependencies(&self, model_id: Uuid) -> Result<Vec<ModelDependency>, AppError> {
        sqlx::query_as::<_, ModelDependency>(
            "SELECT model_id, dependency_id FROM model_dependencies WHERE model_id = $1",
        )
        .bind(model_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// Count of models currently occupying a training slot, for the
    /// license capacity gate ahead of admitting a new train request.
    pub async fn count_active_trainings(&self) -> Result<i64, AppError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM models WHERE train_status IN ('starting', 'in_progress')")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    pub async fn has_active_deployments(&self, model_id: Uuid) -> Result<bool, AppError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM models WHERE parent_id = $1 AND deploy_status IN ('starting', 'in_progress')",
        )
        .bind(model_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0 > 0)
    }

    /// Delete only by owner or global admin, cascading to permissions and
    /// metadata via FK `ON DELETE CASCADE`; children are re-parented to
    /// null by `ON DELETE SET NULL` on `parent_id`.
    pub async fn delete(&self, model_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM models WHERE id = $1")
            .bind(model_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("model {model_id} not found")));
        }
        Ok(())
    }

    pub async fn record_download(&self, model_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE models SET downloads = downloads + 1 WHERE id = $1")
            .bind(model_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
