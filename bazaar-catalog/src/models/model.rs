use garde::Validate;
use r2e::r2e_data::Entity;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, JsonSchema)]
#[sqlx(type_name = "access_level", rename_all = "snake_case")]
pub enum AccessLevel {
    Private,
    Protected,
    Public,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, JsonSchema)]
#[sqlx(type_name = "permission_level", rename_all = "snake_case")]
pub enum Permission {
    Read,
    Write,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, JsonSchema)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
pub enum JobStatus {
    NotStarted,
    Starting,
    InProgress,
    Complete,
    Failed,
    Stopped,
}

impl JobStatus {
    /// True once a Model row's train/deploy state has left the active part
    /// of the lifecycle — invariant 1 in spec §8: it never moves backward
    /// out of one of these.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed | JobStatus::Stopped)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Model {
    pub id: Uuid,
    pub name: String,
    pub kind: String,
    pub sub_kind: Option<String>,
    pub train_status: JobStatus,
    pub deploy_status: JobStatus,
    pub access_level: AccessLevel,
    pub default_permission: Permission,
    pub downloads: i64,
    pub domain: Option<String>,
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
    pub parent_id: Option<Uuid>,
    pub user_id: Uuid,
    pub team_id: Option<Uuid>,
}

impl Entity for Model {
    type Id = Uuid;

    fn table_name() -> &'static str {
        "models"
    }

    fn id_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str] {
        &[
            "id",
            "name",
            "kind",
            "sub_kind",
            "train_status",
            "deploy_status",
            "access_level",
            "default_permission",
            "downloads",
            "domain",
            "published_at",
            "parent_id",
            "user_id",
            "team_id",
        ]
    }

    fn id(&self) -> &Uuid {
        &self.id
    }
}

impl Model {
    pub fn deployment_name(&self) -> String {
        format!("deployment-{}", self.id)
    }

    pub fn train_job_name(&self) -> String {
        format!("train-{}-{}-{}", self.id, self.kind, self.sub_kind.as_deref().unwrap_or("default"))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct ModelAttribute {
    pub model_id: Uuid,
    pub key: String,
    pub value: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct ModelPermission {
    pub user_id: Uuid,
    pub model_id: Uuid,
    pub permission: Permission,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct ModelMetadata {
    pub model_id: Uuid,
    pub general: Option<serde_json::Value>,
    pub train: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct ModelDependency {
    pub model_id: Uuid,
    pub dependency_id: Uuid,
}

fn validate_model_name(name: &str, _ctx: &()) -> garde::Result {
    if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') && !name.is_empty() {
        Ok(())
    } else {
        Err(garde::Error::new(
            "model name must contain only alphanumeric characters, underscores, and hyphens",
        ))
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct UpdateAccessLevelRequest {
    pub model_identifier: String,
    #[garde(skip)]
    pub access_level: AccessLevel,
    pub team_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct UpdateDefaultPermissionRequest {
    pub model_id: Uuid,
    #[garde(skip)]
    pub default_permission: Permission,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct UpdateModelPermissionRequest {
    pub model_id: Uuid,
    #[garde(email)]
    pub email: String,
    #[garde(skip)]
    pub permission: Permission,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct ModelNameCheck {
    #[garde(custom(validate_model_name))]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_exactly_three() {
        assert!(JobStatus::Complete.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Stopped.is_terminal());
        assert!(!JobStatus::NotStarted.is_terminal());
        assert!(!JobStatus::Starting.is_terminal());
        assert!(!JobStatus::InProgress.is_terminal());
    }

    #[test]
    fn permission_ordering_write_beats_read() {
        assert!(Permission::Write > Permission::Read);
    }
}
