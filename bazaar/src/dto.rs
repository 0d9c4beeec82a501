//! Request/response shapes that aren't already owned by `bazaar-catalog`'s
//! models — everything here is wire contract, not durable state.

use bazaar_catalog::models::{JobMessageLevel, JobStatus, Model, TeamRole};
use garde::Validate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, JsonSchema)]
pub struct LoginResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct VerifyRequest {
    pub token: Uuid,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct ResetPasswordRequest {
    #[garde(email)]
    pub email: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct UserInfoResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub verified: bool,
    pub global_admin: bool,
}

impl From<bazaar_catalog::models::User> for UserInfoResponse {
    fn from(u: bazaar_catalog::models::User) -> Self {
        Self { id: u.id, username: u.username, email: u.email, verified: u.verified, global_admin: u.global_admin }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ModelListQuery {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub sub_type: Option<String>,
    pub access_level: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ModelIdQuery {
    pub model_id: Uuid,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NameCheckQuery {
    pub name: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct NameCheckResponse {
    pub available: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UploadTokenQuery {
    pub model_name: String,
    pub size: u64,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct UploadTokenResponse {
    pub model_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UploadChunkQuery {
    pub chunk_number: u64,
    #[serde(default)]
    pub compressed: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UploadCommitQuery {
    pub total_chunks: u64,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct UploadCommitRequest {
    #[garde(skip)]
    pub kind: String,
    pub sub_kind: Option<String>,
    #[garde(skip)]
    pub access_level: bazaar_catalog::models::AccessLevel,
    pub domain: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ModelIdentifierQuery {
    pub model_identifier: String,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct TrainNdbMetadata {
    #[garde(pattern(r"^[A-Za-z0-9_-]+$"))]
    pub model_name: String,
    pub sub_type: Option<String>,
    pub domain: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct TrainNdbResponse {
    pub model_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct TrainCompleteRequest {
    pub model_id: Uuid,
    #[garde(skip)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct JobUpdateStatusRequest {
    pub model_id: Uuid,
    #[garde(skip)]
    pub status: JobStatus,
    pub message: Option<String>,
}

impl JobUpdateStatusRequest {
    pub fn level(&self) -> JobMessageLevel {
        match self.status {
            JobStatus::Failed => JobMessageLevel::Error,
            _ => JobMessageLevel::Warning,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeployRunQuery {
    pub deployment_name: String,
    pub model_identifier: String,
    pub autoscaling_enabled: Option<bool>,
    pub memory: Option<u64>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct DeployRunResponse {
    pub deployment_id: Uuid,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeploymentIdentifierQuery {
    pub deployment_identifier: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct DeployStatusResponse {
    pub deployment_id: Uuid,
    pub status: JobStatus,
    pub deployment_name: String,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct DeployUpdateStatusRequest {
    pub deployment_id: Uuid,
    #[garde(skip)]
    pub status: JobStatus,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct DeployPermissionsResponse {
    pub deployment_id: Uuid,
    pub entries: Vec<DeployPermissionEntry>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct DeployPermissionEntry {
    pub user_id: Uuid,
    pub permission: bazaar_catalog::models::Permission,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateTeamQuery {
    pub name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddUserToTeamQuery {
    pub email: String,
    pub team_id: Uuid,
    #[serde(default)]
    pub role: TeamRole,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AssignTeamAdminQuery {
    pub email: String,
    pub team_id: Uuid,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TeamIdQuery {
    pub team_id: Uuid,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct TeamUserEntry {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub role: TeamRole,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PermissionCheckQuery {
    pub model_identifier: String,
    pub required: bazaar_catalog::models::Permission,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PermissionCheckResponse {
    pub allowed: bool,
}

pub fn model_list_matches(model: &Model, q: &ModelListQuery) -> bool {
    if let Some(kind) = &q.kind {
        if &model.kind != kind {
            return false;
        }
    }
    if let Some(sub_kind) = &q.sub_type {
        if model.sub_kind.as_deref() != Some(sub_kind.as_str()) {
            return false;
        }
    }
    if let Some(access_level) = &q.access_level {
        let matches = match access_level.as_str() {
            "private" => matches!(model.access_level, bazaar_catalog::models::AccessLevel::Private),
            "protected" => matches!(model.access_level, bazaar_catalog::models::AccessLevel::Protected),
            "public" => matches!(model.access_level, bazaar_catalog::models::AccessLevel::Public),
            _ => true,
        };
        if !matches {
            return false;
        }
    }
    true
}
