use bazaar_catalog::models::Permission;
use bazaar_catalog::Envelope;
use bazaar_permissions::EffectivePermission;
use r2e::http::extract::FromRequestParts;
use r2e::http::header::Parts;
use r2e::prelude::*;
use r2e::r2e_security::extract_bearer_token_from_parts;
use uuid::Uuid;

use crate::control_plane::ControlPlaneError;
use crate::state::AppState;

#[derive(Debug)]
pub enum ReplicaError {
    AuthMissing,
    AuthInvalid,
    Forbidden,
    ControlPlaneUnreachable(String),
}

impl IntoResponse for ReplicaError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ReplicaError::AuthMissing => (StatusCode::UNAUTHORIZED, "missing bearer token".to_string()),
            ReplicaError::AuthInvalid => (StatusCode::UNAUTHORIZED, "invalid session token".to_string()),
            ReplicaError::Forbidden => (StatusCode::FORBIDDEN, "insufficient permission".to_string()),
            ReplicaError::ControlPlaneUnreachable(e) => {
                tracing::warn!(error = %e, "control plane unreachable");
                (StatusCode::BAD_GATEWAY, "control plane unreachable".to_string())
            }
        };
        let body = Envelope::<()> { status_code: status.as_u16(), message, data: None };
        (status, Json(body)).into_response()
    }
}

/// The caller of a replica request: a session token's subject, still
/// bearing the raw token so a permission check can be forwarded to the
/// control plane without re-signing anything.
pub struct ReplicaCaller {
    pub user_id: Uuid,
    pub token: String,
}

impl FromRequestParts<AppState> for ReplicaCaller {
    type Rejection = ReplicaError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token_from_parts(parts).map_err(|_| ReplicaError::AuthMissing)?;
        let user_id = state.tokens.verify_session(token).map_err(|_| ReplicaError::AuthInvalid)?;
        Ok(ReplicaCaller { user_id, token: token.to_string() })
    }
}

/// Checks `caller`'s permission against the control plane, consulting the
/// replica's TTL cache first. A cache miss or expiry triggers exactly one
/// outbound call; the result (not just hits) is cached so a denied caller
/// doesn't hammer the control plane either. The model identifier is
/// always the replica's own model id, since one replica serves exactly
/// one model.
pub async fn require_permission(state: &AppState, caller: &ReplicaCaller, required: Permission) -> Result<(), ReplicaError> {
    let required_effective = EffectivePermission::from(required);
    if let Some(cached) = state.permission_cache.get(caller.user_id) {
        if cached >= required_effective {
            return Ok(());
        }
    }

    let model_identifier = state.replica.model_id.to_string();
    let allowed = state
        .control_plane
        .check_permission(&caller.token, &model_identifier, required)
        .await
        .map_err(|ControlPlaneError::Unreachable(e)| ReplicaError::ControlPlaneUnreachable(e))?;

    state.permission_cache.insert(caller.user_id, if allowed { required_effective } else { EffectivePermission::None });

    if !allowed {
        return Err(ReplicaError::Forbidden);
    }
    Ok(())
}

/// Extracted in handlers that only need read access: search, predict,
/// upvote, associate.
pub struct ReadCaller(pub ReplicaCaller);

impl FromRequestParts<AppState> for ReadCaller {
    type Rejection = ReplicaError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let caller = ReplicaCaller::from_request_parts(parts, state).await?;
        require_permission(state, &caller, Permission::Read).await?;
        Ok(ReadCaller(caller))
    }
}

/// Extracted in handlers that mutate the index: insert, delete.
pub struct WriteCaller(pub ReplicaCaller);

impl FromRequestParts<AppState> for WriteCaller {
    type Rejection = ReplicaError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let caller = ReplicaCaller::from_request_parts(parts, state).await?;
        require_permission(state, &caller, Permission::Write).await?;
        Ok(WriteCaller(caller))
    }
}
