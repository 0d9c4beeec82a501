use bazaar_catalog::models::Permission;
use bazaar_catalog::Envelope;
use r2e::http::extract::FromRequestParts;
use r2e::http::header::Parts;
use r2e::prelude::*;
use r2e::r2e_security::extract_bearer_token_from_parts;
use uuid::Uuid;

use crate::control_plane::ControlPlaneError;
use crate::state::AppState;

#[derive(Debug)]
pub enum CacheError {
    AuthMissing,
    AuthInvalid,
    Forbidden,
    ControlPlaneUnreachable(String),
}

impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            CacheError::AuthMissing => (StatusCode::UNAUTHORIZED, "missing bearer token".to_string()),
            CacheError::AuthInvalid => (StatusCode::UNAUTHORIZED, "invalid token".to_string()),
            CacheError::Forbidden => (StatusCode::FORBIDDEN, "insufficient permission".to_string()),
            CacheError::ControlPlaneUnreachable(e) => {
                tracing::warn!(error = %e, "control plane unreachable");
                (StatusCode::BAD_GATEWAY, "control plane unreachable".to_string())
            }
        };
        let body = Envelope::<()> { status_code: status.as_u16(), message, data: None };
        (status, Json(body)).into_response()
    }
}

/// A verified cache-insert token's bearer: the model it's scoped to, not
/// a user — matches `issue_cache_insert_token`'s subject.
pub struct CacheInsertCaller {
    pub model_id: Uuid,
}

impl FromRequestParts<AppState> for CacheInsertCaller {
    type Rejection = CacheError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token_from_parts(parts).map_err(|_| CacheError::AuthMissing)?;
        let model_id = state.tokens.verify_cache_insert(token).map_err(|_| CacheError::AuthInvalid)?;
        Ok(CacheInsertCaller { model_id })
    }
}

/// A verified session token's bearer, used only by `/cache/token` to
/// decide whether the caller may mint a cache-insert token for a model.
pub struct SessionCaller {
    pub user_id: Uuid,
    pub token: String,
}

impl FromRequestParts<AppState> for SessionCaller {
    type Rejection = CacheError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token_from_parts(parts).map_err(|_| CacheError::AuthMissing)?;
        let user_id = state.tokens.verify_session(token).map_err(|_| CacheError::AuthInvalid)?;
        Ok(SessionCaller { user_id, token: token.to_string() })
    }
}

/// Checks whether `caller` may read `model_id`, consulting the TTL cache
/// before round-tripping to the control plane — the same caching
/// convention the deployed replica's permission check uses, keyed here
/// by (caller, model) since one cache-service instance serves every
/// model, not just one.
pub async fn require_read(state: &AppState, caller: &SessionCaller, model_id: Uuid) -> Result<(), CacheError> {
    if let Some(true) = state.permission_cache.get(&(caller.user_id, model_id)) {
        return Ok(());
    }

    let allowed = state
        .control_plane
        .check_permission(&caller.token, &model_id.to_string(), Permission::Read)
        .await
        .map_err(|ControlPlaneError::Unreachable(e)| CacheError::ControlPlaneUnreachable(e))?;

    state.permission_cache.insert((caller.user_id, model_id), allowed);

    if !allowed {
        return Err(CacheError::Forbidden);
    }
    Ok(())
}
