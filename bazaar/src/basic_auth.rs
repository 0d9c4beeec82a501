use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bazaar_catalog::AppError;
use r2e::http::extract::FromRequestParts;
use r2e::http::header::Parts;

use crate::state::AppState;

/// `Authorization: Basic base64(email:password)`, used only by
/// `GET /user/login` — every other endpoint authenticates with a bearer
/// session token instead.
pub struct BasicAuth {
    pub email: String,
    pub password: String,
}

impl FromRequestParts<AppState> for BasicAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(r2e::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::AuthMissing)?;

        let encoded = header
            .strip_prefix("Basic ")
            .ok_or_else(|| AppError::AuthInvalid("expected Basic auth".into()))?;

        let decoded = STANDARD
            .decode(encoded)
            .map_err(|_| AppError::AuthInvalid("malformed Basic auth payload".into()))?;
        let decoded = String::from_utf8(decoded).map_err(|_| AppError::AuthInvalid("Basic auth payload is not utf-8".into()))?;

        let (email, password) = decoded
            .split_once(':')
            .ok_or_else(|| AppError::AuthInvalid("Basic auth payload missing ':'".into()))?;

        Ok(BasicAuth { email: email.to_string(), password: password.to_string() })
    }
}
