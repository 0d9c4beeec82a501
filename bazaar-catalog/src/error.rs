use r2e::http::StatusCode;
use r2e::prelude::{IntoResponse, Json, Response};
use serde::Serialize;

/// Response envelope every bazaar endpoint returns, success or failure.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status_code: 200,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// The catalog's error kinds, mapped 1:1 onto the error table in the design
/// document: validation/auth-missing/auth-invalid/permission-denied/
/// not-found/conflict/transient-dependency/quota/internal.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    AuthMissing,
    AuthInvalid(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Transient(String),
    Quota(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthMissing => (
                StatusCode::UNAUTHORIZED,
                "authentication required".to_string(),
            ),
            AppError::AuthInvalid(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Transient(msg) => {
                tracing::warn!(error = %msg, "transient dependency failure");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::Quota(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        let body = Envelope::<()> {
            status_code: status.as_u16(),
            message,
            data: None,
        };
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("not found".into()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("already exists".into())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        let resp = AppError::Validation("bad name".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn forbidden_maps_to_403() {
        let resp = AppError::Forbidden("no write access".into()).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn not_found_maps_to_404() {
        let resp = AppError::NotFound("model missing".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
