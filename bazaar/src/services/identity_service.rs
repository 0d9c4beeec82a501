use bazaar_catalog::models::{NewPasswordRequest, SignupRequest, User};
use bazaar_catalog::repository::UserRepository;
use bazaar_catalog::AppError;
use bazaar_identity::{generate_reset_code, hash_password, verify_password, TokenService};
use chrono::{Duration, Utc};
use r2e::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

const RESET_CODE_TTL_MINUTES: i64 = 15;

#[derive(Clone)]
pub struct IdentityService {
    users: UserRepository,
    tokens: Arc<TokenService>,
}

#[bean]
impl IdentityService {
    pub fn new(users: UserRepository, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    pub async fn signup(&self, req: &SignupRequest) -> Result<User, AppError> {
        if self.users.by_email(&req.email).await?.is_some() {
            return Err(AppError::Conflict("an account with this email already exists".into()));
        }
        let password_hash = hash_password(&req.password).map_err(|e| AppError::Internal(e.0))?;
        let user = self.users.create(req, &password_hash).await?;
        tracing::info!(user_id = %user.id, email = %user.email, "verification email dispatched (logged, not sent)");
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .users
            .by_email(email)
            .await?
            .ok_or_else(|| AppError::AuthInvalid("invalid email or password".into()))?;

        let hash = user.password_hash.as_deref().ok_or_else(|| {
            AppError::AuthInvalid("this account only supports federated login".into())
        })?;
        if !verify_password(password, hash) {
            return Err(AppError::AuthInvalid("invalid email or password".into()));
        }

        Ok(self.tokens.issue_session_token(user.id))
    }

    pub async fn verify(&self, token: Uuid) -> Result<User, AppError> {
        self.users.mark_verified(token).await
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let Some(user) = self.users.by_email(email).await? else {
            // Don't leak whether an email is registered.
            return Ok(());
        };
        let code = generate_reset_code();
        let code_hash = hash_password(&code).map_err(|e| AppError::Internal(e.0))?;
        let expires = Utc::now() + Duration::minutes(RESET_CODE_TTL_MINUTES);
        self.users.upsert_reset_code(user.id, &code_hash, expires).await?;
        tracing::info!(user_id = %user.id, "password reset code dispatched (logged, not sent): {code}");
        Ok(())
    }

    pub async fn set_new_password(&self, req: &NewPasswordRequest) -> Result<(), AppError> {
        let user = self
            .users
            .by_email(&req.email)
            .await?
            .ok_or_else(|| AppError::Validation("invalid email or code".into()))?;

        let reset = self
            .users
            .take_reset_code(user.id)
            .await?
            .ok_or_else(|| AppError::Validation("invalid email or code".into()))?;

        if !reset.is_valid() || !verify_password(&req.code, &reset.reset_code_hash) {
            return Err(AppError::Validation("invalid email or code".into()));
        }

        let new_hash = hash_password(&req.new_password).map_err(|e| AppError::Internal(e.0))?;
        self.users.set_password_hash(user.id, &new_hash).await?;
        self.users.clear_reset_code(user.id).await?;
        Ok(())
    }

    pub async fn info(&self, user_id: Uuid) -> Result<User, AppError> {
        self.users.by_id(user_id).await
    }
}
