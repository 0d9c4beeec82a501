use r2e::prelude::*;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{PasswordReset, SignupRequest, Team, TeamRole, User, UserTeam};

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct TeamUserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub federated_id: Option<String>,
    pub verified: bool,
    pub verification_token: Uuid,
    pub global_admin: bool,
    pub role: TeamRole,
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

#[bean]
impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, req: &SignupRequest, password_hash: &str) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING id, username, email, password_hash, federated_id, verified, verification_token, global_admin",
        )
        .bind(&req.username)
        .bind(&req.email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, federated_id, verified, verification_token, global_admin \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, federated_id, verified, verification_token, global_admin \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn by_id(&self, id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, federated_id, verified, verification_token, global_admin \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))
    }

    pub async fn mark_verified(&self, token: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET verified = TRUE WHERE verification_token = $1 \
             RETURNING id, username, email, password_hash, federated_id, verified, verification_token, global_admin",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("invalid verification token".into()))
    }

    pub async fn set_password_hash(&self, user_id: Uuid, password_hash: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn upsert_reset_code(
        &self,
        user_id: Uuid,
        reset_code_hash: &str,
        expiration_time: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO password_resets (user_id, reset_code_hash, expiration_time) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET reset_code_hash = $2, expiration_time = $3",
        )
        .bind(user_id)
        .bind(reset_code_hash)
        .bind(expiration_time)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn take_reset_code(&self, user_id: Uuid) -> Result<Option<PasswordReset>, AppError> {
        sqlx::query_as::<_, PasswordReset>(
            "SELECT user_id, reset_code_hash, expiration_time FROM password_resets WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn clear_reset_code(&self, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM password_resets WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn teams_for_user(&self, user_id: Uuid) -> Result<Vec<UserTeam>, AppError> {
        sqlx::query_as::<_, UserTeam>(
            "SELECT user_id, team_id, role FROM user_teams WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn create_team(&self, name: &str) -> Result<Team, AppError> {
        sqlx::query_as::<_, Team>("INSERT INTO teams (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(Into::into)
    }

    pub async fn delete_team(&self, team_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(team_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("team {team_id} not found")));
        }
        Ok(())
    }

    pub async fn list_teams(&self) -> Result<Vec<Team>, AppError> {
        sqlx::query_as::<_, Team>("SELECT id, name FROM teams ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(Into::into)
    }

    pub async fn add_user_to_team(&self, user_id: Uuid, team_id: Uuid, role: TeamRole) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO user_teams (user_id, team_id, role) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, team_id) DO UPDATE SET role = $3",
        )
        .bind(user_id)
        .bind(team_id)
        .bind(role)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn team_users(&self, team_id: Uuid) -> Result<Vec<TeamUserRow>, AppError> {
        sqlx::query_as::<_, TeamUserRow>(
            "SELECT u.id, u.username, u.email, u.password_hash, u.federated_id, u.verified, \
                    u.verification_token, u.global_admin, ut.role \
             FROM users u JOIN user_teams ut ON ut.user_id = u.id WHERE ut.team_id = $1",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }
}
