use garde::Validate;
use r2e::r2e_data::Entity;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub federated_id: Option<String>,
    pub verified: bool,
    pub verification_token: Uuid,
    pub global_admin: bool,
}

impl Entity for User {
    type Id = Uuid;

    fn table_name() -> &'static str {
        "users"
    }

    fn id_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str] {
        &[
            "id",
            "username",
            "email",
            "password_hash",
            "federated_id",
            "verified",
            "verification_token",
            "global_admin",
        ]
    }

    fn id(&self) -> &Uuid {
        &self.id
    }
}

impl User {
    pub fn is_global_admin(&self) -> bool {
        self.global_admin
    }

    /// The domain half of the user's email, used only as informational
    /// metadata copied onto models the user creates.
    pub fn email_domain(&self) -> Option<&str> {
        self.email.split('@').nth(1)
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct SignupRequest {
    #[garde(pattern(r"^[A-Za-z0-9_-]+$"))]
    pub username: String,
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct NewPasswordRequest {
    #[garde(email)]
    pub email: String,
    #[garde(length(equal = 6))]
    pub code: String,
    #[garde(length(min = 8))]
    pub new_password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct PasswordReset {
    pub user_id: Uuid,
    pub reset_code_hash: String,
    pub expiration_time: chrono::DateTime<chrono::Utc>,
}

impl PasswordReset {
    pub fn is_valid(&self) -> bool {
        chrono::Utc::now() < self.expiration_time
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, JsonSchema)]
#[sqlx(type_name = "team_role", rename_all = "snake_case")]
pub enum TeamRole {
    #[default]
    Member,
    TeamAdmin,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserTeam {
    pub user_id: Uuid,
    pub team_id: Uuid,
    pub role: TeamRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_domain_splits_on_at() {
        let user = User {
            id: Uuid::nil(),
            username: "alice".into(),
            email: "alice@x.io".into(),
            password_hash: Some("hash".into()),
            federated_id: None,
            verified: true,
            verification_token: Uuid::nil(),
            global_admin: false,
        };
        assert_eq!(user.email_domain(), Some("x.io"));
    }
}
