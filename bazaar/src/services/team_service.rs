use bazaar_catalog::models::{Team, TeamRole};
use bazaar_catalog::repository::{TeamUserRow, UserRepository};
use bazaar_catalog::AppError;
use r2e::prelude::*;
use uuid::Uuid;

#[derive(Clone)]
pub struct TeamService {
    users: UserRepository,
}

#[bean]
impl TeamService {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }

    pub async fn create_team(&self, name: &str) -> Result<Team, AppError> {
        self.users.create_team(name).await
    }

    pub async fn add_user_to_team(&self, email: &str, team_id: Uuid, role: TeamRole) -> Result<(), AppError> {
        let user = self
            .users
            .by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no such user '{email}'")))?;
        self.users.add_user_to_team(user.id, team_id, role).await
    }

    pub async fn assign_team_admin(&self, email: &str, team_id: Uuid) -> Result<(), AppError> {
        self.add_user_to_team(email, team_id, TeamRole::TeamAdmin).await
    }

    pub async fn delete_team(&self, team_id: Uuid) -> Result<(), AppError> {
        self.users.delete_team(team_id).await
    }

    pub async fn list(&self) -> Result<Vec<Team>, AppError> {
        self.users.list_teams().await
    }

    pub async fn team_users(&self, team_id: Uuid) -> Result<Vec<TeamUserRow>, AppError> {
        self.users.team_users(team_id).await
    }

    /// Whether `caller` may perform admin-only team operations: a global
    /// admin, or a team admin of `team_id` specifically.
    pub fn can_administer(&self, is_global_admin: bool, teams: &[(Uuid, TeamRole)], team_id: Uuid) -> bool {
        is_global_admin || teams.iter().any(|(id, role)| *id == team_id && *role == TeamRole::TeamAdmin)
    }
}
