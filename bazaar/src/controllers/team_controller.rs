use bazaar_catalog::models::Team;
use bazaar_catalog::{AppError, Envelope};
use r2e::prelude::*;
use uuid::Uuid;

use crate::dto::{AddUserToTeamQuery, AssignTeamAdminQuery, CreateTeamQuery, TeamIdQuery, TeamUserEntry};
use crate::identity::BazaarUser;
use crate::services::TeamService;
use crate::state::AppState;

#[derive(Controller)]
#[controller(path = "/team", state = AppState)]
pub struct TeamController {
    #[inject]
    teams: TeamService,
}

#[routes]
impl TeamController {
    #[post("/create-team")]
    async fn create_team(&self, user: BazaarUser, Query(q): Query<CreateTeamQuery>) -> Result<Json<Envelope<Team>>, AppError> {
        require_global_admin(&user)?;
        let team = self.teams.create_team(&q.name).await?;
        Ok(Json(Envelope::ok("team created", team)))
    }

    #[post("/add-user-to-team")]
    async fn add_user_to_team(&self, user: BazaarUser, Query(q): Query<AddUserToTeamQuery>) -> Result<Json<Envelope<()>>, AppError> {
        require_team_admin(&user, &self.teams, q.team_id)?;
        self.teams.add_user_to_team(&q.email, q.team_id, q.role).await?;
        Ok(Json(Envelope::ok("user added to team", ())))
    }

    #[post("/assign-team-admin")]
    async fn assign_team_admin(&self, user: BazaarUser, Query(q): Query<AssignTeamAdminQuery>) -> Result<Json<Envelope<()>>, AppError> {
        require_team_admin(&user, &self.teams, q.team_id)?;
        self.teams.assign_team_admin(&q.email, q.team_id).await?;
        Ok(Json(Envelope::ok("team admin assigned", ())))
    }

    #[delete("/delete-team")]
    async fn delete_team(&self, user: BazaarUser, Query(q): Query<TeamIdQuery>) -> Result<Json<Envelope<()>>, AppError> {
        require_global_admin(&user)?;
        self.teams.delete_team(q.team_id).await?;
        Ok(Json(Envelope::ok("team deleted", ())))
    }

    #[get("/list")]
    async fn list(&self, _user: BazaarUser) -> Result<Json<Envelope<Vec<Team>>>, AppError> {
        let teams = self.teams.list().await?;
        Ok(Json(Envelope::ok("ok", teams)))
    }

    #[get("/team-users")]
    async fn team_users(&self, user: BazaarUser, Query(q): Query<TeamIdQuery>) -> Result<Json<Envelope<Vec<TeamUserEntry>>>, AppError> {
        require_team_admin(&user, &self.teams, q.team_id)?;
        let rows = self.teams.team_users(q.team_id).await?;
        let entries = rows
            .into_iter()
            .map(|r| TeamUserEntry { user_id: r.id, username: r.username, email: r.email, role: r.role })
            .collect();
        Ok(Json(Envelope::ok("ok", entries)))
    }
}

fn require_global_admin(user: &BazaarUser) -> Result<(), AppError> {
    if user.is_global_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("global admin required".into()))
    }
}

fn require_team_admin(user: &BazaarUser, teams: &TeamService, team_id: Uuid) -> Result<(), AppError> {
    if teams.can_administer(user.is_global_admin, &user.teams, team_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden("team admin required".into()))
    }
}
