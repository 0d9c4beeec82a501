use bazaar_catalog::{AppError, Envelope};
use r2e::prelude::*;

use crate::dto::{
    DeployPermissionEntry, DeployPermissionsResponse, DeployRunQuery, DeployRunResponse, DeployStatusResponse,
    DeployUpdateStatusRequest, DeploymentIdentifierQuery,
};
use crate::identity::BazaarUser;
use crate::services::DeployService;
use crate::state::AppState;
use crate::validate::validated;

#[derive(Controller)]
#[controller(path = "/deploy", state = AppState)]
pub struct DeployController {
    #[inject]
    deploy: DeployService,
}

#[routes]
impl DeployController {
    #[post("/run")]
    async fn run(&self, user: BazaarUser, Query(q): Query<DeployRunQuery>) -> Result<Json<Envelope<DeployRunResponse>>, AppError> {
        let payload = serde_json::json!({
            "deployment_name": q.deployment_name,
            "autoscaling_enabled": q.autoscaling_enabled.unwrap_or(false),
            "memory": q.memory,
        });
        let model = self.deploy.run(&user.principal(), &q.model_identifier, payload).await?;
        Ok(Json(Envelope::ok("deployment started", DeployRunResponse { deployment_id: model.id })))
    }

    #[post("/stop")]
    async fn stop(&self, user: BazaarUser, Query(q): Query<DeploymentIdentifierQuery>) -> Result<Json<Envelope<()>>, AppError> {
        self.deploy.stop(&user.principal(), &q.deployment_identifier).await?;
        Ok(Json(Envelope::ok("deployment stopped", ())))
    }

    #[get("/status")]
    async fn status(&self, user: BazaarUser, Query(q): Query<DeploymentIdentifierQuery>) -> Result<Json<Envelope<DeployStatusResponse>>, AppError> {
        let model = self.deploy.status(&user.principal(), &q.deployment_identifier).await?;
        Ok(Json(Envelope::ok(
            "ok",
            DeployStatusResponse { deployment_id: model.id, status: model.deploy_status, deployment_name: model.deployment_name() },
        )))
    }

    #[post("/update-status")]
    async fn update_status(&self, Json(body): Json<DeployUpdateStatusRequest>) -> Result<Json<Envelope<()>>, AppError> {
        validated(&body)?;
        self.deploy.update_status(body.deployment_id, body.status).await?;
        Ok(Json(Envelope::ok("status updated", ())))
    }

    #[get("/permissions/{deployment_id}")]
    async fn permissions(&self, user: BazaarUser, Path(deployment_id): Path<uuid::Uuid>) -> Result<Json<Envelope<DeployPermissionsResponse>>, AppError> {
        let entries = self.deploy.permissions(&user.principal(), deployment_id).await?;
        Ok(Json(Envelope::ok(
            "ok",
            DeployPermissionsResponse {
                deployment_id,
                entries: entries.into_iter().map(|p| DeployPermissionEntry { user_id: p.user_id, permission: p.permission }).collect(),
            },
        )))
    }
}
