use bazaar_catalog::models::Model;
use bazaar_catalog::{AppError, Envelope};
use r2e::prelude::*;

use crate::dto::{
    model_list_matches, ModelIdQuery, ModelListQuery, NameCheckQuery, NameCheckResponse,
    PermissionCheckQuery, PermissionCheckResponse,
};
use bazaar_catalog::models::{UpdateAccessLevelRequest, UpdateDefaultPermissionRequest, UpdateModelPermissionRequest};
use crate::identity::{principal_of, BazaarUser};
use crate::services::ModelService;
use crate::state::AppState;
use crate::validate::validated;

#[derive(Controller)]
#[controller(path = "/model", state = AppState)]
pub struct ModelController {
    #[inject]
    models: ModelService,
}

#[routes]
impl ModelController {
    #[get("/list")]
    async fn list(&self, user: Option<BazaarUser>, Query(q): Query<ModelListQuery>) -> Result<Json<Envelope<Vec<Model>>>, AppError> {
        let principal = principal_of(user.as_ref());
        let models = self.models.list_visible(&principal, q.name.as_deref()).await?;
        let filtered: Vec<Model> = models.into_iter().filter(|m| model_list_matches(m, &q)).collect();
        Ok(Json(Envelope::ok("ok", filtered)))
    }

    #[get("/public-list")]
    async fn public_list(&self, Query(q): Query<ModelListQuery>) -> Result<Json<Envelope<Vec<Model>>>, AppError> {
        let models = self.models.list_public(q.name.as_deref()).await?;
        let filtered: Vec<Model> = models.into_iter().filter(|m| model_list_matches(m, &q)).collect();
        Ok(Json(Envelope::ok("ok", filtered)))
    }

    #[get("/info")]
    async fn info(&self, user: Option<BazaarUser>, Query(q): Query<ModelIdQuery>) -> Result<Json<Envelope<Model>>, AppError> {
        let principal = principal_of(user.as_ref());
        let model = self.models.info(&principal, q.model_id).await?;
        Ok(Json(Envelope::ok("ok", model)))
    }

    #[get("/name-check")]
    async fn name_check(&self, user: BazaarUser, Query(q): Query<NameCheckQuery>) -> Result<Json<Envelope<NameCheckResponse>>, AppError> {
        let available = self.models.name_check(&user.principal(), &q.name).await?;
        Ok(Json(Envelope::ok("ok", NameCheckResponse { available })))
    }

    #[post("/update-access-level")]
    async fn update_access_level(&self, user: BazaarUser, Query(q): Query<UpdateAccessLevelRequest>) -> Result<Json<Envelope<Model>>, AppError> {
        validated(&q)?;
        let model = self
            .models
            .update_access_level(&user.principal(), &q.model_identifier, q.access_level, q.team_id)
            .await?;
        Ok(Json(Envelope::ok("access level updated", model)))
    }

    #[post("/update-default-permission")]
    async fn update_default_permission(&self, user: BazaarUser, Json(body): Json<UpdateDefaultPermissionRequest>) -> Result<Json<Envelope<Model>>, AppError> {
        validated(&body)?;
        let model = self.models.update_default_permission(&user.principal(), body.model_id, body.default_permission).await?;
        Ok(Json(Envelope::ok("default permission updated", model)))
    }

    #[post("/update-model-permission")]
    async fn update_model_permission(&self, user: BazaarUser, Json(body): Json<UpdateModelPermissionRequest>) -> Result<Json<Envelope<()>>, AppError> {
        validated(&body)?;
        self.models.update_model_permission(&user.principal(), body.model_id, &body.email, body.permission).await?;
        Ok(Json(Envelope::ok("permission granted", ())))
    }

    /// Lets a deployed replica verify a caller's effective permission
    /// against the control plane, instead of replicating the resolution
    /// algorithm into every replica process.
    #[get("/permission-check")]
    async fn permission_check(&self, user: BazaarUser, Query(q): Query<PermissionCheckQuery>) -> Result<Json<Envelope<PermissionCheckResponse>>, AppError> {
        let allowed = self.models.check_permission(&user.principal(), &q.model_identifier, q.required).await?;
        Ok(Json(Envelope::ok("ok", PermissionCheckResponse { allowed })))
    }
}
