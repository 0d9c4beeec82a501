use bazaar_catalog::{AppError, Envelope};
use r2e::multipart::{TypedMultipart, UploadedFile};
use r2e::prelude::*;

use crate::dto::{JobUpdateStatusRequest, TrainCompleteRequest, TrainNdbResponse};
use crate::identity::BazaarUser;
use crate::services::TrainService;
use crate::state::AppState;
use crate::validate::validated;

#[derive(FromMultipart)]
pub struct TrainNdbForm {
    pub model_name: String,
    pub sub_type: Option<String>,
    pub domain: Option<String>,
    pub files: Vec<UploadedFile>,
}

#[derive(Controller)]
#[controller(path = "/train", state = AppState)]
pub struct TrainController {
    #[inject]
    train: TrainService,
}

#[routes]
impl TrainController {
    #[post("/ndb")]
    async fn train_ndb(
        &self,
        user: BazaarUser,
        TypedMultipart(form): TypedMultipart<TrainNdbForm>,
    ) -> Result<Json<Envelope<TrainNdbResponse>>, AppError> {
        let payload = serde_json::json!({
            "files": form.files.iter().map(|f| f.file_name.clone()).collect::<Vec<_>>(),
        });
        let model = self
            .train
            .start_ndb(user.user_id, &form.model_name, form.sub_type.as_deref(), form.domain.as_deref(), payload)
            .await?;
        Ok(Json(Envelope::ok("training started", TrainNdbResponse { model_id: model.id })))
    }

    #[post("/complete")]
    async fn complete(&self, Json(body): Json<TrainCompleteRequest>) -> Result<Json<Envelope<()>>, AppError> {
        validated(&body)?;
        self.train.complete(body.model_id, body.metadata).await?;
        Ok(Json(Envelope::ok("train job marked complete", ())))
    }

    #[post("/update-status")]
    async fn update_status(&self, Json(body): Json<JobUpdateStatusRequest>) -> Result<Json<Envelope<()>>, AppError> {
        validated(&body)?;
        self.train.update_status(body.model_id, body.status, body.message.as_deref()).await?;
        Ok(Json(Envelope::ok("status updated", ())))
    }
}
