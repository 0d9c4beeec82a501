use bazaar_catalog::{AppError, Envelope};
use r2e::http::Body;
use r2e::multipart::Multipart;
use r2e::prelude::*;
use tokio_util::io::ReaderStream;

use crate::dto::{
    ModelIdentifierQuery, UploadChunkQuery, UploadCommitQuery, UploadCommitRequest, UploadTokenQuery,
    UploadTokenResponse,
};
use crate::identity::{principal_of, BazaarUser, BearerToken};
use crate::services::{ModelService, UploadService};
use crate::state::AppState;

#[derive(Controller)]
#[controller(path = "/model", state = AppState)]
pub struct UploadController {
    #[inject]
    uploads: UploadService,
    #[inject]
    models: ModelService,
}

#[routes]
impl UploadController {
    #[get("/upload-token")]
    async fn upload_token(&self, user: BazaarUser, Query(q): Query<UploadTokenQuery>) -> Result<Json<Envelope<UploadTokenResponse>>, AppError> {
        let (model_id, token) = self.uploads.issue_upload_token(user.user_id, &q.model_name, q.size).await?;
        Ok(Json(Envelope::ok("upload token issued", UploadTokenResponse { model_id, token })))
    }

    #[post("/upload-chunk")]
    async fn upload_chunk(
        &self,
        token: BearerToken,
        Query(q): Query<UploadChunkQuery>,
        mut multipart: Multipart,
    ) -> Result<Json<Envelope<()>>, AppError> {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
            .ok_or_else(|| AppError::Validation("chunk upload requires one file field".into()))?;
        let bytes = field.bytes().await.map_err(|e| AppError::Internal(e.to_string()))?;
        self.uploads.put_chunk(&token.0, q.chunk_number, bytes).await?;
        Ok(Json(Envelope::ok("chunk stored", ())))
    }

    #[post("/upload-commit")]
    async fn upload_commit(
        &self,
        token: BearerToken,
        Query(q): Query<UploadCommitQuery>,
        Json(body): Json<UploadCommitRequest>,
    ) -> Result<Json<Envelope<()>>, AppError> {
        self.uploads
            .commit(&token.0, q.total_chunks, &body.kind, body.sub_kind.as_deref(), body.access_level, body.domain.as_deref())
            .await?;
        Ok(Json(Envelope::ok("upload committed", ())))
    }

    #[get("/download")]
    async fn download(&self, user: Option<BazaarUser>, Query(q): Query<ModelIdentifierQuery>) -> Result<Response, AppError> {
        let principal = principal_of(user.as_ref());
        let path = self.uploads.download(&principal, &q.model_identifier, false).await?;
        stream_file(path).await
    }

    #[get("/public-download")]
    async fn public_download(&self, Query(q): Query<ModelIdentifierQuery>) -> Result<Response, AppError> {
        let principal = bazaar_permissions::Principal::anonymous();
        let path = self.uploads.download(&principal, &q.model_identifier, true).await?;
        stream_file(path).await
    }
}

async fn stream_file(path: std::path::PathBuf) -> Result<Response, AppError> {
    let file = tokio::fs::File::open(&path).await.map_err(|e| AppError::Internal(e.to_string()))?;
    let body = Body::from_stream(ReaderStream::new(file));
    Ok((
        [(r2e::http::header::CONTENT_TYPE, "application/zip")],
        body,
    )
        .into_response())
}
