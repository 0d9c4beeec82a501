use bazaar_catalog::models::Permission;
use r2e::multipart::Multipart;
use r2e::prelude::*;
use replica_coordinator::Document;
use uuid::Uuid;

use crate::dto::{
    AssociateRequest, DeleteRequest, InsertResponse, PredictRequest, SaveRequest, SaveResponse, SearchRequest, SearchResultEntry,
    UpvoteRequest,
};
use crate::identity::{require_permission, ReadCaller, ReplicaCaller, ReplicaError, WriteCaller};
use crate::services::ReplicaWriteService;
use crate::state::AppState;

#[derive(Controller)]
#[controller(path = "/replica", state = AppState)]
pub struct ReplicaController {
    #[inject]
    write_service: ReplicaWriteService,
}

fn entries(results: Vec<replica_coordinator::SearchResult>) -> Vec<SearchResultEntry> {
    results.into_iter().map(|r| SearchResultEntry { doc_id: r.doc_id, text: r.text, score: r.score }).collect()
}

#[routes]
impl ReplicaController {
    #[post("/search")]
    async fn search(&self, ReadCaller(_caller): ReadCaller, Json(body): Json<SearchRequest>) -> Json<Vec<SearchResultEntry>> {
        Json(entries(self.write_service.search(&body.query, body.top_k)))
    }

    #[post("/predict")]
    async fn predict(&self, ReadCaller(_caller): ReadCaller, Json(body): Json<PredictRequest>) -> Json<Vec<SearchResultEntry>> {
        Json(entries(self.write_service.predict(&body.text, body.top_k)))
    }

    #[post("/insert")]
    async fn insert(&self, WriteCaller(caller): WriteCaller, mut multipart: Multipart) -> Result<(StatusCode, Json<InsertResponse>), ReplicaError> {
        let mut source_name = String::new();
        let mut documents: Vec<Document> = Vec::new();
        while let Ok(Some(field)) = multipart.next_field().await {
            match field.name().unwrap_or_default() {
                "source_name" => {
                    source_name = field.text().await.unwrap_or_default();
                }
                "documents" => {
                    let text = field.text().await.unwrap_or_default();
                    let raw: Vec<String> = serde_json::from_str(&text).unwrap_or_default();
                    documents = raw
                        .into_iter()
                        .map(|text| Document { doc_id: Uuid::new_v4(), source_id: Uuid::nil(), text })
                        .collect();
                }
                _ => {}
            }
        }

        let (applied, info) = self
            .write_service
            .insert(caller.user_id, &source_name, documents.clone())
            .await
            .map_err(|_| ReplicaError::ControlPlaneUnreachable("failed to append to write log".into()))?;
        let status = if applied { StatusCode::OK } else { StatusCode::ACCEPTED };
        Ok((status, Json(InsertResponse { source_id: info.source_id, source_name: info.source_name, document_count: documents.len(), task_id: None })))
    }

    #[post("/delete")]
    async fn delete(&self, WriteCaller(caller): WriteCaller, Json(body): Json<DeleteRequest>) -> Result<StatusCode, ReplicaError> {
        let applied = self
            .write_service
            .delete(caller.user_id, body.source_ids)
            .await
            .map_err(|_| ReplicaError::ControlPlaneUnreachable("failed to append to write log".into()))?;
        Ok(if applied { StatusCode::OK } else { StatusCode::ACCEPTED })
    }

    #[post("/upvote")]
    async fn upvote(&self, ReadCaller(caller): ReadCaller, Json(body): Json<UpvoteRequest>) -> Result<StatusCode, ReplicaError> {
        let applied = self
            .write_service
            .upvote(caller.user_id, body.text_id_pairs)
            .await
            .map_err(|_| ReplicaError::ControlPlaneUnreachable("failed to append to write log".into()))?;
        Ok(if applied { StatusCode::OK } else { StatusCode::ACCEPTED })
    }

    #[post("/associate")]
    async fn associate(&self, ReadCaller(caller): ReadCaller, Json(body): Json<AssociateRequest>) -> Result<StatusCode, ReplicaError> {
        let applied = self
            .write_service
            .associate(caller.user_id, body.text_pairs)
            .await
            .map_err(|_| ReplicaError::ControlPlaneUnreachable("failed to append to write log".into()))?;
        Ok(if applied { StatusCode::OK } else { StatusCode::ACCEPTED })
    }

    /// `save` needs the request body to know whether this is an in-place
    /// override (write-level, owner territory) or a save-as-new copy
    /// (read-level suffices), so its permission check can't run in the
    /// extractor the way the other routes' fixed-level checks do.
    #[post("/save")]
    async fn save(&self, caller: ReplicaCaller, State(state): State<AppState>, Json(body): Json<SaveRequest>) -> Result<Json<SaveResponse>, ReplicaError> {
        let required = if body.override_in_place { Permission::Write } else { Permission::Read };
        require_permission(&state, &caller, required).await?;
        let new_model_id = self
            .write_service
            .save(caller.user_id, body.override_in_place, body.model_name)
            .await
            .map_err(|_| ReplicaError::ControlPlaneUnreachable("failed to append to write log".into()))?;
        Ok(Json(SaveResponse { new_model_id }))
    }
}
