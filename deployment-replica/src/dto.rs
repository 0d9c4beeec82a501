use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub constraints: Option<serde_json::Value>,
}

fn default_top_k() -> usize {
    5
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PredictRequest {
    pub text: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SearchResultEntry {
    pub doc_id: Uuid,
    pub text: String,
    pub score: f32,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteRequest {
    pub source_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpvoteRequest {
    pub text_id_pairs: Vec<(String, Uuid)>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AssociateRequest {
    pub text_pairs: Vec<(String, String)>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SaveRequest {
    #[serde(rename = "override")]
    pub override_in_place: bool,
    pub model_name: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SaveResponse {
    pub new_model_id: Option<Uuid>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct InsertResponse {
    pub source_id: Uuid,
    pub source_name: String,
    pub document_count: usize,
    pub task_id: Option<Uuid>,
}
