use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ModelQuery {
    pub model_id: Uuid,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CacheQuery {
    pub model_id: Uuid,
    pub query: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SuggestionEntry {
    pub query: String,
    pub chunk_id: Uuid,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct CachedResponse {
    pub chunk_id: Uuid,
    pub llm_res: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct QueryResponse {
    pub cached_response: Option<CachedResponse>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct InsertQuery {
    pub query: String,
    pub llm_res: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct TokenResponse {
    pub token: String,
}
