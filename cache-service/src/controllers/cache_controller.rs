use bazaar_catalog::Envelope;
use r2e::prelude::*;

use crate::dto::{CacheQuery, CachedResponse, InsertQuery, ModelQuery, QueryResponse, SuggestionEntry, TokenResponse};
use crate::identity::{require_read, CacheInsertCaller, CacheError, SessionCaller};
use crate::state::AppState;

#[derive(Controller)]
#[controller(path = "/cache", state = AppState)]
pub struct CacheController;

#[routes]
impl CacheController {
    #[get("/suggestions")]
    async fn suggestions(&self, State(state): State<AppState>, Query(q): Query<CacheQuery>) -> Json<Vec<SuggestionEntry>> {
        let suggestions = state.index.suggest(q.model_id, &q.query);
        Json(suggestions.into_iter().map(|s| SuggestionEntry { query: s.query, chunk_id: s.chunk_id }).collect())
    }

    #[get("/query")]
    async fn query(&self, State(state): State<AppState>, Query(q): Query<CacheQuery>) -> Json<QueryResponse> {
        let cached_response = state.index.lookup(q.model_id, &q.query).map(|hit| CachedResponse { chunk_id: hit.chunk_id, llm_res: hit.response });
        Json(QueryResponse { cached_response })
    }

    #[post("/insert")]
    async fn insert(&self, State(state): State<AppState>, caller: CacheInsertCaller, Query(q): Query<InsertQuery>) -> Result<StatusCode, CacheError> {
        let record = semantic_cache::InsertRecord { model: caller.model_id, query: q.query, response: q.llm_res };
        state.insert_log.append(&record).map_err(|_| CacheError::ControlPlaneUnreachable("failed to append to insert log".into()))?;
        Ok(StatusCode::OK)
    }

    #[post("/invalidate")]
    async fn invalidate(&self, State(state): State<AppState>, Query(q): Query<ModelQuery>) -> StatusCode {
        state.index.invalidate(q.model_id);
        let _ = state.insert_log.clear(q.model_id);
        StatusCode::OK
    }

    #[get("/token")]
    async fn token(&self, State(state): State<AppState>, caller: SessionCaller, Query(q): Query<ModelQuery>) -> Result<Json<Envelope<TokenResponse>>, CacheError> {
        require_read(&state, &caller, q.model_id).await?;
        let token = state.tokens.issue_cache_insert_token(q.model_id);
        Ok(Json(Envelope::ok("cache-insert token issued", TokenResponse { token })))
    }
}
