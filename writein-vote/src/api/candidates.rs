//! Candidate listing endpoints

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;
use writein_common::db::Candidate;

use crate::db::candidates;
use crate::{ApiError, ApiResult, AppState};

/// GET /api/v1/candidates
pub async fn list_candidates(State(state): State<AppState>) -> ApiResult<Json<Vec<Candidate>>> {
    Ok(Json(candidates::list_candidates(&state.db).await?))
}

/// GET /api/v1/candidates/:id
pub async fn get_candidate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Candidate>> {
    let candidate_id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::NotFound(format!("Candidate {}", id)))?;

    candidates::get_candidate(&state.db, candidate_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Candidate {}", id)))
}

/// Build candidate routes
pub fn candidate_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/candidates", get(list_candidates))
        .route("/api/v1/candidates/:id", get(get_candidate))
}
