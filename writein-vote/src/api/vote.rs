//! Vote endpoint

use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use writein_common::db::Candidate;

use super::auth::current_voter;
use crate::voting::VoteResult;
use crate::{ApiError, ApiResult, AppState};

/// POST /api/v1/vote body
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    #[serde(default)]
    pub candidate_name: String,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub message: String,
    pub candidate: Candidate,
}

/// POST /api/v1/vote
///
/// Every policy rejection maps to 422 with the failure's message.
pub async fn cast_vote(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<VoteRequest>,
) -> ApiResult<Json<VoteResponse>> {
    let voter = current_voter(&state, &headers).await?;

    match state.caster.cast_vote(&voter, &request.candidate_name).await? {
        VoteResult::Success(candidate) => Ok(Json(VoteResponse {
            message: "Vote recorded".to_string(),
            candidate,
        })),
        VoteResult::Failure(reason) => Err(ApiError::Unprocessable(reason.message())),
    }
}

/// Build vote routes
pub fn vote_routes() -> Router<AppState> {
    Router::new().route("/api/v1/vote", post(cast_vote))
}
