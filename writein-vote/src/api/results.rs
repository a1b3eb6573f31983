//! Results endpoint

use axum::{extract::State, routing::get, Json, Router};
use writein_common::db::ResultEntry;

use crate::voting::fetch_results;
use crate::{ApiResult, AppState};

/// GET /api/v1/results
pub async fn get_results(State(state): State<AppState>) -> ApiResult<Json<Vec<ResultEntry>>> {
    Ok(Json(fetch_results(&state.db).await?))
}

/// Build results routes
pub fn results_routes() -> Router<AppState> {
    Router::new().route("/api/v1/results", get(get_results))
}
