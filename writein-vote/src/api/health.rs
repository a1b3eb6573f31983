//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::voting::audit_tallies;
use crate::{ApiResult, AppState};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" when stored tallies drift from vote rows
    pub status: String,
    /// Module name ("writein-vote")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Candidates whose stored tally disagrees with the vote count
    pub tally_mismatches: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let mismatches = audit_tallies(&state.db).await?;

    let status = if mismatches.is_empty() { "ok" } else { "degraded" };

    Ok(Json(HealthResponse {
        status: status.to_string(),
        module: "writein-vote".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tally_mismatches: mismatches.len(),
    }))
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
