//! Login and voter identification
//!
//! Login registers a voter on first use and verifies the password on every
//! later login. Authenticated requests identify the voter with the
//! `X-Voter-Id` header carrying the id returned by login.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{delete, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use writein_common::db::Voter;

use crate::db::voters::{self, LoginOutcome};
use crate::{ApiError, ApiResult, AppState};

/// Header carrying the logged-in voter's id
pub const VOTER_ID_HEADER: &str = "x-voter-id";

/// POST /api/v1/login body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub zip_code: String,
}

/// Voter as exposed over HTTP
#[derive(Debug, Serialize)]
pub struct VoterView {
    pub id: Uuid,
    pub email: String,
    pub zip_code: String,
    pub has_voted: bool,
    pub write_in_id: Option<Uuid>,
}

impl From<Voter> for VoterView {
    fn from(voter: Voter) -> Self {
        Self {
            has_voted: voter.has_voted(),
            id: voter.id,
            email: voter.email,
            zip_code: voter.zip_code,
            write_in_id: voter.write_in_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub voter: VoterView,
}

/// POST /api/v1/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let email = request.email.trim().to_lowercase();
    let zip_code = request.zip_code.trim();

    if email.is_empty() || zip_code.is_empty() {
        return Err(ApiError::Unprocessable("Missing email or zip code".to_string()));
    }
    if request.password.is_empty() {
        return Err(ApiError::Unprocessable("Password can't be blank".to_string()));
    }

    let voter = match voters::find_or_create_voter(&state.db, &email, zip_code, &request.password).await? {
        LoginOutcome::Existing(voter) | LoginOutcome::Registered(voter) => voter,
        LoginOutcome::WrongPassword => {
            tracing::info!(email = %email, "Login rejected: wrong password");
            return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
        }
    };

    tracing::debug!(voter_id = %voter.id, "Voter logged in");

    Ok(Json(LoginResponse {
        message: "Logged in".to_string(),
        voter: voter.into(),
    }))
}

/// Resolve the voter named by the `X-Voter-Id` header
pub async fn current_voter(state: &AppState, headers: &HeaderMap) -> ApiResult<Voter> {
    let raw = headers
        .get(VOTER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Not logged in".to_string()))?;

    let voter_id = Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::Unauthorized("Invalid voter id".to_string()))?;

    voters::load_voter(&state.db, voter_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown voter".to_string()))
}

/// DELETE /api/v1/logout
///
/// Identity travels with each request, so there is no server state to drop.
pub async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Build login routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/login", post(login))
        .route("/api/v1/logout", delete(logout))
}
