//! writein-vote library interface
//!
//! Exposes the voting core, storage access and HTTP router for the binary
//! and for integration tests.

pub mod api;
pub mod db;
pub mod error;
pub mod utils;
pub mod voting;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

use crate::voting::VoteCaster;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Vote orchestration over the same pool
    pub caster: VoteCaster,
}

impl AppState {
    pub fn new(db: SqlitePool, lock_wait_ms: u64) -> Self {
        let caster = VoteCaster::new(db.clone()).with_lock_wait_ms(lock_wait_ms);
        Self { db, caster }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::auth_routes())
        .merge(api::vote_routes())
        .merge(api::results_routes())
        .merge(api::candidate_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
