//! HTTP API handlers for writein-vote

pub mod auth;
pub mod candidates;
pub mod health;
pub mod results;
pub mod vote;

pub use auth::{auth_routes, current_voter, VOTER_ID_HEADER};
pub use candidates::candidate_routes;
pub use health::health_routes;
pub use results::results_routes;
pub use vote::vote_routes;
