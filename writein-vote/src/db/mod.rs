//! Storage access for the voting service
//!
//! Free functions over SQLite. Functions that only read take any executor
//! (pool or open transaction); functions that write inside the vote
//! transaction take `&mut SqliteConnection`.

pub mod candidates;
pub mod voters;
pub mod votes;

use uuid::Uuid;
use writein_common::db::CANDIDATE_CAP_MESSAGE;
use writein_common::{Error, Result};

/// Constraint violations the vote transaction knows how to recover from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    /// `votes.voter_id` already taken
    DuplicateVote,
    /// `candidates.name` already taken
    DuplicateName,
    /// The voter already has a nominated candidate
    WriteInTaken,
    /// The candidate cap trigger fired
    CandidateCap,
}

/// Map a storage error onto a recoverable conflict, if it is one
pub fn classify_conflict(err: &Error) -> Option<Conflict> {
    let Error::Database(sqlx::Error::Database(db_err)) = err else {
        return None;
    };

    let message = db_err.message();

    if message.contains(CANDIDATE_CAP_MESSAGE) {
        return Some(Conflict::CandidateCap);
    }

    if !db_err.is_unique_violation() {
        return None;
    }

    // SQLite names the column: "UNIQUE constraint failed: votes.voter_id"
    if message.contains("votes.voter_id") {
        Some(Conflict::DuplicateVote)
    } else if message.contains("candidates.name") {
        Some(Conflict::DuplicateName)
    } else if message.contains("candidates.nominated_by") {
        Some(Conflict::WriteInTaken)
    } else {
        None
    }
}

/// Parse a UUID stored as TEXT
pub(crate) fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::Internal(format!("Invalid UUID in database '{}': {}", value, e)))
}
