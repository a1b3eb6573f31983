//! Database models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person eligible to vote, as resolved by the login layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub id: Uuid,
    pub email: String,
    pub zip_code: String,
    /// Candidate this voter personally wrote in, if any
    pub write_in_id: Option<Uuid>,
    /// Set in the same transaction that records the voter's vote
    pub voted_at: Option<String>,
}

impl Voter {
    /// True iff a vote referencing this voter has been committed
    pub fn has_voted(&self) -> bool {
        self.voted_at.is_some()
    }

    /// True iff this voter already created a write-in candidate
    pub fn has_write_in(&self) -> bool {
        self.write_in_id.is_some()
    }
}

/// A nominee with its materialized tally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    /// Normalized display name
    pub name: String,
    /// Always equal to the number of votes referencing this candidate
    pub votes: i64,
    /// Voter who wrote this candidate in; `None` for seeded candidates
    #[serde(skip)]
    pub nominated_by: Option<Uuid>,
}

/// An immutable cast ballot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: Uuid,
    pub voter_id: Uuid,
    pub candidate_id: Uuid,
    pub created_at: String,
}

/// One line of the results table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub name: String,
    pub votes: i64,
}
