//! Write-in admission control
//!
//! Decides whether a brand-new candidate may be created. Rules are checked in
//! order and the first failure wins. The caller evaluates this inside the
//! same write transaction that creates the candidate and records the vote.

use std::fmt;
use writein_common::db::{Voter, MAX_CANDIDATES};

/// Why a write-in was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteInDenial {
    /// The election already holds the maximum number of candidates
    TooManyCandidates,
    /// The voter already nominated someone
    AlreadyWroteIn,
}

impl WriteInDenial {
    /// User-facing wording
    pub fn message(&self) -> &'static str {
        match self {
            WriteInDenial::TooManyCandidates => "Too many candidates",
            WriteInDenial::AlreadyWroteIn => "Already wrote in a candidate",
        }
    }
}

impl fmt::Display for WriteInDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Admission decision for a write-in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteInDecision {
    Authorized,
    Denied(WriteInDenial),
}

/// Check whether `voter` may create a new candidate while `total_candidate_count` exist
pub fn authorize(voter: &Voter, total_candidate_count: usize) -> WriteInDecision {
    if total_candidate_count as i64 >= MAX_CANDIDATES {
        return WriteInDecision::Denied(WriteInDenial::TooManyCandidates);
    }

    if voter.has_write_in() {
        return WriteInDecision::Denied(WriteInDenial::AlreadyWroteIn);
    }

    WriteInDecision::Authorized
}
