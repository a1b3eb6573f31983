//! Vote casting
//!
//! One call to [`VoteCaster::cast_vote`] runs as a single SQLite write
//! transaction:
//!
//! 1. claim the voter's ballot (`voted_at` NULL -> set)
//! 2. load the candidate snapshot and the voter's current write-in
//! 3. resolve the name; on a miss, run the write-in governor and create the candidate
//! 4. insert the vote and bump the tally
//!
//! The claim in step 1 is a write, so the transaction holds the write lock
//! from its first statement and every other caster queues behind it. Any
//! early return rolls the whole thing back, as does dropping the future.

use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};
use uuid::Uuid;
use writein_common::db::{Candidate, Voter};
use writein_common::{config::DEFAULT_LOCK_WAIT_MS, Error, Result};

use super::governor::{authorize, WriteInDecision, WriteInDenial};
use super::normalizer::normalize;
use super::resolver::{CandidateResolver, Resolution};
use crate::db::{candidates, classify_conflict, voters, votes, Conflict};
use crate::utils::retry_on_lock;

/// Why a vote was not recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    AlreadyVoted,
    /// Close to an existing candidate but not close enough to merge
    AmbiguousName { suggestion: String },
    WriteInDenied(WriteInDenial),
    /// A concurrent write-in claimed the same name and the retry also lost
    DuplicateNameRace,
    /// Blank name after normalization
    ValidationError,
}

impl FailureReason {
    /// User-facing wording; the one place it is decided
    pub fn message(&self) -> String {
        match self {
            FailureReason::AlreadyVoted => "Already voted".to_string(),
            FailureReason::AmbiguousName { suggestion } => format!("Did you mean '{}'?", suggestion),
            FailureReason::WriteInDenied(denial) => denial.message().to_string(),
            FailureReason::DuplicateNameRace => {
                "Candidate name was taken concurrently, please retry".to_string()
            }
            FailureReason::ValidationError => "Candidate name can't be blank".to_string(),
        }
    }
}

/// Outcome of a vote attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteResult {
    /// Vote recorded; `votes` on the candidate is the post-increment tally
    Success(Candidate),
    Failure(FailureReason),
}

impl VoteResult {
    pub fn is_success(&self) -> bool {
        matches!(self, VoteResult::Success(_))
    }
}

impl From<Conflict> for FailureReason {
    /// What a conflict means once the retry has also hit it
    fn from(conflict: Conflict) -> Self {
        match conflict {
            Conflict::DuplicateVote => FailureReason::AlreadyVoted,
            Conflict::DuplicateName => FailureReason::DuplicateNameRace,
            Conflict::CandidateCap => FailureReason::WriteInDenied(WriteInDenial::TooManyCandidates),
            Conflict::WriteInTaken => FailureReason::WriteInDenied(WriteInDenial::AlreadyWroteIn),
        }
    }
}

/// One transactional attempt either finishes or reports a recoverable conflict
enum Attempt {
    Finished(VoteResult),
    Conflict(Conflict),
}

/// Orchestrates resolution, write-in admission and atomic vote recording
#[derive(Debug, Clone)]
pub struct VoteCaster {
    pool: SqlitePool,
    resolver: CandidateResolver,
    lock_wait_ms: u64,
}

impl VoteCaster {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            resolver: CandidateResolver::default(),
            lock_wait_ms: DEFAULT_LOCK_WAIT_MS,
        }
    }

    /// Total time to keep retrying while SQLite reports the database locked
    pub fn with_lock_wait_ms(mut self, lock_wait_ms: u64) -> Self {
        self.lock_wait_ms = lock_wait_ms;
        self
    }

    /// Cast `voter`'s single vote for `raw_name`.
    ///
    /// Policy rejections come back as `Ok(VoteResult::Failure(..))`; `Err` is
    /// reserved for storage failures and unknown voters. Nothing is committed
    /// unless the vote, the tally bump and any write-in all commit together.
    pub async fn cast_vote(&self, voter: &Voter, raw_name: &str) -> Result<VoteResult> {
        if voter.has_voted() {
            info!(voter_id = %voter.id, "Vote rejected: already voted");
            return Ok(VoteResult::Failure(FailureReason::AlreadyVoted));
        }

        let name = normalize(raw_name);
        if name.is_empty() {
            info!(voter_id = %voter.id, "Vote rejected: blank candidate name");
            return Ok(VoteResult::Failure(FailureReason::ValidationError));
        }

        let result = match self.attempt_with_lock_retry(voter.id, &name).await? {
            Attempt::Finished(result) => result,
            Attempt::Conflict(conflict) => {
                warn!(
                    voter_id = %voter.id,
                    candidate = %name,
                    ?conflict,
                    "Vote hit a storage conflict, retrying with fresh state"
                );

                match self.attempt_with_lock_retry(voter.id, &name).await? {
                    Attempt::Finished(result) => result,
                    Attempt::Conflict(conflict) => {
                        warn!(voter_id = %voter.id, ?conflict, "Conflict persisted after retry");
                        VoteResult::Failure(conflict.into())
                    }
                }
            }
        };

        match &result {
            VoteResult::Success(candidate) => info!(
                voter_id = %voter.id,
                candidate = %candidate.name,
                votes = candidate.votes,
                "Vote recorded"
            ),
            VoteResult::Failure(reason) => info!(
                voter_id = %voter.id,
                candidate = %name,
                reason = %reason.message(),
                "Vote rejected"
            ),
        }

        Ok(result)
    }

    async fn attempt_with_lock_retry(&self, voter_id: Uuid, name: &str) -> Result<Attempt> {
        retry_on_lock("cast vote", self.lock_wait_ms, || self.attempt(voter_id, name)).await
    }

    /// One full transaction. `name` is already normalized and non-empty.
    async fn attempt(&self, voter_id: Uuid, name: &str) -> Result<Attempt> {
        let mut tx = self.pool.begin().await?;

        // First statement must be a write so the write lock is held before any read
        if !voters::claim_ballot(&mut tx, voter_id).await? {
            let voter = voters::load_voter(&mut *tx, voter_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Voter {}", voter_id)))?;
            tx.rollback().await?;

            debug!(voter_id = %voter.id, voted_at = ?voter.voted_at, "Ballot already claimed");
            return Ok(Attempt::Finished(VoteResult::Failure(FailureReason::AlreadyVoted)));
        }

        let voter = voters::load_voter(&mut *tx, voter_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Voter {}", voter_id)))?;
        let snapshot = candidates::list_candidates(&mut *tx).await?;

        let candidate = match self.resolver.resolve(name, &snapshot) {
            Resolution::Existing(candidate) => {
                debug!(voter_id = %voter_id, candidate = %candidate.name, "Resolved to existing candidate");
                candidate.clone()
            }
            Resolution::Suggestion { candidate, score } => {
                debug!(
                    voter_id = %voter_id,
                    input = %name,
                    suggestion = %candidate.name,
                    score,
                    "Ambiguous candidate name"
                );
                let suggestion = candidate.name.clone();
                tx.rollback().await?;
                return Ok(Attempt::Finished(VoteResult::Failure(
                    FailureReason::AmbiguousName { suggestion },
                )));
            }
            Resolution::NoMatch => match authorize(&voter, snapshot.len()) {
                WriteInDecision::Denied(denial) => {
                    tx.rollback().await?;
                    return Ok(Attempt::Finished(VoteResult::Failure(
                        FailureReason::WriteInDenied(denial),
                    )));
                }
                WriteInDecision::Authorized => match self.create_write_in(&mut tx, &voter, name).await? {
                    Ok(candidate) => candidate,
                    Err(conflict) => return Ok(Attempt::Conflict(conflict)),
                },
            },
        };

        if let Err(err) = votes::insert_vote(&mut tx, voter_id, candidate.id).await {
            return conflict_or_error(err);
        }
        let votes = candidates::increment_tally(&mut tx, candidate.id).await?;

        tx.commit().await?;

        Ok(Attempt::Finished(VoteResult::Success(Candidate {
            votes,
            ..candidate
        })))
    }

    /// Insert the write-in and attribute it to the voter
    async fn create_write_in(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        voter: &Voter,
        name: &str,
    ) -> Result<std::result::Result<Candidate, Conflict>> {
        let candidate = match candidates::insert_write_in(tx, name, voter.id).await {
            Ok(candidate) => candidate,
            Err(err) => {
                return match classify_conflict(&err) {
                    Some(conflict) => Ok(Err(conflict)),
                    None => Err(err),
                }
            }
        };

        if !voters::assign_write_in(tx, voter.id, candidate.id).await? {
            return Ok(Err(Conflict::WriteInTaken));
        }

        info!(voter_id = %voter.id, candidate = %candidate.name, "Created write-in candidate");
        Ok(Ok(candidate))
    }
}

fn conflict_or_error(err: Error) -> Result<Attempt> {
    match classify_conflict(&err) {
        Some(conflict) => Ok(Attempt::Conflict(conflict)),
        None => Err(err),
    }
}
