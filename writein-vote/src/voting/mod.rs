//! Write-in voting core
//!
//! Pure policy (normalization, matching, resolution, write-in admission)
//! plus the transactional [`VoteCaster`] and results queries built on it.

pub mod caster;
pub mod governor;
pub mod matcher;
pub mod normalizer;
pub mod resolver;
pub mod results;

pub use caster::{FailureReason, VoteCaster, VoteResult};
pub use governor::{authorize, WriteInDecision, WriteInDenial};
pub use matcher::{best_match, similarity, BestMatch};
pub use normalizer::normalize;
pub use resolver::{CandidateResolver, MatchThresholds, MatchTier, Resolution};
pub use results::{audit_tallies, fetch_results, TallyMismatch};
