//! Candidate resolution policy
//!
//! Turns the matcher's best score into one of three outcomes:
//!
//! | score            | outcome      |
//! |------------------|--------------|
//! | `>= 0.90`        | `Existing`   |
//! | `[0.85, 0.90)`   | `Suggestion` |
//! | `< 0.85` / none  | `NoMatch`    |
//!
//! At exactly 0.90 `Existing` wins.

use writein_common::db::Candidate;

use super::matcher::best_match;
use super::normalizer::normalize;

/// Score at or above which the input is the same person as an existing candidate
pub const EXISTING_THRESHOLD: f64 = 0.90;

/// Score at or above which (but below `EXISTING_THRESHOLD`) we ask "did you mean?"
pub const SUGGESTION_THRESHOLD: f64 = 0.85;

/// Outcome tier for a similarity score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Existing,
    Suggestion,
    NoMatch,
}

/// Similarity thresholds used to classify scores
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchThresholds {
    pub existing: f64,
    pub suggestion: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            existing: EXISTING_THRESHOLD,
            suggestion: SUGGESTION_THRESHOLD,
        }
    }
}

impl MatchThresholds {
    /// Classify a similarity score
    pub fn classify(&self, score: f64) -> MatchTier {
        if score >= self.existing {
            MatchTier::Existing
        } else if score >= self.suggestion {
            MatchTier::Suggestion
        } else {
            MatchTier::NoMatch
        }
    }
}

/// How a raw name relates to the current candidate set
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    /// Same person as an existing candidate
    Existing(&'a Candidate),
    /// Plausible but risky match; needs explicit confirmation
    Suggestion { candidate: &'a Candidate, score: f64 },
    /// Genuinely new name; the caller may attempt a write-in
    NoMatch,
}

/// Resolves raw names against a candidate snapshot
#[derive(Debug, Clone, Default)]
pub struct CandidateResolver {
    thresholds: MatchThresholds,
}

impl CandidateResolver {
    pub fn new(thresholds: MatchThresholds) -> Self {
        Self { thresholds }
    }

    /// Resolve a raw name. Never fails.
    pub fn resolve<'a>(&self, raw_name: &str, candidates: &'a [Candidate]) -> Resolution<'a> {
        let input = normalize(raw_name);
        let best = best_match(&input, candidates);

        let Some(candidate) = best.candidate else {
            return Resolution::NoMatch;
        };

        match self.thresholds.classify(best.score) {
            MatchTier::Existing => Resolution::Existing(candidate),
            MatchTier::Suggestion => Resolution::Suggestion {
                candidate,
                score: best.score,
            },
            MatchTier::NoMatch => Resolution::NoMatch,
        }
    }
}
