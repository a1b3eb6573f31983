//! Fuzzy candidate name matching
//!
//! Scores an input name against every candidate with Jaro-Winkler, which
//! rewards shared prefixes and tolerates transpositions and small edits.
//! Works on a snapshot slice; never touches storage.

use writein_common::db::Candidate;

use super::normalizer::normalize;

/// Best-scoring candidate for an input name
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMatch<'a> {
    /// `None` only when there were no candidates to compare against
    pub candidate: Option<&'a Candidate>,
    /// Similarity in [0.0, 1.0]; 1.0 means identical normalized names
    pub score: f64,
}

impl BestMatch<'_> {
    fn empty() -> Self {
        Self {
            candidate: None,
            score: 0.0,
        }
    }
}

/// Jaro-Winkler similarity between two already-normalized names
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::jaro_winkler(a, b)
}

/// Find the candidate whose normalized name is most similar to `normalized_input`.
///
/// O(n·m) over the candidate set, which the admission cap keeps small.
/// On equal scores the earlier candidate wins; that order carries no meaning.
pub fn best_match<'a>(normalized_input: &str, candidates: &'a [Candidate]) -> BestMatch<'a> {
    let mut best = BestMatch::empty();

    for candidate in candidates {
        let score = similarity(normalized_input, &normalize(&candidate.name));

        if best.candidate.is_none() || score > best.score {
            best = BestMatch {
                candidate: Some(candidate),
                score,
            };
        }
    }

    tracing::trace!(
        input = %normalized_input,
        best = ?best.candidate.map(|c| c.name.as_str()),
        score = best.score,
        candidates = candidates.len(),
        "Scored candidates"
    );

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn candidate(name: &str) -> Candidate {
        Candidate {
            id: Uuid::new_v4(),
            name: name.to_string(),
            votes: 0,
            nominated_by: None,
        }
    }

    #[test]
    fn test_empty_candidate_set() {
        let result = best_match("Artist A", &[]);
        assert!(result.candidate.is_none());
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_identical_name_scores_one() {
        let candidates = vec![candidate("Kendrick Lamar"), candidate("Artist B")];
        let result = best_match("Kendrick Lamar", &candidates);

        assert_eq!(result.candidate.unwrap().name, "Kendrick Lamar");
        assert!((result.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_stored_names_are_normalized_before_scoring() {
        let candidates = vec![candidate("  KENDRICK   lamar ")];
        let result = best_match("Kendrick Lamar", &candidates);
        assert!((result.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_typo_scores_high() {
        let candidates = vec![candidate("Kendrick Lamar"), candidate("Taylor Swift")];
        let result = best_match("Kendrik Lamar", &candidates);

        assert_eq!(result.candidate.unwrap().name, "Kendrick Lamar");
        assert!(result.score > 0.9, "Single-letter typo should exceed 0.9, got {}", result.score);
    }

    #[test]
    fn test_known_jaro_winkler_value() {
        // Textbook pair: Jaro 0.944, common prefix 3
        assert!((similarity("Martha", "Marhta") - 0.961).abs() < 0.001);
    }

    #[test]
    fn test_unrelated_names_score_low() {
        let candidates = vec![candidate("Artist A")];
        let result = best_match("Zzyzx Quartet", &candidates);
        assert!(result.score < 0.85, "Unrelated names scored {}", result.score);
    }

    #[test]
    fn test_ties_go_to_first_candidate() {
        let first = candidate("Same Name");
        let second = Candidate {
            id: Uuid::new_v4(),
            ..first.clone()
        };
        let candidates = vec![first.clone(), second];

        let result = best_match("Same Name", &candidates);
        assert_eq!(result.candidate.unwrap().id, first.id);
    }

    #[test]
    fn test_zero_scores_still_report_a_candidate() {
        let candidates = vec![candidate("Abc")];
        let result = best_match("Xyz", &candidates);
        assert!(result.candidate.is_some());
        assert_eq!(result.score, 0.0);
    }
}
