//! Results aggregation
//!
//! Tallies are counted from the `votes` table rather than read from the
//! denormalized `votes_count` column, so results stay correct even if the
//! two ever drift. [`audit_tallies`] reports any such drift.

use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;
use writein_common::db::ResultEntry;
use writein_common::Result;

use crate::db::parse_uuid;

/// Current standings, highest tally first.
///
/// Every candidate appears, including those with zero votes. Ties keep
/// creation order.
pub async fn fetch_results(pool: &SqlitePool) -> Result<Vec<ResultEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT c.name AS name, COUNT(v.id) AS votes
        FROM candidates c
        LEFT JOIN votes v ON v.candidate_id = c.id
        GROUP BY c.id
        ORDER BY votes DESC, c.created_at ASC, c.rowid ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(ResultEntry {
                name: row.try_get("name")?,
                votes: row.try_get("votes")?,
            })
        })
        .collect()
}

/// A candidate whose stored tally disagrees with its vote rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TallyMismatch {
    pub candidate_id: Uuid,
    pub name: String,
    pub stored: i64,
    pub counted: i64,
}

/// Compare `votes_count` with the number of vote rows for every candidate
pub async fn audit_tallies(pool: &SqlitePool) -> Result<Vec<TallyMismatch>> {
    let rows = sqlx::query(
        r#"
        SELECT c.id AS id, c.name AS name, c.votes_count AS stored, COUNT(v.id) AS counted
        FROM candidates c
        LEFT JOIN votes v ON v.candidate_id = c.id
        GROUP BY c.id
        HAVING c.votes_count != COUNT(v.id)
        ORDER BY c.rowid ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mismatches = rows
        .iter()
        .map(|row| {
            let id: String = row.try_get("id")?;
            Ok(TallyMismatch {
                candidate_id: parse_uuid(&id)?,
                name: row.try_get("name")?,
                stored: row.try_get("stored")?,
                counted: row.try_get("counted")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if !mismatches.is_empty() {
        tracing::warn!(count = mismatches.len(), "Stored tallies disagree with vote rows");
    }

    Ok(mismatches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{candidates, voters};
    use crate::voting::{VoteCaster, VoteResult};
    use tempfile::TempDir;
    use writein_common::db::init_database;

    async fn setup(seeds: &[&str]) -> (TempDir, SqlitePool, VoteCaster) {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("writein.db")).await.unwrap();
        let names: Vec<String> = seeds.iter().map(|s| s.to_string()).collect();
        candidates::seed_candidates(&pool, &names).await.unwrap();
        let caster = VoteCaster::new(pool.clone());
        (dir, pool, caster)
    }

    async fn vote(pool: &SqlitePool, caster: &VoteCaster, email: &str, name: &str) -> VoteResult {
        let voter = voters::create_voter(pool, email, "12345", "pw").await.unwrap();
        caster.cast_vote(&voter, name).await.unwrap()
    }

    fn entry(name: &str, votes: i64) -> ResultEntry {
        ResultEntry {
            name: name.to_string(),
            votes,
        }
    }

    #[tokio::test]
    async fn test_empty_ballot() {
        let (_dir, pool, _caster) = setup(&[]).await;
        assert!(fetch_results(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_vote_candidates_included() {
        let (_dir, pool, _caster) = setup(&["Artist A", "Dj Synth"]).await;

        let results = fetch_results(&pool).await.unwrap();
        assert_eq!(results, vec![entry("Artist A", 0), entry("Dj Synth", 0)]);
    }

    #[tokio::test]
    async fn test_single_vote() {
        let (_dir, pool, caster) = setup(&["Artist A"]).await;

        assert!(vote(&pool, &caster, "a@example.com", "Artist A").await.is_success());

        let results = fetch_results(&pool).await.unwrap();
        assert_eq!(results, vec![entry("Artist A", 1)]);
    }

    #[tokio::test]
    async fn test_sorted_by_votes_descending() {
        let (_dir, pool, caster) = setup(&["Artist A", "Dj Synth", "Zzyzx Quartet"]).await;

        assert!(vote(&pool, &caster, "a@example.com", "Dj Synth").await.is_success());
        assert!(vote(&pool, &caster, "b@example.com", "Zzyzx Quartet").await.is_success());
        assert!(vote(&pool, &caster, "c@example.com", "dj synth").await.is_success());

        let results = fetch_results(&pool).await.unwrap();
        assert_eq!(
            results,
            vec![
                entry("Dj Synth", 2),
                entry("Zzyzx Quartet", 1),
                entry("Artist A", 0),
            ]
        );
        assert!(audit_tallies(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_audit_detects_drift() {
        let (_dir, pool, caster) = setup(&["Artist A"]).await;
        assert!(vote(&pool, &caster, "a@example.com", "Artist A").await.is_success());

        sqlx::query("UPDATE candidates SET votes_count = 5")
            .execute(&pool)
            .await
            .unwrap();

        let mismatches = audit_tallies(&pool).await.unwrap();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].name, "Artist A");
        assert_eq!(mismatches[0].stored, 5);
        assert_eq!(mismatches[0].counted, 1);

        // Results follow the vote rows, not the stored column
        assert_eq!(fetch_results(&pool).await.unwrap(), vec![entry("Artist A", 1)]);
    }
}
