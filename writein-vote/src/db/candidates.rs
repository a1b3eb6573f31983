//! Candidate persistence
//!
//! The tally column (`votes_count`) is only ever changed by
//! [`increment_tally`], inside the same transaction that inserts the vote.

use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;
use writein_common::db::Candidate;
use writein_common::{Error, Result};

use super::{classify_conflict, parse_uuid, Conflict};
use crate::voting::normalize;

fn candidate_from_row(row: &SqliteRow) -> Result<Candidate> {
    let id: String = row.try_get("id")?;
    let nominated_by: Option<String> = row.try_get("nominated_by")?;

    Ok(Candidate {
        id: parse_uuid(&id)?,
        name: row.try_get("name")?,
        votes: row.try_get("votes_count")?,
        nominated_by: nominated_by.as_deref().map(parse_uuid).transpose()?,
    })
}

/// All candidates in creation order
pub async fn list_candidates<'e, E>(executor: E) -> Result<Vec<Candidate>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        r#"
        SELECT id, name, votes_count, nominated_by
        FROM candidates
        ORDER BY rowid ASC
        "#,
    )
    .fetch_all(executor)
    .await?;

    rows.iter().map(candidate_from_row).collect()
}

/// Load one candidate by id
pub async fn get_candidate<'e, E>(executor: E, candidate_id: Uuid) -> Result<Option<Candidate>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        SELECT id, name, votes_count, nominated_by
        FROM candidates
        WHERE id = ?
        "#,
    )
    .bind(candidate_id.to_string())
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(candidate_from_row).transpose()
}

/// Insert a write-in candidate with a zero tally
pub async fn insert_write_in(
    conn: &mut SqliteConnection,
    name: &str,
    nominated_by: Uuid,
) -> Result<Candidate> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO candidates (id, name, votes_count, nominated_by)
        VALUES (?, ?, 0, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(name)
    .bind(nominated_by.to_string())
    .execute(&mut *conn)
    .await?;

    Ok(Candidate {
        id,
        name: name.to_string(),
        votes: 0,
        nominated_by: Some(nominated_by),
    })
}

/// Add one vote to a candidate's tally, returning the new tally
pub async fn increment_tally(conn: &mut SqliteConnection, candidate_id: Uuid) -> Result<i64> {
    let votes: i64 = sqlx::query_scalar(
        r#"
        UPDATE candidates
        SET votes_count = votes_count + 1
        WHERE id = ?
        RETURNING votes_count
        "#,
    )
    .bind(candidate_id.to_string())
    .fetch_one(&mut *conn)
    .await?;

    Ok(votes)
}

/// Insert the configured starting candidates, skipping names already present.
///
/// Names are normalized first. Seeding stops with a warning once the
/// candidate cap is reached. Returns the number of candidates inserted.
pub async fn seed_candidates(pool: &SqlitePool, names: &[String]) -> Result<usize> {
    let mut inserted = 0;

    for raw in names {
        let name = normalize(raw);
        if name.is_empty() {
            tracing::warn!(raw = %raw, "Skipping blank seed candidate");
            continue;
        }

        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM candidates WHERE name = ?")
            .bind(&name)
            .fetch_one(pool)
            .await?;
        if exists > 0 {
            continue;
        }

        let result = sqlx::query("INSERT INTO candidates (id, name) VALUES (?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(&name)
            .execute(pool)
            .await;

        match result {
            Ok(_) => inserted += 1,
            Err(e) => {
                let err = Error::from(e);
                match classify_conflict(&err) {
                    Some(Conflict::CandidateCap) => {
                        tracing::warn!(candidate = %name, "Candidate cap reached, remaining seeds skipped");
                        break;
                    }
                    Some(Conflict::DuplicateName) => continue,
                    _ => return Err(err),
                }
            }
        }
    }

    if inserted > 0 {
        tracing::info!(inserted, "Seeded candidates");
    }

    Ok(inserted)
}
