//! Vote persistence
//!
//! Votes are insert-only; storage triggers reject UPDATE and DELETE.

use sqlx::{Executor, Row, Sqlite, SqliteConnection};
use uuid::Uuid;
use writein_common::db::Vote;
use writein_common::Result;

use super::parse_uuid;

/// Record a vote. Fails with a unique violation if the voter already has one.
pub async fn insert_vote(
    conn: &mut SqliteConnection,
    voter_id: Uuid,
    candidate_id: Uuid,
) -> Result<Uuid> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO votes (id, voter_id, candidate_id)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(voter_id.to_string())
    .bind(candidate_id.to_string())
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

/// The vote cast by a voter, if any
pub async fn load_vote_for_voter<'e, E>(executor: E, voter_id: Uuid) -> Result<Option<Vote>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        SELECT id, voter_id, candidate_id, created_at
        FROM votes
        WHERE voter_id = ?
        "#,
    )
    .bind(voter_id.to_string())
    .fetch_optional(executor)
    .await?;

    match row {
        Some(row) => {
            let id: String = row.try_get("id")?;
            let voter_id: String = row.try_get("voter_id")?;
            let candidate_id: String = row.try_get("candidate_id")?;

            Ok(Some(Vote {
                id: parse_uuid(&id)?,
                voter_id: parse_uuid(&voter_id)?,
                candidate_id: parse_uuid(&candidate_id)?,
                created_at: row.try_get("created_at")?,
            }))
        }
        None => Ok(None),
    }
}
