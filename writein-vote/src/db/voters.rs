//! Voter persistence
//!
//! Voters are created by the login flow. The vote transaction only ever
//! moves a voter forward: `voted_at` from NULL to set, and `write_in_id`
//! from NULL to a candidate. Nothing resets either column.

use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;
use writein_common::auth::{generate_salt, hash_password, verify_password};
use writein_common::db::Voter;
use writein_common::{Error, Result};

use super::parse_uuid;

/// Stored voter plus the columns needed to check a password
#[derive(Debug, Clone)]
pub struct VoterCredentials {
    pub voter: Voter,
    pub password_hash: String,
    pub password_salt: String,
}

/// Result of a login attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Existing voter whose password matched
    Existing(Voter),
    /// Voter registered on first login
    Registered(Voter),
    WrongPassword,
}

fn voter_from_row(row: &SqliteRow) -> Result<Voter> {
    let id: String = row.try_get("id")?;
    let write_in_id: Option<String> = row.try_get("write_in_id")?;

    Ok(Voter {
        id: parse_uuid(&id)?,
        email: row.try_get("email")?,
        zip_code: row.try_get("zip_code")?,
        write_in_id: write_in_id.as_deref().map(parse_uuid).transpose()?,
        voted_at: row.try_get("voted_at")?,
    })
}

/// Load a voter by id
pub async fn load_voter<'e, E>(executor: E, voter_id: Uuid) -> Result<Option<Voter>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        SELECT id, email, zip_code, write_in_id, voted_at
        FROM voters
        WHERE id = ?
        "#,
    )
    .bind(voter_id.to_string())
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(voter_from_row).transpose()
}

/// Load a voter and password columns by email
pub async fn find_credentials_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<VoterCredentials>> {
    let row = sqlx::query(
        r#"
        SELECT id, email, zip_code, write_in_id, voted_at, password_hash, password_salt
        FROM voters
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(VoterCredentials {
            voter: voter_from_row(&row)?,
            password_hash: row.try_get("password_hash")?,
            password_salt: row.try_get("password_salt")?,
        })),
        None => Ok(None),
    }
}

/// Register a new voter
pub async fn create_voter(
    pool: &SqlitePool,
    email: &str,
    zip_code: &str,
    password: &str,
) -> Result<Voter> {
    let id = Uuid::new_v4();
    let salt = generate_salt();

    sqlx::query(
        r#"
        INSERT INTO voters (id, email, zip_code, password_hash, password_salt)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(email)
    .bind(zip_code)
    .bind(hash_password(password, &salt))
    .bind(&salt)
    .execute(pool)
    .await?;

    Ok(Voter {
        id,
        email: email.to_string(),
        zip_code: zip_code.to_string(),
        write_in_id: None,
        voted_at: None,
    })
}

/// Find a voter by email, registering them on first login.
///
/// Two concurrent first logins for one email race on the UNIQUE index; the
/// loser re-reads the winner's row.
pub async fn find_or_create_voter(
    pool: &SqlitePool,
    email: &str,
    zip_code: &str,
    password: &str,
) -> Result<LoginOutcome> {
    if let Some(existing) = find_credentials_by_email(pool, email).await? {
        return Ok(check_password(existing, password));
    }

    match create_voter(pool, email, zip_code, password).await {
        Ok(voter) => {
            tracing::info!(voter_id = %voter.id, "Registered new voter");
            Ok(LoginOutcome::Registered(voter))
        }
        Err(Error::Database(sqlx::Error::Database(db_err))) if db_err.is_unique_violation() => {
            let existing = find_credentials_by_email(pool, email)
                .await?
                .ok_or_else(|| Error::Internal(format!("Voter {} vanished after conflict", email)))?;
            Ok(check_password(existing, password))
        }
        Err(e) => Err(e),
    }
}

fn check_password(credentials: VoterCredentials, password: &str) -> LoginOutcome {
    if verify_password(password, &credentials.password_salt, &credentials.password_hash) {
        LoginOutcome::Existing(credentials.voter)
    } else {
        LoginOutcome::WrongPassword
    }
}

/// Mark the voter as having voted, if they have not already.
///
/// Returns `false` when nothing changed (unknown voter or already voted).
/// As the first statement of the vote transaction this write also takes the
/// SQLite write lock, so everything read afterwards is current.
pub async fn claim_ballot(conn: &mut SqliteConnection, voter_id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE voters
        SET voted_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP
        WHERE id = ? AND voted_at IS NULL
        "#,
    )
    .bind(voter_id.to_string())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Attribute a write-in candidate to its voter.
///
/// Returns `false` if the voter already had one.
pub async fn assign_write_in(
    conn: &mut SqliteConnection,
    voter_id: Uuid,
    candidate_id: Uuid,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE voters
        SET write_in_id = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ? AND write_in_id IS NULL
        "#,
    )
    .bind(candidate_id.to_string())
    .bind(voter_id.to_string())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
