//! Database initialization
//!
//! Opens (creating if needed) the SQLite database and applies the schema.
//! Schema creation is idempotent and safe to run on every startup.
//!
//! Storage-level guards live here so they hold no matter which code path
//! writes:
//! - one vote per voter (`votes.voter_id UNIQUE`)
//! - unique, case-insensitive candidate names
//! - at most one write-in per voter (`candidates.nominated_by UNIQUE`)
//! - the candidate cap (`BEFORE INSERT` trigger)
//! - votes are never updated or deleted (triggers)

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Hard cap on the number of candidates the election will ever hold
pub const MAX_CANDIDATES: i64 = 10;

/// Message raised by the cap trigger; matched when classifying insert failures
pub const CANDIDATE_CAP_MESSAGE: &str = "candidate cap reached";

/// Message raised when something tries to rewrite a vote
pub const VOTE_IMMUTABLE_MESSAGE: &str = "votes are immutable";

/// Per-connection wait for the SQLite write lock before reporting "database is locked"
pub const BUSY_TIMEOUT_MS: u64 = 5000;

/// Initialize database connection pool and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // foreign_keys and busy_timeout are per-connection, so they go on the
    // connect options rather than a one-off PRAGMA
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS));

    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables, indexes and triggers (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_candidates_table(pool).await?;
    create_voters_table(pool).await?;
    create_votes_table(pool).await?;
    create_guard_triggers(pool).await?;
    Ok(())
}

async fn create_candidates_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS candidates (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            votes_count INTEGER NOT NULL DEFAULT 0 CHECK (votes_count >= 0),
            nominated_by TEXT UNIQUE REFERENCES voters(id),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_voters_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS voters (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            zip_code TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            password_salt TEXT NOT NULL,
            write_in_id TEXT REFERENCES candidates(id),
            voted_at TIMESTAMP,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_voters_write_in ON voters(write_in_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_votes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS votes (
            id TEXT PRIMARY KEY,
            voter_id TEXT NOT NULL UNIQUE REFERENCES voters(id),
            candidate_id TEXT NOT NULL REFERENCES candidates(id),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_votes_candidate ON votes(candidate_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_guard_triggers(pool: &SqlitePool) -> Result<()> {
    let cap_trigger = format!(
        r#"
        CREATE TRIGGER IF NOT EXISTS candidates_cap
        BEFORE INSERT ON candidates
        WHEN (SELECT COUNT(*) FROM candidates) >= {}
        BEGIN
            SELECT RAISE(ABORT, '{}');
        END
        "#,
        MAX_CANDIDATES, CANDIDATE_CAP_MESSAGE
    );
    sqlx::query(&cap_trigger).execute(pool).await?;

    for (name, event) in [("votes_no_update", "UPDATE"), ("votes_no_delete", "DELETE")] {
        let trigger = format!(
            r#"
            CREATE TRIGGER IF NOT EXISTS {}
            BEFORE {} ON votes
            BEGIN
                SELECT RAISE(ABORT, '{}');
            END
            "#,
            name, event, VOTE_IMMUTABLE_MESSAGE
        );
        sqlx::query(&trigger).execute(pool).await?;
    }

    Ok(())
}
