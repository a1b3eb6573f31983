//! Lock-contention retry
//!
//! SQLite reports "database is locked" once a connection's busy timeout
//! expires while another connection holds the write lock. Vote casting
//! treats that as transient and tries again with exponential backoff.

use std::future::Future;
use std::time::{Duration, Instant};
use writein_common::{Error, Result};

const INITIAL_BACKOFF: Duration = Duration::from_millis(10);
const MAX_BACKOFF: Duration = Duration::from_millis(1000);

/// Run `operation` until it stops failing with lock contention or
/// `max_wait_ms` has passed.
///
/// Any other error is returned at once. Backoff starts at 10ms and doubles
/// up to 1s between attempts. Once the budget is spent the last lock error
/// is replaced by `Error::Internal` describing how long we waited.
pub async fn retry_on_lock<F, Fut, T>(operation_name: &str, max_wait_ms: u64, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let started = Instant::now();
    let budget = Duration::from_millis(max_wait_ms);
    let mut backoff = INITIAL_BACKOFF;
    let mut attempt: u32 = 1;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Succeeded after lock contention"
                    );
                }
                return Ok(value);
            }
            Err(err) if err.is_lock_contention() => err,
            Err(err) => return Err(err),
        };

        let waited = started.elapsed();
        if waited >= budget {
            tracing::error!(
                operation = operation_name,
                attempt,
                waited_ms = waited.as_millis() as u64,
                error = %err,
                "Giving up on locked database"
            );
            return Err(Error::Internal(format!(
                "Database locked: {} gave up after {} attempts in {} ms",
                operation_name,
                attempt,
                waited.as_millis()
            )));
        }

        tracing::warn!(
            operation = operation_name,
            attempt,
            backoff_ms = backoff.as_millis() as u64,
            "Database locked, backing off"
        );

        tokio::time::sleep(backoff.min(budget - waited)).await;
        backoff = (backoff * 2).min(MAX_BACKOFF);
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use sqlx::SqlitePool;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    async fn pool_with_busy_timeout(dir: &TempDir, busy_ms: u64) -> SqlitePool {
        let options = SqliteConnectOptions::new()
            .filename(dir.path().join("lock.db"))
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(busy_ms));

        SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_retry_succeeds_first_attempt() {
        let result = retry_on_lock("test_op", 5000, || async { Ok::<i32, Error>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_non_lock_error_fails_immediately() {
        let attempts = AtomicUsize::new(0);

        let result = retry_on_lock("test_op", 5000, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, Error>(Error::Internal("other error".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_through_real_lock_contention() {
        let dir = TempDir::new().unwrap();
        let holder = pool_with_busy_timeout(&dir, 5000).await;
        sqlx::query("CREATE TABLE t (x INTEGER)").execute(&holder).await.unwrap();

        // No busy waiting: contention surfaces as "database is locked" at once
        let impatient = pool_with_busy_timeout(&dir, 0).await;

        let mut tx = holder.begin().await.unwrap();
        sqlx::query("INSERT INTO t (x) VALUES (1)").execute(&mut *tx).await.unwrap();

        let release = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            tx.commit().await.unwrap();
        });

        let attempts = AtomicUsize::new(0);
        let result = retry_on_lock("contended insert", 5000, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            let pool = impatient.clone();
            async move {
                sqlx::query("INSERT INTO t (x) VALUES (2)").execute(&pool).await?;
                Ok::<(), Error>(())
            }
        })
        .await;

        release.await.unwrap();
        assert!(result.is_ok(), "Should succeed once the lock is released: {:?}", result);
        assert!(attempts.load(Ordering::SeqCst) > 1, "Should have retried at least once");
    }

    #[tokio::test]
    async fn test_gives_up_after_max_wait() {
        let dir = TempDir::new().unwrap();
        let holder = pool_with_busy_timeout(&dir, 5000).await;
        sqlx::query("CREATE TABLE t (x INTEGER)").execute(&holder).await.unwrap();
        let impatient = pool_with_busy_timeout(&dir, 0).await;

        let mut tx = holder.begin().await.unwrap();
        sqlx::query("INSERT INTO t (x) VALUES (1)").execute(&mut *tx).await.unwrap();

        let result = retry_on_lock("contended insert", 50, || {
            let pool = impatient.clone();
            async move {
                sqlx::query("INSERT INTO t (x) VALUES (2)").execute(&pool).await?;
                Ok::<(), Error>(())
            }
        })
        .await;

        match result {
            Err(Error::Internal(msg)) => assert!(msg.contains("Database locked"), "{}", msg),
            other => panic!("Expected lock timeout, got {:?}", other),
        }

        tx.rollback().await.unwrap();
    }
}
