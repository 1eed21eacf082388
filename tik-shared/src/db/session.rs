/// Request-scoped database session
///
/// A [`DbSession`] is the transactional handle owned by exactly one request.
/// It lazily begins a transaction on first use, and the transaction stays open
/// until the handler calls [`DbSession::commit`] or the error path calls
/// [`DbSession::rollback`]. [`DbSession::close`] releases the handle and
/// discards anything that was never committed; it never commits on its own.
///
/// After a commit the next call to [`DbSession::connection`] begins a fresh
/// transaction, which is how handlers reload a row after writing it.
///
/// Cloning a session clones the handle, not the transaction: every clone
/// talks to the same underlying connection.
///
/// # Example
///
/// ```no_run
/// use tik_shared::db::session::DbSession;
/// use sqlx::SqlitePool;
///
/// # async fn example(pool: SqlitePool) -> Result<(), sqlx::Error> {
/// let session = DbSession::new(pool);
///
/// {
///     let mut conn = session.connection().await?;
///     sqlx::query("INSERT INTO categories (label) VALUES (?)")
///         .bind("Bug")
///         .execute(&mut *conn)
///         .await?;
/// }
///
/// session.commit().await?;
/// session.close().await?;
/// # Ok(())
/// # }
/// ```

use sqlx::{sqlite::SqliteConnection, Sqlite, SqlitePool, Transaction};
use std::sync::Arc;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::debug;

/// Exclusive access to the session's connection inside the open transaction
///
/// Must be dropped before calling `commit`, `rollback` or `close` on the same
/// session.
pub type SessionConnection<'a> = MappedMutexGuard<'a, SqliteConnection>;

/// Transactional handle scoped to a single request
#[derive(Clone)]
pub struct DbSession {
    inner: Arc<Mutex<SessionState>>,
}

struct SessionState {
    pool: SqlitePool,
    tx: Option<Transaction<'static, Sqlite>>,
    closed: bool,
}

impl DbSession {
    /// Creates a session bound to the pool; no connection is taken yet
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionState {
                pool,
                tx: None,
                closed: false,
            })),
        }
    }

    /// Returns the connection of the active transaction, beginning one if needed
    ///
    /// # Errors
    ///
    /// Returns `PoolClosed` once the session has been closed, or any error
    /// raised while acquiring a connection and issuing `BEGIN`.
    pub async fn connection(&self) -> Result<SessionConnection<'_>, sqlx::Error> {
        let mut state = self.inner.lock().await;

        if state.closed {
            return Err(sqlx::Error::PoolClosed);
        }

        if state.tx.is_none() {
            let tx = state.pool.begin().await?;
            debug!("Session transaction started");
            state.tx = Some(tx);
        }

        MutexGuard::try_map(state, |state| state.tx.as_deref_mut())
            .map_err(|_| sqlx::Error::PoolClosed)
    }

    /// Commits the active transaction, if any
    pub async fn commit(&self) -> Result<(), sqlx::Error> {
        let mut state = self.inner.lock().await;

        if let Some(tx) = state.tx.take() {
            tx.commit().await?;
            debug!("Session transaction committed");
        }

        Ok(())
    }

    /// Rolls back the active transaction, if any
    pub async fn rollback(&self) -> Result<(), sqlx::Error> {
        let mut state = self.inner.lock().await;

        if let Some(tx) = state.tx.take() {
            tx.rollback().await?;
            debug!("Session transaction rolled back");
        }

        Ok(())
    }

    /// Releases the session
    ///
    /// Uncommitted work is rolled back. Further calls to `connection` fail.
    /// Closing twice is a no-op.
    pub async fn close(&self) -> Result<(), sqlx::Error> {
        let mut state = self.inner.lock().await;
        state.closed = true;

        if let Some(tx) = state.tx.take() {
            tx.rollback().await?;
            debug!("Session closed with uncommitted work discarded");
        } else {
            debug!("Session closed");
        }

        Ok(())
    }

    /// Whether a transaction is currently open on this session
    pub async fn in_transaction(&self) -> bool {
        self.inner.lock().await.tx.is_some()
    }

    /// Whether the session has been closed
    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.closed
    }
}

impl std::fmt::Debug for DbSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbSession").finish_non_exhaustive()
    }
}
