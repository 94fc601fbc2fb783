//! Connection pool creation and per-connection configuration.

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

/// Knobs applied when the pool opens connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// How long a statement waits on a locked database file, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Upper bound on open connections. Must be at least 1.
    ///
    /// The CLI holds exactly one connection for its whole lifetime, so the
    /// default is 1.
    pub pool_max_size: u32,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 1,
        }
    }
}

/// Pool of configured catalog connections.
pub type DbPool = Pool<SqliteConnectionManager>;

/// A connection checked out of a [`DbPool`].
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Errors returned by [`create_pool`].
#[derive(Debug, Error)]
pub enum PoolError {
    /// `pool_max_size` was zero; the pool needs room for at least one
    /// connection.
    #[error("database pool size must be at least 1, got {0}")]
    InvalidSize(u32),

    /// r2d2 could not open the initial connections.
    #[error("failed to open database pool: {0}")]
    PoolInit(#[from] r2d2::Error),
}

/// Puts a freshly opened connection into the state the catalog expects.
///
/// Switches the file to WAL (an in-memory database answers `memory` and is
/// left as is), turns on foreign key enforcement so reservations cannot
/// point at missing books or users, and sets how long a write waits on a
/// locked file.
///
/// # Errors
///
/// Fails with the SQLite error of the first pragma that is refused.
pub fn configure_connection(conn: &Connection, busy_timeout_ms: u64) -> rusqlite::Result<()> {
    let journal_mode: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
    if journal_mode != "wal" && journal_mode != "memory" {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(format!(
                "journal mode stayed {} instead of wal",
                journal_mode
            )),
        ));
    }
    conn.execute_batch(&format!(
        "PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = {};",
        busy_timeout_ms
    ))
}

/// Opens the catalog database at `db_path` behind an r2d2 pool.
///
/// `:memory:` is accepted; every pooled connection then gets a private
/// database, so in-memory catalogs should keep the pool at one connection.
///
/// # Errors
///
/// `PoolError::InvalidSize` when `settings.pool_max_size` is zero, and
/// `PoolError::PoolInit` when the file cannot be opened or configured.
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    if settings.pool_max_size == 0 {
        return Err(PoolError::InvalidSize(settings.pool_max_size));
    }

    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

    let manager = SqliteConnectionManager::file(db_path)
        .with_flags(flags)
        .with_init(move |conn| configure_connection(conn, settings.busy_timeout_ms));

    let pool = Pool::builder()
        .max_size(settings.pool_max_size)
        .build(manager)?;

    tracing::debug!(path = db_path, max_size = settings.pool_max_size, "opened database pool");

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_in_memory_pool() {
        let settings = DbRuntimeSettings {
            busy_timeout_ms: 2_500,
            pool_max_size: 1,
        };

        let pool = create_pool(":memory:", settings).expect("pool creation should succeed");
        let conn = pool.get().expect("should get a connection");

        let mode: String = conn
            .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
            .expect("should query journal_mode");
        assert!(
            mode == "wal" || mode == "memory",
            "unexpected journal_mode: {mode}"
        );

        let fk: i32 = conn
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .expect("should query foreign_keys");
        assert_eq!(fk, 1, "foreign keys should be enabled");

        let busy_timeout: i32 = conn
            .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
            .expect("should query busy_timeout");
        assert_eq!(busy_timeout, 2_500, "busy timeout should match settings");

        assert_eq!(pool.max_size(), 1);
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        let settings = DbRuntimeSettings {
            busy_timeout_ms: 5_000,
            pool_max_size: 0,
        };

        match create_pool(":memory:", settings) {
            Err(PoolError::InvalidSize(0)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("zero-sized pool should fail"),
        }
    }

    #[test]
    fn default_settings_hold_a_single_connection() {
        let settings = DbRuntimeSettings::default();
        assert_eq!(settings.pool_max_size, 1);
        assert_eq!(settings.busy_timeout_ms, 5_000);
    }

    #[test]
    fn configure_plain_connection() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        configure_connection(&conn, 750).expect("pragmas should apply");

        let fk: i32 = conn
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .expect("should query foreign_keys");
        assert_eq!(fk, 1);

        let busy_timeout: i32 = conn
            .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
            .expect("should query busy_timeout");
        assert_eq!(busy_timeout, 750);
    }
}
