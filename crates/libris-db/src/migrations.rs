//! Schema migrations for the catalog database.
//!
//! Each step is a `.sql` file under `migrations/`, compiled in with
//! `include_str!`. A step's name goes into `_libris_migrations` in the same
//! transaction as its SQL, so a step is either fully applied and recorded or
//! not at all.

use rusqlite::Connection;
use thiserror::Error;

/// One schema step.
struct Migration {
    name: &'static str,
    sql: &'static str,
}

/// Steps in application order; later schema changes go at the end.
const MIGRATIONS: &[Migration] = &[Migration {
    name: "000_catalog",
    sql: include_str!("migrations/000_catalog.sql"),
}];

/// Errors from [`run_migrations`].
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The step's SQL, or recording it, was refused; its changes were rolled
    /// back.
    #[error("migration '{name}' failed: {source}")]
    ExecutionFailed {
        /// Name of the step, e.g. `000_catalog`.
        name: String,
        source: rusqlite::Error,
    },

    /// `_libris_migrations` could not be read.
    #[error("failed to read applied migrations: {0}")]
    StateQuery(rusqlite::Error),
}

/// Brings the catalog schema up to date.
///
/// Returns how many steps this call applied, so `0` means the file was
/// already current.
///
/// # Errors
///
/// Stops at the first step that fails and returns `MigrationError`; steps
/// before it stay applied.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    run_migrations_from_list(conn, MIGRATIONS)
}

fn run_migrations_from_list(
    conn: &Connection,
    migrations: &[Migration],
) -> Result<usize, MigrationError> {
    // Created here rather than by a step, since every step is looked up in it.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _libris_migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| MigrationError::ExecutionFailed {
        name: "_libris_migrations_bootstrap".to_string(),
        source: e,
    })?;

    let mut applied = 0;

    for migration in migrations {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _libris_migrations WHERE name = ?1",
                [migration.name],
                |row| row.get(0),
            )
            .map_err(MigrationError::StateQuery)?;

        if already_applied {
            tracing::debug!(migration = migration.name, "schema step already recorded");
            continue;
        }

        tracing::info!(migration = migration.name, "applying schema step");

        let failed = |e| MigrationError::ExecutionFailed {
            name: migration.name.to_string(),
            source: e,
        };

        let tx = conn.unchecked_transaction().map_err(failed)?;
        tx.execute_batch(migration.sql).map_err(failed)?;
        tx.execute(
            "INSERT INTO _libris_migrations (name) VALUES (?1)",
            [migration.name],
        )
        .map_err(failed)?;
        tx.commit().map_err(failed)?;

        applied += 1;
    }

    Ok(applied)
}
