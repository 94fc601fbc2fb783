//! Database layer for Libris.
//!
//! Opens SQLite connections through an `r2d2` pool, applies the connection
//! pragmas every catalog connection relies on, and embeds the versioned SQL
//! migrations that create the `Books`, `Users`, and `Reservations` tables.
//!
//! # Design decisions
//!
//! - **SQLite**: the catalog is a single local file; no database process.
//! - **Foreign keys on**: every connection enables `foreign_keys`, so a
//!   reservation can only point at an existing book and user.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!` and applied once each, in order.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{
    configure_connection, create_pool, DbConnection, DbPool, DbRuntimeSettings, PoolError,
};
