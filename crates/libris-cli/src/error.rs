//! Error type for the CLI.

use libris_catalog::CatalogError;
use libris_db::{MigrationError, PoolError};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that end a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("failed to get database connection: {0}")]
    Connection(#[from] r2d2::Error),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("terminal i/o error: {0}")]
    Io(#[from] std::io::Error),
}
