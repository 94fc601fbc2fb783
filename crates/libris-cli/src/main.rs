//! Libris binary: the interactive library catalog.
//!
//! Loads configuration, initializes structured logging on stderr, opens the
//! catalog database, and runs the numbered menu on stdin/stdout.

use std::process::ExitCode;

use libris_catalog::CatalogStore;
use libris_cli::config::{self, LoggingConfig};
use libris_cli::{CliError, Session};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "libris.toml";

fn resolve_config_path() -> (String, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (path, "cli-arg");
    }

    if let Ok(path) = std::env::var("LIBRIS_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (path, "env-var");
        }
    }

    (DEFAULT_CONFIG_PATH.to_string(), "default")
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout belongs to the menu.
    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn run() -> Result<(), CliError> {
    let (config_path, config_source) = resolve_config_path();

    let config = config::load_config(Some(&config_path))?;
    init_tracing(&config.logging);

    tracing::info!(
        source = config_source,
        path = %config_path,
        "resolved startup configuration path"
    );
    if !config.file_found {
        tracing::info!(path = %config_path, "config file not found, using defaults");
    }

    let pool = libris_db::create_pool(&config.database.path, config.database.runtime_settings())?;

    // One connection, held until the session ends.
    let conn = pool.get()?;
    let applied = libris_db::run_migrations(&conn)?;
    if applied > 0 {
        tracing::info!(count = applied, "applied database migrations");
    }

    let store = CatalogStore::new(conn);
    tracing::info!(path = %config.database.path, "starting libris session");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    Session::new(stdin.lock(), stdout.lock(), &store).run()?;

    tracing::info!("libris session ended");
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "libris failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
