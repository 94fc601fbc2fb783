//! Interactive front end for the Libris catalog.
//!
//! The binary loads [`config::Config`], opens one pooled connection, and runs
//! a [`menu::Session`] over standard input and output. Everything the binary
//! does besides wiring lives here so it can be driven from tests.

pub mod config;
mod error;
pub mod menu;

pub use error::CliError;
pub use menu::{MenuCommand, MenuEntry, Session, MENU};
