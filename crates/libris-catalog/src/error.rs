//! Error types for the catalog store.

use crate::model::{BookId, ParseBookFieldError, UserId};

/// Errors that can occur during catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A database operation failed.
    #[error("catalog database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No book row has the given identifier.
    #[error("book not found: {0}")]
    BookNotFound(BookId),

    /// No user row has the given identifier.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// The field name is not one of the updatable book fields.
    #[error(transparent)]
    InvalidField(#[from] ParseBookFieldError),
}

impl CatalogError {
    /// Returns `true` for the not-found variants.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::BookNotFound(_) | Self::UserNotFound(_))
    }
}
