//! The Libris catalog store.
//!
//! A thin layer over the `Books`, `Users`, and `Reservations` tables. Every
//! operation is a single parameterised statement, except [`CatalogStore::delete_book`],
//! which removes a book and its reservations inside one transaction.
//!
//! Reads that show a book to a person go through the [`BookView`] projection:
//! a book left-joined through its reservations to the reserving users, one row
//! per (book, reservation) pairing.
//!
//! # Usage
//!
//! ```rust,ignore
//! use libris_catalog::CatalogStore;
//!
//! let store = CatalogStore::new(pool.get()?);
//! let id = store.add_book("Dune", "Frank Herbert", "9780441013593", "available")?;
//! let view = store.get_book_details(id)?;
//! assert_eq!(view.title, "Dune");
//! ```

mod error;
mod model;
mod store;

pub use error::CatalogError;
pub use model::{
    Book, BookField, BookId, BookView, ParseBookFieldError, Reservation, ReservationId, Reserver,
    SearchKind, User, UserId,
};
pub use store::CatalogStore;
