//! Persistence operations over the catalog tables.
//!
//! Book views are read with one query shape: `Books` left-joined to
//! `Reservations` and then to `Users`, ordered by book and reservation
//! identifier so that repeated reads list rows in the same order.

use std::ops::Deref;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::CatalogError;
use crate::model::{
    Book, BookField, BookId, BookView, Reservation, ReservationId, SearchKind, User, UserId,
};

const BOOK_VIEW_SELECT: &str = "SELECT Books.BookID, Books.Title, Books.Status, Users.Name, Users.Email
     FROM Books
     LEFT JOIN Reservations ON Books.BookID = Reservations.BookID
     LEFT JOIN Users ON Reservations.UserID = Users.UserID";

const BOOK_VIEW_ORDER: &str = "ORDER BY Books.BookID ASC, Reservations.ReservationID ASC";

/// The catalog store.
///
/// Constructed once over a single connection and handed to whoever needs
/// catalog access. `C` is anything that dereferences to a
/// [`rusqlite::Connection`]: a pooled connection in the binary, or a plain
/// `&Connection` in tests.
#[derive(Debug)]
pub struct CatalogStore<C> {
    conn: C,
}

impl<C> CatalogStore<C>
where
    C: Deref<Target = Connection>,
{
    /// Wraps a connection whose schema is already migrated.
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    /// Inserts a new book and returns its generated identifier.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Database` on SQL failure.
    pub fn add_book(
        &self,
        title: &str,
        author: &str,
        isbn: &str,
        status: &str,
    ) -> Result<BookId, CatalogError> {
        self.conn.execute(
            "INSERT INTO Books (Title, Author, ISBN, Status) VALUES (?1, ?2, ?3, ?4)",
            params![title, author, isbn, status],
        )?;
        let book_id = self.conn.last_insert_rowid();
        tracing::info!(book_id, title, "added book");
        Ok(book_id)
    }

    /// Retrieves the full stored row of a book.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::BookNotFound` if no such book exists.
    pub fn get_book(&self, book_id: BookId) -> Result<Book, CatalogError> {
        self.conn
            .query_row(
                "SELECT BookID, Title, Author, ISBN, Status FROM Books WHERE BookID = ?1",
                [book_id],
                map_row_to_book,
            )
            .optional()?
            .ok_or(CatalogError::BookNotFound(book_id))
    }

    /// Looks up one book joined to its reservation and reserving user.
    ///
    /// When the book has several reservations, only the first (lowest
    /// `ReservationID`) is returned.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::BookNotFound` if no such book exists.
    pub fn get_book_details(&self, book_id: BookId) -> Result<BookView, CatalogError> {
        let sql = format!("{BOOK_VIEW_SELECT} WHERE Books.BookID = ?1 {BOOK_VIEW_ORDER} LIMIT 1");
        self.conn
            .query_row(&sql, [book_id], map_row_to_book_view)
            .optional()?
            .ok_or(CatalogError::BookNotFound(book_id))
    }

    /// Searches books by title or by a prefix-tagged identifier.
    ///
    /// Queries starting with `LB`, `LU`, or `LR` are compared, prefix and
    /// all, against `BookID`, `UserID`, and `ReservationID` with OR
    /// semantics. SQLite never coerces text such as `LB7` to an integer, so
    /// these searches match no rows. Any other query matches `Title` exactly.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Database` on SQL failure.
    pub fn search(&self, query: &str) -> Result<Vec<BookView>, CatalogError> {
        let kind = SearchKind::classify(query);
        let filter = if kind.is_identifier() {
            "WHERE Books.BookID = ?1 OR Users.UserID = ?1 OR Reservations.ReservationID = ?1"
        } else {
            "WHERE Books.Title = ?1"
        };
        let sql = format!("{BOOK_VIEW_SELECT} {filter} {BOOK_VIEW_ORDER}");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([query], map_row_to_book_view)?;
        let mut views = Vec::new();
        for row in rows {
            views.push(row?);
        }

        tracing::debug!(query, ?kind, matches = views.len(), "searched catalog");
        Ok(views)
    }

    /// Lists every book, one view per (book, reservation) pairing.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Database` on SQL failure.
    pub fn list_all(&self) -> Result<Vec<BookView>, CatalogError> {
        let sql = format!("{BOOK_VIEW_SELECT} {BOOK_VIEW_ORDER}");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], map_row_to_book_view)?;
        let mut views = Vec::new();
        for row in rows {
            views.push(row?);
        }
        Ok(views)
    }

    /// Sets one field of a book, naming the field as users type it
    /// (`Title`, `Author`, `ISBN`, or `Status`).
    ///
    /// The field name is validated before any statement runs, so an unknown
    /// name never mutates the row. This is the only way to change a stored
    /// book.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidField` for an unknown field name and
    /// `CatalogError::BookNotFound` if no such book exists.
    pub fn update_book_field(
        &self,
        book_id: BookId,
        field: &str,
        new_value: &str,
    ) -> Result<(), CatalogError> {
        let field: BookField = field.parse().map_err(|e| {
            tracing::warn!(book_id, field, "rejected update of unknown book field");
            CatalogError::InvalidField(e)
        })?;
        self.set_field(book_id, field, new_value)
    }

    fn set_field(
        &self,
        book_id: BookId,
        field: BookField,
        new_value: &str,
    ) -> Result<(), CatalogError> {
        // The column name comes from a closed enum, never from input.
        let sql = format!("UPDATE Books SET {} = ?1 WHERE BookID = ?2", field.column());
        let count = self.conn.execute(&sql, params![new_value, book_id])?;
        if count == 0 {
            return Err(CatalogError::BookNotFound(book_id));
        }
        tracing::info!(book_id, %field, "updated book");
        Ok(())
    }

    /// Deletes a book and every reservation referencing it.
    ///
    /// Both deletes run in one transaction; if the book does not exist the
    /// transaction is rolled back and nothing is removed. Returns the number
    /// of reservations removed.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::BookNotFound` if no such book exists.
    pub fn delete_book(&self, book_id: BookId) -> Result<usize, CatalogError> {
        let tx = self.conn.unchecked_transaction()?;

        // Reservations go first so the foreign key never points at a
        // missing book.
        let reservations = tx.execute("DELETE FROM Reservations WHERE BookID = ?1", [book_id])?;
        let books = tx.execute("DELETE FROM Books WHERE BookID = ?1", [book_id])?;
        if books == 0 {
            return Err(CatalogError::BookNotFound(book_id));
        }
        tx.commit()?;

        tracing::info!(book_id, reservations, "deleted book");
        Ok(reservations)
    }

    /// Inserts a new user and returns the generated identifier.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Database` on SQL failure.
    pub fn add_user(&self, name: &str, email: &str) -> Result<UserId, CatalogError> {
        self.conn.execute(
            "INSERT INTO Users (Name, Email) VALUES (?1, ?2)",
            params![name, email],
        )?;
        let user_id = self.conn.last_insert_rowid();
        tracing::info!(user_id, "added user");
        Ok(user_id)
    }

    /// Retrieves a user by identifier.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::UserNotFound` if no such user exists.
    pub fn get_user(&self, user_id: UserId) -> Result<User, CatalogError> {
        self.conn
            .query_row(
                "SELECT UserID, Name, Email FROM Users WHERE UserID = ?1",
                [user_id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        name: text(row, 1)?,
                        email: text(row, 2)?,
                    })
                },
            )
            .optional()?
            .ok_or(CatalogError::UserNotFound(user_id))
    }

    /// Records a reservation of `book_id` by `user_id`, storing the date as
    /// `YYYY-MM-DD` text.
    ///
    /// Nothing prevents several reservations of the same book.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Database` on SQL failure, including a foreign
    /// key violation when the book or user does not exist.
    pub fn add_reservation(
        &self,
        book_id: BookId,
        user_id: UserId,
        reserved_on: NaiveDate,
    ) -> Result<ReservationId, CatalogError> {
        let reserved_on = reserved_on.format("%Y-%m-%d").to_string();
        self.conn.execute(
            "INSERT INTO Reservations (BookID, UserID, ReservationDate) VALUES (?1, ?2, ?3)",
            params![book_id, user_id, reserved_on],
        )?;
        let reservation_id = self.conn.last_insert_rowid();
        tracing::info!(reservation_id, book_id, user_id, "added reservation");
        Ok(reservation_id)
    }

    /// Lists the reservations of a book in identifier order.
    ///
    /// `ReservationDate` is returned verbatim, whatever its format.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Database` on SQL failure.
    pub fn reservations_for_book(&self, book_id: BookId) -> Result<Vec<Reservation>, CatalogError> {
        let mut stmt = self.conn.prepare(
            "SELECT ReservationID, BookID, UserID, ReservationDate
             FROM Reservations WHERE BookID = ?1 ORDER BY ReservationID ASC",
        )?;
        let rows = stmt.query_map([book_id], |row| {
            Ok(Reservation {
                id: row.get(0)?,
                book_id: row.get(1)?,
                user_id: row.get(2)?,
                reserved_on: text(row, 3)?,
            })
        })?;
        let mut reservations = Vec::new();
        for row in rows {
            reservations.push(row?);
        }
        Ok(reservations)
    }
}

/// Reads a nullable text column, mapping `NULL` to an empty string.
fn text(row: &Row, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

fn map_row_to_book(row: &Row) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: text(row, 1)?,
        author: text(row, 2)?,
        isbn: text(row, 3)?,
        status: text(row, 4)?,
    })
}

fn map_row_to_book_view(row: &Row) -> rusqlite::Result<BookView> {
    Ok(BookView {
        book_id: row.get(0)?,
        title: text(row, 1)?,
        status: text(row, 2)?,
        user_name: row.get(3)?,
        user_email: row.get(4)?,
    })
}
