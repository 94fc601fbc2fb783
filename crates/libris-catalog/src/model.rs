//! Record types, the `BookView` projection, and query classification.

use chrono::NaiveDate;

/// Identifier of a row in `Books`.
pub type BookId = i64;
/// Identifier of a row in `Users`.
pub type UserId = i64;
/// Identifier of a row in `Reservations`.
pub type ReservationId = i64;

/// A stored book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    /// Auto-assigned `BookID`.
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    /// Free-text label such as "available" or "checked out".
    pub status: String,
}

/// A library user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// A reservation of a book by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub id: ReservationId,
    pub book_id: BookId,
    pub user_id: UserId,
    /// `ReservationDate` exactly as stored. The column is free text and rows
    /// written by other tools may carry a time or another layout.
    pub reserved_on: String,
}

impl Reservation {
    /// The calendar date of the reservation, when the stored text starts
    /// with a `YYYY-MM-DD` date; any suffix such as a time of day is ignored.
    pub fn reserved_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_and_remainder(self.reserved_on.trim(), "%Y-%m-%d")
            .ok()
            .map(|(date, _)| date)
    }
}

/// A book joined to one of its reservations and the reserving user.
///
/// A book without reservations produces a single view with no user fields.
/// A book with several reservations produces one view per reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookView {
    pub book_id: BookId,
    pub title: String,
    pub status: String,
    /// `Users.Name` of the reserving user, if the row joined one.
    pub user_name: Option<String>,
    /// `Users.Email` of the reserving user, if the row joined one.
    pub user_email: Option<String>,
}

/// Name and email of the user holding a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reserver<'a> {
    pub name: &'a str,
    pub email: &'a str,
}

impl BookView {
    /// Returns the reserving user when both name and email are present and
    /// non-empty.
    pub fn reserver(&self) -> Option<Reserver<'_>> {
        match (self.user_name.as_deref(), self.user_email.as_deref()) {
            (Some(name), Some(email)) if !name.is_empty() && !email.is_empty() => {
                Some(Reserver { name, email })
            }
            _ => None,
        }
    }
}

/// The book columns that can be changed by a field-level update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookField {
    Title,
    Author,
    Isbn,
    Status,
}

impl BookField {
    /// All updatable fields, in prompt order.
    pub const ALL: [BookField; 4] = [Self::Title, Self::Author, Self::Isbn, Self::Status];

    /// Returns the field name as typed by users.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Author => "Author",
            Self::Isbn => "ISBN",
            Self::Status => "Status",
        }
    }

    /// Returns the `Books` column this field is stored in.
    pub(crate) fn column(self) -> &'static str {
        // Field names and column names coincide.
        self.as_str()
    }
}

impl std::fmt::Display for BookField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookField {
    type Err = ParseBookFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Title" => Ok(Self::Title),
            "Author" => Ok(Self::Author),
            "ISBN" => Ok(Self::Isbn),
            "Status" => Ok(Self::Status),
            _ => Err(ParseBookFieldError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown book field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBookFieldError(pub String);

impl std::fmt::Display for ParseBookFieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid book field: {}", self.0)
    }
}

impl std::error::Error for ParseBookFieldError {}

/// How a free-text search query is matched.
///
/// | Prefix | Kind |
/// |--------|------|
/// | `LB` | [`SearchKind::BookId`] |
/// | `LU` | [`SearchKind::UserId`] |
/// | `LR` | [`SearchKind::ReservationId`] |
/// | anything else | [`SearchKind::Title`] |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    BookId,
    UserId,
    ReservationId,
    Title,
}

impl SearchKind {
    /// Classifies a query by its two-letter prefix.
    pub fn classify(query: &str) -> Self {
        if query.starts_with("LB") {
            Self::BookId
        } else if query.starts_with("LU") {
            Self::UserId
        } else if query.starts_with("LR") {
            Self::ReservationId
        } else {
            Self::Title
        }
    }

    /// Returns `true` for the identifier-tagged kinds.
    pub fn is_identifier(self) -> bool {
        !matches!(self, Self::Title)
    }
}
