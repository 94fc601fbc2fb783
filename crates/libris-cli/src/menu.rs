//! The numbered menu and the session loop that drives it.
//!
//! [`MENU`] is the single source for both the printed menu and choice
//! resolution. A [`Session`] reads from any `BufRead`, writes to any `Write`,
//! and talks to an injected [`CatalogStore`].

use std::io::{BufRead, Write};
use std::ops::Deref;

use libris_catalog::{BookField, BookId, BookView, CatalogError, CatalogStore};
use rusqlite::Connection;

use crate::error::CliError;

/// A menu action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    AddBook,
    BookDetails,
    Search,
    ListAll,
    UpdateBook,
    DeleteBook,
    Exit,
}

/// One line of the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    /// What the user types to pick this entry.
    pub choice: &'static str,
    pub label: &'static str,
    pub command: MenuCommand,
}

/// The menu, in display order.
pub const MENU: &[MenuEntry] = &[
    MenuEntry {
        choice: "1",
        label: "Add a new book",
        command: MenuCommand::AddBook,
    },
    MenuEntry {
        choice: "2",
        label: "Find a book's detail based on BookID",
        command: MenuCommand::BookDetails,
    },
    MenuEntry {
        choice: "3",
        label: "Find a book's reservation status",
        command: MenuCommand::Search,
    },
    MenuEntry {
        choice: "4",
        label: "Find all the books",
        command: MenuCommand::ListAll,
    },
    MenuEntry {
        choice: "5",
        label: "Modify/update book details",
        command: MenuCommand::UpdateBook,
    },
    MenuEntry {
        choice: "6",
        label: "Delete a book",
        command: MenuCommand::DeleteBook,
    },
    MenuEntry {
        choice: "7",
        label: "Exit",
        command: MenuCommand::Exit,
    },
];

impl MenuCommand {
    /// Resolves a typed choice through [`MENU`].
    pub fn from_choice(choice: &str) -> Option<Self> {
        let choice = choice.trim();
        MENU.iter()
            .find(|entry| entry.choice == choice)
            .map(|entry| entry.command)
    }
}

/// An interactive session over one catalog store.
pub struct Session<'s, R, W, C> {
    input: R,
    output: W,
    store: &'s CatalogStore<C>,
}

impl<'s, R, W, C> Session<'s, R, W, C>
where
    R: BufRead,
    W: Write,
    C: Deref<Target = Connection>,
{
    pub fn new(input: R, output: W, store: &'s CatalogStore<C>) -> Self {
        Self {
            input,
            output,
            store,
        }
    }

    /// Runs the menu loop until the user picks Exit or input ends.
    ///
    /// Catalog failures inside a command are reported and the loop goes on;
    /// only terminal I/O errors end the session early.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Io` if reading input or writing output fails.
    pub fn run(&mut self) -> Result<(), CliError> {
        loop {
            self.print_menu()?;
            let Some(choice) = self.prompt("Enter your choice: ")? else {
                break;
            };

            match MenuCommand::from_choice(&choice) {
                Some(MenuCommand::Exit) => break,
                Some(command) => self.dispatch(command)?,
                None => writeln!(self.output, "Invalid choice!")?,
            }
        }
        self.output.flush()?;
        Ok(())
    }

    /// Runs a single command, absorbing catalog errors.
    pub fn dispatch(&mut self, command: MenuCommand) -> Result<(), CliError> {
        tracing::debug!(?command, "dispatching menu command");
        let result = match command {
            MenuCommand::AddBook => self.add_book(),
            MenuCommand::BookDetails => self.book_details(),
            MenuCommand::Search => self.search(),
            MenuCommand::ListAll => self.list_all(),
            MenuCommand::UpdateBook => self.update_book(),
            MenuCommand::DeleteBook => self.delete_book(),
            MenuCommand::Exit => Ok(()),
        };

        match result {
            Err(CliError::Catalog(e)) => {
                tracing::error!(error = %e, ?command, "menu command failed");
                writeln!(self.output, "Error: {e}")?;
                Ok(())
            }
            other => other,
        }
    }

    fn print_menu(&mut self) -> Result<(), CliError> {
        writeln!(self.output, "\nLibrary Management System")?;
        for entry in MENU {
            writeln!(self.output, "{}. {}", entry.choice, entry.label)?;
        }
        Ok(())
    }

    /// Prints `label` and reads one line without its line ending.
    /// Returns `None` at end of input.
    fn prompt(&mut self, label: &str) -> Result<Option<String>, CliError> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(&['\n', '\r'][..]).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Prompts for a BookID; `Ok(None)` means the input ended or was not a
    /// number (already reported).
    fn prompt_book_id(&mut self) -> Result<Option<BookId>, CliError> {
        let Some(raw) = self.prompt("Enter the BookID: ")? else {
            return Ok(None);
        };
        match raw.trim().parse::<BookId>() {
            Ok(id) => Ok(Some(id)),
            Err(_) => {
                tracing::warn!(input = %raw, "rejected non-numeric BookID");
                writeln!(self.output, "Invalid BookID!")?;
                Ok(None)
            }
        }
    }

    fn add_book(&mut self) -> Result<(), CliError> {
        let Some(title) = self.prompt("Enter the title of the book: ")? else {
            return Ok(());
        };
        let Some(author) = self.prompt("Enter the author of the book: ")? else {
            return Ok(());
        };
        let Some(isbn) = self.prompt("Enter the ISBN of the book: ")? else {
            return Ok(());
        };
        let Some(status) = self.prompt("Enter the status of the book: ")? else {
            return Ok(());
        };

        let book_id = self.store.add_book(&title, &author, &isbn, &status)?;
        writeln!(self.output, "Book added successfully! BookID: {book_id}")?;
        Ok(())
    }

    fn book_details(&mut self) -> Result<(), CliError> {
        let Some(book_id) = self.prompt_book_id()? else {
            return Ok(());
        };

        match self.store.get_book_details(book_id) {
            Ok(view) => {
                writeln!(self.output, "Title: {}", view.title)?;
                self.write_reservation(&view)?;
            }
            Err(e) if e.is_not_found() => writeln!(self.output, "Book not found!")?,
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn search(&mut self) -> Result<(), CliError> {
        let Some(query) = self.prompt("Enter the BookID, Title, UserID, or ReservationID: ")?
        else {
            return Ok(());
        };

        let views = self.store.search(&query)?;
        if views.is_empty() {
            writeln!(self.output, "Book not found!")?;
        } else {
            self.write_views(&views)?;
        }
        Ok(())
    }

    fn list_all(&mut self) -> Result<(), CliError> {
        let views = self.store.list_all()?;
        if views.is_empty() {
            writeln!(self.output, "No books found!")?;
        } else {
            self.write_views(&views)?;
        }
        Ok(())
    }

    fn update_book(&mut self) -> Result<(), CliError> {
        let Some(book_id) = self.prompt_book_id()? else {
            return Ok(());
        };

        let book = match self.store.get_book(book_id) {
            Ok(book) => book,
            Err(e) if e.is_not_found() => {
                writeln!(self.output, "Book not found!")?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        writeln!(self.output, "Current Book Details:")?;
        writeln!(self.output, "Title: {}", book.title)?;
        writeln!(self.output, "Author: {}", book.author)?;
        writeln!(self.output, "ISBN: {}", book.isbn)?;
        writeln!(self.output, "Status: {}", book.status)?;

        let names: Vec<&str> = BookField::ALL.iter().map(|f| f.as_str()).collect();
        let label = format!("Choose the field to modify ({}): ", names.join("/"));
        let Some(choice) = self.prompt(&label)? else {
            return Ok(());
        };
        let choice = choice.trim();
        // Only picks the prompt wording; the store validates the name again.
        let Ok(field) = choice.parse::<BookField>() else {
            writeln!(self.output, "Invalid choice!")?;
            return Ok(());
        };

        let Some(new_value) = self.prompt(&format!("Enter the new {}: ", value_label(field)))?
        else {
            return Ok(());
        };

        match self.store.update_book_field(book_id, choice, &new_value) {
            Ok(()) => writeln!(self.output, "Book details updated successfully!")?,
            Err(CatalogError::InvalidField(_)) => writeln!(self.output, "Invalid choice!")?,
            Err(CatalogError::BookNotFound(_)) => writeln!(self.output, "Book not found!")?,
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn delete_book(&mut self) -> Result<(), CliError> {
        let Some(book_id) = self.prompt_book_id()? else {
            return Ok(());
        };

        match self.store.delete_book(book_id) {
            Ok(_) => writeln!(self.output, "Book deleted successfully!")?,
            Err(e) if e.is_not_found() => writeln!(self.output, "Book not found!")?,
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn write_views(&mut self, views: &[BookView]) -> Result<(), CliError> {
        for view in views {
            writeln!(self.output, "BookID: {}", view.book_id)?;
            writeln!(self.output, "Title: {}", view.title)?;
            self.write_reservation(view)?;
            writeln!(self.output, "---")?;
        }
        Ok(())
    }

    fn write_reservation(&mut self, view: &BookView) -> Result<(), CliError> {
        writeln!(self.output, "Reservation Status: {}", view.status)?;
        if let Some(reserver) = view.reserver() {
            writeln!(self.output, "Reserved by: {}", reserver.name)?;
            writeln!(self.output, "Email: {}", reserver.email)?;
        }
        Ok(())
    }
}

/// How a field is named in the "Enter the new ..." prompt.
fn value_label(field: BookField) -> &'static str {
    match field {
        BookField::Title => "title",
        BookField::Author => "author",
        BookField::Isbn => "ISBN",
        BookField::Status => "status",
    }
}
