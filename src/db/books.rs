use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::{debug, info, warn};

use crate::models::{
    AdvancedSearchCriteria, Book, BookInput, Confirmation, DeleteEffect, DeleteOutcome,
    DeletePlan, InsertOutcome, SearchCriteria,
};

use super::backup::write_backup;
use super::connection::{connect, ensure_schema};
use super::error::{CatalogError, Result};
use super::query::{book_from_row, isbn_value, BookFilter, BOOK_COLUMNS};
use super::validate::{parse_year, parse_year_bound, validate_book, validate_quantity, Rules};

/// Threshold used by the low-stock check when the caller has no preference.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Handle to the on-disk book catalog.
///
/// The handle only remembers where the database lives. Every operation opens
/// its own connection and drops it before returning, and every write runs in
/// a single transaction that rolls back if anything fails part-way.
#[derive(Debug, Clone)]
pub struct Catalog {
    path: PathBuf,
}

impl Catalog {
    /// Create the database (and its directory) if needed and return a handle.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        ensure_schema(&path)?;
        info!(path = %path.display(), "catalog opened");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        connect(&self.path)
    }

    /// Add copies of a book. Identical content merges into the existing row;
    /// an ISBN already bound to different content is rejected.
    pub fn insert(&self, input: &BookInput) -> Result<InsertOutcome> {
        let book = validate_book(input, Rules::Insert)?;

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        let existing: Option<(i64, i64)> = tx
            .query_row(
                "SELECT id, total FROM book
                 WHERE title = ?1 AND author = ?2 AND year = ?3 AND isbn = ?4
                 ORDER BY id LIMIT 1",
                params![book.title, book.author, book.year, book.isbn],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let outcome = if let Some((id, held)) = existing {
            let total = held.saturating_add(book.total);
            tx.execute(
                "UPDATE book SET total = ?1 WHERE id = ?2",
                params![total, id],
            )?;
            InsertOutcome::Merged {
                id,
                added: book.total,
                total,
            }
        } else {
            let conflicting: Option<i64> = tx
                .query_row(
                    "SELECT id FROM book
                     WHERE isbn = ?1 AND (title <> ?2 OR author <> ?3 OR year <> ?4)
                     LIMIT 1",
                    params![book.isbn, book.title, book.author, book.year],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(other) = conflicting {
                warn!(isbn = book.isbn, other, "insert rejected: isbn bound to other content");
                return Err(CatalogError::IsbnConflict { isbn: book.isbn });
            }

            tx.execute(
                "INSERT INTO book (title, author, year, isbn, total) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![book.title, book.author, book.year, book.isbn, book.total],
            )?;
            let id = tx.last_insert_rowid();
            InsertOutcome::Created(book.into_book(id))
        };

        tx.commit()?;
        info!(?outcome, "insert committed");
        Ok(outcome)
    }

    /// Every record in storage order.
    pub fn view(&self) -> Result<Vec<Book>> {
        let conn = self.connect()?;
        BookFilter::new().fetch(&conn)
    }

    pub fn get(&self, id: i64) -> Result<Option<Book>> {
        let conn = self.connect()?;
        fetch_one(&conn, id)
    }

    /// Exact-match search on the provided fields. A year that is not four
    /// digits fails validation instead of silently matching nothing.
    pub fn search(&self, criteria: &SearchCriteria) -> Result<Vec<Book>> {
        let mut filter = BookFilter::new();

        let title = criteria.title.trim();
        if !title.is_empty() {
            filter.push("title = ?", title.to_string());
        }
        let author = criteria.author.trim();
        if !author.is_empty() {
            filter.push("author = ?", author.to_string());
        }
        let year = criteria.year.trim();
        if !year.is_empty() {
            filter.push("year = ?", parse_year(year)?);
        }
        let isbn = criteria.isbn.trim();
        if !isbn.is_empty() {
            filter.push("isbn = ?", isbn_value(isbn));
        }

        let conn = self.connect()?;
        let books = filter.fetch(&conn)?;
        debug!(?criteria, matches = books.len(), "search");
        Ok(books)
    }

    /// Case-sensitive containment on title/author/ISBN plus an optional year
    /// range. Range bounds that are not plain digits are ignored.
    pub fn advanced_search(&self, criteria: &AdvancedSearchCriteria) -> Result<Vec<Book>> {
        let mut filter = BookFilter::new();

        // `instr` instead of LIKE: LIKE folds ASCII case.
        let title = criteria.title.trim();
        if !title.is_empty() {
            filter.push("instr(title, ?) > 0", title.to_string());
        }
        let author = criteria.author.trim();
        if !author.is_empty() {
            filter.push("instr(author, ?) > 0", author.to_string());
        }
        if let Some(start) = parse_year_bound(&criteria.start_year) {
            filter.push("year >= ?", start);
        }
        if let Some(end) = parse_year_bound(&criteria.end_year) {
            filter.push("year <= ?", end);
        }
        let isbn = criteria.isbn.trim();
        if !isbn.is_empty() {
            filter.push("instr(CAST(isbn AS TEXT), ?) > 0", isbn.to_string());
        }

        let conn = self.connect()?;
        let books = filter.fetch(&conn)?;
        debug!(?criteria, matches = books.len(), "advanced search");
        Ok(books)
    }

    /// Overwrite every mutable field of an existing record. The ISBN may not
    /// be held by any other record, whatever that record contains.
    pub fn update(&self, id: i64, input: &BookInput) -> Result<Book> {
        let book = validate_book(input, Rules::Update)?;

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        if fetch_one(&tx, id)?.is_none() {
            return Err(CatalogError::NotFound(id));
        }

        let taken: Option<i64> = tx
            .query_row(
                "SELECT id FROM book WHERE isbn = ?1 AND id <> ?2 LIMIT 1",
                params![book.isbn, id],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(other) = taken {
            warn!(id, other, isbn = book.isbn, "update rejected: isbn held by another record");
            return Err(CatalogError::IsbnConflict { isbn: book.isbn });
        }

        tx.execute(
            "UPDATE book SET title = ?1, author = ?2, year = ?3, isbn = ?4, total = ?5
             WHERE id = ?6",
            params![book.title, book.author, book.year, book.isbn, book.total, id],
        )?;
        tx.commit()?;

        info!(id, "update committed");
        Ok(book.into_book(id))
    }

    /// Work out what removing `quantity` copies would do, without touching
    /// the table.
    pub fn plan_delete(&self, id: i64, quantity: i64) -> Result<DeletePlan> {
        let quantity = validate_quantity(quantity)?;
        let book = self.get(id)?.ok_or(CatalogError::NotFound(id))?;
        Ok(DeletePlan::new(book, quantity))
    }

    /// Plan removal of the whole record regardless of its total.
    pub fn plan_delete_all(&self, id: i64) -> Result<DeletePlan> {
        let book = self.get(id)?.ok_or(CatalogError::NotFound(id))?;
        let quantity = book.total;
        Ok(DeletePlan::new(book, quantity))
    }

    /// Carry out a plan. Row removal only happens with
    /// `Confirmation::Granted`; the other effects ignore the token. The
    /// effect is worked out again from the stored total, and a plan that no
    /// longer matches it is refused.
    pub fn apply_delete(&self, plan: &DeletePlan, confirmation: Confirmation) -> Result<DeleteOutcome> {
        let id = plan.id();
        match plan.effect {
            DeleteEffect::ExceedsStock { held, requested } => {
                info!(id, held, requested, "delete skipped: quantity exceeds stock");
                return Ok(DeleteOutcome::ExceedsStock {
                    id,
                    held,
                    requested,
                });
            }
            DeleteEffect::Remove if confirmation == Confirmation::Declined => {
                debug!(id, "delete cancelled");
                return Ok(DeleteOutcome::Cancelled { id });
            }
            DeleteEffect::Remove | DeleteEffect::Decrement { .. } => {}
        }

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let held = current_total(&tx, id)?;
        if held != plan.held() || DeleteEffect::for_quantity(held, plan.quantity) != plan.effect {
            warn!(id, held, planned = plan.held(), "delete refused: plan no longer matches record");
            return Err(CatalogError::StalePlan { id });
        }

        let outcome = match plan.effect {
            DeleteEffect::Decrement { remaining } => {
                tx.execute(
                    "UPDATE book SET total = ?1 WHERE id = ?2",
                    params![remaining, id],
                )?;
                DeleteOutcome::Decremented { id, remaining }
            }
            DeleteEffect::Remove => {
                tx.execute("DELETE FROM book WHERE id = ?1", params![id])?;
                DeleteOutcome::Removed { id }
            }
            DeleteEffect::ExceedsStock { held, requested } => DeleteOutcome::ExceedsStock {
                id,
                held,
                requested,
            },
        };

        tx.commit()?;
        info!(?outcome, "delete committed");
        Ok(outcome)
    }

    /// Remove `quantity` copies in one call.
    pub fn delete(&self, id: i64, quantity: i64, confirmation: Confirmation) -> Result<DeleteOutcome> {
        let plan = self.plan_delete(id, quantity)?;
        self.apply_delete(&plan, confirmation)
    }

    /// Remove the record entirely in one call.
    pub fn delete_all(&self, id: i64, confirmation: Confirmation) -> Result<DeleteOutcome> {
        let plan = self.plan_delete_all(id)?;
        self.apply_delete(&plan, confirmation)
    }

    /// Records holding fewer than `threshold` copies.
    pub fn check_low_stock(&self, threshold: i64) -> Result<Vec<Book>> {
        let mut filter = BookFilter::new();
        filter.push("total < ?", threshold);
        let conn = self.connect()?;
        filter.fetch(&conn)
    }

    /// Dump every record to `destination` as CSV and return the path used.
    pub fn backup(&self, destination: impl AsRef<Path>) -> Result<PathBuf> {
        let destination = destination.as_ref();
        let books = self.view()?;
        write_backup(destination, &books)?;
        info!(path = %destination.display(), records = books.len(), "backup written");
        Ok(destination.to_path_buf())
    }
}

fn fetch_one(conn: &Connection, id: i64) -> Result<Option<Book>> {
    let book = conn
        .query_row(
            &format!("SELECT {BOOK_COLUMNS} FROM book WHERE id = ?1"),
            params![id],
            book_from_row,
        )
        .optional()?;
    Ok(book)
}

fn current_total(tx: &Transaction<'_>, id: i64) -> Result<i64> {
    tx.query_row("SELECT total FROM book WHERE id = ?1", params![id], |row| {
        row.get(0)
    })
    .optional()?
    .ok_or(CatalogError::NotFound(id))
}
