use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

use crate::models::Book;

use super::error::Result;

/// Column list shared by every `SELECT` so `book_from_row` can rely on
/// positional access.
pub(crate) const BOOK_COLUMNS: &str = "id, title, author, year, isbn, total";

pub(crate) fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        year: row.get(3)?,
        isbn: row.get(4)?,
        total: row.get(5)?,
    })
}

/// Accumulates `AND`-joined predicates with their bound values. Predicates
/// are static strings with a single `?` placeholder, so user input only ever
/// reaches SQLite as a parameter.
#[derive(Default)]
pub(crate) struct BookFilter {
    clauses: Vec<&'static str>,
    params: Vec<Value>,
}

impl BookFilter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, clause: &'static str, value: impl Into<Value>) -> &mut Self {
        self.clauses.push(clause);
        self.params.push(value.into());
        self
    }

    fn sql(&self) -> String {
        let mut sql = format!("SELECT {BOOK_COLUMNS} FROM book");
        if !self.clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY id");
        sql
    }

    /// Run the filter and collect matching rows in storage order.
    pub(crate) fn fetch(&self, conn: &Connection) -> Result<Vec<Book>> {
        let mut stmt = conn.prepare(&self.sql())?;
        let books = stmt
            .query_map(params_from_iter(self.params.iter()), book_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(books)
    }
}

/// Bind an ISBN criterion as an integer when it is one, so it compares
/// against the INTEGER column directly. Anything else stays text and simply
/// matches nothing.
pub(crate) fn isbn_value(raw: &str) -> Value {
    match raw.parse::<i64>() {
        Ok(isbn) => Value::Integer(isbn),
        Err(_) => Value::Text(raw.to_string()),
    }
}
