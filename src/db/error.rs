//! Error types for catalog operations.
//!
//! Malformed input is a [`ValidationError`]. A broken business rule or a
//! persistence failure is a [`CatalogError`] variant of its own, so callers
//! can tell them apart without string matching.

use thiserror::Error;

/// Input that was missing or malformed before any query ran.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in the {0}.")]
    MissingField(&'static str),

    #[error("Please enter a valid year (4 digits), got '{0}'.")]
    InvalidYear(String),

    #[error("ISBN must be numeric, got '{0}'.")]
    InvalidIsbn(String),

    #[error("Total must be a positive integer, got {0}.")]
    NonPositiveTotal(i64),

    #[error("Quantity must be a positive integer, got {0}.")]
    NonPositiveQuantity(i64),
}

/// Errors surfaced by [`Catalog`](crate::db::Catalog) operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The ISBN is already bound to a book with different content.
    #[error("A different book with ISBN {isbn} already exists.")]
    IsbnConflict { isbn: i64 },

    #[error("Book {0} not found.")]
    NotFound(i64),

    /// The record changed between planning and applying a delete.
    #[error("Book {id} changed since the delete was prepared; please retry.")]
    StalePlan { id: i64 },

    #[error("database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("backup error: {0}")]
    Backup(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used by the shell to pick a message style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    Missing,
    Storage,
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Validation(_) => ErrorKind::Validation,
            CatalogError::IsbnConflict { .. } | CatalogError::StalePlan { .. } => {
                ErrorKind::Conflict
            }
            CatalogError::NotFound(_) => ErrorKind::Missing,
            CatalogError::Storage(_) | CatalogError::Backup(_) | CatalogError::Io(_) => {
                ErrorKind::Storage
            }
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

/// Convenience alias for results with [`CatalogError`].
pub type Result<T> = std::result::Result<T, CatalogError>;
