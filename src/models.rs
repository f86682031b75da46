//! Domain models that mirror the `book` table and get passed between the
//! catalog store and the TUI. The typed `Book`/`NewBook` pair only exists after
//! validation; raw form input travels as `BookInput` until then.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A persisted book holding. The serde renames double as the backup CSV
/// header, so the field order here is the column order on disk.
pub struct Book {
    /// Primary key assigned by SQLite. Never changes after creation.
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Title")]
    pub title: String,
    /// May be empty for records created through `insert`.
    #[serde(rename = "Author")]
    pub author: String,
    #[serde(rename = "Year")]
    pub year: i64,
    #[serde(rename = "ISBN")]
    pub isbn: i64,
    /// Copies held. Always at least one for a live row.
    #[serde(rename = "Total")]
    pub total: i64,
}

impl Book {
    /// Whether this record is under the low-stock threshold.
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.total < threshold
    }

    /// Cell values in table column order. The TUI sorts and renders these
    /// strings directly.
    pub fn cells(&self) -> [String; 6] {
        [
            self.id.to_string(),
            self.title.clone(),
            self.author.clone(),
            self.year.to_string(),
            self.isbn.to_string(),
            self.total.to_string(),
        ]
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.author.trim().is_empty() {
            write!(f, "{} ({})", self.title, self.year)
        } else {
            write!(f, "{} - {} ({})", self.title, self.author, self.year)
        }
    }
}

/// Raw field values as typed by the user. Year and ISBN stay textual so the
/// validator can tell "19" apart from "0019".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookInput {
    pub title: String,
    pub author: String,
    pub year: String,
    pub isbn: String,
    pub total: i64,
}

impl BookInput {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        year: impl Into<String>,
        isbn: impl Into<String>,
        total: i64,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            year: year.into(),
            isbn: isbn.into(),
            total,
        }
    }
}

/// Validated insert/update payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub year: i64,
    pub isbn: i64,
    pub total: i64,
}

impl NewBook {
    pub(crate) fn into_book(self, id: i64) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            year: self.year,
            isbn: self.isbn,
            total: self.total,
        }
    }
}

/// Exact-match search. Blank fields are not filtered on.
#[derive(Debug, Clone, Default)]
pub struct SearchCriteria {
    pub title: String,
    pub author: String,
    pub year: String,
    pub isbn: String,
}

impl SearchCriteria {
    pub fn is_empty(&self) -> bool {
        [&self.title, &self.author, &self.year, &self.isbn]
            .iter()
            .all(|value| value.trim().is_empty())
    }
}

/// Substring and year-range search. Malformed year bounds are dropped rather
/// than rejected.
#[derive(Debug, Clone, Default)]
pub struct AdvancedSearchCriteria {
    pub title: String,
    pub author: String,
    pub start_year: String,
    pub end_year: String,
    pub isbn: String,
}

impl AdvancedSearchCriteria {
    pub fn is_empty(&self) -> bool {
        [
            &self.title,
            &self.author,
            &self.start_year,
            &self.end_year,
            &self.isbn,
        ]
        .iter()
        .all(|value| value.trim().is_empty())
    }
}

/// Result of `Catalog::insert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Identical content already existed; its total grew to `total`.
    Merged { id: i64, added: i64, total: i64 },
    Created(Book),
}

/// What a delete would do to the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteEffect {
    Decrement { remaining: i64 },
    Remove,
    ExceedsStock { held: i64, requested: i64 },
}

impl DeleteEffect {
    /// Effect of removing `quantity` copies from a record holding `held`.
    pub fn for_quantity(held: i64, quantity: i64) -> Self {
        if held > quantity {
            DeleteEffect::Decrement {
                remaining: held - quantity,
            }
        } else if held == quantity {
            DeleteEffect::Remove
        } else {
            DeleteEffect::ExceedsStock {
                held,
                requested: quantity,
            }
        }
    }
}

/// Read-only description of a pending delete. Produced by
/// `Catalog::plan_delete` and consumed by `Catalog::apply_delete`.
///
/// Fields stay crate-private so the effect always matches the record and
/// quantity it was planned from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePlan {
    pub(crate) book: Book,
    pub(crate) quantity: i64,
    pub(crate) effect: DeleteEffect,
}

impl DeletePlan {
    pub(crate) fn new(book: Book, quantity: i64) -> Self {
        let effect = DeleteEffect::for_quantity(book.total, quantity);
        Self {
            book,
            quantity,
            effect,
        }
    }

    /// Only row removal has to be confirmed by the user.
    pub fn needs_confirmation(&self) -> bool {
        matches!(self.effect, DeleteEffect::Remove)
    }

    pub fn id(&self) -> i64 {
        self.book.id
    }

    /// Copies held when the plan was made.
    pub fn held(&self) -> i64 {
        self.book.total
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn effect(&self) -> DeleteEffect {
        self.effect
    }

    pub fn book(&self) -> &Book {
        &self.book
    }
}

/// Answer from whoever owns the confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Granted,
    Declined,
}

/// Result of applying a `DeletePlan`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Decremented { id: i64, remaining: i64 },
    Removed { id: i64 },
    /// Informational: nothing changed because too many copies were requested.
    ExceedsStock { id: i64, held: i64, requested: i64 },
    Cancelled { id: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_criteria_count_as_empty() {
        let criteria = SearchCriteria {
            title: "  ".into(),
            ..Default::default()
        };
        assert!(criteria.is_empty());

        let advanced = AdvancedSearchCriteria {
            end_year: "2001".into(),
            ..Default::default()
        };
        assert!(!advanced.is_empty());
    }

    #[test]
    fn only_remove_needs_confirmation() {
        let book = Book {
            id: 1,
            title: "Dune".into(),
            author: "Frank Herbert".into(),
            year: 1965,
            isbn: 9780441013593,
            total: 3,
        };
        assert!(DeletePlan::new(book.clone(), 3).needs_confirmation());

        let partial = DeletePlan::new(book.clone(), 2);
        assert_eq!(partial.effect(), DeleteEffect::Decrement { remaining: 1 });
        assert!(!partial.needs_confirmation());

        let too_many = DeletePlan::new(book, 4);
        assert_eq!(
            too_many.effect(),
            DeleteEffect::ExceedsStock {
                held: 3,
                requested: 4
            }
        );
        assert!(!too_many.needs_confirmation());
    }
}
