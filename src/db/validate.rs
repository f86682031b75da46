use crate::models::{BookInput, NewBook};

use super::error::ValidationError;

/// Which required-field rule applies. Inserts tolerate a blank author,
/// updates do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rules {
    Insert,
    Update,
}

/// Check a raw input against the field rules and return the typed payload.
/// Text fields are trimmed before they are stored.
pub(crate) fn validate_book(input: &BookInput, rules: Rules) -> Result<NewBook, ValidationError> {
    let title = input.title.trim();
    let author = input.author.trim();
    let year = input.year.trim();
    let isbn = input.isbn.trim();

    if title.is_empty() {
        return Err(ValidationError::MissingField("title"));
    }
    if rules == Rules::Update && author.is_empty() {
        return Err(ValidationError::MissingField("author"));
    }
    if rules == Rules::Update && year.is_empty() {
        return Err(ValidationError::MissingField("year"));
    }
    if isbn.is_empty() {
        return Err(ValidationError::MissingField("ISBN"));
    }

    let year = parse_year(year)?;
    let isbn = parse_isbn(isbn)?;
    if input.total < 1 {
        return Err(ValidationError::NonPositiveTotal(input.total));
    }

    Ok(NewBook {
        title: title.to_string(),
        author: author.to_string(),
        year,
        isbn,
        total: input.total,
    })
}

/// Exactly four ASCII digits.
pub(crate) fn is_four_digit_year(raw: &str) -> bool {
    raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit())
}

pub(crate) fn parse_year(raw: &str) -> Result<i64, ValidationError> {
    let raw = raw.trim();
    if !is_four_digit_year(raw) {
        return Err(ValidationError::InvalidYear(raw.to_string()));
    }
    raw.parse::<i64>()
        .map_err(|_| ValidationError::InvalidYear(raw.to_string()))
}

/// Lenient bound parsing for range filters: anything that is not a plain
/// digit string is treated as absent.
pub(crate) fn parse_year_bound(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<i64>().ok()
}

fn parse_isbn(raw: &str) -> Result<i64, ValidationError> {
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidIsbn(raw.to_string()));
    }
    raw.parse::<i64>()
        .map_err(|_| ValidationError::InvalidIsbn(raw.to_string()))
}

pub(crate) fn validate_quantity(quantity: i64) -> Result<i64, ValidationError> {
    if quantity < 1 {
        Err(ValidationError::NonPositiveQuantity(quantity))
    } else {
        Ok(quantity)
    }
}
