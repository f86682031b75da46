use std::cmp::Ordering;

use crate::models::Book;

/// Table columns in display order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Column {
    Id,
    Title,
    Author,
    Year,
    Isbn,
    Total,
}

impl Column {
    pub(crate) const ALL: [Column; 6] = [
        Column::Id,
        Column::Title,
        Column::Author,
        Column::Year,
        Column::Isbn,
        Column::Total,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            Column::Id => 0,
            Column::Title => 1,
            Column::Author => 2,
            Column::Year => 3,
            Column::Isbn => 4,
            Column::Total => 5,
        }
    }

    pub(crate) fn heading(self) -> &'static str {
        match self {
            Column::Id => "ID",
            Column::Title => "Title",
            Column::Author => "Author",
            Column::Year => "Year",
            Column::Isbn => "ISBN",
            Column::Total => "Total",
        }
    }

    /// Digit keys `1`..`6` pick a column.
    pub(crate) fn from_key(ch: char) -> Option<Self> {
        let digit = ch.to_digit(10)? as usize;
        Self::ALL.get(digit.checked_sub(1)?).copied()
    }
}

/// Which column the table is sorted by. Re-activating the same column flips
/// the direction; a new column starts ascending.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SortState {
    column: Option<Column>,
    descending: bool,
}

impl SortState {
    pub(crate) fn activate(&mut self, column: Column) {
        if self.column == Some(column) {
            self.descending = !self.descending;
        } else {
            self.column = Some(column);
            self.descending = false;
        }
    }

    pub(crate) fn apply(&self, books: &mut Vec<Book>) {
        if let Some(column) = self.column {
            sort_by_column(books, column, self.descending);
        }
    }

    pub(crate) fn indicator(&self, column: Column) -> &'static str {
        match (self.column == Some(column), self.descending) {
            (false, _) => "",
            (true, false) => " ^",
            (true, true) => " v",
        }
    }

    pub(crate) fn describe(&self) -> Option<String> {
        self.column.map(|column| {
            let direction = if self.descending {
                "descending"
            } else {
                "ascending"
            };
            format!("Sorted by {} ({direction}).", column.heading())
        })
    }
}

enum SortKey {
    Number(f64),
    Text(String),
}

fn compare_keys(a: &SortKey, b: &SortKey) -> Ordering {
    match (a, b) {
        (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(y),
        (SortKey::Text(x), SortKey::Text(y)) => x.cmp(y),
        // Keys in one column are always built the same way.
        (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
        (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
    }
}

/// Plain decimal numbers only. `f64::from_str` alone would also take words
/// such as "inf" or "NaN" and exponents like "1e3".
fn numeric_key(cell: &str) -> Option<f64> {
    let plain = cell.bytes().any(|b| b.is_ascii_digit())
        && cell
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.'));
    if plain {
        cell.parse().ok()
    } else {
        None
    }
}

/// Stable sort on the rendered cell text. A column compares numerically only
/// when every cell parses as a number; otherwise it falls back to
/// case-insensitive text for all rows.
pub(crate) fn sort_by_column(books: &mut Vec<Book>, column: Column, descending: bool) {
    let idx = column.index();
    let cells: Vec<String> = books
        .iter()
        .map(|book| book.cells()[idx].trim().to_string())
        .collect();
    let numeric = cells.iter().all(|cell| numeric_key(cell).is_some());

    let mut keyed: Vec<(SortKey, Book)> = cells
        .into_iter()
        .zip(books.drain(..))
        .map(|(cell, book)| {
            let key = match numeric_key(&cell) {
                Some(number) if numeric => SortKey::Number(number),
                _ => SortKey::Text(cell.to_lowercase()),
            };
            (key, book)
        })
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        let ordering = compare_keys(a, b);
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });

    books.extend(keyed.into_iter().map(|(_, book)| book));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: i64, title: &str, year: i64, total: i64) -> Book {
        Book {
            id,
            title: title.to_string(),
            author: String::new(),
            year,
            isbn: 1000 + id,
            total,
        }
    }

    fn ids(books: &[Book]) -> Vec<i64> {
        books.iter().map(|b| b.id).collect()
    }

    #[test]
    fn numbers_sort_numerically_not_lexically() {
        let mut books = vec![book(1, "a", 2000, 10), book(2, "b", 2000, 9), book(3, "c", 2000, 100)];
        sort_by_column(&mut books, Column::Total, false);
        assert_eq!(ids(&books), vec![2, 1, 3]);
    }

    #[test]
    fn text_sorts_case_insensitively() {
        let mut books = vec![book(1, "beta", 2000, 1), book(2, "Alpha", 2000, 1), book(3, "gamma", 2000, 1)];
        sort_by_column(&mut books, Column::Title, false);
        assert_eq!(ids(&books), vec![2, 1, 3]);
    }

    #[test]
    fn mixed_column_falls_back_to_text() {
        let mut books = vec![book(1, "10", 2000, 1), book(2, "9", 2000, 1), book(3, "Ninety", 2000, 1)];
        sort_by_column(&mut books, Column::Title, false);
        assert_eq!(ids(&books), vec![1, 2, 3]);
    }

    #[test]
    fn float_words_and_exponents_sort_as_text() {
        let mut books = vec![book(1, "200", 2000, 1), book(2, "1e3", 2000, 1), book(3, "inf", 2000, 1)];
        sort_by_column(&mut books, Column::Title, false);
        assert_eq!(ids(&books), vec![2, 1, 3]);

        let mut words = vec![book(1, "Infinity", 2000, 1), book(2, "10", 2000, 1), book(3, "9", 2000, 1)];
        sort_by_column(&mut words, Column::Title, false);
        assert_eq!(ids(&words), vec![2, 3, 1]);
    }

    #[test]
    fn negative_and_decimal_numbers_stay_numeric() {
        assert_eq!(numeric_key("-12.5"), Some(-12.5));
        assert_eq!(numeric_key("+3"), Some(3.0));
        assert_eq!(numeric_key("-"), None);
        assert_eq!(numeric_key("1.2.3"), None);
    }

    #[test]
    fn same_column_toggles_direction() {
        let mut state = SortState::default();
        let mut books = vec![book(1, "a", 1990, 1), book(2, "b", 2010, 1), book(3, "c", 2000, 1)];

        state.activate(Column::Year);
        state.apply(&mut books);
        assert_eq!(ids(&books), vec![1, 3, 2]);

        state.activate(Column::Year);
        state.apply(&mut books);
        assert_eq!(ids(&books), vec![2, 3, 1]);

        state.activate(Column::Id);
        state.apply(&mut books);
        assert_eq!(ids(&books), vec![1, 2, 3]);
        assert_eq!(state.indicator(Column::Id), " ^");
        assert_eq!(state.indicator(Column::Year), "");
    }

    #[test]
    fn digit_keys_map_to_columns() {
        assert_eq!(Column::from_key('1'), Some(Column::Id));
        assert_eq!(Column::from_key('6'), Some(Column::Total));
        assert_eq!(Column::from_key('0'), None);
        assert_eq!(Column::from_key('7'), None);
        assert_eq!(Column::from_key('x'), None);
    }
}
