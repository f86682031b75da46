use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Cell, Row};

use crate::db::{CatalogError, ErrorKind};
use crate::models::Book;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Catalog classification of an error, if it came from the store.
pub(crate) fn catalog_error_kind(err: &Error) -> Option<ErrorKind> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<CatalogError>())
        .map(CatalogError::kind)
}

/// One table row. Low-stock records are tinted; the selected record is bold.
pub(crate) fn book_row(book: &Book, low_stock_threshold: i64, selected_id: Option<i64>) -> Row<'static> {
    let mut style = Style::default();
    if book.is_low_stock(low_stock_threshold) {
        style = style.fg(Color::Yellow);
    }
    if selected_id == Some(book.id) {
        style = style.add_modifier(Modifier::BOLD);
    }
    Row::new(book.cells().into_iter().map(Cell::from)).style(style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ValidationError;
    use anyhow::Context;

    #[test]
    fn surfaces_innermost_cause() {
        let err = Err::<(), _>(std::io::Error::other("disk full"))
            .context("failed to write backup")
            .unwrap_err();
        assert_eq!(surface_error(&err), "disk full");
    }

    #[test]
    fn classifies_catalog_errors_through_context() {
        let err = Err::<(), _>(CatalogError::from(ValidationError::NonPositiveTotal(0)))
            .context("failed to add book")
            .unwrap_err();
        assert_eq!(catalog_error_kind(&err), Some(ErrorKind::Validation));

        let plain = anyhow::anyhow!("Total is required.");
        assert_eq!(catalog_error_kind(&plain), None);
    }

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(60, 50, area);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.height, 20);
        assert!(popup.x >= area.x && popup.right() <= area.right());
    }
}
