use std::mem;
use std::path::PathBuf;

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::db::{Catalog, ErrorKind};
use crate::models::{Book, Confirmation, DeleteEffect, DeleteOutcome, DeletePlan, InsertOutcome};

use super::forms::{Form, FormPurpose};
use super::helpers::{book_row, catalog_error_kind, centered_rect, surface_error};
use super::sort::{Column, SortState};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height of the "selected book" banner above the table.
const SELECTION_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown.
const PAGE_STEP: isize = 5;

/// Per-window interaction state: the record the user picked and how the
/// table is sorted. Lives on `App` so handlers receive it explicitly.
#[derive(Debug, Default)]
pub(crate) struct Session {
    pub(crate) selected: Option<Book>,
    pub(crate) sort: SortState,
}

impl Session {
    pub(crate) fn select(&mut self, book: Book) {
        self.selected = Some(book);
    }

    /// "New": forget the current selection.
    pub(crate) fn clear(&mut self) {
        self.selected = None;
    }

    fn selected_id(&self) -> Option<i64> {
        self.selected.as_ref().map(|book| book.id)
    }
}

/// What the table is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Listing {
    All,
    Search,
    AdvancedSearch,
    LowStock,
}

/// Fine-grained modes layered over the table.
enum Mode {
    Normal,
    Editing(Form),
    ConfirmDelete(DeletePlan),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Info,
    Warning,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Warning => Style::default().fg(Color::Yellow),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }

    /// Malformed input is a warning; broken rules and storage failures are
    /// errors.
    fn for_error(err: &anyhow::Error) -> Self {
        match catalog_error_kind(err) {
            Some(ErrorKind::Validation) | None => StatusKind::Warning,
            Some(_) => StatusKind::Error,
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    catalog: Catalog,
    low_stock_threshold: i64,
    backup_path: PathBuf,
    rows: Vec<Book>,
    listing: Listing,
    cursor: usize,
    session: Session,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    /// Build the app and load every record for the first frame.
    pub fn new(catalog: Catalog, config: &AppConfig) -> Result<Self> {
        let mut app = Self {
            catalog,
            low_stock_threshold: config.low_stock_threshold,
            backup_path: config.backup_path.clone(),
            rows: Vec::new(),
            listing: Listing::All,
            cursor: 0,
            session: Session::default(),
            mode: Mode::Normal,
            status: None,
        };
        app.view_all()?;
        Ok(app)
    }

    /// Route a key press to the active mode. Returns `true` when the user
    /// asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Editing(form) => self.handle_form(code, form)?,
            Mode::ConfirmDelete(plan) => self.handle_confirm_delete(code, plan)?,
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Up => self.move_cursor(-1),
            KeyCode::Down => self.move_cursor(1),
            KeyCode::PageUp => self.move_cursor(-PAGE_STEP),
            KeyCode::PageDown => self.move_cursor(PAGE_STEP),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.rows.len().saturating_sub(1),
            KeyCode::Enter => match self.rows.get(self.cursor).cloned() {
                Some(book) => {
                    self.set_status(format!("Selected {book}."), StatusKind::Info);
                    self.session.select(book);
                }
                None => self.set_status("No book to select.", StatusKind::Warning),
            },
            KeyCode::Char('n') => {
                self.session.clear();
                self.set_status("Selection cleared.", StatusKind::Info);
            }
            KeyCode::Char('v') => {
                self.clear_status();
                if let Err(err) = self.view_all() {
                    self.report_error(&err);
                }
            }
            KeyCode::Char('a') => {
                self.clear_status();
                return Ok(Mode::Editing(Form::add()));
            }
            KeyCode::Char('u') => match self.session.selected.as_ref() {
                Some(book) => {
                    let form = Form::update(book);
                    self.clear_status();
                    return Ok(Mode::Editing(form));
                }
                None => self.set_status("Please select a book to update.", StatusKind::Warning),
            },
            KeyCode::Char('s') | KeyCode::Char('/') => {
                self.clear_status();
                return Ok(Mode::Editing(Form::search()));
            }
            KeyCode::Char('f') => {
                self.clear_status();
                return Ok(Mode::Editing(Form::advanced_search()));
            }
            KeyCode::Char('d') => match self.session.selected.as_ref() {
                Some(book) => {
                    let form = Form::delete_quantity(book);
                    self.clear_status();
                    return Ok(Mode::Editing(form));
                }
                None => self.set_status("Please select a book to delete.", StatusKind::Warning),
            },
            KeyCode::Char('D') => match self.session.selected_id() {
                Some(id) => match self.catalog.plan_delete_all(id) {
                    Ok(plan) => {
                        self.clear_status();
                        return Ok(Mode::ConfirmDelete(plan));
                    }
                    Err(err) => self.report_error(&anyhow::Error::from(err)),
                },
                None => self.set_status("Please select a book to delete.", StatusKind::Warning),
            },
            KeyCode::Char('b') => self.backup(),
            KeyCode::Char('l') => {
                if let Err(err) = self.show_low_stock() {
                    self.report_error(&err);
                }
            }
            KeyCode::Char(ch) => {
                if let Some(column) = Column::from_key(ch) {
                    self.session.sort.activate(column);
                    self.session.sort.apply(&mut self.rows);
                    if let Some(message) = self.session.sort.describe() {
                        self.set_status(message, StatusKind::Info);
                    }
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_form(&mut self, code: KeyCode, mut form: Form) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status(format!("{} cancelled.", form.title()), StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Tab | KeyCode::Down => {
                form.toggle_field(false);
                Ok(Mode::Editing(form))
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.toggle_field(true);
                Ok(Mode::Editing(form))
            }
            KeyCode::Backspace => {
                form.backspace();
                Ok(Mode::Editing(form))
            }
            KeyCode::Enter => match self.submit(&form) {
                Ok(next) => Ok(next),
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::for_error(&err));
                    Ok(Mode::Editing(form))
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
                Ok(Mode::Editing(form))
            }
            _ => Ok(Mode::Editing(form)),
        }
    }

    /// Run the action behind a form. Errors keep the form open.
    fn submit(&mut self, form: &Form) -> Result<Mode> {
        match form.purpose {
            FormPurpose::Add => {
                let input = form.book_input()?;
                let outcome = self.catalog.insert(&input).context("failed to add book")?;
                let message = match outcome {
                    InsertOutcome::Merged { added, total, .. } => {
                        format!("The number of books was updated by {added} (now {total}).")
                    }
                    InsertOutcome::Created(book) => {
                        format!("Book '{}' added successfully!", book.title)
                    }
                };
                self.reload_with_status(message, StatusKind::Info);
                Ok(Mode::Normal)
            }
            FormPurpose::Update { id } => {
                let input = form.book_input()?;
                let book = self
                    .catalog
                    .update(id, &input)
                    .context("failed to update book")?;
                self.reload_with_status(format!("Updated {book}."), StatusKind::Info);
                Ok(Mode::Normal)
            }
            FormPurpose::Search => {
                let criteria = form.search_criteria();
                if criteria.is_empty() {
                    self.view_all()?;
                    self.set_status(
                        "Please fill in at least one field to search.",
                        StatusKind::Warning,
                    );
                    return Ok(Mode::Normal);
                }
                let books = self.catalog.search(&criteria).context("search failed")?;
                if books.is_empty() {
                    self.view_all()?;
                    self.set_status("No results found.", StatusKind::Info);
                } else {
                    self.set_status(format!("{} result(s).", books.len()), StatusKind::Info);
                    self.show(books, Listing::Search);
                }
                Ok(Mode::Normal)
            }
            FormPurpose::AdvancedSearch => {
                let criteria = form.advanced_criteria();
                if criteria.is_empty() {
                    self.set_status(
                        "Please fill in at least one field to search.",
                        StatusKind::Warning,
                    );
                    return Ok(Mode::Editing(form.clone()));
                }
                let books = self
                    .catalog
                    .advanced_search(&criteria)
                    .context("advanced search failed")?;
                if books.is_empty() {
                    self.set_status("No results found.", StatusKind::Info);
                } else {
                    self.set_status(format!("{} result(s).", books.len()), StatusKind::Info);
                }
                self.show(books, Listing::AdvancedSearch);
                Ok(Mode::Normal)
            }
            FormPurpose::DeleteQuantity { id } => {
                let quantity = form.quantity()?;
                let plan = self
                    .catalog
                    .plan_delete(id, quantity)
                    .context("failed to prepare delete")?;
                if plan.needs_confirmation() {
                    return Ok(Mode::ConfirmDelete(plan));
                }
                self.apply_delete(&plan, Confirmation::Granted)?;
                Ok(Mode::Normal)
            }
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, plan: DeletePlan) -> Result<Mode> {
        let confirmation = match code {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => Confirmation::Granted,
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => Confirmation::Declined,
            _ => return Ok(Mode::ConfirmDelete(plan)),
        };

        if let Err(err) = self.apply_delete(&plan, confirmation) {
            // Refresh so a stale row shows its current total.
            self.reload_with_status(surface_error(&err), StatusKind::for_error(&err));
        }
        Ok(Mode::Normal)
    }

    fn apply_delete(&mut self, plan: &DeletePlan, confirmation: Confirmation) -> Result<()> {
        let outcome = self
            .catalog
            .apply_delete(plan, confirmation)
            .context("failed to delete book")?;
        debug!(?outcome, "delete applied");

        match outcome {
            DeleteOutcome::Decremented { remaining, .. } => self.reload_with_status(
                format!(
                    "The number of books was updated by {} ({remaining} left).",
                    plan.quantity()
                ),
                StatusKind::Info,
            ),
            DeleteOutcome::Removed { .. } => {
                self.reload_with_status(format!("Deleted {}.", plan.book()), StatusKind::Info)
            }
            DeleteOutcome::ExceedsStock { held, requested, .. } => self.set_status(
                format!(
                    "Only {held} copies held, {requested} requested. Please check the quantity and try again."
                ),
                StatusKind::Info,
            ),
            DeleteOutcome::Cancelled { .. } => {
                self.set_status("Deletion cancelled.", StatusKind::Info)
            }
        }
        Ok(())
    }

    fn backup(&mut self) {
        match self.catalog.backup(&self.backup_path) {
            Ok(path) => {
                info!(path = %path.display(), "backup requested from shell");
                self.set_status(
                    format!("Backup completed successfully! File saved as: {}", path.display()),
                    StatusKind::Info,
                );
            }
            Err(err) => self.report_error(&anyhow::Error::from(err).context("backup failed")),
        }
    }

    fn show_low_stock(&mut self) -> Result<()> {
        let threshold = self.low_stock_threshold;
        let books = self
            .catalog
            .check_low_stock(threshold)
            .context("low stock check failed")?;
        if books.is_empty() {
            self.set_status(
                format!("No books with stock less than {threshold}."),
                StatusKind::Info,
            );
        } else {
            self.set_status(
                format!("Books with stock less than {threshold} are displayed."),
                StatusKind::Warning,
            );
            self.show(books, Listing::LowStock);
        }
        Ok(())
    }

    /// Reload every record and clear the selection, like pressing "New".
    fn view_all(&mut self) -> Result<()> {
        let books = self.catalog.view().context("failed to load books")?;
        self.session.clear();
        self.show(books, Listing::All);
        Ok(())
    }

    /// Reload the table, then show `message`. A failed reload is appended to
    /// the message instead of failing the caller, so a committed write is
    /// never offered for resubmission.
    fn reload_with_status(&mut self, message: String, kind: StatusKind) {
        match self.view_all() {
            Ok(()) => self.set_status(message, kind),
            Err(err) => {
                warn!(error = %format!("{err:#}"), "table reload failed");
                self.set_status(
                    format!("{message} Could not reload books: {}", surface_error(&err)),
                    StatusKind::Error,
                );
            }
        }
    }

    fn show(&mut self, mut books: Vec<Book>, listing: Listing) {
        self.session.sort.apply(&mut books);
        self.rows = books;
        self.listing = listing;
        if self.cursor >= self.rows.len() {
            self.cursor = self.rows.len().saturating_sub(1);
        }
    }

    fn move_cursor(&mut self, offset: isize) {
        if self.rows.is_empty() {
            return;
        }
        let last = self.rows.len() as isize - 1;
        self.cursor = (self.cursor as isize + offset).clamp(0, last) as usize;
    }

    fn report_error(&mut self, err: &anyhow::Error) {
        let kind = StatusKind::for_error(err);
        self.set_status(surface_error(err), kind);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(SELECTION_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_selection(frame, chunks[0]);
        self.draw_table(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::Editing(form) => self.draw_form(frame, area, form),
            Mode::ConfirmDelete(plan) => self.draw_confirm_delete(frame, area, plan),
            Mode::Normal => {}
        }
    }

    fn draw_selection(&self, frame: &mut Frame, area: Rect) {
        let line = match &self.session.selected {
            Some(book) => Line::from(vec![
                Span::styled("Selected: ", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(format!(
                    "#{} {} | ISBN {} | {} cop{}",
                    book.id,
                    book,
                    book.isbn,
                    book.total,
                    if book.total == 1 { "y" } else { "ies" }
                )),
            ]),
            None => Line::from(Span::styled(
                "No book selected. Press Enter on a row to select it.",
                Style::default().fg(Color::DarkGray),
            )),
        };
        let block = Block::default().borders(Borders::ALL).title("Book Store");
        frame.render_widget(Paragraph::new(line).block(block), area);
    }

    fn draw_table(&self, frame: &mut Frame, area: Rect) {
        let title = match self.listing {
            Listing::All => format!("All books ({})", self.rows.len()),
            Listing::Search => format!("Search results ({})", self.rows.len()),
            Listing::AdvancedSearch => format!("Advanced search results ({})", self.rows.len()),
            Listing::LowStock => format!(
                "Stock below {} ({})",
                self.low_stock_threshold,
                self.rows.len()
            ),
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.rows.is_empty() {
            let message = Paragraph::new("No books to show. Press 'a' to add one or 'v' to view all.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let header = Row::new(Column::ALL.iter().map(|column| {
            format!(
                "[{}] {}{}",
                column.index() + 1,
                column.heading(),
                self.session.sort.indicator(*column)
            )
        }))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

        let selected_id = self.session.selected_id();
        let rows = self
            .rows
            .iter()
            .map(|book| book_row(book, self.low_stock_threshold, selected_id));

        let widths = [
            Constraint::Length(8),
            Constraint::Percentage(30),
            Constraint::Percentage(22),
            Constraint::Length(10),
            Constraint::Length(17),
            Constraint::Length(10),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");

        let mut state = TableState::default().with_selected(Some(self.cursor));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let hints: &[(&str, &str)] = match &self.mode {
            Mode::Editing(_) => &[("[Enter]", "Submit"), ("[Tab]", "Next field"), ("[Esc]", "Cancel")],
            Mode::ConfirmDelete(_) => &[("[Y]", "Confirm"), ("[N/Esc]", "Cancel")],
            Mode::Normal => &[
                ("[Enter]", "Select"),
                ("[n]", "New"),
                ("[v]", "View all"),
                ("[a]", "Add"),
                ("[u]", "Update"),
                ("[s]", "Search"),
                ("[f]", "Advanced"),
                ("[d]", "Delete"),
                ("[D]", "Delete all"),
                ("[b]", "Backup"),
                ("[l]", "Low stock"),
                ("[1-6]", "Sort"),
                ("[q]", "Quit"),
            ],
        };

        let mut spans = Vec::with_capacity(hints.len() * 2);
        for (key, label) in hints {
            spans.push(Span::styled(*key, key_style));
            spans.push(Span::raw(format!(" {label}   ")));
        }
        Line::from(spans)
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, form: &Form) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(form.title()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line<'static>> = (0..form.fields.len())
            .map(|idx| form.build_line(idx))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to submit, Tab to switch, Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let prefix = form.prefix(form.active).chars().count() as u16;
        let cursor_x = inner.x + prefix + form.value_len(form.active) as u16;
        let cursor_y = inner.y + form.active as u16;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, plan: &DeletePlan) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Removal")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let detail = match plan.effect() {
            DeleteEffect::Remove => format!(
                "All {} cop{} will be removed from the catalog.",
                plan.held(),
                if plan.held() == 1 { "y" } else { "ies" }
            ),
            DeleteEffect::Decrement { remaining } => {
                format!("{remaining} copies will remain.")
            }
            DeleteEffect::ExceedsStock { held, .. } => format!("Only {held} copies are held."),
        };

        let lines = vec![
            Line::from(format!("Are you sure you want to delete all of '{}'?", plan.book())),
            Line::from(detail),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookInput;
    use tempfile::TempDir;

    fn app_with_books(dir: &TempDir) -> App {
        let config = AppConfig::load_from_dir(dir.path()).unwrap();
        let catalog = Catalog::open(&config.database_path).unwrap();
        catalog
            .insert(&BookInput::new("Dune", "Frank Herbert", "1965", "9780441013593", 3))
            .unwrap();
        catalog
            .insert(&BookInput::new("Emma", "Jane Austen", "1815", "9780141439587", 8))
            .unwrap();
        App::new(catalog, &config).unwrap()
    }

    fn press(app: &mut App, keys: &str) {
        for ch in keys.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    /// Store a row whose year is text. Listing every book then fails, while
    /// queries that never read that row keep working.
    fn break_listing(app: &App) {
        let conn = rusqlite::Connection::open(app.catalog.path()).unwrap();
        conn.execute(
            "INSERT INTO book (title, author, year, isbn, total) VALUES ('Broken', '', 'unknown', 1, 1)",
            [],
        )
        .unwrap();
    }

    fn copies_of(app: &App, title: &str) -> (i64, i64) {
        let conn = rusqlite::Connection::open(app.catalog.path()).unwrap();
        conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(total), 0) FROM book WHERE title = ?1",
            [title],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap()
    }

    #[test]
    fn enter_selects_and_new_clears() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with_books(&dir);

        app.handle_key(KeyCode::Down).unwrap();
        app.handle_key(KeyCode::Enter).unwrap();
        assert_eq!(app.session.selected.as_ref().map(|b| b.title.as_str()), Some("Emma"));

        press(&mut app, "n");
        assert!(app.session.selected.is_none());
    }

    #[test]
    fn sorting_keeps_toggling_on_same_column() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with_books(&dir);

        press(&mut app, "4");
        assert_eq!(app.rows[0].title, "Emma");
        press(&mut app, "4");
        assert_eq!(app.rows[0].title, "Dune");
    }

    #[test]
    fn delete_needing_removal_waits_for_confirmation() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with_books(&dir);

        app.handle_key(KeyCode::Enter).unwrap();
        press(&mut app, "d");
        app.handle_key(KeyCode::Backspace).unwrap();
        press(&mut app, "3");
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(matches!(app.mode, Mode::ConfirmDelete(_)));

        press(&mut app, "n");
        assert_eq!(app.catalog.view().unwrap().len(), 2);

        app.handle_key(KeyCode::Enter).unwrap();
        press(&mut app, "D");
        press(&mut app, "y");
        let titles: Vec<String> = app.catalog.view().unwrap().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["Emma".to_string()]);
    }

    #[test]
    fn empty_search_is_refused_by_the_shell() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with_books(&dir);

        press(&mut app, "s");
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.listing, Listing::All);
        assert_eq!(app.status.as_ref().map(|s| s.kind), Some(StatusKind::Warning));
    }

    #[test]
    fn invalid_add_keeps_form_open_with_error() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with_books(&dir);

        press(&mut app, "a");
        press(&mut app, "Dune");
        app.handle_key(KeyCode::Tab).unwrap();
        app.handle_key(KeyCode::Tab).unwrap();
        press(&mut app, "65");
        app.handle_key(KeyCode::Tab).unwrap();
        press(&mut app, "9780441013593");
        app.handle_key(KeyCode::Enter).unwrap();

        match &app.mode {
            Mode::Editing(form) => assert!(form.error.as_deref().unwrap_or("").contains("year")),
            _ => panic!("form should stay open"),
        }
    }

    #[test]
    fn low_stock_lists_records_under_threshold() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with_books(&dir);

        press(&mut app, "l");
        assert_eq!(app.listing, Listing::LowStock);
        assert_eq!(app.rows.len(), 1);
        assert_eq!(app.rows[0].title, "Dune");
    }

    #[test]
    fn committed_add_closes_form_when_reload_fails() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with_books(&dir);
        break_listing(&app);

        press(&mut app, "a");
        press(&mut app, "Neuromancer");
        app.handle_key(KeyCode::Tab).unwrap();
        press(&mut app, "William Gibson");
        app.handle_key(KeyCode::Tab).unwrap();
        press(&mut app, "1984");
        app.handle_key(KeyCode::Tab).unwrap();
        press(&mut app, "9780441569595");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        let status = app.status.as_ref().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert!(status.text.contains("added successfully"), "{}", status.text);

        // A second Enter must not submit the add again.
        app.handle_key(KeyCode::Enter).unwrap();
        assert_eq!(copies_of(&app, "Neuromancer"), (1, 1));
    }

    #[test]
    fn failed_delete_reports_reload_failure_too() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with_books(&dir);

        app.handle_key(KeyCode::Enter).unwrap();
        press(&mut app, "D");
        assert!(matches!(app.mode, Mode::ConfirmDelete(_)));

        let conn = rusqlite::Connection::open(app.catalog.path()).unwrap();
        conn.execute("UPDATE book SET total = 7 WHERE title = 'Dune'", [])
            .unwrap();
        break_listing(&app);

        press(&mut app, "y");

        assert!(matches!(app.mode, Mode::Normal));
        let status = app.status.as_ref().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert!(status.text.contains("changed since"), "{}", status.text);
        assert!(status.text.contains("Could not reload books"), "{}", status.text);
        assert_eq!(copies_of(&app, "Dune"), (1, 7));
    }
}
