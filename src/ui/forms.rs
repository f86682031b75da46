use anyhow::{anyhow, Context, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{AdvancedSearchCriteria, Book, BookInput, SearchCriteria};

/// What a field accepts as the user types.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum FieldKind {
    Text,
    /// ASCII digits only, optionally capped in length.
    Digits { max_len: Option<usize> },
}

#[derive(Clone, Debug)]
pub(crate) struct FormField {
    pub(crate) label: &'static str,
    pub(crate) value: String,
    pub(crate) kind: FieldKind,
    pub(crate) required: bool,
}

impl FormField {
    fn text(label: &'static str, required: bool) -> Self {
        Self {
            label,
            value: String::new(),
            kind: FieldKind::Text,
            required,
        }
    }

    fn digits(label: &'static str, required: bool, max_len: Option<usize>) -> Self {
        Self {
            label,
            value: String::new(),
            kind: FieldKind::Digits { max_len },
            required,
        }
    }

    fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    fn accepts(&self, ch: char) -> bool {
        match self.kind {
            FieldKind::Text => !ch.is_control(),
            FieldKind::Digits { max_len } => {
                ch.is_ascii_digit() && max_len.map_or(true, |max| self.value.chars().count() < max)
            }
        }
    }
}

/// Which action the form feeds when submitted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum FormPurpose {
    Add,
    Update { id: i64 },
    Search,
    AdvancedSearch,
    DeleteQuantity { id: i64 },
}

/// Modal form state shared by every data-entry dialog.
#[derive(Clone, Debug)]
pub(crate) struct Form {
    pub(crate) purpose: FormPurpose,
    pub(crate) fields: Vec<FormField>,
    pub(crate) active: usize,
    pub(crate) error: Option<String>,
}

const YEAR_DIGITS: Option<usize> = Some(4);

impl Form {
    fn new(purpose: FormPurpose, fields: Vec<FormField>) -> Self {
        Self {
            purpose,
            fields,
            active: 0,
            error: None,
        }
    }

    fn book_fields() -> Vec<FormField> {
        vec![
            FormField::text("Title", true),
            FormField::text("Author", false),
            FormField::digits("Year", true, YEAR_DIGITS),
            FormField::digits("ISBN", true, None),
            FormField::digits("Total", true, None).with_value("1"),
        ]
    }

    pub(crate) fn add() -> Self {
        Self::new(FormPurpose::Add, Self::book_fields())
    }

    /// Pre-fill every field from the selected record.
    pub(crate) fn update(book: &Book) -> Self {
        let fields = vec![
            FormField::text("Title", true).with_value(book.title.clone()),
            FormField::text("Author", true).with_value(book.author.clone()),
            FormField::digits("Year", true, YEAR_DIGITS).with_value(book.year.to_string()),
            FormField::digits("ISBN", true, None).with_value(book.isbn.to_string()),
            FormField::digits("Total", true, None).with_value(book.total.to_string()),
        ];
        Self::new(FormPurpose::Update { id: book.id }, fields)
    }

    pub(crate) fn search() -> Self {
        Self::new(
            FormPurpose::Search,
            vec![
                FormField::text("Title", false),
                FormField::text("Author", false),
                FormField::digits("Year", false, YEAR_DIGITS),
                FormField::digits("ISBN", false, None),
            ],
        )
    }

    pub(crate) fn advanced_search() -> Self {
        Self::new(
            FormPurpose::AdvancedSearch,
            vec![
                FormField::text("Title (contains)", false),
                FormField::digits("Start year", false, YEAR_DIGITS),
                FormField::digits("End year", false, YEAR_DIGITS),
                FormField::text("Author (contains)", false),
                FormField::digits("ISBN (contains)", false, None),
            ],
        )
    }

    pub(crate) fn delete_quantity(book: &Book) -> Self {
        Self::new(
            FormPurpose::DeleteQuantity { id: book.id },
            vec![FormField::digits("Quantity", true, None).with_value("1")],
        )
    }

    pub(crate) fn title(&self) -> &'static str {
        match self.purpose {
            FormPurpose::Add => "Add Book",
            FormPurpose::Update { .. } => "Update Book",
            FormPurpose::Search => "Search (exact match)",
            FormPurpose::AdvancedSearch => "Advanced Search",
            FormPurpose::DeleteQuantity { .. } => "Delete Copies",
        }
    }

    /// Cycle focus forward or backward across the fields.
    pub(crate) fn toggle_field(&mut self, backward: bool) {
        let len = self.fields.len();
        if len == 0 {
            return;
        }
        self.active = if backward {
            (self.active + len - 1) % len
        } else {
            (self.active + 1) % len
        };
    }

    /// Append a character to the active field, validating allowed input.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.fields.get_mut(self.active) {
            Some(field) if field.accepts(ch) => {
                field.value.push(ch);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.active) {
            field.value.pop();
        }
    }

    fn value(&self, idx: usize) -> &str {
        self.fields
            .get(idx)
            .map(|field| field.value.trim())
            .unwrap_or("")
    }

    fn parse_count(&self, idx: usize) -> Result<i64> {
        let label = self.fields.get(idx).map_or("Value", |field| field.label);
        let raw = self.value(idx);
        if raw.is_empty() {
            return Err(anyhow!("{label} is required."));
        }
        raw.parse::<i64>()
            .with_context(|| format!("{label} must be a whole number."))
    }

    /// Raw book input from the five book fields. Field-level rules are left
    /// to the catalog so the shell and store cannot disagree.
    pub(crate) fn book_input(&self) -> Result<BookInput> {
        Ok(BookInput::new(
            self.value(0),
            self.value(1),
            self.value(2),
            self.value(3),
            self.parse_count(4)?,
        ))
    }

    pub(crate) fn search_criteria(&self) -> SearchCriteria {
        SearchCriteria {
            title: self.value(0).to_string(),
            author: self.value(1).to_string(),
            year: self.value(2).to_string(),
            isbn: self.value(3).to_string(),
        }
    }

    pub(crate) fn advanced_criteria(&self) -> AdvancedSearchCriteria {
        AdvancedSearchCriteria {
            title: self.value(0).to_string(),
            start_year: self.value(1).to_string(),
            end_year: self.value(2).to_string(),
            author: self.value(3).to_string(),
            isbn: self.value(4).to_string(),
        }
    }

    pub(crate) fn quantity(&self) -> Result<i64> {
        self.parse_count(0)
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, idx: usize) -> Line<'static> {
        let Some(field) = self.fields.get(idx) else {
            return Line::from("");
        };
        let is_active = idx == self.active;

        let display = if field.value.is_empty() {
            if field.required {
                "<required>".to_string()
            } else {
                "<optional>".to_string()
            }
        } else {
            field.value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if field.value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(self.prefix(idx)),
            Span::styled(display, style),
        ])
    }

    /// Label prefix for a field; the cursor is placed right after it.
    pub(crate) fn prefix(&self, idx: usize) -> String {
        self.fields
            .get(idx)
            .map(|field| format!("{}: ", field.label))
            .unwrap_or_default()
    }

    /// Return the character count for the requested field.
    pub(crate) fn value_len(&self, idx: usize) -> usize {
        self.fields
            .get(idx)
            .map_or(0, |field| field.value.chars().count())
    }
}
