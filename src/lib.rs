//! Core library surface for the Book Inventory TUI application.
//!
//! `db` holds the catalog store and its rules, `ui` the terminal shell that
//! drives it, and `config` the settings both are built from.
pub mod config;
pub mod db;
pub mod models;
pub mod ui;

pub use config::AppConfig;

/// Convenience re-exports for the persistence layer.
pub use db::{read_backup, Catalog, CatalogError, ValidationError, DEFAULT_LOW_STOCK_THRESHOLD};

pub use models::{
    AdvancedSearchCriteria, Book, BookInput, Confirmation, DeleteEffect, DeleteOutcome,
    DeletePlan, InsertOutcome, SearchCriteria,
};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
