//! Ratatui front-end: a sortable book table, modal forms for each catalog
//! operation, and a confirmation dialog in front of row removal.

mod app;
mod forms;
mod helpers;
mod sort;
mod terminal;

pub use app::App;
pub use terminal::run_app;
