//! Persistence module split across logical submodules.

mod backup;
mod books;
mod connection;
mod error;
mod query;
mod validate;

pub use backup::read_backup;
pub use books::{Catalog, DEFAULT_LOW_STOCK_THRESHOLD};
pub use error::{CatalogError, ErrorKind, Result, ValidationError};
