use std::fs;
use std::path::Path;

use rusqlite::Connection;
use tracing::debug;

use super::error::Result;

/// Schema for the single `book` table. `total` defaults to one copy so a
/// bare insert always yields a live record.
const CREATE_BOOK_TABLE: &str = "CREATE TABLE IF NOT EXISTS book (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    author TEXT NOT NULL DEFAULT '',
    year INTEGER NOT NULL,
    isbn INTEGER NOT NULL,
    total INTEGER NOT NULL DEFAULT 1
)";

/// Make sure the database file and its parent directory exist and that the
/// `book` table is present. The connection used for the check is dropped
/// before returning.
pub(crate) fn ensure_schema(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let conn = connect(path)?;
    conn.execute(CREATE_BOOK_TABLE, [])?;
    debug!(path = %path.display(), "book table ready");
    Ok(())
}

/// Open a fresh connection for one catalog operation. Callers keep it on the
/// stack so it is closed on every exit path, including early validation
/// returns.
pub(crate) fn connect(path: &Path) -> Result<Connection> {
    Ok(Connection::open(path)?)
}
