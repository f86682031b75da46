use std::fs;
use std::path::Path;

use crate::models::Book;

use super::error::Result;

/// Write `books` as CSV. The header row comes from the serde renames on
/// [`Book`] (`ID,Title,Author,Year,ISBN,Total`).
pub(crate) fn write_backup(path: &Path, books: &[Book]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    if books.is_empty() {
        // `serialize` only emits the header alongside the first record.
        writer.write_record(["ID", "Title", "Author", "Year", "ISBN", "Total"])?;
    }
    for book in books {
        writer.serialize(book)?;
    }
    writer.flush()?;
    Ok(())
}

/// Parse a file written by [`Catalog::backup`](crate::db::Catalog::backup).
pub fn read_backup(path: &Path) -> Result<Vec<Book>> {
    let mut reader = csv::Reader::from_path(path)?;
    let books = reader
        .deserialize::<Book>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(books)
}
