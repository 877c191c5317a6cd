//! Bridge between library files on disk and the in-memory record store.
//!
//! Loading is lenient (missing files start an empty library, ragged rows are
//! repaired) while saving is strict: a failure is always surfaced, and the
//! previous file stays in place until the replacement is fully written.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use log::info;
use tempfile::NamedTempFile;

use super::error::{LibraryError, Result};
use super::schema::{is_isbn_column, Header};
use super::store::{LoadReport, RecordStore};

/// Line-break markup found in Goodreads review exports.
const REVIEW_BREAKS: &[&str] = &["<br/>", "<br />", "<br>"];

/// A freshly loaded library plus whatever had to be repaired on the way in.
#[derive(Debug, Default)]
pub struct LoadedLibrary {
    pub store: RecordStore,
    pub report: LoadReport,
}

/// Read a library file. A missing or zero-length file yields an empty
/// library with the canonical header; a path that exists but cannot be read
/// is an error.
pub fn load_from_path(path: &Path) -> Result<LoadedLibrary> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            info!(
                "event=library_load path={} status=missing records=0",
                path.display()
            );
            return Ok(LoadedLibrary::default());
        }
        Err(err) => return Err(LibraryError::file_access(path, err)),
    };

    if metadata.is_dir() {
        return Err(LibraryError::file_access(
            path,
            io::Error::other("path is a directory"),
        ));
    }
    if metadata.len() == 0 {
        info!(
            "event=library_load path={} status=empty records=0",
            path.display()
        );
        return Ok(LoadedLibrary::default());
    }

    let file = File::open(path).map_err(|err| LibraryError::file_access(path, err))?;
    let loaded = read_library(file).map_err(|err| LibraryError::from_csv(path, err))?;
    info!(
        "event=library_load path={} status=ok records={} repairs={}",
        path.display(),
        loaded.store.len(),
        loaded.report.issues.len()
    );
    Ok(loaded)
}

/// First-run import of a spreadsheet export. Same rules as `load_from_path`,
/// then the Goodreads quirks are cleaned up: ISBNs wrapped as `="..."`
/// formulas are unwrapped and `<br/>` markup in reviews becomes newlines.
pub fn import_from_path(path: &Path) -> Result<LoadedLibrary> {
    let mut loaded = load_from_path(path)?;
    let isbn_columns: Vec<String> = loaded
        .store
        .header()
        .columns()
        .iter()
        .filter(|column| is_isbn_column(&column.name))
        .map(|column| column.key.clone())
        .collect();

    for record in loaded.store.records_mut() {
        record.isbn = unwrap_formula(&record.isbn);
        record.review = REVIEW_BREAKS
            .iter()
            .fold(record.review.clone(), |text, tag| text.replace(tag, "\n"));
        for column in &isbn_columns {
            if let Some(value) = record.extra.get_mut(column) {
                *value = unwrap_formula(value);
            }
        }
    }

    info!(
        "event=library_import path={} records={}",
        path.display(),
        loaded.store.len()
    );
    Ok(loaded)
}

/// Write the whole library to `path`. Rows go to a temporary file next to the
/// destination, which is synced and then renamed over it, so a failed save
/// never leaves a truncated library behind.
pub fn save_to_path(path: &Path, store: &RecordStore) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|err| LibraryError::file_access(path, err))?;
    // Temp files are owner-only; the replaced library keeps its own mode.
    match fs::metadata(path) {
        Ok(existing) => tmp
            .as_file()
            .set_permissions(existing.permissions())
            .map_err(|err| LibraryError::file_access(path, err))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(LibraryError::file_access(path, err)),
    }
    write_library(tmp.as_file_mut(), store).map_err(|err| LibraryError::from_csv(path, err))?;
    tmp.as_file()
        .sync_all()
        .map_err(|err| LibraryError::file_access(path, err))?;
    tmp.persist(path)
        .map_err(|err| LibraryError::file_access(path, err.error))?;

    info!(
        "event=library_save path={} records={}",
        path.display(),
        store.len()
    );
    Ok(())
}

/// Parse CSV text with a header row into a record store. Quoted cells may
/// contain commas, doubled quotes and line breaks.
pub fn read_library<R: Read>(reader: R) -> csv::Result<LoadedLibrary> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let names: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let rows = rdr
        .records()
        .map(|record| record.map(|cells| cells.iter().map(str::to_string).collect()))
        .collect::<csv::Result<Vec<Vec<String>>>>()?;

    if names.iter().all(|name| name.trim().is_empty()) && rows.is_empty() {
        return Ok(LoadedLibrary::default());
    }

    let (store, report) = RecordStore::load(Header::parse(names), rows);
    Ok(LoadedLibrary { store, report })
}

/// Serialize a record store as CSV: the stored header plus any missing
/// canonical columns, then one row per record in library order.
pub fn write_library<W: Write>(writer: W, store: &RecordStore) -> csv::Result<()> {
    let header = store.header().with_canonical();
    let mut wtr = WriterBuilder::new().from_writer(writer);

    wtr.write_record(header.names())?;
    for record in store.records() {
        wtr.write_record(header.row_for(record))?;
    }
    wtr.flush()?;
    Ok(())
}

/// `="0143039431"` -> `0143039431`; anything else is returned unchanged.
fn unwrap_formula(value: &str) -> String {
    value
        .strip_prefix("=\"")
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(value)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Field;

    #[test]
    fn quoted_cells_keep_delimiters_and_newlines() {
        let csv_text = "Title,My Review\n\"Dune\",\"spice, \"\"worms\"\"\nand sand\"\n";
        let loaded = read_library(csv_text.as_bytes()).unwrap();

        assert_eq!(loaded.store.len(), 1);
        assert_eq!(
            loaded.store.records()[0].review,
            "spice, \"worms\"\nand sand"
        );
        assert!(loaded.report.is_clean());
    }

    #[test]
    fn header_only_file_keeps_its_columns() {
        let loaded = read_library("Book Id,Title\n".as_bytes()).unwrap();
        assert!(loaded.store.is_empty());

        let names: Vec<&str> = loaded.store.header().names().collect();
        assert_eq!(names, vec!["Book Id", "Title"]);
    }

    #[test]
    fn written_header_adds_missing_canonical_columns() {
        let loaded = read_library("Book Id,Title\n1,Emma\n".as_bytes()).unwrap();
        let mut out = Vec::new();
        write_library(&mut out, &loaded.store).unwrap();

        let text = String::from_utf8(out).unwrap();
        let first_line = text.lines().next().unwrap();
        assert!(first_line.starts_with("Book Id,Title,Author,ISBN,My Rating"));
        assert!(text.lines().nth(1).unwrap().starts_with("1,Emma,"));
    }

    #[test]
    fn unwrap_formula_only_touches_wrapped_values() {
        assert_eq!(unwrap_formula("=\"9780143039433\""), "9780143039433");
        assert_eq!(unwrap_formula("=\"\""), "");
        assert_eq!(unwrap_formula("0143039431"), "0143039431");
        assert_eq!(unwrap_formula("=1+1"), "=1+1");
    }

    #[test]
    fn fields_are_matched_regardless_of_header_spelling() {
        let loaded =
            read_library("title,author,exclusive_shelf\nHeat,Buford,currently-reading\n".as_bytes())
                .unwrap();
        let header = loaded.store.header();

        assert!(header.contains_field(Field::Status));
        assert!(loaded.store.records()[0].is_reading());
    }
}
