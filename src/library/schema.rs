//! Column schema for library files.
//!
//! A header keeps every column exactly as the source file named it and only
//! records which canonical field (if any) each column feeds. Matching is
//! tolerant so exports from different tools load without configuration, and
//! saving never renames a column the user already had.

use std::collections::HashSet;
use std::fmt;

use crate::models::{BookRecord, Field};

/// Names accepted for each canonical field, compared after `fold_name`.
const FIELD_ALIASES: &[(Field, &[&str])] = &[
    (Field::Title, &["title", "book_title"]),
    (Field::Author, &["author", "authors"]),
    (Field::Isbn, &["isbn", "isbn13", "isbn_13"]),
    (Field::Rating, &["my_rating", "rating"]),
    (Field::Review, &["my_review", "review"]),
    (
        Field::Status,
        &["exclusive_shelf", "reading_status", "status", "shelf"],
    ),
    (Field::Publisher, &["publisher"]),
    (Field::YearPublished, &["year_published", "year"]),
    (Field::DateRead, &["date_read"]),
    (Field::DateAdded, &["date_added"]),
    (Field::Bookshelves, &["bookshelves", "shelves", "tags"]),
];

/// Lowercase and collapse spaces and dashes into underscores so `My Rating`,
/// `my-rating` and `my_rating` compare equal.
fn fold_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|ch| match ch {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Canonical field a header name refers to, if any.
pub fn match_field(name: &str) -> Option<Field> {
    let folded = fold_name(name);
    FIELD_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&folded.as_str()))
        .map(|(field, _)| *field)
}

/// Whether a column holds an ISBN, canonical or not (Goodreads ships both
/// `ISBN` and `ISBN13`).
pub(crate) fn is_isbn_column(name: &str) -> bool {
    fold_name(name).starts_with("isbn")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Known(Field),
    Extra,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Name exactly as the file spells it; written back unchanged.
    pub name: String,
    /// Unique within the header. Equal to `name` unless an earlier column
    /// already used that name, in which case it becomes `Name (2)` and so on.
    /// Extra values are stored under this key.
    pub key: String,
    pub kind: ColumnKind,
}

/// Repairs applied while reading a file. They are reported so the user
/// knows something was adjusted, but they never fail a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaIssue {
    /// Data row (1-based) had fewer cells than the header; padded with `""`.
    ShortRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// Data row had more cells than the header; the header grew to fit them.
    LongRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// Rating cell that is not a whole number in 0..=5; loaded as unrated
    /// and kept as text for the next save.
    InvalidRating { row: usize, value: String },
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaIssue::ShortRow {
                row,
                expected,
                found,
            } => write!(f, "row {row} has {found} of {expected} columns; padded"),
            SchemaIssue::LongRow {
                row,
                expected,
                found,
            } => write!(
                f,
                "row {row} has {found} columns, header has {expected}; extra columns added"
            ),
            SchemaIssue::InvalidRating { row, value } => {
                write!(f, "row {row} has invalid rating `{value}`; shown as unrated")
            }
        }
    }
}

/// Ordered column list of a library file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    columns: Vec<Column>,
}

impl Header {
    /// Header for a brand new library: every canonical field, in order.
    pub fn canonical() -> Self {
        Self {
            columns: Field::ALL
                .iter()
                .map(|field| Column {
                    name: field.canonical_name().to_string(),
                    key: field.canonical_name().to_string(),
                    kind: ColumnKind::Known(*field),
                })
                .collect(),
        }
    }

    /// Build a header from the names in a file. The first column matching a
    /// field claims it; later matches stay extra columns. Repeated names get
    /// distinct keys so their values cannot collide.
    pub fn parse<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut header = Self {
            columns: Vec::new(),
        };
        for name in names {
            header.push_column(name.into());
        }
        header
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.key.as_str())
    }

    pub fn column_for(&self, field: Field) -> Option<&Column> {
        self.columns
            .iter()
            .find(|column| column.kind == ColumnKind::Known(field))
    }

    pub fn contains_field(&self, field: Field) -> bool {
        self.column_for(field).is_some()
    }

    /// The header as it will be written: original columns in file order,
    /// then any canonical field the file lacked.
    pub fn with_canonical(&self) -> Self {
        let mut header = self.clone();
        for field in Field::ALL {
            if !header.contains_field(field) {
                let key = header.unique_key(field.canonical_name());
                header.columns.push(Column {
                    name: field.canonical_name().to_string(),
                    key,
                    kind: ColumnKind::Known(field),
                });
            }
        }
        header
    }

    /// Cells for one record, aligned with this header.
    pub fn row_for(&self, record: &BookRecord) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| match column.kind {
                ColumnKind::Known(field) => record.text(field),
                ColumnKind::Extra => record.extra.get(&column.key).cloned().unwrap_or_default(),
            })
            .collect()
    }

    /// Append a synthesized extra column, used when rows run past the header.
    /// Returns the key its values are stored under.
    pub(crate) fn push_extra(&mut self, name: &str) -> String {
        let key = self.unique_key(name);
        self.columns.push(Column {
            name: key.clone(),
            key: key.clone(),
            kind: ColumnKind::Extra,
        });
        key
    }

    fn push_column(&mut self, name: String) {
        let key = self.unique_key(&name);
        let kind = match match_field(&name) {
            Some(field) if !self.contains_field(field) => ColumnKind::Known(field),
            _ => ColumnKind::Extra,
        };
        self.columns.push(Column { name, key, kind });
    }

    fn unique_key(&self, base: &str) -> String {
        let taken: HashSet<&str> = self.keys().collect();
        if !taken.contains(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base} ({n})"))
            .find(|candidate| !taken.contains(candidate.as_str()))
            .unwrap_or_else(|| base.to_string())
    }
}
