use std::cmp::Ordering;

use chrono::Local;
use log::{debug, info, warn};

use crate::models::{
    BookChanges, BookDraft, BookRecord, Field, Rating, RecordId, DEFAULT_STATUS,
};

use super::error::{LibraryError, Result};
use super::schema::{ColumnKind, Header, SchemaIssue};

/// Format used for the Date Added stamp, matching Goodreads exports.
const DATE_ADDED_FORMAT: &str = "%Y/%m/%d";

/// Outcome of normalizing rows into records.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub issues: Vec<SchemaIssue>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// One-line summary for the status footer, `None` when nothing was
    /// repaired.
    pub fn summary(&self) -> Option<String> {
        match self.issues.as_slice() {
            [] => None,
            [only] => Some(format!("Repaired 1 problem while loading: {only}.")),
            [first, rest @ ..] => Some(format!(
                "Repaired {} problems while loading (first: {first}).",
                rest.len() + 1
            )),
        }
    }
}

/// Column used to sort rows inside each priority group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: Field,
    pub descending: bool,
}

impl SortSpec {
    pub fn ascending(field: Field) -> Self {
        Self {
            field,
            descending: false,
        }
    }
}

/// Authoritative in-memory library. Owns the records and the header they
/// were read with; nothing in here touches the file system.
#[derive(Debug, Clone)]
pub struct RecordStore {
    header: Header,
    records: Vec<BookRecord>,
    next_id: u64,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new(Header::canonical())
    }
}

impl RecordStore {
    pub fn new(header: Header) -> Self {
        Self {
            header,
            records: Vec::new(),
            next_id: 1,
        }
    }

    /// Build a library from rows given in header order. Ragged rows are
    /// repaired rather than rejected: short rows are padded with `""` and
    /// long rows grow the header with synthesized `Column N` columns so no
    /// cell is lost. Every repair lands in the returned report.
    pub fn load(mut header: Header, rows: Vec<Vec<String>>) -> (Self, LoadReport) {
        let mut report = LoadReport::default();
        let declared = header.len();

        let widest = rows.iter().map(Vec::len).max().unwrap_or(0);
        for position in declared..widest {
            header.push_extra(&format!("Column {}", position + 1));
        }

        let mut store = Self::new(header);
        for (index, mut row) in rows.into_iter().enumerate() {
            let row_number = index + 1;
            match row.len().cmp(&declared) {
                Ordering::Less => report.issues.push(SchemaIssue::ShortRow {
                    row: row_number,
                    expected: declared,
                    found: row.len(),
                }),
                Ordering::Greater => report.issues.push(SchemaIssue::LongRow {
                    row: row_number,
                    expected: declared,
                    found: row.len(),
                }),
                Ordering::Equal => {}
            }
            row.resize(store.header.len(), String::new());

            let id = store.allocate_id();
            let record = store.record_from_row(id, row_number, row, &mut report);
            store.records.push(record);
        }

        for issue in &report.issues {
            warn!("event=schema_repair issue=\"{issue}\"");
        }
        debug!(
            "event=library_normalize records={} columns={} repairs={}",
            store.records.len(),
            store.header.len(),
            report.issues.len()
        );

        (store, report)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[BookRecord] {
        &self.records
    }

    pub(crate) fn records_mut(&mut self) -> &mut [BookRecord] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: RecordId) -> Option<&BookRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|record| record.id == id)
    }

    /// Append a new book. Only the rating is validated; every other field
    /// accepts arbitrary text. A blank status becomes `to-read` and a blank
    /// Date Added is stamped with today's date.
    pub fn add(&mut self, draft: BookDraft) -> Result<&BookRecord> {
        let rating = parse_rating(&draft.rating)?;
        let id = self.allocate_id();

        let mut record = BookRecord::empty(id);
        record.title = draft.title;
        record.author = draft.author;
        record.isbn = draft.isbn;
        record.rating = rating;
        record.review = draft.review;
        record.status = draft.status;
        record.publisher = draft.publisher;
        record.year_published = draft.year_published;
        record.date_read = draft.date_read;
        record.date_added = draft.date_added;
        record.bookshelves = draft.bookshelves;

        if record.status.trim().is_empty() {
            record.status = DEFAULT_STATUS.to_string();
        }
        if record.date_added.trim().is_empty() {
            record.date_added = Local::now().format(DATE_ADDED_FORMAT).to_string();
        }

        info!("event=record_add id={} status={}", id.0, record.status);
        self.records.push(record);
        Ok(&self.records[self.records.len() - 1])
    }

    /// Apply a partial update. Validation happens before anything is
    /// written, so a rejected change leaves the record untouched. A new
    /// rating also drops any unparsed rating text kept from the file.
    pub fn update(&mut self, id: RecordId, changes: BookChanges) -> Result<&BookRecord> {
        let index = self.position(id).ok_or(LibraryError::NotFound(id))?;
        let rating = changes.rating.as_deref().map(parse_rating).transpose()?;

        let record = &mut self.records[index];
        if let Some(rating) = rating {
            record.rating = rating;
            record.rating_raw = None;
        }
        for (field, value) in changes.into_text_changes() {
            record.set_text(field, value);
        }

        info!("event=record_update id={}", id.0);
        Ok(&self.records[index])
    }

    /// Remove a book and hand it back. Deleting the same id twice fails the
    /// second time.
    pub fn delete(&mut self, id: RecordId) -> Result<BookRecord> {
        let index = self.position(id).ok_or(LibraryError::NotFound(id))?;
        info!("event=record_delete id={}", id.0);
        Ok(self.records.remove(index))
    }

    /// Display order: books being read first, then everything else. Both
    /// groups keep insertion order; nothing is alphabetized.
    pub fn ordered_view(&self) -> Vec<&BookRecord> {
        let (reading, rest): (Vec<&BookRecord>, Vec<&BookRecord>) =
            self.records.iter().partition(|record| record.is_reading());
        reading.into_iter().chain(rest).collect()
    }

    /// Same priority split as `ordered_view`, with each group sorted by the
    /// requested column. Blank values sort last in either direction and ties
    /// keep insertion order.
    pub fn sorted_view(&self, sort: SortSpec) -> Vec<&BookRecord> {
        let mut view = self.ordered_view();
        view.sort_by(|a, b| {
            b.is_reading()
                .cmp(&a.is_reading())
                .then_with(|| compare_by(sort, a, b))
        });
        view
    }

    fn allocate_id(&mut self) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        id
    }

    fn record_from_row(
        &self,
        id: RecordId,
        row_number: usize,
        row: Vec<String>,
        report: &mut LoadReport,
    ) -> BookRecord {
        let mut record = BookRecord::empty(id);
        for (column, value) in self.header.columns().iter().zip(row) {
            match column.kind {
                ColumnKind::Known(Field::Rating) => match Rating::parse(&value) {
                    Ok(rating) => record.rating = rating,
                    Err(_) => {
                        report.issues.push(SchemaIssue::InvalidRating {
                            row: row_number,
                            value: value.clone(),
                        });
                        record.rating_raw = Some(value);
                    }
                },
                ColumnKind::Known(field) => record.set_text(field, value),
                ColumnKind::Extra => {
                    record.extra.insert(column.key.clone(), value);
                }
            }
        }
        record
    }
}

fn parse_rating(raw: &str) -> Result<Option<Rating>> {
    Rating::parse(raw).map_err(|message| LibraryError::Validation {
        field: "rating",
        message,
    })
}

fn compare_by(sort: SortSpec, a: &BookRecord, b: &BookRecord) -> Ordering {
    match sort.field {
        Field::Rating => compare_present(a.rating, b.rating, sort.descending),
        Field::YearPublished => compare_present(
            a.year_published.trim().parse::<i64>().ok(),
            b.year_published.trim().parse::<i64>().ok(),
            sort.descending,
        ),
        field => compare_present(text_key(a, field), text_key(b, field), sort.descending),
    }
}

fn text_key(record: &BookRecord, field: Field) -> Option<String> {
    let text = record.text(field);
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

fn compare_present<T: Ord>(a: Option<T>, b: Option<T>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
