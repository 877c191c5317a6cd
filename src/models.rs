//! Domain models for the reading log. These types stay light-weight data
//! holders: the record store owns validation and ordering, the CSV layer owns
//! the file format, and the TUI only reads and edits through them.

use std::collections::BTreeMap;
use std::fmt;

/// Reading status that floats a book to the top of every view.
pub const CURRENTLY_READING: &str = "currently-reading";
/// Status assigned to new books when the caller leaves it blank.
pub const DEFAULT_STATUS: &str = "to-read";
/// Statuses offered by the form. Any other value from the file is kept as-is.
pub const STATUS_CHOICES: &[&str] = &[CURRENTLY_READING, "read", DEFAULT_STATUS];

/// Identity handed out by the record store. It lives only for the process run
/// and is never written to the CSV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A star rating between 0 and 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(u8);

impl Rating {
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Parse user or file input. Blank text means "unrated" and yields
    /// `Ok(None)`. Whole numbers written as floats (`"4.0"`) are accepted
    /// because spreadsheet exports like to emit them.
    pub fn parse(raw: &str) -> Result<Option<Self>, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let number: f64 = trimmed
            .parse()
            .map_err(|_| format!("`{trimmed}` is not a number"))?;
        if !number.is_finite() || number.fract() != 0.0 {
            return Err(format!("`{trimmed}` is not a whole number"));
        }
        if !(0.0..=f64::from(Self::MAX)).contains(&number) {
            return Err(format!("`{trimmed}` is outside 0-{}", Self::MAX));
        }

        Ok(Some(Self(number as u8)))
    }

    /// Render the rating as filled and hollow stars, e.g. `★★★☆☆`.
    pub fn stars(self) -> String {
        let filled = usize::from(self.0);
        let hollow = usize::from(Self::MAX) - filled;
        format!("{}{}", "★".repeat(filled), "☆".repeat(hollow))
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical columns the application understands. Everything else in a CSV
/// header is carried along as an extra column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Title,
    Author,
    Isbn,
    Rating,
    Review,
    Status,
    Publisher,
    YearPublished,
    DateRead,
    DateAdded,
    Bookshelves,
}

impl Field {
    /// Canonical order, also the order missing columns get appended on save.
    pub const ALL: [Field; 11] = [
        Field::Title,
        Field::Author,
        Field::Isbn,
        Field::Rating,
        Field::Review,
        Field::Status,
        Field::Publisher,
        Field::YearPublished,
        Field::DateRead,
        Field::DateAdded,
        Field::Bookshelves,
    ];

    /// Header name written for a field the source file did not have. The
    /// names follow the Goodreads export so fresh files look familiar.
    pub fn canonical_name(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Author => "Author",
            Field::Isbn => "ISBN",
            Field::Rating => "My Rating",
            Field::Review => "My Review",
            Field::Status => "Exclusive Shelf",
            Field::Publisher => "Publisher",
            Field::YearPublished => "Year Published",
            Field::DateRead => "Date Read",
            Field::DateAdded => "Date Added",
            Field::Bookshelves => "Bookshelves",
        }
    }

    /// Short label used by the table header and the form.
    pub fn label(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Author => "Author",
            Field::Isbn => "ISBN",
            Field::Rating => "Rating",
            Field::Review => "Review",
            Field::Status => "Status",
            Field::Publisher => "Publisher",
            Field::YearPublished => "Year",
            Field::DateRead => "Date Read",
            Field::DateAdded => "Date Added",
            Field::Bookshelves => "Shelves",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One book in the library. Text fields use an empty string for "absent", so
/// a missing title column still yields `""` rather than dropping the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRecord {
    pub id: RecordId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub rating: Option<Rating>,
    /// Rating cell from the file that did not parse. Written back verbatim
    /// so an unreadable value is never erased by a save.
    pub rating_raw: Option<String>,
    pub review: String,
    pub status: String,
    pub publisher: String,
    pub year_published: String,
    pub date_read: String,
    pub date_added: String,
    pub bookshelves: String,
    /// Columns from the source header that have no canonical field, keyed by
    /// column key (the header name, suffixed when the name repeats).
    pub extra: BTreeMap<String, String>,
}

impl BookRecord {
    pub fn empty(id: RecordId) -> Self {
        Self {
            id,
            title: String::new(),
            author: String::new(),
            isbn: String::new(),
            rating: None,
            rating_raw: None,
            review: String::new(),
            status: String::new(),
            publisher: String::new(),
            year_published: String::new(),
            date_read: String::new(),
            date_added: String::new(),
            bookshelves: String::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn is_reading(&self) -> bool {
        self.status == CURRENTLY_READING
    }

    /// Cell text for a canonical field, as it would be written to the file.
    pub fn text(&self, field: Field) -> String {
        match field {
            Field::Rating => match (self.rating, &self.rating_raw) {
                (Some(rating), _) => rating.to_string(),
                (None, Some(raw)) => raw.clone(),
                (None, None) => String::new(),
            },
            other => self.text_ref(other).to_string(),
        }
    }

    fn text_ref(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Author => &self.author,
            Field::Isbn => &self.isbn,
            Field::Review => &self.review,
            Field::Status => &self.status,
            Field::Publisher => &self.publisher,
            Field::YearPublished => &self.year_published,
            Field::DateRead => &self.date_read,
            Field::DateAdded => &self.date_added,
            Field::Bookshelves => &self.bookshelves,
            Field::Rating => "",
        }
    }

    /// Overwrite a text field. Ratings go through validation in the store, so
    /// `Field::Rating` is ignored here.
    pub(crate) fn set_text(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Author => &mut self.author,
            Field::Isbn => &mut self.isbn,
            Field::Review => &mut self.review,
            Field::Status => &mut self.status,
            Field::Publisher => &mut self.publisher,
            Field::YearPublished => &mut self.year_published,
            Field::DateRead => &mut self.date_read,
            Field::DateAdded => &mut self.date_added,
            Field::Bookshelves => &mut self.bookshelves,
            Field::Rating => return,
        };
        *slot = value;
    }

    /// Case-insensitive substring match on title or author.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle) || self.author.to_lowercase().contains(&needle)
    }

    /// `Title - Author`, dropping the hyphen when the author is blank.
    pub fn display_title(&self) -> String {
        if self.author.trim().is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.title, self.author)
        }
    }
}

/// Input for `RecordStore::add`. The rating arrives as raw text so validation
/// errors can quote exactly what the user typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub rating: String,
    pub review: String,
    pub status: String,
    pub publisher: String,
    pub year_published: String,
    pub date_read: String,
    pub date_added: String,
    pub bookshelves: String,
}

impl BookDraft {
    /// Prefill a draft from an existing record, used when editing.
    pub fn from_record(record: &BookRecord) -> Self {
        Self {
            title: record.title.clone(),
            author: record.author.clone(),
            isbn: record.isbn.clone(),
            rating: record.text(Field::Rating),
            review: record.review.clone(),
            status: record.status.clone(),
            publisher: record.publisher.clone(),
            year_published: record.year_published.clone(),
            date_read: record.date_read.clone(),
            date_added: record.date_added.clone(),
            bookshelves: record.bookshelves.clone(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Author => &self.author,
            Field::Isbn => &self.isbn,
            Field::Rating => &self.rating,
            Field::Review => &self.review,
            Field::Status => &self.status,
            Field::Publisher => &self.publisher,
            Field::YearPublished => &self.year_published,
            Field::DateRead => &self.date_read,
            Field::DateAdded => &self.date_added,
            Field::Bookshelves => &self.bookshelves,
        }
    }

    pub fn get_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Title => &mut self.title,
            Field::Author => &mut self.author,
            Field::Isbn => &mut self.isbn,
            Field::Rating => &mut self.rating,
            Field::Review => &mut self.review,
            Field::Status => &mut self.status,
            Field::Publisher => &mut self.publisher,
            Field::YearPublished => &mut self.year_published,
            Field::DateRead => &mut self.date_read,
            Field::DateAdded => &mut self.date_added,
            Field::Bookshelves => &mut self.bookshelves,
        }
    }
}

/// Partial update for `RecordStore::update`. `None` leaves a field alone; for
/// the rating, `Some("")` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub rating: Option<String>,
    pub review: Option<String>,
    pub status: Option<String>,
    pub publisher: Option<String>,
    pub year_published: Option<String>,
    pub date_read: Option<String>,
    pub date_added: Option<String>,
    pub bookshelves: Option<String>,
}

impl BookChanges {
    /// Text changes paired with their field, skipping the rating.
    pub(crate) fn into_text_changes(self) -> Vec<(Field, String)> {
        [
            (Field::Title, self.title),
            (Field::Author, self.author),
            (Field::Isbn, self.isbn),
            (Field::Review, self.review),
            (Field::Status, self.status),
            (Field::Publisher, self.publisher),
            (Field::YearPublished, self.year_published),
            (Field::DateRead, self.date_read),
            (Field::DateAdded, self.date_added),
            (Field::Bookshelves, self.bookshelves),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .collect()
    }
}

impl From<BookDraft> for BookChanges {
    /// A submitted edit form replaces every field it carries.
    fn from(draft: BookDraft) -> Self {
        Self {
            title: Some(draft.title),
            author: Some(draft.author),
            isbn: Some(draft.isbn),
            rating: Some(draft.rating),
            review: Some(draft.review),
            status: Some(draft.status),
            publisher: Some(draft.publisher),
            year_published: Some(draft.year_published),
            date_read: Some(draft.date_read),
            date_added: Some(draft.date_added),
            bookshelves: Some(draft.bookshelves),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_accepts_whole_numbers_in_range() {
        assert_eq!(Rating::parse("4").unwrap(), Rating::new(4));
        assert_eq!(Rating::parse(" 0 ").unwrap(), Rating::new(0));
        assert_eq!(Rating::parse("5.0").unwrap(), Rating::new(5));
        assert_eq!(Rating::parse("").unwrap(), None);
        assert_eq!(Rating::parse("   ").unwrap(), None);
    }

    #[test]
    fn rating_rejects_out_of_range_and_garbage() {
        assert!(Rating::parse("7").is_err());
        assert!(Rating::parse("-1").is_err());
        assert!(Rating::parse("3.5").is_err());
        assert!(Rating::parse("five").is_err());
        assert!(Rating::parse("NaN").is_err());
    }

    #[test]
    fn stars_fill_from_the_left() {
        assert_eq!(Rating::new(3).unwrap().stars(), "★★★☆☆");
        assert_eq!(Rating::new(0).unwrap().stars(), "☆☆☆☆☆");
        assert!(Rating::new(6).is_none());
    }

    #[test]
    fn matches_title_or_author_ignoring_case() {
        let mut record = BookRecord::empty(RecordId(1));
        record.title = "The Left Hand of Darkness".to_string();
        record.author = "Ursula K. Le Guin".to_string();

        assert!(record.matches("left hand"));
        assert!(record.matches("LE GUIN"));
        assert!(record.matches(""));
        assert!(!record.matches("tolkien"));
    }

    #[test]
    fn draft_round_trips_through_record_text() {
        let mut record = BookRecord::empty(RecordId(7));
        record.title = "Dune".to_string();
        record.rating = Rating::new(5);
        record.status = CURRENTLY_READING.to_string();

        let draft = BookDraft::from_record(&record);
        assert_eq!(draft.get(Field::Title), "Dune");
        assert_eq!(draft.get(Field::Rating), "5");
        assert_eq!(draft.get(Field::Status), CURRENTLY_READING);
    }
}
