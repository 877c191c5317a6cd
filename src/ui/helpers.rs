use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::library::LibraryError;
use crate::models::{BookRecord, Field};

/// Table columns, left to right, with their width constraints.
pub(crate) const TABLE_COLUMNS: &[(Field, Constraint)] = &[
    (Field::Author, Constraint::Percentage(14)),
    (Field::Title, Constraint::Percentage(22)),
    (Field::Rating, Constraint::Length(7)),
    (Field::Status, Constraint::Length(17)),
    (Field::Publisher, Constraint::Percentage(10)),
    (Field::YearPublished, Constraint::Length(6)),
    (Field::DateRead, Constraint::Length(10)),
    (Field::DateAdded, Constraint::Length(10)),
    (Field::Bookshelves, Constraint::Percentage(10)),
    (Field::Isbn, Constraint::Length(13)),
    (Field::Review, Constraint::Min(10)),
];

/// Text shown in a table cell. Ratings render as stars and reviews collapse
/// to their first line.
pub(crate) fn cell_text(record: &BookRecord, field: Field) -> String {
    match field {
        Field::Rating => record
            .rating
            .map(|r| r.stars())
            .or_else(|| record.rating_raw.clone())
            .unwrap_or_default(),
        Field::Review => {
            let mut lines = record.review.lines();
            let first = lines.next().unwrap_or_default().to_string();
            if lines.next().is_some() {
                format!("{first} …")
            } else {
                first
            }
        }
        other => record.text(other),
    }
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Pick the message worth showing in the footer. Library errors already name
/// the path or field involved, so they win over their underlying cause;
/// otherwise the innermost cause is the most specific.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<LibraryError>())
        .map(|library_err| library_err.to_string())
        .or_else(|| err.chain().last().map(|cause| cause.to_string()))
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rating, RecordId};
    use anyhow::Context;

    #[test]
    fn review_cell_shows_first_line_only() {
        let mut record = BookRecord::empty(RecordId(1));
        record.review = "Loved it.\nSecond paragraph.".to_string();
        assert_eq!(cell_text(&record, Field::Review), "Loved it. …");

        record.review = "Short.".to_string();
        assert_eq!(cell_text(&record, Field::Review), "Short.");
    }

    #[test]
    fn rating_cell_uses_stars() {
        let mut record = BookRecord::empty(RecordId(1));
        assert_eq!(cell_text(&record, Field::Rating), "");
        record.rating = Rating::new(2);
        assert_eq!(cell_text(&record, Field::Rating), "★★☆☆☆");

        record.rating = None;
        record.rating_raw = Some("3.5".to_string());
        assert_eq!(cell_text(&record, Field::Rating), "3.5");
    }

    #[test]
    fn surface_error_prefers_library_errors() {
        let err: Result<(), LibraryError> = Err(LibraryError::NotFound(RecordId(9)));
        let err = err.context("failed to delete book").unwrap_err();
        assert_eq!(surface_error(&err), "no book with id #9");

        let plain = anyhow::anyhow!("inner").context("outer");
        assert_eq!(surface_error(&plain), "inner");
    }
}
