use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{BookDraft, BookRecord, Field, RecordId, DEFAULT_STATUS, STATUS_CHOICES};

/// Fields shown by the book form, top to bottom. Date Added is not editable;
/// it is stamped on creation and carried through edits untouched.
pub(crate) const FORM_FIELDS: [Field; 10] = [
    Field::Title,
    Field::Author,
    Field::Status,
    Field::Rating,
    Field::DateRead,
    Field::Publisher,
    Field::YearPublished,
    Field::Isbn,
    Field::Bookshelves,
    Field::Review,
];

/// Form state for adding or editing a book.
#[derive(Clone)]
pub(crate) struct BookForm {
    pub(crate) draft: BookDraft,
    pub(crate) active: usize,
    pub(crate) error: Option<String>,
}

impl BookForm {
    /// Blank form for a new book, with the status preset to `to-read`.
    pub(crate) fn new() -> Self {
        Self {
            draft: BookDraft {
                status: DEFAULT_STATUS.to_string(),
                ..BookDraft::default()
            },
            active: 0,
            error: None,
        }
    }

    /// Populate the form from an existing record when editing.
    pub(crate) fn from_record(record: &BookRecord) -> Self {
        Self {
            draft: BookDraft::from_record(record),
            active: 0,
            error: None,
        }
    }

    pub(crate) fn active_field(&self) -> Field {
        FORM_FIELDS[self.active]
    }

    pub(crate) fn next_field(&mut self) {
        self.active = (self.active + 1) % FORM_FIELDS.len();
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = (self.active + FORM_FIELDS.len() - 1) % FORM_FIELDS.len();
    }

    /// Append a character to the active field. Rating and year only take
    /// digits; everything else takes any printable character.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        let field = self.active_field();
        let accepted = match field {
            Field::Rating => ch.is_ascii_digit() && self.draft.rating.is_empty(),
            Field::YearPublished => {
                ch.is_ascii_digit() || (ch == '-' && self.draft.year_published.is_empty())
            }
            _ => true,
        };
        if accepted {
            self.draft.get_mut(field).push(ch);
        }
        accepted
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        let field = self.active_field();
        self.draft.get_mut(field).pop();
    }

    /// Step the status field through the preset shelves. Custom values from
    /// the file jump to the first preset.
    pub(crate) fn cycle_status(&mut self, forward: bool) -> bool {
        if self.active_field() != Field::Status {
            return false;
        }
        let count = STATUS_CHOICES.len();
        let next = match STATUS_CHOICES
            .iter()
            .position(|choice| *choice == self.draft.status)
        {
            Some(index) if forward => (index + 1) % count,
            Some(index) => (index + count - 1) % count,
            None => 0,
        };
        self.draft.status = STATUS_CHOICES[next].to_string();
        true
    }

    /// Check the fields the form insists on and return a trimmed draft. The
    /// rating is validated by the record store so its message stays in one
    /// place.
    pub(crate) fn parse_inputs(&self) -> Result<BookDraft> {
        let mut draft = self.draft.clone();
        for field in FORM_FIELDS {
            if field != Field::Review {
                let trimmed = draft.get(field).trim().to_string();
                *draft.get_mut(field) = trimmed;
            }
        }

        if draft.title.is_empty() {
            return Err(anyhow!("Title is required."));
        }
        if draft.author.is_empty() {
            return Err(anyhow!("Author is required."));
        }
        Ok(draft)
    }

    /// Render one line of the form.
    pub(crate) fn build_line(&self, field: Field) -> Line<'static> {
        let value = self.draft.get(field);
        let is_active = self.active_field() == field;

        let placeholder = match field {
            Field::Title | Field::Author => "<required>",
            Field::Rating => "<0-5, blank for unrated>",
            Field::Status => "<←/→ to choose>",
            Field::DateRead => "<YYYY/MM/DD>",
            _ => "<optional>",
        };

        let display = if value.is_empty() {
            placeholder.to_string()
        } else {
            value.replace('\n', " ⏎ ")
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(field_prefix(field)),
            Span::styled(display, style),
        ])
    }

    /// Cursor column for the active field, relative to the form's inner area.
    pub(crate) fn cursor_offset(&self) -> usize {
        let field = self.active_field();
        let value = self.draft.get(field).replace('\n', " ⏎ ");
        field_prefix(field).chars().count() + value.chars().count()
    }
}

fn field_prefix(field: Field) -> String {
    format!("{:>10}: ", field.label())
}

/// Book awaiting delete confirmation.
#[derive(Clone)]
pub(crate) struct ConfirmBookDelete {
    pub(crate) id: RecordId,
    pub(crate) display_title: String,
}

impl ConfirmBookDelete {
    pub(crate) fn from(record: &BookRecord) -> Self {
        Self {
            id: record.id,
            display_title: record.display_title(),
        }
    }
}

/// First-run prompt asking which export to import.
#[derive(Clone)]
pub(crate) struct ImportPrompt {
    pub(crate) path: String,
    pub(crate) error: Option<String>,
}

impl ImportPrompt {
    pub(crate) fn new(suggestion: &str) -> Self {
        Self {
            path: suggestion.to_string(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.path.push(ch);
        self.error = None;
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.path.pop();
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn focus(form: &mut BookForm, field: Field) {
        form.active = FORM_FIELDS.iter().position(|f| *f == field).unwrap();
    }

    #[test]
    fn rating_takes_a_single_digit() {
        let mut form = BookForm::new();
        focus(&mut form, Field::Rating);

        assert!(!form.push_char('x'));
        assert!(form.push_char('4'));
        assert!(!form.push_char('2'));
        assert_eq!(form.draft.rating, "4");
    }

    #[test]
    fn required_fields_are_enforced() {
        let mut form = BookForm::new();
        form.draft.title = "  ".to_string();
        assert!(form.parse_inputs().unwrap_err().to_string().contains("Title"));

        form.draft.title = "Beloved".to_string();
        assert!(form.parse_inputs().unwrap_err().to_string().contains("Author"));

        form.draft.author = " Toni Morrison ".to_string();
        let draft = form.parse_inputs().unwrap();
        assert_eq!(draft.author, "Toni Morrison");
        assert_eq!(draft.status, DEFAULT_STATUS);
    }

    #[test]
    fn status_cycles_through_presets_in_both_directions() {
        let mut form = BookForm::new();
        assert!(!form.cycle_status(true));

        focus(&mut form, Field::Status);
        assert!(form.cycle_status(true));
        assert_eq!(form.draft.status, STATUS_CHOICES[0]);
        form.cycle_status(false);
        assert_eq!(form.draft.status, DEFAULT_STATUS);

        form.draft.status = "abandoned".to_string();
        form.cycle_status(true);
        assert_eq!(form.draft.status, STATUS_CHOICES[0]);
    }

    #[test]
    fn focus_wraps_around() {
        let mut form = BookForm::new();
        form.previous_field();
        assert_eq!(form.active_field(), Field::Review);
        form.next_field();
        assert_eq!(form.active_field(), Field::Title);
    }
}
