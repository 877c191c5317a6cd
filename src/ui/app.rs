use std::cmp::min;
use std::collections::HashMap;
use std::mem;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use log::warn;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap,
};
use ratatui::Frame;

use crate::library::{import_from_path, save_to_path, LoadReport, RecordStore};
use crate::models::{BookChanges, BookRecord, RecordId};

use super::forms::{BookForm, ConfirmBookDelete, ImportPrompt, FORM_FIELDS};
use super::helpers::{cell_text, centered_rect, surface_error, TABLE_COLUMNS};
use super::screens::TableScreen;

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown.
const PAGE_STEP: isize = 10;

/// Fine-grained modes layered over the book table.
enum Mode {
    Normal,
    Adding(BookForm),
    Editing { id: RecordId, form: BookForm },
    ConfirmDelete(ConfirmBookDelete),
    Searching(SearchState),
    Importing(ImportPrompt),
}

/// State for an active inline search.
struct SearchState {
    query: String,
}

/// What a key press did to an open book form.
enum FormAction {
    Keep,
    Cancel,
    Submit,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Warning,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Warning => Style::default().fg(Color::Yellow),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state. The app owns the record store for the whole
/// run and writes it back after every successful mutation and on quit.
pub struct App {
    store: RecordStore,
    library_path: PathBuf,
    table: TableScreen,
    mode: Mode,
    status: Option<StatusMessage>,
    quit_armed: bool,
}

impl App {
    pub fn new(store: RecordStore, library_path: PathBuf) -> Self {
        let table = TableScreen::new(&store);
        Self {
            store,
            library_path,
            table,
            mode: Mode::Normal,
            status: None,
            quit_armed: false,
        }
    }

    /// Start with an empty library and ask which export to import. Nothing is
    /// written until the user answers.
    pub fn first_run(library_path: PathBuf, suggestion: &str) -> Self {
        let mut app = Self::new(RecordStore::default(), library_path);
        app.mode = Mode::Importing(ImportPrompt::new(suggestion));
        app
    }

    /// Tell the user about rows that were repaired while loading.
    pub fn report_load(&mut self, report: &LoadReport) {
        if let Some(summary) = report.summary() {
            self.set_status(summary, StatusKind::Warning);
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        if !matches!(code, KeyCode::Char('q') | KeyCode::Esc) {
            self.quit_armed = false;
        }

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Adding(form) => self.handle_add_book(code, form)?,
            Mode::Editing { id, form } => self.handle_edit_book(code, id, form)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
            Mode::Searching(state) => self.handle_search(code, state)?,
            Mode::Importing(prompt) => self.handle_import(code, prompt, &mut exit)?,
        };

        self.mode = mode;
        Ok(exit)
    }

    /// Ctrl-key shortcuts: Ctrl+S saves, Ctrl+C quits like `q`.
    pub fn handle_ctrl(&mut self, code: KeyCode) -> Result<bool> {
        match code {
            KeyCode::Char('s') if !matches!(self.mode, Mode::Importing(_)) => {
                self.save_now();
                Ok(false)
            }
            KeyCode::Char('c') => {
                if matches!(self.mode, Mode::Importing(_)) {
                    return Ok(true);
                }
                Ok(self.request_quit())
            }
            _ => Ok(false),
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = self.request_quit();
            }
            KeyCode::Up => self.table.move_selection(-1),
            KeyCode::Down => self.table.move_selection(1),
            KeyCode::PageUp => self.table.move_selection(-PAGE_STEP),
            KeyCode::PageDown => self.table.move_selection(PAGE_STEP),
            KeyCode::Home => self.table.select_first(),
            KeyCode::End => self.table.select_last(),
            KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Char('+') => {
                self.clear_status();
                return Ok(Mode::Adding(BookForm::new()));
            }
            KeyCode::Char('e') | KeyCode::Char('E') | KeyCode::Enter => {
                if let Some(record) = self.current_record() {
                    let mode = Mode::Editing {
                        id: record.id,
                        form: BookForm::from_record(record),
                    };
                    self.clear_status();
                    return Ok(mode);
                }
                self.set_status("No book selected to edit.", StatusKind::Error);
            }
            KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Char('-') => {
                if let Some(record) = self.current_record() {
                    let confirm = ConfirmBookDelete::from(record);
                    self.clear_status();
                    return Ok(Mode::ConfirmDelete(confirm));
                }
                self.set_status("No book selected to delete.", StatusKind::Error);
            }
            KeyCode::Char('f') | KeyCode::Char('/') => {
                let query = self.table.filter.clone().unwrap_or_default();
                return Ok(Mode::Searching(SearchState { query }));
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.table.cycle_sort(&self.store);
                self.set_status(
                    format!("Sorted by {}.", self.table.sort_label()),
                    StatusKind::Info,
                );
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if self.table.toggle_direction(&self.store) {
                    self.set_status(
                        format!("Sorted by {}.", self.table.sort_label()),
                        StatusKind::Info,
                    );
                } else {
                    self.set_status("Pick a sort column with [s] first.", StatusKind::Error);
                }
            }
            KeyCode::Char('w') | KeyCode::Char('W') => self.save_now(),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_add_book(&mut self, code: KeyCode, mut form: BookForm) -> Result<Mode> {
        match apply_form_key(&mut form, code) {
            FormAction::Keep => Ok(Mode::Adding(form)),
            FormAction::Cancel => {
                self.set_status("Add book cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            FormAction::Submit => match self.save_new_book(&form) {
                Ok(()) => Ok(Mode::Normal),
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                    Ok(Mode::Adding(form))
                }
            },
        }
    }

    fn handle_edit_book(&mut self, code: KeyCode, id: RecordId, mut form: BookForm) -> Result<Mode> {
        match apply_form_key(&mut form, code) {
            FormAction::Keep => Ok(Mode::Editing { id, form }),
            FormAction::Cancel => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            FormAction::Submit => match self.save_existing_book(id, &form) {
                Ok(()) => Ok(Mode::Normal),
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                    Ok(Mode::Editing { id, form })
                }
            },
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmBookDelete) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_delete(&confirm) {
                    Ok(()) => Ok(Mode::Normal),
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Ok(Mode::Normal)
                    }
                }
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.table.set_filter(None, &self.store);
                return Ok(Mode::Normal);
            }
            KeyCode::Enter => return Ok(Mode::Normal),
            KeyCode::Up => {
                self.table.move_selection(-1);
                return Ok(Mode::Searching(state));
            }
            KeyCode::Down => {
                self.table.move_selection(1);
                return Ok(Mode::Searching(state));
            }
            KeyCode::PageUp => {
                self.table.move_selection(-PAGE_STEP);
                return Ok(Mode::Searching(state));
            }
            KeyCode::PageDown => {
                self.table.move_selection(PAGE_STEP);
                return Ok(Mode::Searching(state));
            }
            KeyCode::Backspace => {
                state.query.pop();
            }
            KeyCode::Char(ch) if !ch.is_control() => state.query.push(ch),
            _ => {}
        }

        self.table
            .set_filter(Some(state.query.clone()), &self.store);
        Ok(Mode::Searching(state))
    }

    fn handle_import(
        &mut self,
        code: KeyCode,
        mut prompt: ImportPrompt,
        exit: &mut bool,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Char(ch) => {
                prompt.push_char(ch);
            }
            KeyCode::Enter => match self.run_import(&prompt.path) {
                Ok(()) => return Ok(Mode::Normal),
                Err(err) => {
                    let message = surface_error(&err);
                    prompt.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            _ => {}
        }
        Ok(Mode::Importing(prompt))
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        self.draw_table(frame, content_area);

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Adding(form) => self.draw_book_form(frame, area, "Add Book", form),
            Mode::Editing { form, .. } => self.draw_book_form(frame, area, "Edit Book", form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::Importing(prompt) => self.draw_import_prompt(frame, area, prompt),
            Mode::Normal => {}
        }
    }

    fn draw_table(&self, frame: &mut Frame, area: Rect) {
        let mut title = format!(
            " Tome Todo List | {} books | {} ",
            self.store.len(),
            self.table.sort_label()
        );
        if let Some(filter) = &self.table.filter {
            title.push_str(&format!("| filter: {filter} "));
        }
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.table.rows.is_empty() {
            let text = if self.table.filter.is_some() {
                "No books match the current search."
            } else {
                "No books yet. Press 'a' to add one."
            };
            let message = Paragraph::new(text)
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let by_id: HashMap<RecordId, &BookRecord> = self
            .store
            .records()
            .iter()
            .map(|record| (record.id, record))
            .collect();

        let header_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let header = Row::new(TABLE_COLUMNS.iter().map(|(field, _)| {
            let label = match self.table.sort {
                Some(sort) if sort.field == *field && sort.descending => {
                    format!("{} ▼", field.label())
                }
                Some(sort) if sort.field == *field => format!("{} ▲", field.label()),
                _ => field.label().to_string(),
            };
            Cell::from(label)
        }))
        .style(header_style);

        let rows = self
            .table
            .rows
            .iter()
            .filter_map(|id| by_id.get(id).copied())
            .map(|record| {
                let row = Row::new(
                    TABLE_COLUMNS
                        .iter()
                        .map(|(field, _)| Cell::from(cell_text(record, *field))),
                );
                if record.is_reading() {
                    row.style(Style::default().fg(Color::Green))
                } else {
                    row
                }
            });

        let table = Table::new(rows, TABLE_COLUMNS.iter().map(|(_, width)| *width))
            .header(header)
            .block(block)
            .row_highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("» ");

        let mut state = TableState::default().with_selected(Some(self.table.selected));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Search title or author");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + state.query.chars().count() as u16;
        frame.set_cursor_position((min(cursor_x, inner.right().saturating_sub(1)), inner.y));
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&'static str, &'static str)] = match &self.mode {
            Mode::Adding(_) | Mode::Editing { .. } => &[
                ("[Tab/↑↓]", " Field   "),
                ("[←→]", " Status   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
            Mode::ConfirmDelete(_) => &[("[y]", " Delete   "), ("[n/Esc]", " Keep")],
            Mode::Searching(_) => &[
                ("[↑↓]", " Select   "),
                ("[Enter]", " Keep Filter   "),
                ("[Esc]", " Clear"),
            ],
            Mode::Importing(_) => &[
                ("[Enter]", " Import (empty for new library)   "),
                ("[Esc]", " Quit"),
            ],
            Mode::Normal => &[
                ("[↑↓]", " Select   "),
                ("[a]", " Add   "),
                ("[e]", " Edit   "),
                ("[d]", " Delete   "),
                ("[f]", " Search   "),
                ("[s]", " Sort   "),
                ("[r]", " Reverse   "),
                ("[w]", " Save   "),
                ("[q]", " Quit"),
            ],
        };

        Line::from(
            keys.iter()
                .flat_map(|(key, label)| {
                    [Span::styled(*key, key_style), Span::raw(*label)]
                })
                .collect::<Vec<_>>(),
        )
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &BookForm) {
        let popup_area = centered_rect(70, 70, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = FORM_FIELDS
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • ←/→ to pick a status • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines);
        frame.render_widget(paragraph, inner);

        let cursor_x = inner.x + form.cursor_offset() as u16;
        let cursor_y = inner.y + form.active as u16;
        frame.set_cursor_position((
            min(cursor_x, inner.right().saturating_sub(1)),
            min(cursor_y, inner.bottom().saturating_sub(1)),
        ));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmBookDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Deletion")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Delete {}?", confirm.display_title)),
            Line::from("The library file is rewritten right away."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_import_prompt(&self, frame: &mut Frame, area: Rect, prompt: &ImportPrompt) {
        let popup_area = centered_rect(70, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Welcome to Tome Todo List")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            Line::from(format!(
                "No library found at {}.",
                self.library_path.display()
            )),
            Line::from("Enter the path of a CSV export to import, or clear it to start empty."),
            Line::from(""),
            Line::from(vec![
                Span::raw("Path: "),
                Span::styled(prompt.path.clone(), Style::default().fg(Color::Yellow)),
            ]),
            Line::from(""),
        ];
        if let Some(error) = &prompt.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let cursor_x = inner.x + "Path: ".len() as u16 + prompt.path.chars().count() as u16;
        frame.set_cursor_position((
            min(cursor_x, inner.right().saturating_sub(1)),
            min(inner.y + 3, inner.bottom().saturating_sub(1)),
        ));
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn current_record(&self) -> Option<&BookRecord> {
        self.table.current_id().and_then(|id| self.store.get(id))
    }

    fn save_new_book(&mut self, form: &BookForm) -> Result<()> {
        let draft = form.parse_inputs()?;
        let record = self.store.add(draft).context("failed to add book")?;
        let (id, title) = (record.id, record.display_title());

        self.table.refresh(&self.store);
        if !self.table.select_id(id) {
            // The new book may be hidden by the active search.
            self.table.set_filter(None, &self.store);
            self.table.select_id(id);
        }
        self.write_through(format!("Added {title}."));
        Ok(())
    }

    fn save_existing_book(&mut self, id: RecordId, form: &BookForm) -> Result<()> {
        let draft = form.parse_inputs()?;
        let record = self
            .store
            .update(id, BookChanges::from(draft))
            .context("failed to update book")?;
        let title = record.display_title();

        self.table.refresh(&self.store);
        self.write_through(format!("Updated {title}."));
        Ok(())
    }

    fn perform_delete(&mut self, confirm: &ConfirmBookDelete) -> Result<()> {
        self.store
            .delete(confirm.id)
            .context("failed to delete book")?;
        self.table.refresh(&self.store);
        self.write_through(format!("Deleted {}.", confirm.display_title));
        Ok(())
    }

    /// Import the export at `raw`, or start empty when the path is blank or
    /// names no file. The library file is created right away so the next
    /// launch skips the prompt.
    fn run_import(&mut self, raw: &str) -> Result<()> {
        let trimmed = raw.trim();
        let (store, report, message) = if trimmed.is_empty() {
            (
                RecordStore::default(),
                LoadReport::default(),
                "Started an empty library.".to_string(),
            )
        } else {
            let source = PathBuf::from(trimmed);
            if source.try_exists()? {
                let loaded = import_from_path(&source).context("failed to import library")?;
                let message = format!("Imported {} books from `{trimmed}`.", loaded.store.len());
                (loaded.store, loaded.report, message)
            } else {
                (
                    RecordStore::default(),
                    LoadReport::default(),
                    format!("No file at `{trimmed}`; started an empty library."),
                )
            }
        };

        save_to_path(&self.library_path, &store).context("failed to create library file")?;

        self.store = store;
        self.table = TableScreen::new(&self.store);
        match report.summary() {
            Some(summary) => self.set_status(format!("{message} {summary}"), StatusKind::Warning),
            None => self.set_status(message, StatusKind::Info),
        }
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        save_to_path(&self.library_path, &self.store).context("failed to save library")
    }

    /// Save after a mutation. The change already happened in memory, so a
    /// failed write is reported but does not undo it; quitting retries.
    fn write_through(&mut self, done: String) {
        match self.persist() {
            Ok(()) => self.set_status(done, StatusKind::Info),
            Err(err) => self.set_status(
                format!("{done} Saving failed: {}", surface_error(&err)),
                StatusKind::Error,
            ),
        }
    }

    fn save_now(&mut self) {
        match self.persist() {
            Ok(()) => self.set_status(
                format!("Saved {} books.", self.store.len()),
                StatusKind::Info,
            ),
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    /// Save and report whether the app may exit. A failed save keeps the app
    /// open once; asking again quits without saving.
    fn request_quit(&mut self) -> bool {
        if self.quit_armed {
            warn!("event=app_quit status=unsaved");
            return true;
        }
        match self.persist() {
            Ok(()) => true,
            Err(err) => {
                self.quit_armed = true;
                self.set_status(
                    format!(
                        "{} Press q again to quit without saving.",
                        surface_error(&err)
                    ),
                    StatusKind::Error,
                );
                false
            }
        }
    }
}

/// Route a key press to an open book form.
fn apply_form_key(form: &mut BookForm, code: KeyCode) -> FormAction {
    match code {
        KeyCode::Esc => return FormAction::Cancel,
        KeyCode::Enter => return FormAction::Submit,
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.previous_field(),
        KeyCode::Left => {
            form.cycle_status(false);
        }
        KeyCode::Right => {
            form.cycle_status(true);
        }
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(ch) => {
            if form.push_char(ch) {
                form.error = None;
            }
        }
        _ => {}
    }
    FormAction::Keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::load_from_path;
    use crate::models::{BookDraft, CURRENTLY_READING};

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    fn app_in(dir: &tempfile::TempDir) -> App {
        App::new(RecordStore::default(), dir.path().join("library.csv"))
    }

    #[test]
    fn adding_a_book_writes_through_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);

        app.handle_key(KeyCode::Char('a')).unwrap();
        type_text(&mut app, "Piranesi");
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "Susanna Clarke");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        let loaded = load_from_path(app.library_path()).unwrap();
        assert_eq!(loaded.store.len(), 1);
        assert_eq!(loaded.store.records()[0].title, "Piranesi");
    }

    #[test]
    fn invalid_rating_keeps_the_form_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);

        app.handle_key(KeyCode::Char('a')).unwrap();
        type_text(&mut app, "Title");
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "Author");
        app.handle_key(KeyCode::Tab).unwrap();
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "9");
        app.handle_key(KeyCode::Enter).unwrap();

        match &app.mode {
            Mode::Adding(form) => assert!(form.error.as_deref().unwrap().contains("rating")),
            _ => panic!("form should stay open"),
        }
        assert!(app.store().is_empty());
        assert!(!app.library_path().exists());
    }

    #[test]
    fn delete_requires_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RecordStore::default();
        store
            .add(BookDraft {
                title: "Gilead".to_string(),
                status: CURRENTLY_READING.to_string(),
                ..BookDraft::default()
            })
            .unwrap();
        let mut app = App::new(store, dir.path().join("library.csv"));

        app.handle_key(KeyCode::Char('d')).unwrap();
        app.handle_key(KeyCode::Char('n')).unwrap();
        assert_eq!(app.store().len(), 1);

        app.handle_key(KeyCode::Char('d')).unwrap();
        app.handle_key(KeyCode::Char('y')).unwrap();
        assert!(app.store().is_empty());
        assert!(load_from_path(app.library_path()).unwrap().store.is_empty());
    }

    #[test]
    fn quit_saves_the_library() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);

        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
        assert!(app.library_path().exists());
    }

    #[test]
    fn failed_save_on_quit_needs_a_second_press() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(
            RecordStore::default(),
            dir.path().join("missing-dir").join("library.csv"),
        );

        assert!(!app.handle_key(KeyCode::Char('q')).unwrap());
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }

    #[test]
    fn first_run_with_blank_path_starts_empty_library() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::first_run(dir.path().join("library.csv"), "export.csv");

        for _ in 0.."export.csv".len() {
            app.handle_key(KeyCode::Backspace).unwrap();
        }
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        assert!(app.library_path().exists());
    }

    #[test]
    fn first_run_with_missing_export_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        let mut app = App::first_run(
            dir.path().join("library.csv"),
            missing.to_str().unwrap(),
        );

        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        assert!(app.store().is_empty());
        assert!(app.library_path().exists());
    }

    #[test]
    fn first_run_imports_an_existing_export() {
        let dir = tempfile::tempdir().unwrap();
        let export = dir.path().join("export.csv");
        std::fs::write(&export, "Title,Author,Exclusive Shelf\nDune,Frank Herbert,read\n").unwrap();
        let mut app = App::first_run(dir.path().join("library.csv"), export.to_str().unwrap());

        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.store().len(), 1);
        assert_eq!(load_from_path(app.library_path()).unwrap().store.len(), 1);
    }
}
