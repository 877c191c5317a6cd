use crate::library::{RecordStore, SortSpec};
use crate::models::{Field, RecordId};

/// Columns the `s` key cycles through, after the default priority order.
pub(crate) const SORTABLE_FIELDS: [Field; 8] = [
    Field::Author,
    Field::Title,
    Field::Rating,
    Field::Status,
    Field::Publisher,
    Field::YearPublished,
    Field::DateRead,
    Field::DateAdded,
];

/// View state of the book table: which records are visible, in what order,
/// and which one is selected. Rows are ids, so the store stays the only owner
/// of record data.
pub(crate) struct TableScreen {
    pub(crate) rows: Vec<RecordId>,
    pub(crate) selected: usize,
    pub(crate) filter: Option<String>,
    pub(crate) sort: Option<SortSpec>,
}

impl TableScreen {
    pub(crate) fn new(store: &RecordStore) -> Self {
        let mut screen = Self {
            rows: Vec::new(),
            selected: 0,
            filter: None,
            sort: None,
        };
        screen.refresh(store);
        screen
    }

    /// Recompute visible rows after the store, the filter or the sort
    /// changed, keeping the selection on the same book when it survives.
    pub(crate) fn refresh(&mut self, store: &RecordStore) {
        let focus = self.current_id();
        let view = match self.sort {
            Some(sort) => store.sorted_view(sort),
            None => store.ordered_view(),
        };

        self.rows = view
            .into_iter()
            .filter(|record| {
                self.filter
                    .as_deref()
                    .map_or(true, |query| record.matches(query))
            })
            .map(|record| record.id)
            .collect();

        if let Some(id) = focus {
            if self.select_id(id) {
                return;
            }
        }
        self.ensure_in_bounds();
    }

    /// Move the selection to `id` if it is visible.
    pub(crate) fn select_id(&mut self, id: RecordId) -> bool {
        match self.rows.iter().position(|row| *row == id) {
            Some(index) => {
                self.selected = index;
                true
            }
            None => false,
        }
    }

    pub(crate) fn current_id(&self) -> Option<RecordId> {
        self.rows.get(self.selected).copied()
    }

    pub(crate) fn set_filter(&mut self, filter: Option<String>, store: &RecordStore) {
        self.filter = filter.filter(|query| !query.trim().is_empty());
        self.refresh(store);
    }

    /// Advance to the next sort column; after the last one the table goes
    /// back to plain priority order.
    pub(crate) fn cycle_sort(&mut self, store: &RecordStore) {
        self.sort = match self.sort {
            None => Some(SortSpec::ascending(SORTABLE_FIELDS[0])),
            Some(current) => SORTABLE_FIELDS
                .iter()
                .position(|field| *field == current.field)
                .and_then(|index| SORTABLE_FIELDS.get(index + 1))
                .map(|field| SortSpec::ascending(*field)),
        };
        self.refresh(store);
    }

    /// Flip the direction of the active sort. Returns `false` when the table
    /// is in plain priority order and there is nothing to flip.
    pub(crate) fn toggle_direction(&mut self, store: &RecordStore) -> bool {
        match self.sort.as_mut() {
            Some(sort) => {
                sort.descending = !sort.descending;
                self.refresh(store);
                true
            }
            None => false,
        }
    }

    /// Human-readable description of the current ordering.
    pub(crate) fn sort_label(&self) -> String {
        match self.sort {
            None => "reading first".to_string(),
            Some(sort) if sort.descending => format!("{} ▼", sort.field.label()),
            Some(sort) => format!("{} ▲", sort.field.label()),
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.rows.is_empty() {
            return;
        }
        let last = self.rows.len() as isize - 1;
        self.selected = (self.selected as isize + offset).clamp(0, last) as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.rows.len().saturating_sub(1);
    }

    fn ensure_in_bounds(&mut self) {
        if self.rows.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.rows.len() {
            self.selected = self.rows.len() - 1;
        }
    }
}
