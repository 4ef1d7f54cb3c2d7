// Month view composition: navigation, filters, per-cell projection, and the
// interaction rules between grid, form and delete confirmation.
use crate::filter::FilterOptions;
use crate::form::{EventForm, SaveOutcome};
use crate::grid::{self, GridDay, WeekStart};
use crate::model::{Event, EventId, Palette};
use crate::store::EventStore;
use chrono::{Days, NaiveDate};

/// A delete waiting for the user's yes/no.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub id: EventId,
    pub title: String,
    /// Raised from the open form rather than from a chip.
    pub from_form: bool,
}

impl DeleteRequest {
    pub fn prompt(&self) -> String {
        format!("Are you sure you want to delete this event? ({})", self.title)
    }
}

/// One rendered day cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellView<'a> {
    pub day: GridDay,
    pub events: Vec<&'a Event>,
}

#[derive(Debug, Clone)]
pub struct CalendarView {
    pub current_month: NaiveDate,
    /// Day under the keyboard cursor.
    pub cursor: NaiveDate,
    search_term: String,
    filter_category: Option<Palette>,
    pub week_start: WeekStart,
    pub form: EventForm,
    pending_delete: Option<DeleteRequest>,
}

impl CalendarView {
    pub fn new(today: NaiveDate, week_start: WeekStart, default_color: Option<Palette>) -> Self {
        Self {
            current_month: grid::first_of_month(today),
            cursor: today,
            search_term: String::new(),
            filter_category: None,
            week_start,
            form: EventForm::new(default_color),
            pending_delete: None,
        }
    }

    // --- Navigation ---

    pub fn next_month(&mut self) {
        self.shift_month(1);
    }

    pub fn previous_month(&mut self) {
        self.shift_month(-1);
    }

    fn shift_month(&mut self, delta: i32) {
        self.current_month = grid::shift_month(self.current_month, delta);
        self.cursor = grid::shift_month(self.cursor, delta);
    }

    pub fn go_to_today(&mut self, today: NaiveDate) {
        self.current_month = grid::first_of_month(today);
        self.cursor = today;
    }

    /// Moves the cursor by whole days, following it into adjacent months.
    pub fn move_cursor(&mut self, days: i64) {
        let step = Days::new(days.unsigned_abs());
        let moved = if days >= 0 {
            self.cursor.checked_add_days(step)
        } else {
            self.cursor.checked_sub_days(step)
        };
        if let Some(day) = moved {
            self.cursor = day;
            if !grid::same_month(day, self.current_month) {
                self.current_month = grid::first_of_month(day);
            }
        }
    }

    pub fn month_title(&self) -> String {
        grid::month_title(self.current_month)
    }

    // --- Filters ---

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Stores the term case-folded, as typed into the search box.
    pub fn set_search_term(&mut self, term: &str) {
        self.search_term = term.to_lowercase();
    }

    pub fn filter_category(&self) -> Option<Palette> {
        self.filter_category
    }

    pub fn set_filter_category(&mut self, category: Option<Palette>) {
        self.filter_category = category;
    }

    pub fn cycle_filter_category(&mut self, forward: bool) {
        self.filter_category = Palette::cycle_optional(self.filter_category, forward);
    }

    pub fn clear_filters(&mut self) {
        self.search_term.clear();
        self.filter_category = None;
    }

    pub fn filter_options(&self) -> FilterOptions<'_> {
        FilterOptions::new(&self.search_term, self.filter_category)
    }

    // --- Projection ---

    pub fn grid(&self, today: NaiveDate) -> Vec<GridDay> {
        grid::build_month_grid(self.current_month, today, self.week_start)
    }

    /// Every visible cell with its matching events. Derived fresh on each call.
    pub fn cells<'s>(&self, store: &'s EventStore, today: NaiveDate) -> Vec<CellView<'s>> {
        let opts = self.filter_options();
        self.grid(today)
            .into_iter()
            .map(|day| CellView {
                day,
                events: store.events_on(day.date, &opts),
            })
            .collect()
    }

    pub fn events_for<'s>(&self, store: &'s EventStore, day: NaiveDate) -> Vec<&'s Event> {
        store.events_on(day, &self.filter_options())
    }

    // --- Interaction ---

    /// Clicking a cell's empty area opens a blank form for that day.
    pub fn click_day(&mut self, day: NaiveDate) {
        self.cursor = day;
        self.form.open_new(day);
    }

    /// Clicking a chip opens the form on that event, and only that.
    pub fn click_event(&mut self, store: &EventStore, id: &EventId) -> bool {
        let Some(event) = store.get(id) else {
            return false;
        };
        self.cursor = event.date;
        self.form.open_edit(event);
        true
    }

    pub fn save_form(&mut self, store: &mut EventStore) -> SaveOutcome {
        self.form.save(store)
    }

    pub fn cancel_form(&mut self) {
        self.form.cancel();
    }

    pub fn request_delete_from_form(&mut self, store: &EventStore) -> bool {
        let Some(id) = self.form.delete_target().cloned() else {
            return false;
        };
        self.request_delete(store, id, true)
    }

    pub fn request_delete_from_chip(&mut self, store: &EventStore, id: &EventId) -> bool {
        self.request_delete(store, id.clone(), false)
    }

    fn request_delete(&mut self, store: &EventStore, id: EventId, from_form: bool) -> bool {
        let Some(event) = store.get(&id) else {
            return false;
        };
        self.pending_delete = Some(DeleteRequest {
            id,
            title: event.title.clone(),
            from_form,
        });
        true
    }

    pub fn pending_delete(&self) -> Option<&DeleteRequest> {
        self.pending_delete.as_ref()
    }

    /// Answers the pending confirmation. Returns the removed id on a confirmed
    /// delete. Declining leaves both the store and the form as they were.
    pub fn resolve_delete(&mut self, store: &mut EventStore, confirmed: bool) -> Option<EventId> {
        let request = self.pending_delete.take()?;
        if !confirmed {
            return None;
        }
        let removed = store.remove(&request.id);
        if request.from_form {
            self.form.finish_delete();
        }
        removed.then_some(request.id)
    }
}
