// File: ./src/tui/state.rs
// Manages the application state for the TUI.
use crate::calendar::CalendarView;
use crate::config::Config;
use crate::context::SharedContext;
use crate::model::Event;
use crate::storage::{FileSlot, MemorySlot, PersistentSlot};
use crate::store::EventStore;
use chrono::{Local, NaiveDate};
use std::sync::Arc;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InputMode {
    Normal,
    Searching,
    Form,
    ConfirmDelete,
}

pub struct AppState {
    // Data
    pub ctx: SharedContext,
    pub config: Config,
    pub store: EventStore,
    pub calendar: CalendarView,
    pub today: NaiveDate,

    // UI State
    pub mode: InputMode,
    pub message: String,
    /// Selected chip inside the cursor cell.
    pub chip_index: Option<usize>,
    pub show_full_help: bool,

    // Input Buffers
    pub input_buffer: String,
    pub cursor_position: usize,
}

impl AppState {
    /// Opens the event slot of `ctx`. When the data directory is unusable the
    /// session runs on an in-memory slot instead.
    pub fn new_with_ctx(ctx: SharedContext, config: Config) -> Self {
        let (slot, message): (Box<dyn PersistentSlot>, String) =
            match FileSlot::from_context(ctx.as_ref()) {
                Ok(slot) => (Box::new(slot), "Ready.".to_string()),
                Err(e) => {
                    log::warn!("Data directory unavailable, events will not persist: {:#}", e);
                    (
                        Box::new(MemorySlot::new()),
                        "Storage unavailable: changes will not be kept.".to_string(),
                    )
                }
            };
        let store = EventStore::load(slot);
        let mut state = Self::with_store(ctx, config, store, Local::now().date_naive());
        state.message = message;
        state
    }

    pub fn with_store(
        ctx: SharedContext,
        config: Config,
        store: EventStore,
        today: NaiveDate,
    ) -> Self {
        let calendar = CalendarView::new(today, config.week_start, config.default_color);
        Self {
            ctx,
            config,
            store,
            calendar,
            today,
            mode: InputMode::Normal,
            message: String::new(),
            chip_index: None,
            show_full_help: false,
            input_buffer: String::new(),
            cursor_position: 0,
        }
    }

    /// Picks up a date change while the app stays open over midnight.
    pub fn refresh_today(&mut self) {
        self.today = Local::now().date_naive();
    }

    // --- CHIPS IN THE CURSOR CELL ---

    pub fn cursor_events(&self) -> Vec<&Event> {
        self.calendar.events_for(&self.store, self.calendar.cursor)
    }

    pub fn selected_event(&self) -> Option<&Event> {
        let idx = self.chip_index?;
        self.cursor_events().get(idx).copied()
    }

    /// Drops the chip selection if it no longer points at a visible event.
    pub fn clamp_chip(&mut self) {
        let len = self.cursor_events().len();
        if let Some(i) = self.chip_index
            && i >= len
        {
            self.chip_index = if len == 0 { None } else { Some(len - 1) };
        }
    }

    pub fn next_chip(&mut self) {
        let len = self.cursor_events().len();
        if len == 0 {
            self.chip_index = None;
            return;
        }
        let i = match self.chip_index {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.chip_index = Some(i);
    }

    pub fn previous_chip(&mut self) {
        let len = self.cursor_events().len();
        if len == 0 {
            self.chip_index = None;
            return;
        }
        let i = match self.chip_index {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => len - 1,
        };
        self.chip_index = Some(i);
    }

    /// Derives the input mode from the calendar after an interaction.
    pub fn sync_mode(&mut self) {
        self.mode = if self.calendar.pending_delete().is_some() {
            InputMode::ConfirmDelete
        } else if self.calendar.form.is_open() {
            InputMode::Form
        } else if self.mode == InputMode::Searching {
            InputMode::Searching
        } else {
            InputMode::Normal
        };
        self.clamp_chip();
    }

    // --- TEXT INPUT ---

    pub fn move_cursor_left(&mut self) {
        let cursor_moved_left = self.cursor_position.saturating_sub(1);
        self.cursor_position = self.clamp_cursor(cursor_moved_left);
    }

    pub fn move_cursor_right(&mut self) {
        let cursor_moved_right = self.cursor_position.saturating_add(1);
        self.cursor_position = self.clamp_cursor(cursor_moved_right);
    }

    pub fn enter_char(&mut self, new_char: char) {
        let byte_index = self
            .input_buffer
            .char_indices()
            .map(|(i, _)| i)
            .nth(self.cursor_position)
            .unwrap_or(self.input_buffer.len());

        self.input_buffer.insert(byte_index, new_char);
        self.move_cursor_right();
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position != 0 {
            let current_index = self.cursor_position;
            let before = self.input_buffer.chars().take(current_index - 1);
            let after = self.input_buffer.chars().skip(current_index);
            self.input_buffer = before.chain(after).collect();
            self.move_cursor_left();
        }
    }

    pub fn reset_input(&mut self) {
        self.input_buffer.clear();
        self.cursor_position = 0;
    }

    /// Loads `text` into the input line with the cursor at its end.
    pub fn set_input(&mut self, text: &str) {
        self.input_buffer = text.to_string();
        self.cursor_position = self.input_buffer.chars().count();
    }

    fn clamp_cursor(&self, new_cursor_pos: usize) -> usize {
        new_cursor_pos.clamp(0, self.input_buffer.chars().count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TestContext;
    use crate::model::EventDraft;

    fn state_with(titles: &[&str]) -> AppState {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut store = EventStore::in_memory();
        for t in titles {
            store.add(EventDraft::new(t), today);
        }
        AppState::with_store(Arc::new(TestContext::new()), Config::default(), store, today)
    }

    #[test]
    fn test_chip_navigation_wraps() {
        let mut state = state_with(&["a", "b", "c"]);
        assert!(state.selected_event().is_none());

        state.next_chip();
        assert_eq!(state.selected_event().unwrap().title, "a");
        state.next_chip();
        state.next_chip();
        assert_eq!(state.chip_index, Some(2));
        state.next_chip();
        assert_eq!(state.chip_index, Some(0));
        state.previous_chip();
        assert_eq!(state.chip_index, Some(2));
    }

    #[test]
    fn test_chip_navigation_empty_cell() {
        let mut state = state_with(&[]);
        state.next_chip();
        state.previous_chip();
        assert_eq!(state.chip_index, None);
    }

    #[test]
    fn test_chip_clamped_after_filter() {
        let mut state = state_with(&["Standup", "Retro"]);
        state.chip_index = Some(1);
        state.calendar.set_search_term("stand");
        state.sync_mode();
        assert_eq!(state.chip_index, Some(0));
        assert_eq!(state.selected_event().unwrap().title, "Standup");
    }

    #[test]
    fn test_cursor_clamping() {
        let mut state = state_with(&[]);
        state.input_buffer = "abc".to_string();
        state.cursor_position = 0;

        state.move_cursor_right();
        state.move_cursor_right();
        state.move_cursor_right();
        state.move_cursor_right();
        assert_eq!(state.cursor_position, 3);

        state.move_cursor_left();
        state.move_cursor_left();
        state.move_cursor_left();
        state.move_cursor_left();
        assert_eq!(state.cursor_position, 0);
    }

    #[test]
    fn test_enter_and_delete_multibyte() {
        let mut state = state_with(&[]);
        state.enter_char('é');
        state.enter_char('t');
        state.move_cursor_left();
        state.enter_char('x');
        assert_eq!(state.input_buffer, "éxt");
        state.delete_char();
        assert_eq!(state.input_buffer, "ét");
    }

    #[test]
    fn test_new_with_ctx_reads_existing_slot() {
        let ctx = Arc::new(TestContext::new());
        {
            let slot = FileSlot::from_context(ctx.as_ref()).unwrap();
            let mut store = EventStore::load(Box::new(slot));
            store.add(EventDraft::new("Persisted"), Local::now().date_naive());
        }
        let state = AppState::new_with_ctx(ctx, Config::default());
        assert_eq!(state.store.len(), 1);
        assert_eq!(state.message, "Ready.");
    }
}
