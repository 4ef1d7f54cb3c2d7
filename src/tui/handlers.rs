// File: src/tui/handlers.rs
// Handles keyboard input for the TUI.
use crate::form::{FormField, SaveOutcome};
use crate::tui::action::Action;
use crate::tui::state::{AppState, InputMode};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub fn handle_key_event(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    let action = match state.mode {
        InputMode::ConfirmDelete => handle_confirm(key, state),
        InputMode::Form => handle_form(key, state),
        InputMode::Searching => {
            handle_search(key, state);
            None
        }
        InputMode::Normal => handle_normal(key, state),
    };
    state.sync_mode();
    action
}

fn handle_confirm(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    let confirmed = match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => true,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => false,
        _ => return None,
    };
    match state.calendar.resolve_delete(&mut state.store, confirmed) {
        Some(id) => {
            state.message = "Event deleted.".to_string();
            Some(Action::Deleted(id))
        }
        None => {
            state.message = if confirmed {
                "Event was already gone.".to_string()
            } else {
                "Delete cancelled.".to_string()
            };
            None
        }
    }
}

fn handle_form(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let on_selector = !state.calendar.form.focus.is_text();

    match key.code {
        KeyCode::Esc => {
            state.calendar.cancel_form();
            state.message = "Cancelled.".to_string();
        }
        KeyCode::Char('s') if ctrl => return save_form(state),
        KeyCode::Enter if state.calendar.form.focus == FormField::Description => {
            state.calendar.form.insert_char('\n')
        }
        KeyCode::Enter => return save_form(state),
        KeyCode::Char('d') if ctrl => {
            if !state.calendar.request_delete_from_form(&state.store) {
                state.message = "Only saved events can be deleted.".to_string();
            }
        }
        KeyCode::Tab | KeyCode::Down => state.calendar.form.next_field(),
        KeyCode::BackTab | KeyCode::Up => state.calendar.form.previous_field(),
        KeyCode::Left if on_selector => state.calendar.form.cycle_selection(false),
        KeyCode::Right | KeyCode::Char(' ') if on_selector => {
            state.calendar.form.cycle_selection(true)
        }
        KeyCode::Backspace => state.calendar.form.backspace(),
        KeyCode::Char(c) if !ctrl => {
            let form = &mut state.calendar.form;
            // The time field only takes what an HH:MM value can contain.
            if form.focus != FormField::Time || c.is_ascii_digit() || c == ':' {
                form.insert_char(c);
            }
        }
        _ => {}
    }
    None
}

fn save_form(state: &mut AppState) -> Option<Action> {
    let outcome = state.calendar.save_form(&mut state.store);
    match outcome {
        SaveOutcome::Created(id) => {
            state.message = "Event added.".to_string();
            Some(Action::Created(id))
        }
        SaveOutcome::Updated(id) => {
            state.message = "Event updated.".to_string();
            Some(Action::Updated(id))
        }
        SaveOutcome::Stale(_) => {
            state.message = "Event no longer exists.".to_string();
            None
        }
        SaveOutcome::MissingTitle => {
            state.calendar.form.focus = FormField::Title;
            state.message = "Title is required.".to_string();
            None
        }
        SaveOutcome::InvalidTime => {
            state.calendar.form.focus = FormField::Time;
            state.message = "Time must be HH:MM (or empty).".to_string();
            None
        }
        SaveOutcome::NotOpen => None,
    }
}

fn handle_search(key: KeyEvent, state: &mut AppState) {
    match key.code {
        KeyCode::Enter => {
            state.mode = InputMode::Normal;
            state.reset_input();
            state.message = if state.calendar.search_term().is_empty() {
                String::new()
            } else {
                format!("Search: {}", state.calendar.search_term())
            };
        }
        KeyCode::Esc => {
            state.calendar.set_search_term("");
            state.mode = InputMode::Normal;
            state.reset_input();
            state.message = String::new();
        }
        KeyCode::Char(c) => {
            state.enter_char(c);
            state.calendar.set_search_term(&state.input_buffer);
        }
        KeyCode::Backspace => {
            state.delete_char();
            state.calendar.set_search_term(&state.input_buffer);
        }
        KeyCode::Left => state.move_cursor_left(),
        KeyCode::Right => state.move_cursor_right(),
        _ => {}
    }
}

fn move_cursor(state: &mut AppState, days: i64) {
    state.calendar.move_cursor(days);
    state.chip_index = None;
}

/// Flips the first day of the week and remembers it in the config file.
fn toggle_week_start(state: &mut AppState) {
    let week_start = state.calendar.week_start.toggled();
    state.calendar.week_start = week_start;
    state.config.week_start = week_start;
    state.message = match state.config.save(state.ctx.as_ref()) {
        Ok(()) => format!("Weeks start on {}.", week_start),
        Err(e) => {
            log::warn!("Failed to save config: {:#}", e);
            format!("Weeks start on {} (config not saved).", week_start)
        }
    };
}

fn handle_normal(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    match key.code {
        KeyCode::Char('q') => return Some(Action::Quit),
        KeyCode::Char('?') => state.show_full_help = !state.show_full_help,

        KeyCode::Left | KeyCode::Char('h') => move_cursor(state, -1),
        KeyCode::Right | KeyCode::Char('l') => move_cursor(state, 1),
        KeyCode::Up | KeyCode::Char('k') => move_cursor(state, -7),
        KeyCode::Down | KeyCode::Char('j') => move_cursor(state, 7),

        KeyCode::PageDown | KeyCode::Char('n') | KeyCode::Char('>') => {
            state.calendar.next_month();
            state.chip_index = None;
        }
        KeyCode::PageUp | KeyCode::Char('p') | KeyCode::Char('<') => {
            state.calendar.previous_month();
            state.chip_index = None;
        }
        KeyCode::Char('t') => {
            state.refresh_today();
            state.calendar.go_to_today(state.today);
            state.chip_index = None;
        }

        KeyCode::Tab => state.next_chip(),
        KeyCode::BackTab => state.previous_chip(),

        KeyCode::Enter => {
            let selected = state.selected_event().map(|e| e.id.clone());
            match selected {
                Some(id) => {
                    state.calendar.click_event(&state.store, &id);
                }
                None => state.calendar.click_day(state.calendar.cursor),
            }
        }
        KeyCode::Char('a') => state.calendar.click_day(state.calendar.cursor),
        KeyCode::Char('e') => {
            let selected = state.selected_event().map(|e| e.id.clone());
            match selected {
                Some(id) => {
                    state.calendar.click_event(&state.store, &id);
                }
                None => state.message = "Select an event with Tab first.".to_string(),
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            let selected = state.selected_event().map(|e| e.id.clone());
            match selected {
                Some(id) => {
                    state.calendar.request_delete_from_chip(&state.store, &id);
                }
                None => state.message = "Select an event with Tab first.".to_string(),
            }
        }

        KeyCode::Char('/') => {
            state.mode = InputMode::Searching;
            let term = state.calendar.search_term().to_string();
            state.set_input(&term);
        }
        KeyCode::Char('w') => toggle_week_start(state),
        KeyCode::Char('c') => state.calendar.cycle_filter_category(true),
        KeyCode::Char('C') => state.calendar.cycle_filter_category(false),
        KeyCode::Esc => {
            state.calendar.clear_filters();
            state.message = String::new();
        }
        _ => {}
    }
    None
}
