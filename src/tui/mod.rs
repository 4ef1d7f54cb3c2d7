// File: ./src/tui/mod.rs
// Entry point and main loop for the TUI application.
pub mod action;
pub mod handlers;
pub mod state;
pub mod view;

use crate::config::Config;
use crate::context::SharedContext;
use crate::logging;
use crate::tui::action::Action;
use crate::tui::state::{AppState, InputMode};
use crate::tui::view::draw;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, MouseEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{io, time::Duration};

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)
}

pub fn run(ctx: SharedContext) -> Result<()> {
    // --- 1. CONFIG & LOGGING ---
    // A broken config file aborts here, before the terminal is taken over.
    let cfg = Config::load_or_default(ctx.as_ref())?;
    if let Err(e) = logging::init(ctx.as_ref(), cfg.log_level.to_filter()) {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    // Panic Hook: give the terminal back before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        log::error!("PANIC: {}", info);
        default_hook(info);
    }));

    // --- 2. STATE INIT ---
    let mut app_state = AppState::new_with_ctx(ctx, cfg);

    // --- 3. TERMINAL SETUP ---
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // --- 4. UI LOOP ---
    let result = event_loop(&mut terminal, &mut app_state);

    // --- 5. CLEANUP ---
    restore_terminal()?;
    terminal.show_cursor()?;

    if app_state.store.has_unsaved_changes() {
        eprintln!(
            "Warning: the last changes could not be written to {}",
            app_state.store.slot_name()
        );
    }
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app_state: &mut AppState,
) -> Result<()> {
    loop {
        terminal.draw(|f| draw(f, app_state))?;

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        match event::read()? {
            Event::Mouse(mouse) if app_state.mode == InputMode::Normal => match mouse.kind {
                MouseEventKind::ScrollDown => app_state.calendar.next_month(),
                MouseEventKind::ScrollUp => app_state.calendar.previous_month(),
                _ => {}
            },
            Event::Key(key) => {
                // Filter out KeyRelease events to prevent double input on Windows
                if key.kind == event::KeyEventKind::Release {
                    continue;
                }
                match handlers::handle_key_event(key, app_state) {
                    Some(Action::Quit) => break,
                    Some(action) => log::debug!("{:?}", action),
                    None => {}
                }
            }
            _ => {}
        }
    }
    Ok(())
}
