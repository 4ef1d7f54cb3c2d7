// File: src/tui/view.rs
use crate::color_utils;
use crate::form::FormField;
use crate::grid;
use crate::model::Event;
use crate::tui::state::{AppState, InputMode};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

fn full_help_text() -> Vec<Line<'static>> {
    let section = |name: &'static str, color: Color| {
        Span::styled(
            name,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )
    };
    vec![
        Line::from(vec![
            section(" GLOBAL ", Color::Cyan),
            Span::raw(" ?:Toggle Help  q:Quit  Esc:Clear Filters"),
        ]),
        Line::from(vec![
            section(" NAVIGATION ", Color::Yellow),
            Span::raw(" h/j/k/l or arrows:Move Day  n/p or PgDn/PgUp:Month  t:Today"),
        ]),
        Line::from(vec![
            section(" EVENTS ", Color::Green),
            Span::raw(" Tab/S-Tab:Select Event  Enter:Open  a:Add  e:Edit  d/Del:Delete"),
        ]),
        Line::from(vec![
            section(" FILTER ", Color::Blue),
            Span::raw(" /:Search  c/C:Cycle Category  w:Toggle Week Start"),
        ]),
        Line::from(vec![
            section(" FORM ", Color::Magenta),
            Span::raw(" Tab:Next Field  \u{2190}/\u{2192}:Change Choice  Enter/Ctrl-S:Save (Enter in Description:New Line)  Esc:Cancel  Ctrl-D:Delete"),
        ]),
    ]
}

/// Cuts `text` to at most `max` terminal columns, marking the cut with an ellipsis.
pub fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('\u{2026}');
    out
}

fn chip_style(event: &Event) -> Style {
    let rgb = color_utils::event_rgb(event.color.as_ref());
    let fg = if color_utils::is_dark(rgb) {
        Color::White
    } else {
        Color::Black
    };
    Style::default().bg(Color::Rgb(rgb.0, rgb.1, rgb.2)).fg(fg)
}

fn chip_label(event: &Event) -> String {
    if event.time.is_empty() {
        event.title.clone()
    } else {
        format!("{} {}", event.time, event.title)
    }
}

/// Lines of one cell: visible chips, then "+N more" when they do not fit.
/// The window scrolls so a selected chip stays visible.
fn cell_lines(
    events: &[&Event],
    selected: Option<usize>,
    max_chips: usize,
    width: usize,
) -> Vec<Line<'static>> {
    let max_chips = max_chips.max(1);
    let start = match selected {
        Some(sel) if sel >= max_chips => sel + 1 - max_chips,
        _ => 0,
    };
    let mut lines: Vec<Line> = events
        .iter()
        .enumerate()
        .skip(start)
        .take(max_chips)
        .map(|(i, ev)| {
            if selected == Some(i) {
                // Delete affordance on the selected chip.
                let label = truncate_to_width(&chip_label(ev), width.saturating_sub(2));
                Line::from(vec![
                    Span::styled(label, chip_style(ev).add_modifier(Modifier::BOLD | Modifier::REVERSED)),
                    Span::styled(" x", Style::default().fg(Color::LightRed)),
                ])
            } else {
                Line::from(Span::styled(
                    truncate_to_width(&chip_label(ev), width),
                    chip_style(ev),
                ))
            }
        })
        .collect();

    let hidden = events.len().saturating_sub(lines.len());
    if hidden > 0 {
        lines.push(Line::from(Span::styled(
            format!("+{} more", hidden),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines
}

pub fn draw(f: &mut Frame, state: &mut AppState) {
    let footer_height = if state.show_full_help && state.mode != InputMode::Searching {
        7
    } else {
        3
    };
    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(footer_height),
        ])
        .split(f.area());

    draw_header(f, state, v_chunks[0]);

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
        .split(v_chunks[1]);
    draw_grid(f, state, main_chunks[0]);
    draw_details(f, state, main_chunks[1]);

    draw_footer(f, state, v_chunks[2]);

    match state.mode {
        InputMode::Form => draw_form(f, state),
        InputMode::ConfirmDelete => {
            if state.calendar.form.is_open() {
                draw_form(f, state);
            }
            draw_confirm(f, state);
        }
        _ => {}
    }
}

fn draw_header(f: &mut Frame, state: &AppState, area: Rect) {
    let mut title = state.calendar.month_title();
    if state.store.has_unsaved_changes() {
        title.push_str(" [UNSAVED]");
    }
    let nav = Line::from(vec![
        Span::styled(" < ", Style::default().fg(Color::Yellow)),
        Span::styled(
            title,
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" > ", Style::default().fg(Color::Yellow)),
    ]);

    let search = if state.calendar.search_term().is_empty() {
        Span::styled("Search: -", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(
            format!("Search: '{}'", state.calendar.search_term()),
            Style::default().fg(Color::Green),
        )
    };
    let category = match state.calendar.filter_category() {
        None => Span::styled("  Category: All", Style::default().fg(Color::DarkGray)),
        Some(p) => {
            let (r, g, b) = color_utils::palette_rgb(p);
            Span::styled(
                format!("  Category: {}", p.label()),
                Style::default().fg(Color::Rgb(r, g, b)),
            )
        }
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    f.render_widget(
        Paragraph::new(nav).block(Block::default().borders(Borders::LEFT | Borders::TOP | Borders::BOTTOM)),
        chunks[0],
    );
    f.render_widget(
        Paragraph::new(Line::from(vec![search, category]))
            .alignment(Alignment::Right)
            .block(Block::default().borders(Borders::RIGHT | Borders::TOP | Borders::BOTTOM)),
        chunks[1],
    );
}

fn draw_grid(f: &mut Frame, state: &AppState, area: Rect) {
    let border_style = if state.store.has_unsaved_changes() {
        Style::default().fg(Color::LightRed)
    } else {
        Style::default()
    };
    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(format!(" {} ", state.calendar.month_title()));
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let cells = state.calendar.cells(&state.store, state.today);
    let weeks: Vec<_> = cells.chunks(7).collect();
    if weeks.is_empty() {
        return;
    }

    let mut row_constraints = vec![Constraint::Length(1)];
    row_constraints.extend(weeks.iter().map(|_| Constraint::Ratio(1, weeks.len() as u32)));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(row_constraints)
        .split(inner);

    let columns = |row: Rect| {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 7); 7])
            .split(row)
    };

    let labels = grid::weekday_labels(state.calendar.week_start);
    for (col, label) in columns(rows[0]).iter().zip(labels) {
        f.render_widget(
            Paragraph::new(label)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            *col,
        );
    }

    for (week, row) in weeks.iter().zip(rows.iter().skip(1)) {
        for (cell, col) in week.iter().zip(columns(*row).iter()) {
            let is_cursor = cell.day.date == state.calendar.cursor;

            let mut day_style = if cell.day.in_month {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };
            if cell.day.is_today {
                day_style = day_style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
            }
            let border = if is_cursor {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(Span::styled(format!("{}", cell.day.date.format("%-d")), day_style));
            let width = block.inner(*col).width as usize;
            let selected = if is_cursor { state.chip_index } else { None };

            let body = Paragraph::new(cell_lines(
                &cell.events,
                selected,
                state.config.max_chips_per_cell,
                width,
            ))
            .block(block);
            f.render_widget(body, *col);
        }
    }
}

fn draw_details(f: &mut Frame, state: &AppState, area: Rect) {
    let day = state.calendar.cursor;
    let mut lines = vec![
        Line::from(Span::styled(
            day.format("%A, %B %-d %Y").to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    let events = state.cursor_events();
    if events.is_empty() {
        lines.push(Line::from(Span::styled(
            "No events. Enter or 'a' to add one.",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for (i, ev) in events.iter().enumerate() {
        let marker = if state.chip_index == Some(i) { "> " } else { "  " };
        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(ev.tooltip(), chip_style(ev)),
        ]));
    }

    if let Some(ev) = state.selected_event() {
        lines.push(Line::from(""));
        for text in ev.description.lines() {
            lines.push(Line::from(text.to_string()));
        }
        lines.push(Line::from(Span::styled(
            format!("Recurrence: {}", ev.recurrence.label()),
            Style::default().fg(Color::Magenta),
        )));
        if let Some(color) = &ev.color {
            lines.push(Line::from(Span::styled(
                format!("Color: {}", color.label()),
                Style::default().fg(Color::Gray),
            )));
        }
    }

    let details = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Details "));
    f.render_widget(details, area);
}

fn draw_footer(f: &mut Frame, state: &AppState, footer_area: Rect) {
    f.render_widget(Clear, footer_area);

    if state.mode == InputMode::Searching {
        let prefix = "/ ";
        let input = Paragraph::new(Line::from(vec![
            Span::styled(prefix, Style::default().fg(Color::Green)),
            Span::styled(state.input_buffer.as_str(), Style::default().fg(Color::Green)),
        ]))
        .block(Block::default().borders(Borders::ALL).title(" Search "));
        f.render_widget(input, footer_area);

        let cursor_x = footer_area.x + 1 + prefix.chars().count() as u16 + state.cursor_position as u16;
        f.set_cursor_position((
            cursor_x.min(footer_area.x + footer_area.width.saturating_sub(2)),
            footer_area.y + 1,
        ));
        return;
    }

    if state.show_full_help {
        let p = Paragraph::new(full_help_text())
            .block(Block::default().borders(Borders::ALL).title(" Help "))
            .wrap(Wrap { trim: false });
        f.render_widget(p, footer_area);
        return;
    }

    let status = Paragraph::new(state.message.clone())
        .style(Style::default().fg(Color::Cyan))
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::TOP | Borders::BOTTOM)
                .title(" Status "),
        );
    let help_str = match state.mode {
        InputMode::Form => "Enter/^S:Save Esc:Cancel Tab:Field \u{2190}/\u{2192}:Choice ^D:Delete",
        InputMode::ConfirmDelete => "y:Delete n:Keep",
        _ => "?:Help q:Quit a:Add Tab:Select e:Edit d:Del /:Find c:Category n/p:Month",
    };
    let help = Paragraph::new(help_str).alignment(Alignment::Right).block(
        Block::default()
            .borders(Borders::RIGHT | Borders::TOP | Borders::BOTTOM)
            .title(" Actions "),
    );

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(footer_area);
    f.render_widget(status, chunks[0]);
    f.render_widget(help, chunks[1]);
}

fn draw_form(f: &mut Frame, state: &AppState) {
    let form = &state.calendar.form;
    let area = centered_rect(60, 60, f.area());

    let mut lines = Vec::new();
    if let Some(day) = form.selected_date() {
        lines.push(Line::from(Span::styled(
            day.format("%A, %B %-d %Y").to_string(),
            Style::default().fg(Color::Gray),
        )));
        lines.push(Line::from(""));
    }

    let mut cursor = None;
    for field in [
        FormField::Title,
        FormField::Time,
        FormField::Description,
        FormField::Recurrence,
        FormField::Color,
    ] {
        let focused = form.focus == field;
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let label = format!("{:<12}", field.label());

        let value = match form.buffer.text(field) {
            Some(text) => {
                // Newlines show as a return mark so the field stays on one row.
                let shown = text.replace('\n', "\u{21b5}");
                if focused {
                    cursor = Some((label.width() + shown.width(), lines.len()));
                }
                Span::raw(shown)
            }
            None => {
                let text = match field {
                    FormField::Recurrence => form.buffer.recurrence.label().to_string(),
                    _ => form
                        .buffer
                        .color
                        .as_ref()
                        .map(|c| c.label())
                        .unwrap_or_else(|| "Default".to_string()),
                };
                let style = match (field, &form.buffer.color) {
                    (FormField::Color, Some(c)) => {
                        let (r, g, b) = color_utils::event_rgb(Some(c));
                        Style::default().fg(Color::Rgb(r, g, b))
                    }
                    _ => Style::default(),
                };
                Span::styled(format!("< {} >", text), style)
            }
        };
        lines.push(Line::from(vec![Span::styled(label, label_style), value]));
    }

    lines.push(Line::from(""));
    let mut actions = vec![
        Span::styled(" [Enter] ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::raw("Save (^S)  "),
        Span::styled(" [Esc] ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::raw("Cancel  "),
    ];
    if form.is_editing() {
        actions.push(Span::styled(
            " [Ctrl-D] ",
            Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
        ));
        actions.push(Span::raw("Delete"));
    }
    lines.push(Line::from(actions));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} ", form.title_text()));
    let inner = block.inner(area);
    let p = Paragraph::new(lines).block(block);

    f.render_widget(Clear, area);
    f.render_widget(p, area);

    if state.mode == InputMode::Form
        && let Some((x, y)) = cursor
    {
        let x = inner.x + (x as u16).min(inner.width.saturating_sub(1));
        f.set_cursor_position((x, inner.y + y as u16));
    }
}

fn draw_confirm(f: &mut Frame, state: &AppState) {
    let Some(request) = state.calendar.pending_delete() else {
        return;
    };
    let area = centered_rect(50, 25, f.area());
    let block = Block::default()
        .title(" Delete Event ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::LightRed))
        .style(Style::default().bg(Color::DarkGray));

    let lines = vec![
        Line::from(""),
        Line::from("Are you sure you want to delete this event?"),
        Line::from(Span::styled(
            request.title.clone(),
            Style::default().add_modifier(Modifier::BOLD).fg(Color::White),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" [Y] ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw("Delete    "),
            Span::styled(" [N] ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw("Keep"),
        ]),
    ];

    let p = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::context::TestContext;
    use crate::model::{EventDraft, EventId};
    use crate::store::EventStore;
    use chrono::NaiveDate;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::sync::Arc;

    fn buffer_to_string(buf: &ratatui::buffer::Buffer) -> String {
        let mut s = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                s.push(buf[(x, y)].symbol().chars().next().unwrap_or(' '));
            }
            s.push('\n');
        }
        s
    }

    fn render(state: &mut AppState) -> String {
        let backend = TestBackend::new(200, 50);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| draw(frame, state)).unwrap();
        buffer_to_string(terminal.backend().buffer())
    }

    fn state() -> AppState {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut store = EventStore::in_memory();
        store.add(EventDraft::new("Standup").with_time("09:00"), today);
        AppState::with_store(Arc::new(TestContext::new()), Config::default(), store, today)
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("Standup", 10), "Standup");
        assert_eq!(truncate_to_width("Standup", 4), "Sta\u{2026}");
        assert_eq!(truncate_to_width("Standup", 0), "");
    }

    #[test]
    fn test_cell_lines_overflow_and_selection() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let events: Vec<Event> = (0..5)
            .map(|i| Event::from_draft(EventId::Numeric(i), EventDraft::new(&format!("E{}", i)), today))
            .collect();
        let refs: Vec<&Event> = events.iter().collect();

        let lines = cell_lines(&refs, None, 3, 20);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[3].to_string(), "+2 more");

        // Selecting the last chip scrolls the window.
        let lines = cell_lines(&refs, Some(4), 3, 20);
        assert_eq!(lines[2].to_string(), "E4 x");
    }

    #[test]
    fn test_renders_month_and_chip() {
        let mut s = state();
        let out = render(&mut s);
        assert!(out.contains("May 2024"));
        assert!(out.contains("Sun"));
        assert!(out.contains("09:00 Standup"));
    }

    #[test]
    fn test_multiline_description_rendering() {
        let mut s = state();
        let id = s.store.events()[0].id.clone();
        let draft = s.store.get(&id).unwrap().to_draft().with_description("line one\nline two");
        s.store.update(&id, draft, s.today);
        s.chip_index = Some(0);
        let out = render(&mut s);
        assert!(out.contains("line one"));
        assert!(out.contains("line two"));

        s.calendar.click_event(&s.store, &id);
        s.sync_mode();
        let out = render(&mut s);
        assert!(out.contains("line one\u{21b5}line two"));
    }

    #[test]
    fn test_renders_form_and_confirm() {
        let mut s = state();
        s.calendar.click_day(s.today);
        s.sync_mode();
        let out = render(&mut s);
        assert!(out.contains("Add Event"));
        assert!(out.contains("Recurrence"));

        s.calendar.cancel_form();
        let id = s.store.events()[0].id.clone();
        s.calendar.request_delete_from_chip(&s.store, &id);
        s.sync_mode();
        let out = render(&mut s);
        assert!(out.contains("Are you sure you want to delete this event?"));
    }
}
