// File: ./src/model/mod.rs
pub mod event;

pub use event::{
    Event, EventColor, EventDraft, EventId, Palette, Recurrence, parse_calendar_date,
};
