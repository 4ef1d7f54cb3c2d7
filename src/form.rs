// Modal event form: edit buffer plus the open/closed state machine.
use crate::model::{Event, EventColor, EventDraft, EventId, Palette, Recurrence};
use crate::store::EventStore;
use chrono::{NaiveDate, NaiveTime};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Closed,
    OpenForNew(NaiveDate),
    OpenForEdit(EventId, NaiveDate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Title,
    Time,
    Description,
    Recurrence,
    Color,
}

impl FormField {
    const ORDER: [FormField; 5] = [
        FormField::Title,
        FormField::Time,
        FormField::Description,
        FormField::Recurrence,
        FormField::Color,
    ];

    pub fn next(self) -> Self {
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(idx + 1) % Self::ORDER.len()]
    }

    pub fn previous(self) -> Self {
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(idx + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::Time => "Time",
            FormField::Description => "Description",
            FormField::Recurrence => "Recurrence",
            FormField::Color => "Color",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, FormField::Title | FormField::Time | FormField::Description)
    }
}

/// Uncommitted copy of an event's editable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBuffer {
    /// `None` while creating a new event.
    pub id: Option<EventId>,
    pub title: String,
    pub time: String,
    pub description: String,
    pub recurrence: Recurrence,
    pub color: Option<EventColor>,
}

impl EditBuffer {
    pub fn empty(default_color: Option<Palette>) -> Self {
        Self {
            color: default_color.map(EventColor::Palette),
            ..Self::default()
        }
    }

    pub fn from_event(event: &Event) -> Self {
        let draft = event.to_draft();
        Self {
            id: Some(event.id.clone()),
            title: draft.title,
            time: draft.time,
            description: draft.description,
            recurrence: draft.recurrence,
            color: draft.color,
        }
    }

    pub fn to_draft(&self) -> EventDraft {
        EventDraft {
            title: self.title.clone(),
            time: self.time.clone(),
            description: self.description.clone(),
            recurrence: self.recurrence,
            color: self.color.clone(),
        }
    }

    fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Title => Some(&mut self.title),
            FormField::Time => Some(&mut self.time),
            FormField::Description => Some(&mut self.description),
            FormField::Recurrence | FormField::Color => None,
        }
    }

    pub fn text(&self, field: FormField) -> Option<&str> {
        match field {
            FormField::Title => Some(&self.title),
            FormField::Time => Some(&self.time),
            FormField::Description => Some(&self.description),
            FormField::Recurrence | FormField::Color => None,
        }
    }
}

/// Normalizes a time of day to `HH:MM`. Empty input means "no time".
pub fn normalize_time(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(String::new());
    }
    NaiveTime::parse_from_str(raw, "%H:%M")
        .ok()
        .map(|t| t.format("%H:%M").to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Created(EventId),
    Updated(EventId),
    /// The edited event vanished from the store; nothing was written.
    Stale(EventId),
    MissingTitle,
    InvalidTime,
    NotOpen,
}

impl SaveOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, SaveOutcome::Created(_) | SaveOutcome::Updated(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventForm {
    state: FormState,
    pub buffer: EditBuffer,
    pub focus: FormField,
    default_color: Option<Palette>,
}

impl EventForm {
    pub fn new(default_color: Option<Palette>) -> Self {
        Self {
            default_color,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != FormState::Closed
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, FormState::OpenForEdit(..))
    }

    /// The day a save would anchor the event to.
    pub fn selected_date(&self) -> Option<NaiveDate> {
        match &self.state {
            FormState::Closed => None,
            FormState::OpenForNew(day) | FormState::OpenForEdit(_, day) => Some(*day),
        }
    }

    pub fn title_text(&self) -> &'static str {
        if self.buffer.id.is_some() {
            "Edit Event"
        } else {
            "Add Event"
        }
    }

    pub fn open_new(&mut self, day: NaiveDate) {
        self.buffer = EditBuffer::empty(self.default_color);
        self.focus = FormField::Title;
        self.state = FormState::OpenForNew(day);
    }

    /// Opens the form on `event`. The selected day is the event's own day.
    pub fn open_edit(&mut self, event: &Event) {
        self.buffer = EditBuffer::from_event(event);
        self.focus = FormField::Title;
        self.state = FormState::OpenForEdit(event.id.clone(), event.date);
    }

    pub fn cancel(&mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.state = FormState::Closed;
        self.buffer = EditBuffer::default();
        self.focus = FormField::Title;
    }

    /// Validates the buffer and commits it. On any refusal the form stays
    /// open and the store is untouched.
    pub fn save(&mut self, store: &mut EventStore) -> SaveOutcome {
        let Some(day) = self.selected_date() else {
            return SaveOutcome::NotOpen;
        };
        if self.buffer.title.trim().is_empty() {
            return SaveOutcome::MissingTitle;
        }
        let Some(time) = normalize_time(&self.buffer.time) else {
            return SaveOutcome::InvalidTime;
        };
        self.buffer.time = time;

        let draft = self.buffer.to_draft();
        let outcome = match self.buffer.id.clone() {
            None => SaveOutcome::Created(store.add(draft, day)),
            Some(id) => {
                if store.update(&id, draft, day) {
                    SaveOutcome::Updated(id)
                } else {
                    SaveOutcome::Stale(id)
                }
            }
        };
        self.close();
        outcome
    }

    /// The event a delete from the form would remove.
    pub fn delete_target(&self) -> Option<&EventId> {
        match &self.state {
            FormState::OpenForEdit(id, _) => Some(id),
            _ => None,
        }
    }

    /// Closes the form after its event was removed.
    pub fn finish_delete(&mut self) {
        if self.is_editing() {
            self.close();
        }
    }

    // --- Field editing ---

    pub fn next_field(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn previous_field(&mut self) {
        self.focus = self.focus.previous();
    }

    pub fn insert_char(&mut self, c: char) {
        let focus = self.focus;
        if let Some(text) = self.buffer.text_mut(focus) {
            text.push(c);
        }
    }

    pub fn backspace(&mut self) {
        let focus = self.focus;
        if let Some(text) = self.buffer.text_mut(focus) {
            text.pop();
        }
    }

    /// Steps the focused selector (recurrence or color).
    pub fn cycle_selection(&mut self, forward: bool) {
        match self.focus {
            FormField::Recurrence => {
                self.buffer.recurrence = self.buffer.recurrence.cycle(forward);
            }
            FormField::Color => {
                self.buffer.color = EventColor::cycle(self.buffer.color.as_ref(), forward);
            }
            _ => {}
        }
    }
}
