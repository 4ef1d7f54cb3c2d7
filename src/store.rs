// File: src/store.rs
// In-memory event collection, mirrored to a persisted slot after every change.
use crate::filter::{self, FilterOptions};
use crate::model::{Event, EventDraft, EventId};
use crate::storage::{self, MemorySlot, PersistentSlot};
use chrono::{NaiveDate, Utc};
use std::collections::HashSet;
use uuid::Uuid;

/// Hands out strictly increasing, time-derived numeric ids.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    /// Starts past the largest numeric id already in use.
    pub fn seeded_from(events: &[Event]) -> Self {
        let last = events
            .iter()
            .filter_map(|e| e.id.as_numeric())
            .max()
            .unwrap_or(0);
        Self { last }
    }

    /// Once the numeric range is used up, ids fall back to random text ids.
    pub fn next_id_at(&mut self, now_ms: u64) -> EventId {
        match self.last.checked_add(1) {
            Some(next) => {
                self.last = now_ms.max(next);
                EventId::Numeric(self.last)
            }
            None => {
                let id = EventId::Text(Uuid::new_v4().to_string());
                log::warn!("Numeric event ids exhausted, using {}", id);
                id
            }
        }
    }

    pub fn next_id(&mut self) -> EventId {
        let now_ms = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        self.next_id_at(now_ms)
    }
}

#[derive(Debug)]
pub struct EventStore {
    slot: Box<dyn PersistentSlot>,
    events: Vec<Event>,
    ids: IdGenerator,
    unsaved: bool,
}

impl EventStore {
    /// Hydrates the collection from `slot`. Never fails: an absent slot gives
    /// an empty store, an unreadable one is quarantined and also gives an
    /// empty store.
    pub fn load(slot: Box<dyn PersistentSlot>) -> Self {
        let events = match slot.read() {
            Ok(None) => {
                log::info!("No stored events at {}, starting empty", slot.name());
                Vec::new()
            }
            Ok(Some(raw)) => match storage::decode_events(&raw) {
                Ok(events) => events,
                Err(e) => {
                    log::warn!("Discarding unreadable events in {}: {:#}", slot.name(), e);
                    if let Err(qe) = slot.quarantine(&raw) {
                        log::warn!("Could not keep unreadable events aside: {:#}", qe);
                    }
                    Vec::new()
                }
            },
            Err(e) => {
                log::warn!("Failed to read events from {}: {:#}", slot.name(), e);
                Vec::new()
            }
        };

        let mut ids = IdGenerator::seeded_from(&events);
        let events = Self::dedupe_ids(events, &mut ids);
        log::info!("Loaded {} events from {}", events.len(), slot.name());

        Self {
            slot,
            events,
            ids,
            unsaved: false,
        }
    }

    /// Store over a fresh in-memory slot.
    pub fn in_memory() -> Self {
        Self::load(Box::new(MemorySlot::new()))
    }

    fn dedupe_ids(events: Vec<Event>, ids: &mut IdGenerator) -> Vec<Event> {
        let mut seen = HashSet::new();
        events
            .into_iter()
            .map(|mut event| {
                if !seen.insert(event.id.clone()) {
                    let fresh = ids.next_id();
                    log::warn!(
                        "Duplicate event id {} for '{}', reassigned to {}",
                        event.id,
                        event.title,
                        fresh
                    );
                    event.id = fresh.clone();
                    seen.insert(fresh);
                }
                event
            })
            .collect()
    }

    // --- Queries ---

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, id: &EventId) -> Option<&Event> {
        self.events.iter().find(|e| &e.id == id)
    }

    pub fn events_on(&self, day: NaiveDate, opts: &FilterOptions) -> Vec<&Event> {
        filter::events_on(&self.events, day, opts)
    }

    /// The collection exactly as it is (or would be) written to the slot.
    pub fn snapshot_json(&self) -> anyhow::Result<String> {
        storage::encode_events(&self.events)
    }

    /// True when the last write to the slot failed.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    pub fn slot_name(&self) -> String {
        self.slot.name()
    }

    // --- Mutations ---

    pub fn add(&mut self, draft: EventDraft, date: NaiveDate) -> EventId {
        let id = self.ids.next_id();
        log::debug!("Adding event {} on {}", id, date);
        self.events.push(Event::from_draft(id.clone(), draft, date));
        self.save();
        id
    }

    /// Replaces the fields of event `id` and rebinds it to `date`.
    /// Returns false (and writes nothing) when the id is unknown.
    pub fn update(&mut self, id: &EventId, draft: EventDraft, date: NaiveDate) -> bool {
        let Some(event) = self.events.iter_mut().find(|e| &e.id == id) else {
            log::debug!("Update of unknown event {} ignored", id);
            return false;
        };
        log::debug!("Updating event {} (now on {})", id, date);
        event.apply_draft(draft, date);
        self.save();
        true
    }

    pub fn remove(&mut self, id: &EventId) -> bool {
        let Some(idx) = self.events.iter().position(|e| &e.id == id) else {
            log::debug!("Removal of unknown event {} ignored", id);
            return false;
        };
        let removed = self.events.remove(idx);
        log::debug!("Removed event {} ('{}')", removed.id, removed.title);
        self.save();
        true
    }

    /// Writes the whole collection to the slot. A failure is logged and
    /// remembered, never propagated.
    pub fn save(&mut self) -> bool {
        let result = self
            .snapshot_json()
            .and_then(|json| self.slot.write(&json));
        match result {
            Ok(()) => {
                self.unsaved = false;
                true
            }
            Err(e) => {
                log::warn!("Failed to save events to {}: {:#}", self.slot.name(), e);
                self.unsaved = true;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Palette;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_id_generator_is_strictly_monotonic() {
        let mut ids = IdGenerator::default();
        assert_eq!(ids.next_id_at(1000), EventId::Numeric(1000));
        // Same millisecond, and a clock going backwards.
        assert_eq!(ids.next_id_at(1000), EventId::Numeric(1001));
        assert_eq!(ids.next_id_at(900), EventId::Numeric(1002));
        assert_eq!(ids.next_id_at(5000), EventId::Numeric(5000));
    }

    #[test]
    fn test_generator_seeded_past_existing_ids() {
        let events = vec![Event::from_draft(
            EventId::Numeric(u64::MAX - 1),
            EventDraft::new("Far future"),
            day(1),
        )];
        let mut ids = IdGenerator::seeded_from(&events);
        assert_eq!(ids.next_id_at(10), EventId::Numeric(u64::MAX));

        let after_max = ids.next_id_at(10);
        assert!(matches!(after_max, EventId::Text(_)));
        assert_ne!(after_max, ids.next_id_at(10));
    }

    #[test]
    fn test_add_after_max_numeric_id_stays_unique() {
        for stored_id in ["18446744073709551615", "\"18446744073709551615\""] {
            let raw = format!(
                r#"[{{"id": {}, "title": "A", "date": "2024-05-01"}}]"#,
                stored_id
            );
            let mut store = EventStore::load(Box::new(MemorySlot::with_contents(&raw)));
            let existing = store.events()[0].id.clone();

            let first = store.add(EventDraft::new("B"), day(2));
            let second = store.add(EventDraft::new("C"), day(3));
            assert_ne!(first, existing);
            assert_ne!(second, existing);
            assert_ne!(first, second);

            let reloaded = EventStore::load(Box::new(MemorySlot::with_contents(
                &store.snapshot_json().unwrap(),
            )));
            assert_eq!(reloaded.len(), 3);
            assert_eq!(reloaded.get(&first).unwrap().title, "B");
        }
    }

    #[test]
    fn test_duplicate_max_ids_reassigned_on_load() {
        let raw = r#"[
            {"id": 18446744073709551615, "title": "A", "date": "2024-05-01"},
            {"id": 18446744073709551615, "title": "B", "date": "2024-05-01"}
        ]"#;
        let store = EventStore::load(Box::new(MemorySlot::with_contents(raw)));
        assert_eq!(store.len(), 2);
        assert_ne!(store.events()[0].id, store.events()[1].id);
    }

    #[test]
    fn test_add_update_remove_persist_each_time() {
        let slot = MemorySlot::new();
        let mut store = EventStore::load(Box::new(slot.clone()));
        assert!(slot.contents().is_none());

        let id = store.add(EventDraft::new("Standup").with_color(Palette::Pink), day(1));
        assert!(slot.contents().unwrap().contains("Standup"));

        assert!(store.update(&id, EventDraft::new("Daily"), day(2)));
        let raw = slot.contents().unwrap();
        assert!(raw.contains("Daily") && raw.contains("2024-05-02"));
        assert_eq!(store.get(&id).unwrap().date, day(2));

        assert!(store.remove(&id));
        assert_eq!(slot.contents().unwrap().trim(), "[]");
        assert!(store.is_empty());
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let slot = MemorySlot::new();
        let mut store = EventStore::load(Box::new(slot.clone()));
        let ghost = EventId::Numeric(42);
        assert!(!store.update(&ghost, EventDraft::new("x"), day(1)));
        assert!(!store.remove(&ghost));
        assert!(store.is_empty());
        assert!(slot.contents().is_none());
    }

    #[test]
    fn test_ids_unique_across_fast_adds() {
        let mut store = EventStore::in_memory();
        let a = store.add(EventDraft::new("a"), day(1));
        let b = store.add(EventDraft::new("b"), day(1));
        let c = store.add(EventDraft::new("c"), day(1));
        assert!(a < b && b < c);
    }

    #[test]
    fn test_write_failure_marks_unsaved_and_keeps_memory() {
        let slot = MemorySlot::new();
        let mut store = EventStore::load(Box::new(slot.clone()));
        slot.set_unavailable(true);

        let id = store.add(EventDraft::new("Offline"), day(3));
        assert!(store.has_unsaved_changes());
        assert!(store.get(&id).is_some());

        slot.set_unavailable(false);
        assert!(store.save());
        assert!(!store.has_unsaved_changes());
        assert!(slot.contents().unwrap().contains("Offline"));
    }

    #[test]
    fn test_corrupt_slot_loads_empty_and_is_quarantined() {
        let slot = MemorySlot::with_contents("[{\"id\": 1, \"title\": ");
        let store = EventStore::load(Box::new(slot.clone()));
        assert!(store.is_empty());
        assert_eq!(slot.quarantined().as_deref(), Some("[{\"id\": 1, \"title\": "));
    }

    #[test]
    fn test_duplicate_ids_reassigned_on_load() {
        let raw = r#"[
            {"id": 5, "title": "A", "time": "", "description": "", "recurrence": "", "color": "", "date": "2024-05-01"},
            {"id": 5, "title": "B", "time": "", "description": "", "recurrence": "", "color": "", "date": "2024-05-01"}
        ]"#;
        let store = EventStore::load(Box::new(MemorySlot::with_contents(raw)));
        assert_eq!(store.len(), 2);
        assert_ne!(store.events()[0].id, store.events()[1].id);
        assert_eq!(store.events()[0].id, EventId::Numeric(5));
    }

    #[test]
    fn test_save_twice_is_identical() {
        let slot = MemorySlot::new();
        let mut store = EventStore::load(Box::new(slot.clone()));
        store.add(EventDraft::new("Standup").with_time("09:00"), day(1));
        store.save();
        let first = slot.contents();
        store.save();
        assert_eq!(first, slot.contents());
    }
}
