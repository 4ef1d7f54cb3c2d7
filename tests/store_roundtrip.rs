// Persistence of the event collection through the on-disk slot.
use chrono::NaiveDate;
use evcal::context::{AppContext, TestContext};
use evcal::model::{EventColor, EventDraft, EventId, Palette, Recurrence};
use evcal::storage::{FileSlot, PersistentSlot};
use evcal::store::EventStore;
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

fn open(ctx: &TestContext) -> EventStore {
    EventStore::load(Box::new(FileSlot::from_context(ctx).unwrap()))
}

#[test]
fn test_add_then_reload_yields_the_event() {
    let ctx = TestContext::new();
    let id = {
        let mut store = open(&ctx);
        store.add(
            EventDraft::new("Standup")
                .with_time("09:00")
                .with_color(Palette::Pink),
            day(1),
        )
    };

    let store = open(&ctx);
    assert_eq!(store.len(), 1);
    let ev = store.get(&id).unwrap();
    assert_eq!(ev.title, "Standup");
    assert_eq!(ev.time, "09:00");
    assert_eq!(ev.date, day(1));
    assert_eq!(ev.color, Some(EventColor::Palette(Palette::Pink)));
}

#[test]
fn test_reload_equals_memory() {
    let ctx = TestContext::new();
    let mut store = open(&ctx);
    store.add(
        EventDraft::new("Retro")
            .with_description("Sprint 12, room B")
            .with_recurrence(Recurrence::Weekly)
            .with_color(Palette::Indigo),
        day(3),
    );
    store.add(EventDraft::new("Dentist").with_time("14:30"), day(20));
    let id = store.add(EventDraft::new("Temp"), day(21));
    store.remove(&id);

    let reloaded = open(&ctx);
    assert_eq!(reloaded.events(), store.events());
}

#[test]
fn test_saving_twice_gives_identical_file() {
    let ctx = TestContext::new();
    let mut store = open(&ctx);
    store.add(EventDraft::new("Standup"), day(1));
    let path = ctx.get_events_path().unwrap();

    assert!(store.save());
    let first = fs::read_to_string(&path).unwrap();
    assert!(store.save());
    assert_eq!(first, fs::read_to_string(&path).unwrap());
}

#[test]
fn test_corrupt_file_starts_empty_and_is_kept_aside() {
    let ctx = TestContext::new();
    let path = ctx.get_events_path().unwrap();
    fs::write(&path, "[{\"id\": 1, \"title\": \"half").unwrap();

    let mut store = open(&ctx);
    assert!(store.is_empty());

    let mut corrupt = path.clone().into_os_string();
    corrupt.push(".corrupt");
    assert!(fs::read_to_string(&corrupt).unwrap().contains("half"));

    // The store keeps working and overwrites the slot with valid data.
    store.add(EventDraft::new("Fresh start"), day(2));
    assert_eq!(open(&ctx).len(), 1);
}

#[test]
fn test_browser_era_records_load() {
    let ctx = TestContext::new();
    let path = ctx.get_events_path().unwrap();
    let legacy = r##"[
        {"id": 1714550400000, "title": "Standup", "time": "09:00", "description": "",
         "recurrence": "", "color": "bg-green-300", "date": "2024-05-01T12:00:00.000Z"},
        {"id": "abc", "title": "Imported", "date": "2024-05-02",
         "recurrence": "monthly", "color": "#ff8800"}
    ]"##;
    fs::write(&path, legacy).unwrap();

    let mut store = open(&ctx);
    assert_eq!(store.len(), 2);

    let standup = store.get(&EventId::Numeric(1714550400000)).unwrap();
    assert_eq!(standup.recurrence, Recurrence::None);
    assert_eq!(standup.color, Some(EventColor::Palette(Palette::Green)));

    let imported = store.get(&EventId::Text("abc".into())).unwrap();
    assert_eq!(imported.date, day(2));
    assert_eq!(imported.recurrence, Recurrence::Monthly);
    assert_eq!(imported.color, Some(EventColor::Custom("#ff8800".into())));
    assert_eq!(imported.time, "");

    // New ids land past the largest numeric id already stored.
    let id = store.add(EventDraft::new("Next"), day(3));
    assert!(id.as_numeric().unwrap() > 1714550400000);
}

#[test]
fn test_concurrent_writes_leave_a_valid_file() {
    let ctx = Arc::new(TestContext::new());
    let path = ctx.get_events_path().unwrap();
    let thread_count = 8;
    let barrier = Arc::new(Barrier::new(thread_count));

    let handles: Vec<_> = (0..thread_count)
        .map(|i| {
            let b = barrier.clone();
            let path = path.clone();
            thread::spawn(move || {
                let mut store = EventStore::load(Box::new(FileSlot::new(path)));
                b.wait();
                store.add(EventDraft::new(&format!("Writer {}", i)), day(1));
                assert!(!store.has_unsaved_changes(), "write failed in thread {}", i);
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    // Whole-collection replace: one writer wins, and the file always parses.
    let slot = FileSlot::new(path);
    let raw = slot.read().unwrap().unwrap();
    let store = open(&ctx);
    assert!(!raw.is_empty());
    assert!(!store.is_empty());
}
