// Manages the persisted slot holding the serialized event collection.
//
// The slot is a single JSON array. Writes always replace the whole file
// (temp file + rename) while holding an advisory lock on a sidecar file.
use crate::context::AppContext;
use crate::model::Event;
use anyhow::{Context, Result};
use fs2::FileExt;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const EVENTS_FILENAME: &str = "calendar_events.json";

/// Filesystem helpers shared by the event slot and the config file.
pub struct LocalStorage;

impl LocalStorage {
    /// Helper to get a sidecar lock file path
    fn get_lock_path(file_path: &Path) -> PathBuf {
        let mut lock_path = file_path.to_path_buf();
        if let Some(ext) = lock_path.extension() {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".lock");
            lock_path.set_extension(new_ext);
        } else {
            lock_path.set_extension("lock");
        }
        lock_path
    }

    pub fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let lock_path = Self::get_lock_path(file_path);
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file {:?}", lock_path))?;

        file.lock_exclusive()?;
        let result = f();
        file.unlock()?;
        result
    }

    /// Atomic write: Write to .tmp file then rename
    pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, contents)
            .with_context(|| format!("Failed to write {:?}", tmp_path))?;
        fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to move {:?} into place", tmp_path))?;
        Ok(())
    }
}

/// Serializes the full collection in slot format.
pub fn encode_events(events: &[Event]) -> Result<String> {
    Ok(serde_json::to_string_pretty(events)?)
}

pub fn decode_events(raw: &str) -> Result<Vec<Event>> {
    // A blank file is what an interrupted first run leaves behind.
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).context("Failed to parse event collection")
}

/// The single named location holding the serialized event collection.
pub trait PersistentSlot: Send + Sync + fmt::Debug {
    /// Human readable location, used in log lines.
    fn name(&self) -> String;

    /// `Ok(None)` when nothing has been stored yet.
    fn read(&self) -> Result<Option<String>>;

    fn write(&self, contents: &str) -> Result<()>;

    /// Keeps an unreadable payload aside so the next write does not destroy it.
    fn quarantine(&self, _raw: &str) -> Result<()> {
        Ok(())
    }
}

/// Slot backed by a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_context(ctx: &dyn AppContext) -> Result<Self> {
        Ok(Self::new(ctx.get_events_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn quarantine_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".corrupt");
        PathBuf::from(name)
    }
}

impl PersistentSlot for FileSlot {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        LocalStorage::with_lock(&self.path, || {
            let raw = fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read {:?}", self.path))?;
            Ok(Some(raw))
        })
    }

    fn write(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
        LocalStorage::with_lock(&self.path, || {
            LocalStorage::atomic_write(&self.path, contents)
        })
    }

    fn quarantine(&self, raw: &str) -> Result<()> {
        let target = self.quarantine_path();
        LocalStorage::atomic_write(&target, raw)?;
        log::warn!("Unreadable event data kept at {}", target.display());
        Ok(())
    }
}

/// In-memory slot. Clones share the same contents, which lets tests inspect
/// what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    contents: Arc<Mutex<Option<String>>>,
    quarantined: Arc<Mutex<Option<String>>>,
    unavailable: Arc<Mutex<bool>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(raw: &str) -> Self {
        let slot = Self::default();
        if let Ok(mut guard) = slot.contents.lock() {
            *guard = Some(raw.to_string());
        }
        slot
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|g| g.clone())
    }

    pub fn quarantined(&self) -> Option<String> {
        self.quarantined.lock().ok().and_then(|g| g.clone())
    }

    /// Makes every following write fail, like a full or read-only disk.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut guard) = self.unavailable.lock() {
            *guard = unavailable;
        }
    }

    fn is_unavailable(&self) -> bool {
        self.unavailable.lock().map(|g| *g).unwrap_or(true)
    }
}

impl PersistentSlot for MemorySlot {
    fn name(&self) -> String {
        "memory".to_string()
    }

    fn read(&self) -> Result<Option<String>> {
        Ok(self.contents())
    }

    fn write(&self, contents: &str) -> Result<()> {
        if self.is_unavailable() {
            anyhow::bail!("Storage unavailable");
        }
        let mut guard = self
            .contents
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory slot poisoned"))?;
        *guard = Some(contents.to_string());
        Ok(())
    }

    fn quarantine(&self, raw: &str) -> Result<()> {
        let mut guard = self
            .quarantined
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory slot poisoned"))?;
        *guard = Some(raw.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TestContext;
    use crate::model::{EventDraft, EventId, Palette};
    use chrono::NaiveDate;

    #[test]
    fn test_lock_path_keeps_extension() {
        let p = LocalStorage::get_lock_path(Path::new("/tmp/calendar_events.json"));
        assert_eq!(p, PathBuf::from("/tmp/calendar_events.json.lock"));
        let p = LocalStorage::get_lock_path(Path::new("/tmp/noext"));
        assert_eq!(p, PathBuf::from("/tmp/noext.lock"));
    }

    #[test]
    fn test_file_slot_absent_then_written() {
        let ctx = TestContext::new();
        let slot = FileSlot::from_context(&ctx).unwrap();
        assert!(slot.read().unwrap().is_none());

        slot.write("[]").unwrap();
        assert_eq!(slot.read().unwrap().as_deref(), Some("[]"));
        assert!(!slot.path().with_extension("tmp").exists());
    }

    #[test]
    fn test_file_slot_quarantine() {
        let ctx = TestContext::new();
        let slot = FileSlot::from_context(&ctx).unwrap();
        slot.quarantine("{not json").unwrap();
        let kept = fs::read_to_string(slot.quarantine_path()).unwrap();
        assert_eq!(kept, "{not json");
    }

    #[test]
    fn test_encode_decode() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let events = vec![Event::from_draft(
            EventId::Numeric(7),
            EventDraft::new("Standup").with_time("09:00").with_color(Palette::Pink),
            date,
        )];
        let raw = encode_events(&events).unwrap();
        assert!(raw.contains("\"date\": \"2024-05-01\""));
        assert_eq!(decode_events(&raw).unwrap(), events);
        assert!(decode_events("  \n").unwrap().is_empty());
        assert!(decode_events("{").is_err());
    }

    #[test]
    fn test_memory_slot_unavailable() {
        let slot = MemorySlot::new();
        let shared = slot.clone();
        slot.set_unavailable(true);
        assert!(slot.write("[]").is_err());
        slot.set_unavailable(false);
        slot.write("[]").unwrap();
        assert_eq!(shared.contents().as_deref(), Some("[]"));
    }
}
