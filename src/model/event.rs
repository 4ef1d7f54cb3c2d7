// File: ./src/model/event.rs
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use strum::{EnumIter, IntoEnumIterator};

/// Identifier of a stored event.
///
/// Generated ids are numeric (milliseconds-derived, strictly increasing).
/// String ids are accepted when loading so that hand-edited or older slots
/// keep working.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventId {
    Numeric(u64),
    Text(String),
}

impl EventId {
    pub fn as_numeric(&self) -> Option<u64> {
        match self {
            EventId::Numeric(n) => Some(*n),
            EventId::Text(s) => s.parse().ok(),
        }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventId::Numeric(n) => write!(f, "{}", n),
            EventId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for EventId {
    fn from(value: u64) -> Self {
        EventId::Numeric(value)
    }
}

// --- RECURRENCE ---

/// Recurrence tag. Stored with the event, never expanded into instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter)]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl Recurrence {
    pub const VARIANTS: &'static [&'static str] = &["none", "daily", "weekly", "monthly", "custom"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::None => "none",
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::Monthly => "monthly",
            Recurrence::Custom => "custom",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Recurrence::None => "No Recurrence",
            Recurrence::Daily => "Daily",
            Recurrence::Weekly => "Weekly",
            Recurrence::Monthly => "Monthly",
            Recurrence::Custom => "Custom",
        }
    }

    /// Next (or previous) entry in select order, wrapping around.
    pub fn cycle(self, forward: bool) -> Self {
        let all: Vec<Recurrence> = Recurrence::iter().collect();
        let idx = all.iter().position(|r| *r == self).unwrap_or(0);
        let len = all.len();
        if forward {
            all[(idx + 1) % len]
        } else {
            all[(idx + len - 1) % len]
        }
    }
}

impl FromStr for Recurrence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            // The empty string is how the "No Recurrence" option was stored historically.
            "" | "none" => Ok(Recurrence::None),
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            "monthly" => Ok(Recurrence::Monthly),
            "custom" => Ok(Recurrence::Custom),
            other => Err(format!("Unknown recurrence '{}'", other)),
        }
    }
}

impl Serialize for Recurrence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Recurrence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        let raw = raw.unwrap_or_default();
        raw.parse()
            .map_err(|_| serde::de::Error::unknown_variant(&raw, Self::VARIANTS))
    }
}

// --- COLORS ---

/// The fixed category palette offered by the category filter and the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Palette {
    Pink,
    Indigo,
    Green,
    Yellow,
    Red,
}

impl Palette {
    /// The class string persisted in the slot (kept from the web version of the data).
    pub fn class_name(&self) -> &'static str {
        match self {
            Palette::Pink => "bg-pink-300",
            Palette::Indigo => "bg-indigo-300",
            Palette::Green => "bg-green-300",
            Palette::Yellow => "bg-yellow-300",
            Palette::Red => "bg-red-300",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Palette::Pink => "Pink",
            Palette::Indigo => "Indigo",
            Palette::Green => "Green",
            Palette::Yellow => "Yellow",
            Palette::Red => "Red",
        }
    }

    pub fn from_class_name(name: &str) -> Option<Self> {
        Palette::iter().find(|p| p.class_name() == name.trim())
    }

    /// Cycles through "no category" followed by every palette entry.
    pub fn cycle_optional(current: Option<Palette>, forward: bool) -> Option<Palette> {
        let mut choices: Vec<Option<Palette>> = vec![None];
        choices.extend(Palette::iter().map(Some));
        let idx = choices.iter().position(|c| *c == current).unwrap_or(0);
        let len = choices.len();
        if forward {
            choices[(idx + 1) % len]
        } else {
            choices[(idx + len - 1) % len]
        }
    }
}

impl Serialize for Palette {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.class_name())
    }
}

impl<'de> Deserialize<'de> for Palette {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Palette::from_class_name(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("Unknown palette entry '{}'", raw)))
    }
}

/// Color of an event: one of the palette categories, or an arbitrary color
/// string (e.g. `#ff8800`) carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventColor {
    Palette(Palette),
    Custom(String),
}

impl EventColor {
    /// Interprets a stored color string. Empty means "no color".
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(match Palette::from_class_name(raw) {
            Some(p) => EventColor::Palette(p),
            None => EventColor::Custom(raw.to_string()),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventColor::Palette(p) => p.class_name(),
            EventColor::Custom(s) => s,
        }
    }

    pub fn palette(&self) -> Option<Palette> {
        match self {
            EventColor::Palette(p) => Some(*p),
            EventColor::Custom(_) => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            EventColor::Palette(p) => p.label().to_string(),
            EventColor::Custom(s) => s.clone(),
        }
    }

    /// Form selector order: none, then the palette. A custom color leaves the
    /// cycle at its first palette entry.
    pub fn cycle(current: Option<&EventColor>, forward: bool) -> Option<EventColor> {
        let palette = match current {
            None => None,
            Some(EventColor::Palette(p)) => Some(*p),
            Some(EventColor::Custom(_)) => {
                return Palette::iter().next().map(EventColor::Palette);
            }
        };
        Palette::cycle_optional(palette, forward).map(EventColor::Palette)
    }
}

impl From<Palette> for EventColor {
    fn from(p: Palette) -> Self {
        EventColor::Palette(p)
    }
}

mod color_format {
    use super::EventColor;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        color: &Option<EventColor>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(color.as_ref().map(|c| c.as_str()).unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<EventColor>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(EventColor::parse))
    }
}

mod date_format {
    use super::*;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_calendar_date(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("Invalid event date '{}'", raw))
        })
    }
}

/// Parses a stored date. Accepts a plain `YYYY-MM-DD` day, or a full RFC 3339
/// timestamp (what browsers write for date objects) converted to the local day.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Local).date_naive())
}

// --- EVENT ---

/// Editable fields of an event, without identity or anchoring day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub time: String,
    pub description: String,
    pub recurrence: Recurrence,
    pub color: Option<EventColor>,
}

impl EventDraft {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    pub fn with_time(mut self, time: &str) -> Self {
        self.time = time.to_string();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = recurrence;
        self
    }

    pub fn with_color(mut self, color: impl Into<EventColor>) -> Self {
        self.color = Some(color.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default, with = "color_format")]
    pub color: Option<EventColor>,
    #[serde(with = "date_format")]
    pub date: NaiveDate,
}

impl Event {
    pub fn from_draft(id: EventId, draft: EventDraft, date: NaiveDate) -> Self {
        Self {
            id,
            title: draft.title,
            time: draft.time,
            description: draft.description,
            recurrence: draft.recurrence,
            color: draft.color,
            date,
        }
    }

    /// Replaces every editable field and re-anchors the event. The id is kept.
    pub fn apply_draft(&mut self, draft: EventDraft, date: NaiveDate) {
        self.title = draft.title;
        self.time = draft.time;
        self.description = draft.description;
        self.recurrence = draft.recurrence;
        self.color = draft.color;
        self.date = date;
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

    /// "title - time", as shown when hovering a chip.
    pub fn tooltip(&self) -> String {
        format!("{} - {}", self.title, self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Event {
        Event::from_draft(
            EventId::Numeric(1714550400000),
            EventDraft::new("Standup")
                .with_time("09:00")
                .with_color(Palette::Pink),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        )
    }

    #[test]
    fn test_serialized_record_layout() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["id"], 1714550400000u64);
        assert_eq!(json["title"], "Standup");
        assert_eq!(json["time"], "09:00");
        assert_eq!(json["description"], "");
        assert_eq!(json["recurrence"], "none");
        assert_eq!(json["color"], "bg-pink-300");
        assert_eq!(json["date"], "2024-05-01");
    }

    #[test]
    fn test_loads_browser_era_record() {
        // Empty recurrence and color, string id, full timestamp date.
        let raw = r#"{
            "id": "abc",
            "title": "Retro",
            "time": "",
            "description": "Sprint retro",
            "recurrence": "",
            "color": "",
            "date": "2024-05-01T12:00:00.000Z"
        }"#;
        let event: Event = serde_json::from_str(raw).unwrap();
        assert_eq!(event.id, EventId::Text("abc".to_string()));
        assert_eq!(event.recurrence, Recurrence::None);
        assert_eq!(event.color, None);
        let expected = DateTime::parse_from_rfc3339("2024-05-01T12:00:00.000Z")
            .unwrap()
            .with_timezone(&Local)
            .date_naive();
        assert_eq!(event.date, expected);
    }

    #[test]
    fn test_custom_color_is_preserved() {
        let raw = r##"{"id": 7, "title": "x", "color": "#ff8800", "date": "2024-01-02"}"##;
        let event: Event = serde_json::from_str(raw).unwrap();
        assert_eq!(event.color, Some(EventColor::Custom("#ff8800".to_string())));
        let back = serde_json::to_value(&event).unwrap();
        assert_eq!(back["color"], "#ff8800");
    }

    #[test]
    fn test_unknown_recurrence_is_rejected() {
        let raw = r#"{"id": 7, "title": "x", "recurrence": "hourly", "date": "2024-01-02"}"#;
        assert!(serde_json::from_str::<Event>(raw).is_err());
    }

    #[test]
    fn test_recurrence_cycle_wraps() {
        assert_eq!(Recurrence::None.cycle(true), Recurrence::Daily);
        assert_eq!(Recurrence::Custom.cycle(true), Recurrence::None);
        assert_eq!(Recurrence::None.cycle(false), Recurrence::Custom);
    }

    #[test]
    fn test_palette_cycle_includes_no_filter() {
        assert_eq!(Palette::cycle_optional(None, true), Some(Palette::Pink));
        assert_eq!(Palette::cycle_optional(Some(Palette::Red), true), None);
        assert_eq!(Palette::cycle_optional(None, false), Some(Palette::Red));
    }

    #[test]
    fn test_text_ids_expose_numeric_value() {
        assert_eq!(EventId::Text("42".into()).as_numeric(), Some(42));
        assert_eq!(EventId::Text("x".into()).as_numeric(), None);
    }
}
