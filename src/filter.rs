// Search and category filtering of events for a single grid day.
use crate::model::{Event, Palette};
use chrono::NaiveDate;

/// The active filter inputs of the view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterOptions<'a> {
    /// Free text matched against title and description, case-insensitively.
    pub search_term: &'a str,
    pub category: Option<Palette>,
}

impl<'a> FilterOptions<'a> {
    pub fn new(search_term: &'a str, category: Option<Palette>) -> Self {
        Self {
            search_term,
            category,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.search_term.is_empty() || self.category.is_some()
    }
}

fn contains_folded(haystack: &str, needle_folded: &str) -> bool {
    haystack.to_lowercase().contains(needle_folded)
}

/// True iff the event sits on `day`, matches the search term (if any) and
/// carries the selected category (if any).
pub fn matches(event: &Event, day: NaiveDate, opts: &FilterOptions) -> bool {
    if event.date != day {
        return false;
    }

    if !opts.search_term.is_empty() {
        let term = opts.search_term.to_lowercase();
        if !contains_folded(&event.title, &term) && !contains_folded(&event.description, &term) {
            return false;
        }
    }

    match opts.category {
        None => true,
        Some(cat) => event.color.as_ref().and_then(|c| c.palette()) == Some(cat),
    }
}

/// Events on `day` passing the filter, in store order.
pub fn events_on<'e>(
    events: &'e [Event],
    day: NaiveDate,
    opts: &FilterOptions,
) -> Vec<&'e Event> {
    events.iter().filter(|e| matches(e, day, opts)).collect()
}
