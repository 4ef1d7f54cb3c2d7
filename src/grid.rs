// Date grid computation for the month view.
//
// Everything in here is a pure function of (anchor date, today, week start).
// The grid always covers whole weeks: from the week holding the 1st of the
// anchor's month to the week holding its last day.
use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::EnumIter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    pub fn first_weekday(&self) -> Weekday {
        match self {
            WeekStart::Sunday => Weekday::Sun,
            WeekStart::Monday => Weekday::Mon,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            WeekStart::Sunday => WeekStart::Monday,
            WeekStart::Monday => WeekStart::Sunday,
        }
    }

    /// Column index (0..7) of `date` in a week starting on `self`.
    pub fn column_of(&self, date: NaiveDate) -> u32 {
        match self {
            WeekStart::Sunday => date.weekday().num_days_from_sunday(),
            WeekStart::Monday => date.weekday().num_days_from_monday(),
        }
    }
}

impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekStart::Sunday => write!(f, "Sunday"),
            WeekStart::Monday => write!(f, "Monday"),
        }
    }
}

/// One cell of the month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDay {
    pub date: NaiveDate,
    /// False for the leading/trailing days borrowed from adjacent months.
    pub in_month: bool,
    pub is_today: bool,
}

pub fn first_of_month(anchor: NaiveDate) -> NaiveDate {
    anchor.with_day(1).unwrap_or(anchor)
}

pub fn last_of_month(anchor: NaiveDate) -> NaiveDate {
    let first = first_of_month(anchor);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        // Only reachable at the very end of chrono's range.
        .unwrap_or(NaiveDate::MAX)
}

pub fn start_of_week(date: NaiveDate, week_start: WeekStart) -> NaiveDate {
    let back = week_start.column_of(date) as u64;
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

pub fn end_of_week(date: NaiveDate, week_start: WeekStart) -> NaiveDate {
    let forward = 6 - week_start.column_of(date) as u64;
    date.checked_add_days(Days::new(forward)).unwrap_or(date)
}

pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// Builds the visible day sequence for the month containing `anchor`.
/// The length is always 28, 35 or 42.
pub fn build_month_grid(anchor: NaiveDate, today: NaiveDate, week_start: WeekStart) -> Vec<GridDay> {
    let month_start = first_of_month(anchor);
    let month_end = last_of_month(anchor);
    let grid_start = start_of_week(month_start, week_start);
    let grid_end = end_of_week(month_end, week_start);

    grid_start
        .iter_days()
        .take_while(|d| *d <= grid_end)
        .map(|date| GridDay {
            date,
            in_month: same_month(date, month_start),
            is_today: date == today,
        })
        .collect()
}

/// Moves the anchor by whole months. The day is clamped to the target
/// month's length (Jan 31 + 1 month = Feb 28/29).
pub fn shift_month(anchor: NaiveDate, delta: i32) -> NaiveDate {
    let months = Months::new(delta.unsigned_abs());
    let shifted = if delta >= 0 {
        anchor.checked_add_months(months)
    } else {
        anchor.checked_sub_months(months)
    };
    shifted.unwrap_or(anchor)
}

/// Abbreviated weekday names in column order.
pub fn weekday_labels(week_start: WeekStart) -> [&'static str; 7] {
    const SUNDAY_FIRST: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
    const MONDAY_FIRST: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    match week_start {
        WeekStart::Sunday => SUNDAY_FIRST,
        WeekStart::Monday => MONDAY_FIRST,
    }
}

/// Header text, e.g. "May 2024".
pub fn month_title(anchor: NaiveDate) -> String {
    anchor.format("%B %Y").to_string()
}
