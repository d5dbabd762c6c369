//! Operating hours types
//!
//! Weekly service windows plus per-date overrides. A day may carry several
//! windows (split shifts, e.g. lunch 12:00-15:00 and dinner 19:00-23:00).

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// A single service window within a day, half-open on start times:
/// seatings must start at or after `open` and strictly before `close`.
/// A seating (and its buffer) may run past close; last seatings are
/// taken until closing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl TimeRange {
    pub fn new(open: NaiveTime, close: NaiveTime) -> Self {
        Self { open, close }
    }

    /// Whether a seating may start at `start` in this window
    pub fn contains_start(&self, start: NaiveTime) -> bool {
        start >= self.open && start < self.close
    }
}

/// Weekly operating hours, one window list per weekday
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeeklyHours {
    #[serde(default)]
    pub monday: Vec<TimeRange>,
    #[serde(default)]
    pub tuesday: Vec<TimeRange>,
    #[serde(default)]
    pub wednesday: Vec<TimeRange>,
    #[serde(default)]
    pub thursday: Vec<TimeRange>,
    #[serde(default)]
    pub friday: Vec<TimeRange>,
    #[serde(default)]
    pub saturday: Vec<TimeRange>,
    #[serde(default)]
    pub sunday: Vec<TimeRange>,
}

impl WeeklyHours {
    pub fn for_weekday(&self, weekday: Weekday) -> &[TimeRange] {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    /// Same window list for all seven days
    pub fn every_day(windows: Vec<TimeRange>) -> Self {
        Self {
            monday: windows.clone(),
            tuesday: windows.clone(),
            wednesday: windows.clone(),
            thursday: windows.clone(),
            friday: windows.clone(),
            saturday: windows.clone(),
            sunday: windows,
        }
    }
}

/// Per-date override of the weekly schedule
///
/// An empty `windows` list declares the date closed; a non-empty list
/// replaces the weekly windows entirely for that date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialDay {
    pub date: NaiveDate,
    #[serde(default)]
    pub windows: Vec<TimeRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SpecialDay {
    pub fn closure(date: NaiveDate, reason: impl Into<String>) -> Self {
        Self {
            date,
            windows: Vec::new(),
            reason: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn seating_must_start_inside_window() {
        let dinner = TimeRange::new(t(17, 0), t(22, 0));
        assert!(dinner.contains_start(t(17, 0)));
        // a late seating may run past close
        assert!(dinner.contains_start(t(20, 45)));
        // starts before open or at/after close
        assert!(!dinner.contains_start(t(16, 45)));
        assert!(!dinner.contains_start(t(22, 0)));
    }

    #[test]
    fn every_day_replicates_windows() {
        let hours = WeeklyHours::every_day(vec![TimeRange::new(t(12, 0), t(15, 0))]);
        assert_eq!(hours.for_weekday(Weekday::Mon), hours.for_weekday(Weekday::Sun));
    }
}
