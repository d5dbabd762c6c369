//! Operating calendar lookup
//!
//! Resolves the service windows of a restaurant for a concrete date:
//! per-date overrides win over weekly hours, an empty override means a
//! declared closure.

use chrono::{Datelike, NaiveDate, NaiveTime};
use shared::booking::{SpecialDay, TimeRange, WeeklyHours};

/// Borrowing view over a restaurant's schedule data
#[derive(Debug, Clone, Copy)]
pub struct OperatingCalendar<'a> {
    hours: &'a WeeklyHours,
    special_days: &'a [SpecialDay],
}

impl<'a> OperatingCalendar<'a> {
    pub fn new(hours: &'a WeeklyHours, special_days: &'a [SpecialDay]) -> Self {
        Self {
            hours,
            special_days,
        }
    }

    /// Service windows for the date (override first, then weekly hours)
    pub fn windows_for(&self, date: NaiveDate) -> Vec<TimeRange> {
        if let Some(special) = self.special_days.iter().find(|s| s.date == date) {
            return special.windows.clone();
        }
        self.hours.for_weekday(date.weekday()).to_vec()
    }

    /// Declared closure or simply no weekly hours that day
    pub fn is_closed(&self, date: NaiveDate) -> bool {
        self.windows_for(date).is_empty()
    }

    /// Whether a seating may start at this time on this date
    pub fn fits_service_window(&self, date: NaiveDate, start: NaiveTime) -> bool {
        self.windows_for(date).iter().any(|w| w.contains_start(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn dinner_hours() -> WeeklyHours {
        WeeklyHours::every_day(vec![TimeRange::new(t(17, 0), t(22, 0))])
    }

    #[test]
    fn override_replaces_weekly_windows() {
        let hours = dinner_hours();
        // 2026-09-07 is a Monday
        let holiday = NaiveDate::from_ymd_opt(2026, 9, 7).unwrap();
        let special = vec![SpecialDay {
            date: holiday,
            windows: vec![TimeRange::new(t(12, 0), t(16, 0))],
            reason: Some("holiday lunch only".into()),
        }];
        let cal = OperatingCalendar::new(&hours, &special);

        assert!(cal.fits_service_window(holiday, t(12, 0)));
        assert!(!cal.fits_service_window(holiday, t(19, 0)));

        let regular = NaiveDate::from_ymd_opt(2026, 9, 8).unwrap();
        assert!(cal.fits_service_window(regular, t(19, 0)));
    }

    #[test]
    fn declared_closure_yields_no_windows() {
        let hours = dinner_hours();
        let closed = NaiveDate::from_ymd_opt(2026, 12, 25).unwrap();
        let special = vec![SpecialDay::closure(closed, "Christmas")];
        let cal = OperatingCalendar::new(&hours, &special);

        assert!(cal.is_closed(closed));
        assert!(cal.windows_for(closed).is_empty());
    }

    #[test]
    fn split_shifts_keep_the_gap_unbookable() {
        let hours = WeeklyHours::every_day(vec![
            TimeRange::new(t(12, 0), t(15, 0)),
            TimeRange::new(t(19, 0), t(23, 0)),
        ]);
        let cal = OperatingCalendar::new(&hours, &[]);
        let date = NaiveDate::from_ymd_opt(2026, 9, 9).unwrap();

        assert!(cal.fits_service_window(date, t(13, 0)));
        assert!(cal.fits_service_window(date, t(19, 30)));
        // the afternoon gap takes no seatings
        assert!(!cal.fits_service_window(date, t(16, 0)));
        assert!(!cal.fits_service_window(date, t(15, 0)));
    }
}
