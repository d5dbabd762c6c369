//! Derived availability slots

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// An offerable (date, start, duration) tuple
///
/// `remaining_tables` counts free qualifying claims: a capacity signal
/// for waitlist prioritization and "almost full" display, never a license
/// to overbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub duration_minutes: u32,
    pub remaining_tables: u32,
}
