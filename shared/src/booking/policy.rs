//! Per-restaurant booking policy

use serde::{Deserialize, Serialize};

/// Which side(s) of a seating the table buffer applies to.
///
/// 缓冲方向 - 默认仅在座位结束后保留（更常见的业务口径），
/// 可按餐厅配置为前后对称。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BufferMode {
    /// Buffer after the seating only
    #[default]
    After,
    /// Buffer both before and after the seating
    BeforeAndAfter,
}

/// Booking policy knobs, staff-configured per restaurant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPolicy {
    /// Default seating duration when the request does not override it
    pub default_duration_minutes: u32,
    /// Minimum idle time on a table between seatings
    pub buffer_minutes: u32,
    #[serde(default)]
    pub buffer_mode: BufferMode,
    /// Candidate slot start granularity
    pub slot_granularity_minutes: u32,
    /// Largest bookable party
    pub max_party_size: u32,
    /// Booking horizon in days from today
    pub max_advance_days: u32,
    /// How long a notified waitlist party holds its offer before expiry
    pub waitlist_hold_minutes: u32,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            default_duration_minutes: 90,
            buffer_minutes: 15,
            buffer_mode: BufferMode::After,
            slot_granularity_minutes: 15,
            max_party_size: 12,
            max_advance_days: 60,
            waitlist_hold_minutes: 15,
        }
    }
}

impl BookingPolicy {
    /// Effective seating duration for a request
    pub fn duration_or_default(&self, requested: Option<u32>) -> u32 {
        requested.unwrap_or(self.default_duration_minutes)
    }
}
