//! Waitlist entry types

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::reservation::CustomerContact;

/// Waitlist lifecycle status
///
/// ```text
/// Waiting ──> Notified ──> Converted
///    │ ▲          │
///    │ └──────────┼── (lost the race: back to Waiting, rank kept)
///    │            └────> Expired
///    └─────────────────> Removed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaitlistStatus {
    Waiting,
    Notified,
    Converted,
    Expired,
    Removed,
}

impl WaitlistStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WaitlistStatus::Converted | WaitlistStatus::Expired | WaitlistStatus::Removed
        )
    }
}

/// A party waiting for capacity on a given date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub entry_id: String,
    pub restaurant_id: String,
    pub date: NaiveDate,
    pub party_size: u32,
    /// Earliest acceptable seating start
    pub window_start: NaiveTime,
    /// Latest acceptable seating start
    pub window_end: NaiveTime,
    /// Priority key; lower ranks are offered capacity first.
    /// Seeded from `join_seq`, staff-adjustable for VIP handling.
    pub rank: u64,
    /// Immutable monotonic join sequence, tie-break for equal ranks
    pub join_seq: u64,
    pub status: WaitlistStatus,
    #[serde(default)]
    pub contact: CustomerContact,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WaitlistEntry {
    pub fn new(
        restaurant_id: impl Into<String>,
        date: NaiveDate,
        party_size: u32,
        window_start: NaiveTime,
        window_end: NaiveTime,
        join_seq: u64,
        contact: CustomerContact,
    ) -> Self {
        let now = Utc::now();
        Self {
            entry_id: uuid::Uuid::new_v4().to_string(),
            restaurant_id: restaurant_id.into(),
            date,
            party_size,
            window_start,
            window_end,
            rank: join_seq,
            join_seq,
            status: WaitlistStatus::Waiting,
            contact,
            notified_at: None,
            notify_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Promotion order: (rank, join_seq) ascending
    pub fn priority_key(&self) -> (u64, u64) {
        (self.rank, self.join_seq)
    }

    /// Whether a slot starting at `start` falls inside the party's
    /// arrival window (inclusive on both ends)
    pub fn accepts_start(&self, start: NaiveTime) -> bool {
        start >= self.window_start && start <= self.window_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn priority_follows_join_order_until_staff_override() {
        let date = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let a = WaitlistEntry::new("r1", date, 2, t(18, 0), t(20, 0), 1, Default::default());
        let mut b = WaitlistEntry::new("r1", date, 2, t(18, 0), t(20, 0), 2, Default::default());
        assert!(a.priority_key() < b.priority_key());

        // VIP bump
        b.rank = 0;
        assert!(b.priority_key() < a.priority_key());
    }

    #[test]
    fn arrival_window_is_inclusive() {
        let date = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let e = WaitlistEntry::new("r1", date, 2, t(18, 0), t(20, 0), 1, Default::default());
        assert!(e.accepts_start(t(18, 0)));
        assert!(e.accepts_start(t(20, 0)));
        assert!(!e.accepts_start(t(20, 15)));
    }
}
