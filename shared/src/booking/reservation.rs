//! Reservation types and the table-occupancy window

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::policy::BufferMode;

/// Reservation lifecycle status
///
/// ```text
/// Pending ──> Confirmed ──> Seated ──> Completed
///    │            │  │
///    │            │  └────> NoShow
///    └────────────┴───────> Cancelled ··> Confirmed (staff reinstate)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Seated,
    Completed,
    Cancelled,
    NoShow,
}

impl ReservationStatus {
    /// Statuses that hold a table claim for overlap purposes
    pub fn holds_table(&self) -> bool {
        matches!(self, ReservationStatus::Confirmed | ReservationStatus::Seated)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Completed | ReservationStatus::Cancelled | ReservationStatus::NoShow
        )
    }

    /// Status machine edges. Cancelled -> Confirmed is the staff
    /// "reinstate" path and re-activates the table claim, so the ledger
    /// must re-run the overlap check for it.
    pub fn can_transition_to(&self, to: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, to),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Seated)
                | (Confirmed, Cancelled)
                | (Confirmed, NoShow)
                | (Seated, Completed)
                | (Cancelled, Confirmed)
        )
    }
}

/// The table (or staff-declared combination) a reservation holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableAssignment {
    Single {
        table_id: String,
    },
    Combined {
        group: String,
        table_ids: Vec<String>,
    },
}

impl TableAssignment {
    pub fn single(table_id: impl Into<String>) -> Self {
        Self::Single {
            table_id: table_id.into(),
        }
    }

    /// All physical tables this assignment occupies
    pub fn table_ids(&self) -> Vec<&str> {
        match self {
            TableAssignment::Single { table_id } => vec![table_id.as_str()],
            TableAssignment::Combined { table_ids, .. } => {
                table_ids.iter().map(String::as_str).collect()
            }
        }
    }

    pub fn is_combined(&self) -> bool {
        matches!(self, TableAssignment::Combined { .. })
    }

    /// Whether the assignment occupies the given table
    pub fn uses_table(&self, table_id: &str) -> bool {
        match self {
            TableAssignment::Single { table_id: id } => id == table_id,
            TableAssignment::Combined { table_ids, .. } => {
                table_ids.iter().any(|id| id == table_id)
            }
        }
    }
}

/// Opaque customer payload, carried through but never interpreted by the
/// engine's algorithms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A booking of one restaurant table (or combination) for a time window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub reservation_id: String,
    pub restaurant_id: String,
    /// Human-facing code (RSV<yyyymmdd><counter>)
    pub confirmation_code: String,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub duration_minutes: u32,
    pub party_size: u32,
    pub status: ReservationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment: Option<TableAssignment>,
    #[serde(default)]
    pub contact: CustomerContact,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// New reservation in `Pending`, not yet holding a table
    pub fn draft(
        restaurant_id: impl Into<String>,
        confirmation_code: impl Into<String>,
        date: NaiveDate,
        start: NaiveTime,
        duration_minutes: u32,
        party_size: u32,
        contact: CustomerContact,
    ) -> Self {
        let now = Utc::now();
        Self {
            reservation_id: uuid::Uuid::new_v4().to_string(),
            restaurant_id: restaurant_id.into(),
            confirmation_code: confirmation_code.into(),
            date,
            start,
            duration_minutes,
            party_size,
            status: ReservationStatus::Pending,
            assignment: None,
            contact,
            created_at: now,
            updated_at: now,
        }
    }

    /// Minutes since midnight of the seating start
    pub fn start_minute(&self) -> i32 {
        (self.start.hour() * 60 + self.start.minute()) as i32
    }

    /// Table-occupancy window including buffer, per the restaurant policy
    pub fn occupancy(&self, buffer_minutes: u32, mode: BufferMode) -> OccupancyWindow {
        OccupancyWindow::for_seating(self.start_minute(), self.duration_minutes, buffer_minutes, mode)
    }

    pub fn uses_table(&self, table_id: &str) -> bool {
        self.assignment
            .as_ref()
            .is_some_and(|a| a.uses_table(table_id))
    }
}

/// Half-open minute window [start_minute, end_minute) a seating blocks a
/// table for. May extend past close (after-buffer) or before open
/// (`BeforeAndAfter` buffer); overlap math is unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupancyWindow {
    pub start_minute: i32,
    pub end_minute: i32,
}

impl OccupancyWindow {
    pub fn for_seating(start_minute: i32, duration_minutes: u32, buffer_minutes: u32, mode: BufferMode) -> Self {
        let lead = match mode {
            BufferMode::After => 0,
            BufferMode::BeforeAndAfter => buffer_minutes as i32,
        };
        Self {
            start_minute: start_minute - lead,
            end_minute: start_minute + duration_minutes as i32 + buffer_minutes as i32,
        }
    }

    pub fn overlaps(&self, other: &OccupancyWindow) -> bool {
        self.start_minute < other.end_minute && other.start_minute < self.end_minute
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_edges() {
        use ReservationStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(NoShow));
        assert!(Cancelled.can_transition_to(Confirmed));
        assert!(!Completed.can_transition_to(Confirmed));
        assert!(!Seated.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Seated));
    }

    #[test]
    fn buffer_is_additive_after_the_seating() {
        // 19:00 + 90min seating + 15min buffer blocks until 20:45
        let w = OccupancyWindow::for_seating(19 * 60, 90, 15, BufferMode::After);
        assert_eq!(w.start_minute, 19 * 60);
        assert_eq!(w.end_minute, 20 * 60 + 45);

        // a 20:00 seating overlaps, a 20:45 one does not
        let at_20 = OccupancyWindow::for_seating(20 * 60, 90, 15, BufferMode::After);
        let at_2045 = OccupancyWindow::for_seating(20 * 60 + 45, 90, 15, BufferMode::After);
        assert!(w.overlaps(&at_20));
        assert!(!w.overlaps(&at_2045));
    }

    #[test]
    fn symmetric_buffer_extends_both_sides() {
        let w = OccupancyWindow::for_seating(19 * 60, 90, 15, BufferMode::BeforeAndAfter);
        assert_eq!(w.start_minute, 18 * 60 + 45);
        assert_eq!(w.end_minute, 20 * 60 + 45);
    }
}
