//! Reservation ledger: the sole writer of reservation state
//!
//! Enforces the no-overlap invariant at the storage boundary: the check
//! and the claim run inside one redb write transaction, so no caller
//! (including a buggy one elsewhere in the system) can commit two
//! overlapping confirmed claims on a table. redb's single-writer model
//! serializes all claim attempts process-wide; availability reads stay on
//! relaxed snapshot reads and a stale read surfaces as `Conflict` here at
//! commit time, never as a double-booking.

use chrono::{NaiveDate, Utc};
use shared::booking::{
    BookingError, BookingResult, BufferMode, OccupancyWindow, Reservation, ReservationStatus,
    TableAssignment,
};

use super::storage::LedgerStorage;

#[derive(Clone)]
pub struct ReservationLedger {
    storage: LedgerStorage,
}

impl ReservationLedger {
    pub fn new(storage: LedgerStorage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &LedgerStorage {
        &self.storage
    }

    /// Human-facing confirmation code (crash-safe counter)
    pub fn next_confirmation_code(&self, date: NaiveDate) -> BookingResult<String> {
        let count = self.storage.next_reservation_count()?;
        Ok(format!("RSV{}{}", date.format("%Y%m%d"), 1000 + count))
    }

    /// Get a reservation by id
    pub fn get(&self, reservation_id: &str) -> BookingResult<Option<Reservation>> {
        Ok(self.storage.get_reservation(reservation_id)?)
    }

    /// Snapshot read of a restaurant's day
    pub fn reservations_for_day(
        &self,
        restaurant_id: &str,
        date: NaiveDate,
    ) -> BookingResult<Vec<Reservation>> {
        let mut day = self.storage.reservations_for_day(restaurant_id, date)?;
        day.sort_by_key(|r| (r.start, r.reservation_id.clone()));
        Ok(day)
    }

    /// Atomically claim tables for a pending draft.
    ///
    /// Re-runs the overlap check against the transactional view before
    /// inserting the reservation as `Confirmed`. Returns `Conflict` when
    /// a concurrent claim won the window in the meantime.
    pub fn claim(
        &self,
        mut draft: Reservation,
        assignment: TableAssignment,
        buffer_minutes: u32,
        buffer_mode: BufferMode,
    ) -> BookingResult<Reservation> {
        let txn = self.storage.begin_write()?;

        let day = self
            .storage
            .reservations_for_day_txn(&txn, &draft.restaurant_id, draft.date)?;
        let window = OccupancyWindow::for_seating(
            draft.start_minute(),
            draft.duration_minutes,
            buffer_minutes,
            buffer_mode,
        );

        if blocks_any_table(&day, &assignment, &window, buffer_minutes, buffer_mode, None) {
            tracing::debug!(
                reservation_id = %draft.reservation_id,
                restaurant_id = %draft.restaurant_id,
                "Claim lost to a concurrent reservation"
            );
            return Err(BookingError::Conflict);
        }

        draft.status = ReservationStatus::Confirmed;
        draft.assignment = Some(assignment);
        draft.updated_at = Utc::now();

        self.storage.put_reservation(&txn, &draft)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        Ok(draft)
    }

    /// Compare-and-set status transition.
    ///
    /// Fails with `InvalidTransition` when the persisted status differs
    /// from `from` (lost-update guard) or the edge is not in the status
    /// machine. Transitions that re-activate a table claim (reinstating a
    /// cancelled booking) re-run the overlap check and fail with
    /// `Conflict` when the table has been given away since.
    pub fn transition(
        &self,
        reservation_id: &str,
        from: ReservationStatus,
        to: ReservationStatus,
        buffer_minutes: u32,
        buffer_mode: BufferMode,
    ) -> BookingResult<Reservation> {
        let txn = self.storage.begin_write()?;

        let mut reservation = self
            .storage
            .get_reservation_txn(&txn, reservation_id)?
            .ok_or_else(|| BookingError::not_found(format!("Reservation {}", reservation_id)))?;

        if reservation.status != from {
            return Err(BookingError::InvalidTransition(format!(
                "expected {:?}, ledger holds {:?}",
                from, reservation.status
            )));
        }
        if !from.can_transition_to(to) {
            return Err(BookingError::transition(from, to));
        }

        if to.holds_table() && !from.holds_table() {
            // Re-activating the claim: the window must still be free
            let Some(assignment) = reservation.assignment.clone() else {
                return Err(BookingError::InvalidTransition(
                    "no table assignment to re-activate".to_string(),
                ));
            };
            let day = self.storage.reservations_for_day_txn(
                &txn,
                &reservation.restaurant_id,
                reservation.date,
            )?;
            let window = reservation.occupancy(buffer_minutes, buffer_mode);
            if blocks_any_table(
                &day,
                &assignment,
                &window,
                buffer_minutes,
                buffer_mode,
                Some(reservation_id),
            ) {
                return Err(BookingError::Conflict);
            }
        }

        reservation.status = to;
        reservation.updated_at = Utc::now();
        self.storage.put_reservation(&txn, &reservation)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        tracing::info!(
            reservation_id = %reservation_id,
            from = ?from,
            to = ?to,
            "Reservation status transitioned"
        );
        Ok(reservation)
    }
}

/// Whether any table of `assignment` is blocked for `window` by a
/// reservation that currently holds it. `exclude` skips the reservation
/// being re-activated itself.
fn blocks_any_table(
    day: &[Reservation],
    assignment: &TableAssignment,
    window: &OccupancyWindow,
    buffer_minutes: u32,
    buffer_mode: BufferMode,
    exclude: Option<&str>,
) -> bool {
    assignment.table_ids().iter().any(|table_id| {
        day.iter().any(|r| {
            exclude != Some(r.reservation_id.as_str())
                && r.status.holds_table()
                && r.uses_table(table_id)
                && r.occupancy(buffer_minutes, buffer_mode).overlaps(window)
        })
    })
}
