//! Table assignment resolver
//!
//! Best-fit selection over a snapshot read, then an atomic claim through
//! the ledger. The snapshot may be stale (a concurrent booking can win
//! the window between the read and the claim), so the claim re-verifies
//! inside the write transaction and the resolver retries against fresh
//! availability a bounded number of times.

use shared::booking::{BookingError, BookingPolicy, BookingResult, Reservation, TableSpec};

use super::availability::{free_claims, occupancy_at};
use super::ledger::ReservationLedger;

#[derive(Clone)]
pub struct TableAssignmentResolver {
    ledger: ReservationLedger,
    max_attempts: u32,
}

impl TableAssignmentResolver {
    pub fn new(ledger: ReservationLedger, max_attempts: u32) -> Self {
        Self {
            ledger,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Select and claim a table for the draft.
    ///
    /// - `NoCapacity` when fresh availability shows no qualifying free
    ///   claim (caller should offer the waitlist).
    /// - `Conflict` when every attempt lost its race at commit time
    ///   (caller retries against freshly computed availability).
    pub fn resolve(
        &self,
        policy: &BookingPolicy,
        tables: &[TableSpec],
        draft: Reservation,
    ) -> BookingResult<Reservation> {
        let window = occupancy_at(draft.start, draft.duration_minutes, policy);

        for attempt in 1..=self.max_attempts {
            // 快照读，可能过期，由 claim 在事务内兜底
            let day = self
                .ledger
                .reservations_for_day(&draft.restaurant_id, draft.date)?;
            let candidates = free_claims(tables, draft.party_size, &day, &window, policy);

            let Some(best) = candidates.into_iter().next() else {
                return Err(BookingError::NoCapacity);
            };

            match self.ledger.claim(
                draft.clone(),
                best.assignment,
                policy.buffer_minutes,
                policy.buffer_mode,
            ) {
                Ok(reservation) => {
                    tracing::info!(
                        reservation_id = %reservation.reservation_id,
                        restaurant_id = %reservation.restaurant_id,
                        date = %reservation.date,
                        start = %reservation.start,
                        party_size = reservation.party_size,
                        attempt,
                        "Table assigned"
                    );
                    return Ok(reservation);
                }
                Err(BookingError::Conflict) => {
                    tracing::debug!(
                        reservation_id = %draft.reservation_id,
                        attempt,
                        "Lost the claim race, retrying with fresh availability"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(BookingError::Conflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::storage::LedgerStorage;
    use chrono::{NaiveDate, NaiveTime};
    use shared::booking::{CustomerContact, TableAssignment};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()
    }

    fn table(id: &str, max: u32, group: Option<&str>) -> TableSpec {
        TableSpec {
            table_id: format!("table:{id}"),
            name: id.to_uppercase(),
            min_covers: 1,
            max_covers: max,
            combine_group: group.map(str::to_string),
        }
    }

    fn resolver() -> TableAssignmentResolver {
        TableAssignmentResolver::new(
            ReservationLedger::new(LedgerStorage::open_in_memory().unwrap()),
            3,
        )
    }

    fn draft(start: NaiveTime, party: u32) -> Reservation {
        Reservation::draft(
            "restaurant:r1",
            "RSV-T",
            date(),
            start,
            90,
            party,
            CustomerContact::default(),
        )
    }

    #[test]
    fn single_four_top_buffer_scenario() {
        // Open 17:00-22:00, one capacity-4 table, buffer 15, duration 90
        let resolver = resolver();
        let policy = BookingPolicy::default();
        let tables = vec![table("a", 4, None)];

        // A @ 19:00 party 4 succeeds
        let a = resolver.resolve(&policy, &tables, draft(t(19, 0), 4)).unwrap();
        assert_eq!(a.assignment, Some(TableAssignment::single("table:a")));

        // B @ 20:00 party 2: 19:00+90+15 = 20:45 > 20:00, no other table
        let b = resolver.resolve(&policy, &tables, draft(t(20, 0), 2)).unwrap_err();
        assert_eq!(b, BookingError::NoCapacity);

        // C @ 20:45 party 2: the buffer has lapsed
        resolver.resolve(&policy, &tables, draft(t(20, 45), 2)).unwrap();
    }

    #[test]
    fn best_fit_leaves_large_tables_for_large_parties() {
        let resolver = resolver();
        let policy = BookingPolicy::default();
        let tables = vec![table("six", 6, None), table("two", 2, None), table("four", 4, None)];

        let r = resolver.resolve(&policy, &tables, draft(t(19, 0), 2)).unwrap();
        assert_eq!(r.assignment, Some(TableAssignment::single("table:two")));

        // next party of 2 gets the four-top, not the six
        let r = resolver.resolve(&policy, &tables, draft(t(19, 0), 2)).unwrap();
        assert_eq!(r.assignment, Some(TableAssignment::single("table:four")));
    }

    #[test]
    fn party_of_six_gets_the_combined_group() {
        let resolver = resolver();
        let policy = BookingPolicy::default();
        let tables = vec![
            table("g1", 4, Some("window")),
            table("g2", 4, Some("window")),
            table("a", 4, None),
        ];

        let r = resolver.resolve(&policy, &tables, draft(t(19, 0), 6)).unwrap();
        assert_eq!(
            r.assignment,
            Some(TableAssignment::Combined {
                group: "window".into(),
                table_ids: vec!["table:g1".into(), "table:g2".into()],
            })
        );

        // the group members are now blocked for a second large party
        let err = resolver.resolve(&policy, &tables, draft(t(19, 30), 6)).unwrap_err();
        assert_eq!(err, BookingError::NoCapacity);

        // but the free single still serves a small party
        resolver.resolve(&policy, &tables, draft(t(19, 30), 2)).unwrap();
    }

    #[test]
    fn concurrent_assignments_never_oversell() {
        // 8 workers race for 3 qualifying tables at the same slot:
        // exactly 3 must win, the rest fail with NoCapacity/Conflict.
        let resolver = resolver();
        let policy = BookingPolicy::default();
        let tables = vec![table("a", 4, None), table("b", 4, None), table("c", 4, None)];

        let results: Vec<BookingResult<Reservation>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let resolver = resolver.clone();
                    let tables = tables.clone();
                    let policy = policy.clone();
                    scope.spawn(move || resolver.resolve(&policy, &tables, draft(t(19, 0), 2)))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let won: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(won.len(), 3, "exactly one success per qualifying table");
        assert!(results.iter().all(|r| match r {
            Ok(_) => true,
            Err(BookingError::NoCapacity) | Err(BookingError::Conflict) => true,
            Err(e) => panic!("unexpected error: {e:?}"),
        }));

        // the three winners hold three distinct tables
        let mut held: Vec<_> = won
            .iter()
            .flat_map(|r| r.assignment.as_ref().unwrap().table_ids())
            .map(str::to_string)
            .collect();
        held.sort();
        held.dedup();
        assert_eq!(held.len(), 3);
    }
}
