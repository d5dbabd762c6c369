//! Availability computation
//!
//! Pure functions over inventory specs and a day's reservations; no
//! storage access here, which keeps slot generation deterministic and
//! directly testable. The engine feeds it repository data and caches the
//! result.

use chrono::{Duration, NaiveDate, NaiveTime};
use shared::booking::{
    AvailabilitySlot, BookingPolicy, OccupancyWindow, Reservation, TableAssignment, TableSpec,
    TimeRange,
};
use std::collections::BTreeMap;

/// A bookable unit: one table, or one complete combinable group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateClaim {
    pub assignment: TableAssignment,
    /// Seats this claim provides (single max_covers, or the group sum)
    pub capacity: u32,
}

impl CandidateClaim {
    /// Best-fit order: smallest capacity first, single tables before
    /// combined groups at equal capacity, then stable id order (the
    /// fixed deterministic tie-break).
    fn fit_key(&self) -> (u32, bool, String) {
        let id = match &self.assignment {
            TableAssignment::Single { table_id } => table_id.clone(),
            TableAssignment::Combined { group, .. } => group.clone(),
        };
        (self.capacity, self.assignment.is_combined(), id)
    }
}

/// All claims whose capacity covers the party, best-fit ordered.
///
/// A combinable group becomes a candidate only when none of its members
/// could seat the party alone: joining tables for a party a single
/// table handles would fragment the floor.
pub fn qualifying_claims(tables: &[TableSpec], party_size: u32) -> Vec<CandidateClaim> {
    let mut claims: Vec<CandidateClaim> = tables
        .iter()
        .filter(|t| t.seats(party_size))
        .map(|t| CandidateClaim {
            assignment: TableAssignment::single(t.table_id.clone()),
            capacity: t.max_covers,
        })
        .collect();

    // BTreeMap keeps group iteration deterministic
    let mut groups: BTreeMap<&str, Vec<&TableSpec>> = BTreeMap::new();
    for table in tables {
        if let Some(group) = table.combine_group.as_deref() {
            groups.entry(group).or_default().push(table);
        }
    }

    for (group, members) in groups {
        if members.len() < 2 {
            continue;
        }
        let combined_capacity: u32 = members.iter().map(|t| t.max_covers).sum();
        let any_member_suffices = members.iter().any(|t| t.seats(party_size));
        if combined_capacity >= party_size && !any_member_suffices {
            let mut table_ids: Vec<String> =
                members.iter().map(|t| t.table_id.clone()).collect();
            table_ids.sort();
            claims.push(CandidateClaim {
                assignment: TableAssignment::Combined {
                    group: group.to_string(),
                    table_ids,
                },
                capacity: combined_capacity,
            });
        }
    }

    claims.sort_by_key(|c| c.fit_key());
    claims
}

/// Whether every table of the claim is free for the occupancy window
pub fn claim_is_free(
    claim: &CandidateClaim,
    reservations: &[Reservation],
    window: &OccupancyWindow,
    buffer_minutes: u32,
    buffer_mode: shared::booking::BufferMode,
) -> bool {
    claim.assignment.table_ids().iter().all(|table_id| {
        !reservations.iter().any(|r| {
            r.status.holds_table()
                && r.uses_table(table_id)
                && r.occupancy(buffer_minutes, buffer_mode).overlaps(window)
        })
    })
}

/// Qualifying claims that are free at the given start, best-fit ordered
pub fn free_claims(
    tables: &[TableSpec],
    party_size: u32,
    reservations: &[Reservation],
    window: &OccupancyWindow,
    policy: &BookingPolicy,
) -> Vec<CandidateClaim> {
    qualifying_claims(tables, party_size)
        .into_iter()
        .filter(|c| claim_is_free(c, reservations, window, policy.buffer_minutes, policy.buffer_mode))
        .collect()
}

/// Inputs for one slot computation
#[derive(Debug, Clone, Copy)]
pub struct SlotQuery<'a> {
    pub date: NaiveDate,
    pub party_size: u32,
    pub duration_minutes: u32,
    pub policy: &'a BookingPolicy,
    pub windows: &'a [TimeRange],
    pub tables: &'a [TableSpec],
    pub reservations: &'a [Reservation],
}

/// Generate offerable slots for a day.
///
/// Candidate starts step through each service window at the policy
/// granularity; a slot is offered when at least one qualifying claim is
/// free for the full occupancy window (seating plus buffer; the buffer is
/// additive, never absorbed by an adjacent seating's own duration).
pub fn compute_slots(query: &SlotQuery<'_>) -> Vec<AvailabilitySlot> {
    let granularity = query.policy.slot_granularity_minutes.max(1);
    let candidates = qualifying_claims(query.tables, query.party_size);
    if candidates.is_empty() {
        return Vec::new();
    }

    let mut slots = Vec::new();
    for window in query.windows {
        let mut start = window.open;
        while window.contains_start(start) {
            let occupancy = occupancy_at(start, query.duration_minutes, query.policy);
            let remaining = candidates
                .iter()
                .filter(|c| {
                    claim_is_free(
                        c,
                        query.reservations,
                        &occupancy,
                        query.policy.buffer_minutes,
                        query.policy.buffer_mode,
                    )
                })
                .count() as u32;
            if remaining > 0 {
                slots.push(AvailabilitySlot {
                    date: query.date,
                    start,
                    duration_minutes: query.duration_minutes,
                    remaining_tables: remaining,
                });
            }

            let (next, wrapped) =
                start.overflowing_add_signed(Duration::minutes(granularity as i64));
            if wrapped != 0 {
                break;
            }
            start = next;
        }
    }
    slots
}

/// Occupancy window for a seating starting at `start`
pub fn occupancy_at(start: NaiveTime, duration_minutes: u32, policy: &BookingPolicy) -> OccupancyWindow {
    use chrono::Timelike;
    OccupancyWindow::for_seating(
        (start.hour() * 60 + start.minute()) as i32,
        duration_minutes,
        policy.buffer_minutes,
        policy.buffer_mode,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::booking::{BufferMode, CustomerContact, ReservationStatus};

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

    fn confirmed(table_id: &str, start: NaiveTime, duration: u32) -> Reservation {
        let mut r = Reservation::draft(
            "restaurant:r1",
            "RSV-T",
            date(),
            start,
            duration,
            2,
            CustomerContact::default(),
        );
        r.status = ReservationStatus::Confirmed;
        r.assignment = Some(TableAssignment::single(table_id));
        r
    }

    fn policy() -> BookingPolicy {
        BookingPolicy::default()
    }

    #[test]
    fn best_fit_prefers_smallest_single_table() {
        let tables = vec![table("big", 8, None), table("small", 4, None), table("mid", 6, None)];
        let claims = qualifying_claims(&tables, 3);
        assert_eq!(claims.len(), 3);
        assert_eq!(
            claims[0].assignment,
            TableAssignment::single("table:small")
        );
        assert_eq!(claims[1].assignment, TableAssignment::single("table:mid"));
    }

    #[test]
    fn combinable_group_qualifies_only_when_no_member_suffices() {
        // two grouped 4-tops plus two unrelated 4-tops
        let tables = vec![
            table("g1", 4, Some("window")),
            table("g2", 4, Some("window")),
            table("a", 4, None),
            table("b", 4, None),
        ];

        // party of 6: only the declared group qualifies
        let claims = qualifying_claims(&tables, 6);
        assert_eq!(claims.len(), 1);
        assert_eq!(
            claims[0].assignment,
            TableAssignment::Combined {
                group: "window".into(),
                table_ids: vec!["table:g1".into(), "table:g2".into()],
            }
        );
        assert_eq!(claims[0].capacity, 8);

        // party of 4: singles qualify, the group is not considered
        let claims = qualifying_claims(&tables, 4);
        assert_eq!(claims.len(), 4);
        assert!(claims.iter().all(|c| !c.assignment.is_combined()));

        // party of 9 exceeds even the combined capacity
        assert!(qualifying_claims(&tables, 9).is_empty());
    }

    #[test]
    fn deterministic_tie_break_on_equal_capacity() {
        let tables = vec![table("b", 4, None), table("a", 4, None)];
        let claims = qualifying_claims(&tables, 2);
        assert_eq!(claims[0].assignment, TableAssignment::single("table:a"));
        assert_eq!(claims[1].assignment, TableAssignment::single("table:b"));
    }

    #[test]
    fn no_qualifying_tables_means_empty_slots_not_error() {
        let q = SlotQuery {
            date: date(),
            party_size: 10,
            duration_minutes: 90,
            policy: &policy(),
            windows: &[TimeRange::new(t(17, 0), t(22, 0))],
            tables: &[table("a", 4, None)],
            reservations: &[],
        };
        assert!(compute_slots(&q).is_empty());
    }

    #[test]
    fn buffer_is_additive_for_back_to_back_seatings() {
        // One 4-top, open 17:00-22:00, buffer 15, duration 90.
        // A confirmed 19:00 seating blocks [19:00, 20:45).
        let tables = vec![table("a", 4, None)];
        let reservations = vec![confirmed("table:a", t(19, 0), 90)];
        let q = SlotQuery {
            date: date(),
            party_size: 2,
            duration_minutes: 90,
            policy: &policy(),
            windows: &[TimeRange::new(t(17, 0), t(22, 0))],
            tables: &tables,
            reservations: &reservations,
        };
        let slots = compute_slots(&q);
        let starts: Vec<NaiveTime> = slots.iter().map(|s| s.start).collect();

        // 17:00 seating occupies until 18:45 (with buffer), clear of 19:00
        assert!(starts.contains(&t(17, 0)));
        // 17:30 occupies until 19:15, collides with the 19:00 seating
        assert!(!starts.contains(&t(17, 30)));
        // 20:00 still inside the blocked window (until 20:45)
        assert!(!starts.contains(&t(20, 0)));
        // 20:45 is the first start the buffer allows again
        assert!(starts.contains(&t(20, 45)));
        // nothing starts at or past close
        assert!(starts.iter().all(|s| *s < t(22, 0)));
    }

    #[test]
    fn remaining_tables_counts_free_claims() {
        let tables = vec![table("a", 4, None), table("b", 4, None)];
        let reservations = vec![confirmed("table:a", t(19, 0), 90)];
        let q = SlotQuery {
            date: date(),
            party_size: 2,
            duration_minutes: 90,
            policy: &policy(),
            windows: &[TimeRange::new(t(17, 0), t(22, 0))],
            tables: &tables,
            reservations: &reservations,
        };
        let slots = compute_slots(&q);
        let at = |time: NaiveTime| slots.iter().find(|s| s.start == time).map(|s| s.remaining_tables);

        assert_eq!(at(t(17, 0)), Some(2));
        // only table b is free at 19:00
        assert_eq!(at(t(19, 0)), Some(1));
    }

    #[test]
    fn identical_queries_yield_identical_slots() {
        let tables = vec![table("a", 4, None), table("b", 6, None)];
        let reservations = vec![confirmed("table:a", t(18, 0), 120)];
        let q = SlotQuery {
            date: date(),
            party_size: 2,
            duration_minutes: 90,
            policy: &policy(),
            windows: &[TimeRange::new(t(17, 0), t(22, 0))],
            tables: &tables,
            reservations: &reservations,
        };
        assert_eq!(compute_slots(&q), compute_slots(&q));
    }
}
