//! End-to-end engine tests over the real storage stack
//!
//! Drives BookingEngine against an embedded SurrealDB (RocksDB backend)
//! and an on-disk redb ledger, the way the server wires it in
//! production. The race test is the one that matters: N concurrent
//! assignments for M qualifying tables must yield exactly M successes.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate, NaiveTime, Utc};
use shared::Tenant;
use shared::booking::{
    BookingError, CustomerContact, ReservationStatus, TimeRange, WaitlistStatus, WeeklyHours,
};

use booking_server::booking::{
    AssignRequest, BookingEngine, EngineOptions, JoinWaitlistRequest, LedgerStorage, LogDispatcher,
};
use booking_server::db::DbService;
use booking_server::db::models::{DiningTableCreate, RestaurantCreate};
use booking_server::db::repository::{DiningTableRepository, RestaurantRepository};

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// A date comfortably inside the booking horizon
fn test_date() -> NaiveDate {
    Utc::now().date_naive() + Days::new(7)
}

struct TestRig {
    engine: BookingEngine,
    tenant: Tenant,
    restaurant_id: String,
    tables: DiningTableRepository,
    // keep the storage alive for the duration of the test
    _dir: tempfile::TempDir,
}

async fn setup(table_specs: &[(&str, u32, Option<&str>)]) -> TestRig {
    let dir = tempfile::tempdir().unwrap();

    let db = DbService::new(&dir.path().join("inventory.db").to_string_lossy())
        .await
        .unwrap()
        .db;
    let storage = LedgerStorage::open(dir.path().join("reservations.redb")).unwrap();
    let engine = BookingEngine::new(
        db.clone(),
        storage,
        EngineOptions {
            cache_ttl: Duration::from_secs(15),
            assign_max_attempts: 3,
        },
        Arc::new(LogDispatcher),
    );

    let tenant = Tenant::new("org:acme");
    let restaurants = RestaurantRepository::new(db.clone());
    let restaurant = restaurants
        .create(
            &tenant.org_id,
            RestaurantCreate {
                name: "Mar Azul".into(),
                timezone: "UTC".into(),
                hours: WeeklyHours::every_day(vec![TimeRange::new(t(17, 0), t(22, 0))]),
                special_days: vec![],
                policy: Default::default(),
            },
        )
        .await
        .unwrap();
    let restaurant_id = restaurant.id_string();

    let tables = DiningTableRepository::new(db);
    for (name, covers, group) in table_specs {
        tables
            .create(
                &restaurant_id,
                DiningTableCreate {
                    name: (*name).to_string(),
                    min_covers: None,
                    max_covers: *covers,
                    combine_group: group.map(str::to_string),
                },
            )
            .await
            .unwrap();
    }

    TestRig {
        engine,
        tenant,
        restaurant_id,
        tables,
        _dir: dir,
    }
}

fn assign_at(date: NaiveDate, start: NaiveTime, party: u32) -> AssignRequest {
    AssignRequest {
        date,
        start,
        party_size: party,
        duration_minutes: None,
        contact: CustomerContact::default(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_bookings_yield_exactly_one_success_per_table() {
    let rig = setup(&[("T1", 4, None), ("T2", 4, None), ("T3", 4, None)]).await;
    let date = test_date();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = rig.engine.clone();
        let tenant = rig.tenant.clone();
        let restaurant_id = rig.restaurant_id.clone();
        handles.push(tokio::spawn(async move {
            engine
                .assign_table(&tenant, &restaurant_id, assign_at(date, t(19, 0), 2))
                .await
        }));
    }

    let mut successes = 0;
    let mut held_tables = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(reservation) => {
                successes += 1;
                let assignment = reservation.assignment.expect("confirmed without a table");
                held_tables.extend(assignment.table_ids().iter().map(|s| s.to_string()));
            }
            Err(BookingError::NoCapacity) | Err(BookingError::Conflict) => {}
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    assert_eq!(successes, 3, "three qualifying tables, three winners");
    held_tables.sort();
    held_tables.dedup();
    assert_eq!(held_tables.len(), 3, "every winner holds a distinct table");

    // the ledger agrees
    let day = rig
        .engine
        .reservations_for_day(&rig.tenant, &rig.restaurant_id, date)
        .await
        .unwrap();
    assert_eq!(
        day.iter()
            .filter(|r| r.status == ReservationStatus::Confirmed)
            .count(),
        3
    );
}

#[tokio::test]
async fn booked_slot_disappears_from_availability() {
    let rig = setup(&[("T1", 4, None)]).await;
    let date = test_date();

    let before = rig
        .engine
        .compute_availability(&rig.tenant, &rig.restaurant_id, date, 2, None)
        .await
        .unwrap();
    assert!(before.iter().any(|s| s.start == t(19, 0)));

    // identical query with no mutation in between: identical slots
    let again = rig
        .engine
        .compute_availability(&rig.tenant, &rig.restaurant_id, date, 2, None)
        .await
        .unwrap();
    assert_eq!(before, again);

    rig.engine
        .assign_table(&rig.tenant, &rig.restaurant_id, assign_at(date, t(19, 0), 2))
        .await
        .unwrap();

    // cache was invalidated before the assignment returned
    let after = rig
        .engine
        .compute_availability(&rig.tenant, &rig.restaurant_id, date, 2, None)
        .await
        .unwrap();
    assert!(!after.iter().any(|s| s.start == t(19, 0)));
    assert!(!after.iter().any(|s| s.start == t(20, 0)), "buffer still held");
    assert!(after.iter().any(|s| s.start == t(20, 45)), "buffer lapsed");
}

#[tokio::test]
async fn cancellation_promotes_the_waitlist_in_join_order() {
    let rig = setup(&[("T1", 4, None)]).await;
    let date = test_date();

    // pack the single table for the whole evening
    let mut reservations = Vec::new();
    for (h, m) in [(17, 0), (18, 45), (20, 30)] {
        reservations.push(
            rig.engine
                .assign_table(&rig.tenant, &rig.restaurant_id, assign_at(date, t(h, m), 2))
                .await
                .unwrap(),
        );
    }
    let full = rig
        .engine
        .compute_availability(&rig.tenant, &rig.restaurant_id, date, 2, None)
        .await
        .unwrap();
    assert!(full.is_empty(), "the evening is packed");

    // two parties queue up
    let join = |party| JoinWaitlistRequest {
        date,
        party_size: party,
        window_start: t(18, 0),
        window_end: t(21, 0),
        contact: CustomerContact::default(),
    };
    let first = rig
        .engine
        .join_waitlist(&rig.tenant, &rig.restaurant_id, join(2))
        .await
        .unwrap();
    let second = rig
        .engine
        .join_waitlist(&rig.tenant, &rig.restaurant_id, join(2))
        .await
        .unwrap();

    // cancelling the 18:45 seating frees capacity inside both windows:
    // the earlier join is notified, the later one keeps waiting
    rig.engine
        .cancel_reservation(&rig.tenant, &reservations[1].reservation_id)
        .await
        .unwrap();

    let queue = rig
        .engine
        .waitlist_for_day(&rig.tenant, &rig.restaurant_id, date)
        .await
        .unwrap();
    let status_of = |id: &str| queue.iter().find(|e| e.entry_id == id).unwrap().status;
    assert_eq!(status_of(&first.entry_id), WaitlistStatus::Notified);
    assert_eq!(status_of(&second.entry_id), WaitlistStatus::Waiting);

    // accepting converts into a confirmed reservation on the freed table
    let reservation = rig
        .engine
        .convert_waitlist_entry(&rig.tenant, &first.entry_id)
        .await
        .unwrap();
    assert_eq!(reservation.status, ReservationStatus::Confirmed);
    assert!(reservation.start >= t(18, 0) && reservation.start <= t(21, 0));

    let queue = rig
        .engine
        .waitlist_for_day(&rig.tenant, &rig.restaurant_id, date)
        .await
        .unwrap();
    assert_eq!(
        queue.iter().find(|e| e.entry_id == first.entry_id).unwrap().status,
        WaitlistStatus::Converted
    );
}

#[tokio::test]
async fn losing_the_conversion_race_preserves_queue_position() {
    let rig = setup(&[("T1", 4, None)]).await;
    let date = test_date();

    let mut reservations = Vec::new();
    for (h, m) in [(17, 0), (18, 45), (20, 30)] {
        reservations.push(
            rig.engine
                .assign_table(&rig.tenant, &rig.restaurant_id, assign_at(date, t(h, m), 2))
                .await
                .unwrap(),
        );
    }

    let entry = rig
        .engine
        .join_waitlist(
            &rig.tenant,
            &rig.restaurant_id,
            JoinWaitlistRequest {
                date,
                party_size: 2,
                window_start: t(18, 0),
                window_end: t(21, 0),
                contact: CustomerContact::default(),
            },
        )
        .await
        .unwrap();

    // freeing 18:45 notifies the entry
    rig.engine
        .cancel_reservation(&rig.tenant, &reservations[1].reservation_id)
        .await
        .unwrap();

    // ...but a walk-in books the freed slot directly first
    rig.engine
        .assign_table(&rig.tenant, &rig.restaurant_id, assign_at(date, t(18, 45), 2))
        .await
        .unwrap();

    let err = rig
        .engine
        .convert_waitlist_entry(&rig.tenant, &entry.entry_id)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NoCapacity | BookingError::Conflict));

    // back to waiting, not penalized: rank and join_seq unchanged
    let queue = rig
        .engine
        .waitlist_for_day(&rig.tenant, &rig.restaurant_id, date)
        .await
        .unwrap();
    let after = queue.iter().find(|e| e.entry_id == entry.entry_id).unwrap();
    assert_eq!(after.status, WaitlistStatus::Waiting);
    assert_eq!(after.rank, entry.rank);
    assert_eq!(after.join_seq, entry.join_seq);
    assert!(after.notified_at.is_none());
}

#[tokio::test]
async fn party_of_six_books_the_declared_combination_only() {
    let rig = setup(&[
        ("G1", 4, Some("window")),
        ("G2", 4, Some("window")),
        ("A", 4, None),
        ("B", 4, None),
    ])
    .await;
    let date = test_date();

    let slots = rig
        .engine
        .compute_availability(&rig.tenant, &rig.restaurant_id, date, 6, None)
        .await
        .unwrap();
    // exactly one qualifying claim per slot: the combined group
    assert!(!slots.is_empty());
    assert!(slots.iter().all(|s| s.remaining_tables == 1));

    let reservation = rig
        .engine
        .assign_table(&rig.tenant, &rig.restaurant_id, assign_at(date, t(19, 0), 6))
        .await
        .unwrap();
    let assignment = reservation.assignment.unwrap();
    assert!(assignment.is_combined());
    assert_eq!(assignment.table_ids().len(), 2);

    // the unrelated four-tops remain bookable for small parties
    rig.engine
        .assign_table(&rig.tenant, &rig.restaurant_id, assign_at(date, t(19, 0), 4))
        .await
        .unwrap();
}

#[tokio::test]
async fn foreign_tenants_see_nothing() {
    let rig = setup(&[("T1", 4, None)]).await;
    let date = test_date();

    let reservation = rig
        .engine
        .assign_table(&rig.tenant, &rig.restaurant_id, assign_at(date, t(19, 0), 2))
        .await
        .unwrap();

    let intruder = Tenant::new("org:other");
    let err = rig
        .engine
        .compute_availability(&intruder, &rig.restaurant_id, date, 2, None)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NotFound(_)));

    let err = rig
        .engine
        .get_reservation(&intruder, &reservation.reservation_id)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NotFound(_)));

    let err = rig
        .engine
        .cancel_reservation(&intruder, &reservation.reservation_id)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NotFound(_)));
}

#[tokio::test]
async fn deactivated_tables_stop_qualifying() {
    let rig = setup(&[("T1", 4, None), ("T2", 4, None)]).await;
    let date = test_date();

    let all = rig
        .tables
        .find_all_for_restaurant(&rig.restaurant_id)
        .await
        .unwrap();
    let t2 = all.iter().find(|t| t.name == "T2").unwrap();
    rig.tables
        .deactivate(&t2.id.as_ref().unwrap().to_string())
        .await
        .unwrap();
    rig.engine.invalidate_restaurant_cache(&rig.restaurant_id);

    let slots = rig
        .engine
        .compute_availability(&rig.tenant, &rig.restaurant_id, date, 2, None)
        .await
        .unwrap();
    assert!(slots.iter().all(|s| s.remaining_tables == 1));

    // with the last table inactive too, availability is empty, not an error
    let t1 = all.iter().find(|t| t.name == "T1").unwrap();
    rig.tables
        .deactivate(&t1.id.as_ref().unwrap().to_string())
        .await
        .unwrap();
    rig.engine.invalidate_restaurant_cache(&rig.restaurant_id);

    let slots = rig
        .engine
        .compute_availability(&rig.tenant, &rig.restaurant_id, date, 2, None)
        .await
        .unwrap();
    assert!(slots.is_empty());
}
