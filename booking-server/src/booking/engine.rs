//! BookingEngine - the reservation & availability core
//!
//! Orchestrates the leaf components behind the boundary contracts the
//! surrounding application calls:
//!
//! ```text
//! compute_availability(tenant, ...)   read-only, cache-assisted
//! assign_table(tenant, ...)           best-fit select + atomic claim
//! cancel / seat / no-show / complete  ledger status transitions
//! join / remove / convert waitlist    priority queue + state machine
//! ```
//!
//! Every operation takes the tenant scope as an explicit parameter and
//! re-checks restaurant ownership; the engine never reads ambient
//! request state. Mutations invalidate the availability cache for the
//! affected restaurant/date before returning, and capacity-freeing
//! transitions drive the waitlist promotion scan.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tokio::sync::broadcast;

use shared::Tenant;
use shared::booking::{
    AvailabilitySlot, BookingError, BookingResult, CustomerContact, Reservation,
    ReservationStatus, TableSpec, WaitlistEntry, WaitlistStatus,
};

use crate::db::models::Restaurant;
use crate::db::repository::{DiningTableRepository, RestaurantRepository};

use super::assign::TableAssignmentResolver;
use super::availability::{self, SlotQuery};
use super::cache::AvailabilityCache;
use super::ledger::ReservationLedger;
use super::notify::{NotificationDispatcher, WaitlistNotification};
use super::storage::LedgerStorage;
use super::waitlist::WaitlistManager;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// Engine tuning knobs, derived from server config
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub cache_ttl: Duration,
    pub assign_max_attempts: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(15),
            assign_max_attempts: 3,
        }
    }
}

/// Engine lifecycle events, broadcast after the storage commit
#[derive(Debug, Clone)]
pub enum BookingEvent {
    ReservationConfirmed {
        reservation: Reservation,
    },
    ReservationTransitioned {
        reservation: Reservation,
        from: ReservationStatus,
    },
    WaitlistJoined {
        entry: WaitlistEntry,
    },
    WaitlistNotified {
        entry: WaitlistEntry,
    },
    WaitlistConverted {
        entry_id: String,
        reservation: Reservation,
    },
}

/// Booking request for a concrete slot
#[derive(Debug, Clone)]
pub struct AssignRequest {
    pub date: NaiveDate,
    pub start: chrono::NaiveTime,
    pub party_size: u32,
    pub duration_minutes: Option<u32>,
    pub contact: CustomerContact,
}

/// Waitlist join request
#[derive(Debug, Clone)]
pub struct JoinWaitlistRequest {
    pub date: NaiveDate,
    pub party_size: u32,
    pub window_start: chrono::NaiveTime,
    pub window_end: chrono::NaiveTime,
    pub contact: CustomerContact,
}

#[derive(Clone)]
pub struct BookingEngine {
    restaurants: RestaurantRepository,
    tables: DiningTableRepository,
    ledger: ReservationLedger,
    waitlist: WaitlistManager,
    resolver: TableAssignmentResolver,
    cache: Arc<AvailabilityCache>,
    notifier: Arc<dyn NotificationDispatcher>,
    event_tx: broadcast::Sender<BookingEvent>,
}

impl std::fmt::Debug for BookingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingEngine")
            .field("ledger", &"<ReservationLedger>")
            .field("cache", &"<AvailabilityCache>")
            .finish()
    }
}

impl BookingEngine {
    pub fn new(
        db: Surreal<Db>,
        storage: LedgerStorage,
        options: EngineOptions,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        let ledger = ReservationLedger::new(storage.clone());
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            restaurants: RestaurantRepository::new(db.clone()),
            tables: DiningTableRepository::new(db),
            waitlist: WaitlistManager::new(storage),
            resolver: TableAssignmentResolver::new(ledger.clone(), options.assign_max_attempts),
            ledger,
            cache: Arc::new(AvailabilityCache::new(options.cache_ttl)),
            notifier,
            event_tx,
        }
    }

    /// Subscribe to engine events
    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.event_tx.subscribe()
    }

    // ========== Availability ==========

    /// Offerable slots for a date and party size.
    ///
    /// Pure read; populates the availability cache as a side effect
    /// (default-duration queries only; overrides bypass the cache).
    pub async fn compute_availability(
        &self,
        tenant: &Tenant,
        restaurant_id: &str,
        date: NaiveDate,
        party_size: u32,
        duration_override: Option<u32>,
    ) -> BookingResult<Vec<AvailabilitySlot>> {
        let restaurant = self.scoped_restaurant(tenant, restaurant_id).await?;
        validate_party(&restaurant, party_size)?;
        validate_horizon(&restaurant, date)?;
        let duration = restaurant.policy.duration_or_default(duration_override);
        if duration == 0 {
            return Err(BookingError::invalid("duration must be positive"));
        }

        if duration_override.is_none()
            && let Some(slots) = self.cache.get(restaurant_id, date, party_size)
        {
            return Ok(slots);
        }

        let tables = self.bookable_specs(restaurant_id).await?;
        let reservations = self.ledger.reservations_for_day(restaurant_id, date)?;
        let windows = restaurant.calendar().windows_for(date);

        let slots = availability::compute_slots(&SlotQuery {
            date,
            party_size,
            duration_minutes: duration,
            policy: &restaurant.policy,
            windows: &windows,
            tables: &tables,
            reservations: &reservations,
        });

        if duration_override.is_none() {
            self.cache.put(restaurant_id, date, party_size, slots.clone());
        }
        Ok(slots)
    }

    // ========== Assignment ==========

    /// Confirm a booking: validate, best-fit select, atomically claim.
    pub async fn assign_table(
        &self,
        tenant: &Tenant,
        restaurant_id: &str,
        request: AssignRequest,
    ) -> BookingResult<Reservation> {
        let restaurant = self.scoped_restaurant(tenant, restaurant_id).await?;
        validate_party(&restaurant, request.party_size)?;
        validate_horizon(&restaurant, request.date)?;
        let duration = restaurant.policy.duration_or_default(request.duration_minutes);
        if duration == 0 {
            return Err(BookingError::invalid("duration must be positive"));
        }
        if !restaurant
            .calendar()
            .fits_service_window(request.date, request.start)
        {
            return Err(BookingError::invalid(
                "requested time is outside operating hours",
            ));
        }

        let tables = self.bookable_specs(restaurant_id).await?;
        let code = self.ledger.next_confirmation_code(request.date)?;
        let draft = Reservation::draft(
            restaurant_id,
            code,
            request.date,
            request.start,
            duration,
            request.party_size,
            request.contact,
        );

        let reservation = self.resolver.resolve(&restaurant.policy, &tables, draft)?;

        // invalidate before acknowledging, so no reader sees the slot
        self.cache.invalidate_day(restaurant_id, request.date);
        let _ = self.event_tx.send(BookingEvent::ReservationConfirmed {
            reservation: reservation.clone(),
        });
        Ok(reservation)
    }

    // ========== Status transitions ==========

    pub async fn cancel_reservation(
        &self,
        tenant: &Tenant,
        reservation_id: &str,
    ) -> BookingResult<Reservation> {
        self.transition_reservation(tenant, reservation_id, ReservationStatus::Cancelled)
            .await
    }

    pub async fn seat_reservation(
        &self,
        tenant: &Tenant,
        reservation_id: &str,
    ) -> BookingResult<Reservation> {
        self.transition_reservation(tenant, reservation_id, ReservationStatus::Seated)
            .await
    }

    pub async fn mark_no_show(
        &self,
        tenant: &Tenant,
        reservation_id: &str,
    ) -> BookingResult<Reservation> {
        self.transition_reservation(tenant, reservation_id, ReservationStatus::NoShow)
            .await
    }

    pub async fn complete_reservation(
        &self,
        tenant: &Tenant,
        reservation_id: &str,
    ) -> BookingResult<Reservation> {
        self.transition_reservation(tenant, reservation_id, ReservationStatus::Completed)
            .await
    }

    /// Staff un-cancel. Re-activates the table claim, so the ledger
    /// re-checks the overlap invariant and may return `Conflict`.
    pub async fn reinstate_reservation(
        &self,
        tenant: &Tenant,
        reservation_id: &str,
    ) -> BookingResult<Reservation> {
        self.transition_reservation(tenant, reservation_id, ReservationStatus::Confirmed)
            .await
    }

    async fn transition_reservation(
        &self,
        tenant: &Tenant,
        reservation_id: &str,
        to: ReservationStatus,
    ) -> BookingResult<Reservation> {
        let existing = self
            .ledger
            .get(reservation_id)?
            .ok_or_else(|| BookingError::not_found(format!("Reservation {}", reservation_id)))?;
        let restaurant = self
            .scoped_restaurant(tenant, &existing.restaurant_id)
            .await
            .map_err(|_| BookingError::not_found(format!("Reservation {}", reservation_id)))?;

        let from = existing.status;
        if !from.can_transition_to(to) {
            return Err(BookingError::transition(from, to));
        }

        let updated = self.ledger.transition(
            reservation_id,
            from,
            to,
            restaurant.policy.buffer_minutes,
            restaurant.policy.buffer_mode,
        )?;

        // any change to what holds a table invalidates derived views
        if from.holds_table() != to.holds_table() {
            self.cache.invalidate_day(&updated.restaurant_id, updated.date);
        }
        let _ = self.event_tx.send(BookingEvent::ReservationTransitioned {
            reservation: updated.clone(),
            from,
        });

        // freed capacity drives the waitlist
        if from.holds_table() && !to.holds_table() {
            if let Err(e) = self
                .promote_waitlist(tenant, &restaurant, updated.date)
                .await
            {
                tracing::warn!(
                    restaurant_id = %updated.restaurant_id,
                    date = %updated.date,
                    error = %e,
                    "Waitlist promotion after freed capacity failed"
                );
            }
        }

        Ok(updated)
    }

    // ========== Queries ==========

    pub async fn get_reservation(
        &self,
        tenant: &Tenant,
        reservation_id: &str,
    ) -> BookingResult<Reservation> {
        let reservation = self
            .ledger
            .get(reservation_id)?
            .ok_or_else(|| BookingError::not_found(format!("Reservation {}", reservation_id)))?;
        // scope check; a foreign tenant sees NotFound, never the record
        self.scoped_restaurant(tenant, &reservation.restaurant_id)
            .await
            .map_err(|_| BookingError::not_found(format!("Reservation {}", reservation_id)))?;
        Ok(reservation)
    }

    pub async fn reservations_for_day(
        &self,
        tenant: &Tenant,
        restaurant_id: &str,
        date: NaiveDate,
    ) -> BookingResult<Vec<Reservation>> {
        self.scoped_restaurant(tenant, restaurant_id).await?;
        self.ledger.reservations_for_day(restaurant_id, date)
    }

    // ========== Waitlist ==========

    pub async fn join_waitlist(
        &self,
        tenant: &Tenant,
        restaurant_id: &str,
        request: JoinWaitlistRequest,
    ) -> BookingResult<WaitlistEntry> {
        let restaurant = self.scoped_restaurant(tenant, restaurant_id).await?;
        validate_party(&restaurant, request.party_size)?;
        validate_horizon(&restaurant, request.date)?;
        if request.window_start > request.window_end {
            return Err(BookingError::invalid("arrival window is inverted"));
        }

        let entry = self.waitlist.join(
            restaurant_id,
            request.date,
            request.party_size,
            request.window_start,
            request.window_end,
            request.contact,
        )?;
        let _ = self
            .event_tx
            .send(BookingEvent::WaitlistJoined { entry: entry.clone() });
        Ok(entry)
    }

    pub async fn remove_from_waitlist(
        &self,
        tenant: &Tenant,
        entry_id: &str,
    ) -> BookingResult<WaitlistEntry> {
        self.scoped_entry(tenant, entry_id).await?;
        self.waitlist.remove(entry_id)
    }

    /// Staff priority override (VIP handling)
    pub async fn set_waitlist_rank(
        &self,
        tenant: &Tenant,
        entry_id: &str,
        rank: u64,
    ) -> BookingResult<WaitlistEntry> {
        self.scoped_entry(tenant, entry_id).await?;
        self.waitlist.set_rank(entry_id, rank)
    }

    pub async fn waitlist_for_day(
        &self,
        tenant: &Tenant,
        restaurant_id: &str,
        date: NaiveDate,
    ) -> BookingResult<Vec<WaitlistEntry>> {
        self.scoped_restaurant(tenant, restaurant_id).await?;
        self.waitlist.entries_for_day(restaurant_id, date)
    }

    /// Convert a waitlist entry into a confirmed reservation.
    ///
    /// On `NoCapacity`/`Conflict` (another party took the slot first) a
    /// notified entry reverts to `waiting` with its original rank; it is
    /// not penalized for losing the race.
    pub async fn convert_waitlist_entry(
        &self,
        tenant: &Tenant,
        entry_id: &str,
    ) -> BookingResult<Reservation> {
        let entry = self.scoped_entry(tenant, entry_id).await?;
        if !matches!(entry.status, WaitlistStatus::Waiting | WaitlistStatus::Notified) {
            return Err(BookingError::InvalidTransition(format!(
                "waitlist entry is {:?}",
                entry.status
            )));
        }

        let slots = self
            .compute_availability(tenant, &entry.restaurant_id, entry.date, entry.party_size, None)
            .await?;
        let Some(slot) = slots.iter().find(|s| entry.accepts_start(s.start)) else {
            self.revert_after_lost_race(&entry)?;
            return Err(BookingError::NoCapacity);
        };

        let request = AssignRequest {
            date: entry.date,
            start: slot.start,
            party_size: entry.party_size,
            duration_minutes: None,
            contact: entry.contact.clone(),
        };
        match self.assign_table(tenant, &entry.restaurant_id, request).await {
            Ok(reservation) => {
                self.waitlist.mark_converted(entry_id)?;
                let _ = self.event_tx.send(BookingEvent::WaitlistConverted {
                    entry_id: entry_id.to_string(),
                    reservation: reservation.clone(),
                });
                tracing::info!(
                    entry_id = %entry_id,
                    reservation_id = %reservation.reservation_id,
                    "Waitlist entry converted"
                );
                Ok(reservation)
            }
            Err(e @ (BookingError::NoCapacity | BookingError::Conflict)) => {
                self.revert_after_lost_race(&entry)?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    fn revert_after_lost_race(&self, entry: &WaitlistEntry) -> BookingResult<()> {
        if entry.status == WaitlistStatus::Notified {
            self.waitlist.revert_to_waiting(&entry.entry_id)?;
            tracing::debug!(
                entry_id = %entry.entry_id,
                rank = entry.rank,
                "Conversion lost the race, entry back to waiting with original rank"
            );
        }
        Ok(())
    }

    /// Promotion scan: offer freed capacity to the highest-priority
    /// waiting party whose size and window fit. Entries for past dates
    /// expire in passing instead of erroring.
    pub async fn promote_waitlist(
        &self,
        tenant: &Tenant,
        restaurant: &Restaurant,
        date: NaiveDate,
    ) -> BookingResult<Option<WaitlistEntry>> {
        let restaurant_id = restaurant.id_string();
        let entries = self.waitlist.entries_for_day(&restaurant_id, date)?;
        let waiting: Vec<_> = entries
            .into_iter()
            .filter(|e| e.status == WaitlistStatus::Waiting)
            .collect();
        if waiting.is_empty() {
            return Ok(None);
        }

        if date < restaurant.local_today() {
            // passive cleanup of a stale queue
            for entry in &waiting {
                self.waitlist.mark_expired(&entry.entry_id)?;
            }
            return Ok(None);
        }

        for entry in waiting {
            let slots = self
                .compute_availability(tenant, &restaurant_id, date, entry.party_size, None)
                .await?;
            if slots.iter().any(|s| entry.accepts_start(s.start)) {
                let notified = self.waitlist.mark_notified(
                    &entry.entry_id,
                    Utc::now(),
                    restaurant.policy.waitlist_hold_minutes,
                )?;
                self.notifier
                    .dispatch(WaitlistNotification::for_entry(&notified));
                let _ = self
                    .event_tx
                    .send(BookingEvent::WaitlistNotified { entry: notified.clone() });
                return Ok(Some(notified));
            }
        }
        Ok(None)
    }

    /// Inventory/calendar changed: drop derived views and re-scan the
    /// waitlist for newly fitting parties.
    pub async fn notify_capacity_freed(
        &self,
        tenant: &Tenant,
        restaurant_id: &str,
        date: NaiveDate,
    ) -> BookingResult<Option<WaitlistEntry>> {
        let restaurant = self.scoped_restaurant(tenant, restaurant_id).await?;
        self.cache.invalidate_day(restaurant_id, date);
        self.promote_waitlist(tenant, &restaurant, date).await
    }

    /// Sweep overdue notified entries (periodic background task). Each
    /// expiry frees the held offer, so the affected day is re-scanned.
    pub async fn expire_overdue_notifications(&self) -> BookingResult<usize> {
        let expired = self.waitlist.expire_overdue(Utc::now())?;
        let count = expired.len();
        for entry in expired {
            let restaurant = match self.restaurants.find_by_id(&entry.restaurant_id).await {
                Ok(Some(r)) => r,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(
                        restaurant_id = %entry.restaurant_id,
                        error = %e,
                        "Failed to load restaurant during expiry sweep"
                    );
                    continue;
                }
            };
            let tenant = Tenant::new(restaurant.org.clone());
            if let Err(e) = self.promote_waitlist(&tenant, &restaurant, entry.date).await {
                tracing::warn!(
                    restaurant_id = %entry.restaurant_id,
                    date = %entry.date,
                    error = %e,
                    "Re-promotion after expiry failed"
                );
            }
        }
        Ok(count)
    }

    /// Drop all derived availability for a restaurant. Called after
    /// inventory or calendar mutations.
    pub fn invalidate_restaurant_cache(&self, restaurant_id: &str) {
        self.cache.invalidate_restaurant(restaurant_id);
    }

    /// Load a restaurant within the tenant scope (handler-facing)
    pub async fn get_restaurant(
        &self,
        tenant: &Tenant,
        restaurant_id: &str,
    ) -> BookingResult<Restaurant> {
        self.scoped_restaurant(tenant, restaurant_id).await
    }

    // ========== Internal helpers ==========

    /// Load a restaurant and verify tenant ownership. Foreign tenants
    /// get `NotFound`, never confirmation that the id exists.
    async fn scoped_restaurant(
        &self,
        tenant: &Tenant,
        restaurant_id: &str,
    ) -> BookingResult<Restaurant> {
        let restaurant = self
            .restaurants
            .find_by_id(restaurant_id)
            .await?
            .ok_or_else(|| BookingError::not_found(format!("Restaurant {}", restaurant_id)))?;
        if !tenant.owns(&restaurant.org) {
            return Err(BookingError::not_found(format!(
                "Restaurant {}",
                restaurant_id
            )));
        }
        Ok(restaurant)
    }

    async fn scoped_entry(&self, tenant: &Tenant, entry_id: &str) -> BookingResult<WaitlistEntry> {
        let entry = self.waitlist.get(entry_id)?;
        self.scoped_restaurant(tenant, &entry.restaurant_id)
            .await
            .map_err(|_| BookingError::not_found(format!("Waitlist entry {}", entry_id)))?;
        Ok(entry)
    }

    async fn bookable_specs(&self, restaurant_id: &str) -> BookingResult<Vec<TableSpec>> {
        let tables = self.tables.find_bookable(restaurant_id).await?;
        Ok(tables.iter().filter_map(|t| t.to_spec()).collect())
    }
}

fn validate_party(restaurant: &Restaurant, party_size: u32) -> BookingResult<()> {
    if party_size == 0 {
        return Err(BookingError::invalid("party_size must be at least 1"));
    }
    if party_size > restaurant.policy.max_party_size {
        return Err(BookingError::invalid(format!(
            "party_size {} exceeds the maximum of {}",
            party_size, restaurant.policy.max_party_size
        )));
    }
    Ok(())
}

fn validate_horizon(restaurant: &Restaurant, date: NaiveDate) -> BookingResult<()> {
    let today = restaurant.local_today();
    if date < today {
        return Err(BookingError::invalid("date is in the past"));
    }
    let horizon = today + chrono::Days::new(restaurant.policy.max_advance_days as u64);
    if date > horizon {
        return Err(BookingError::invalid(format!(
            "date is beyond the {}-day booking horizon",
            restaurant.policy.max_advance_days
        )));
    }
    Ok(())
}
