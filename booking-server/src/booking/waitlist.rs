//! Waitlist state machine
//!
//! Per-restaurant, per-date queue of waiting parties. Priority is the
//! (rank, join_seq) pair: rank seeds from the monotonic join sequence and
//! may be lowered by staff for VIP handling; join_seq never changes, so a
//! party that loses a conversion race keeps its place exactly.
//!
//! `waiting -> notified -> {converted | expired}`, `-> removed` anywhere
//! before converted. All transitions are compare-and-set inside one write
//! transaction.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use shared::booking::{
    BookingError, BookingResult, CustomerContact, WaitlistEntry, WaitlistStatus,
};

use super::storage::LedgerStorage;

#[derive(Clone)]
pub struct WaitlistManager {
    storage: LedgerStorage,
}

impl WaitlistManager {
    pub fn new(storage: LedgerStorage) -> Self {
        Self { storage }
    }

    /// Enqueue a party. Priority rank = join sequence (earlier joins
    /// rank higher).
    pub fn join(
        &self,
        restaurant_id: &str,
        date: NaiveDate,
        party_size: u32,
        window_start: NaiveTime,
        window_end: NaiveTime,
        contact: CustomerContact,
    ) -> BookingResult<WaitlistEntry> {
        let txn = self.storage.begin_write()?;
        let join_seq = self.storage.next_waitlist_seq(&txn)?;
        let entry = WaitlistEntry::new(
            restaurant_id,
            date,
            party_size,
            window_start,
            window_end,
            join_seq,
            contact,
        );
        self.storage.put_waitlist_entry(&txn, &entry)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        tracing::info!(
            entry_id = %entry.entry_id,
            restaurant_id = %restaurant_id,
            date = %date,
            party_size,
            join_seq,
            "Party joined the waitlist"
        );
        Ok(entry)
    }

    pub fn get(&self, entry_id: &str) -> BookingResult<WaitlistEntry> {
        self.storage
            .get_waitlist_entry(entry_id)?
            .ok_or_else(|| BookingError::not_found(format!("Waitlist entry {}", entry_id)))
    }

    /// Entries of a day in promotion order
    pub fn entries_for_day(
        &self,
        restaurant_id: &str,
        date: NaiveDate,
    ) -> BookingResult<Vec<WaitlistEntry>> {
        let mut entries = self.storage.waitlist_for_day(restaurant_id, date)?;
        entries.sort_by_key(|e| e.priority_key());
        Ok(entries)
    }

    /// Staff priority override. join_seq is untouched, so ties among
    /// equal ranks still resolve by join order.
    pub fn set_rank(&self, entry_id: &str, rank: u64) -> BookingResult<WaitlistEntry> {
        self.update_entry(
            entry_id,
            &[WaitlistStatus::Waiting, WaitlistStatus::Notified],
            |entry| entry.rank = rank,
        )
    }

    /// Customer/staff removal, valid any time before conversion
    pub fn remove(&self, entry_id: &str) -> BookingResult<WaitlistEntry> {
        self.update_entry(
            entry_id,
            &[WaitlistStatus::Waiting, WaitlistStatus::Notified],
            |entry| entry.status = WaitlistStatus::Removed,
        )
    }

    /// `waiting -> notified`, recording the hold deadline
    pub fn mark_notified(
        &self,
        entry_id: &str,
        now: DateTime<Utc>,
        hold_minutes: u32,
    ) -> BookingResult<WaitlistEntry> {
        self.update_entry(entry_id, &[WaitlistStatus::Waiting], |entry| {
            entry.status = WaitlistStatus::Notified;
            entry.notified_at = Some(now);
            entry.notify_expires_at = Some(now + Duration::minutes(hold_minutes as i64));
        })
    }

    /// `notified -> waiting` after a lost conversion race. Rank and
    /// join_seq are preserved: the party is not pushed to the back.
    pub fn revert_to_waiting(&self, entry_id: &str) -> BookingResult<WaitlistEntry> {
        self.update_entry(entry_id, &[WaitlistStatus::Notified], |entry| {
            entry.status = WaitlistStatus::Waiting;
            entry.notified_at = None;
            entry.notify_expires_at = None;
        })
    }

    /// `waiting | notified -> converted`
    pub fn mark_converted(&self, entry_id: &str) -> BookingResult<WaitlistEntry> {
        self.update_entry(
            entry_id,
            &[WaitlistStatus::Waiting, WaitlistStatus::Notified],
            |entry| entry.status = WaitlistStatus::Converted,
        )
    }

    /// Passive cleanup: a stale entry expires instead of erroring
    pub fn mark_expired(&self, entry_id: &str) -> BookingResult<WaitlistEntry> {
        self.update_entry(
            entry_id,
            &[WaitlistStatus::Waiting, WaitlistStatus::Notified],
            |entry| {
                entry.status = WaitlistStatus::Expired;
            },
        )
    }

    /// Expire every notified entry whose hold deadline has lapsed.
    /// Returns the expired entries so the caller can re-promote.
    pub fn expire_overdue(&self, now: DateTime<Utc>) -> BookingResult<Vec<WaitlistEntry>> {
        let overdue = self.storage.overdue_notified(now)?;
        let mut expired = Vec::with_capacity(overdue.len());
        for entry in overdue {
            // a concurrent convert/remove may have won, skip quietly
            match self.mark_expired(&entry.entry_id) {
                Ok(e) => {
                    tracing::info!(
                        entry_id = %e.entry_id,
                        restaurant_id = %e.restaurant_id,
                        "Waitlist notification expired without response"
                    );
                    expired.push(e);
                }
                Err(BookingError::InvalidTransition(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(expired)
    }

    /// Compare-and-set update: the persisted status must be in `expect`
    fn update_entry(
        &self,
        entry_id: &str,
        expect: &[WaitlistStatus],
        apply: impl FnOnce(&mut WaitlistEntry),
    ) -> BookingResult<WaitlistEntry> {
        let txn = self.storage.begin_write()?;
        let mut entry = self
            .storage
            .get_waitlist_entry_txn(&txn, entry_id)?
            .ok_or_else(|| BookingError::not_found(format!("Waitlist entry {}", entry_id)))?;

        if !expect.contains(&entry.status) {
            return Err(BookingError::InvalidTransition(format!(
                "waitlist entry is {:?}",
                entry.status
            )));
        }

        apply(&mut entry);
        entry.updated_at = Utc::now();
        self.storage.put_waitlist_entry(&txn, &entry)?;
        txn.commit().map_err(super::storage::StorageError::from)?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> WaitlistManager {
        WaitlistManager::new(LedgerStorage::open_in_memory().unwrap())
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()
    }

    fn join(m: &WaitlistManager, party: u32) -> WaitlistEntry {
        m.join("restaurant:r1", date(), party, t(18, 0), t(21, 0), Default::default())
            .unwrap()
    }

    #[test]
    fn join_order_defines_priority() {
        let m = manager();
        let a = join(&m, 2);
        let b = join(&m, 4);
        let c = join(&m, 2);

        let entries = m.entries_for_day("restaurant:r1", date()).unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.entry_id.as_str()).collect();
        assert_eq!(ids, vec![a.entry_id.as_str(), b.entry_id.as_str(), c.entry_id.as_str()]);
    }

    #[test]
    fn staff_rank_override_jumps_the_queue() {
        let m = manager();
        let _a = join(&m, 2);
        let b = join(&m, 2);

        m.set_rank(&b.entry_id, 0).unwrap();
        let entries = m.entries_for_day("restaurant:r1", date()).unwrap();
        assert_eq!(entries[0].entry_id, b.entry_id);
    }

    #[test]
    fn lost_race_keeps_the_original_rank() {
        let m = manager();
        let a = join(&m, 2);
        let _b = join(&m, 2);

        let now = Utc::now();
        m.mark_notified(&a.entry_id, now, 15).unwrap();
        let reverted = m.revert_to_waiting(&a.entry_id).unwrap();

        assert_eq!(reverted.status, WaitlistStatus::Waiting);
        assert_eq!(reverted.rank, a.rank);
        assert_eq!(reverted.join_seq, a.join_seq);
        assert!(reverted.notified_at.is_none());

        // still first in line
        let entries = m.entries_for_day("restaurant:r1", date()).unwrap();
        assert_eq!(entries[0].entry_id, a.entry_id);
    }

    #[test]
    fn notify_requires_waiting_status() {
        let m = manager();
        let a = join(&m, 2);
        m.remove(&a.entry_id).unwrap();

        let err = m.mark_notified(&a.entry_id, Utc::now(), 15).unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition(_)));
    }

    #[test]
    fn overdue_notifications_expire() {
        let m = manager();
        let a = join(&m, 2);
        let b = join(&m, 2);

        let notified_at = Utc::now() - Duration::minutes(30);
        m.mark_notified(&a.entry_id, notified_at, 15).unwrap();

        let expired = m.expire_overdue(Utc::now()).unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].entry_id, a.entry_id);
        assert_eq!(m.get(&a.entry_id).unwrap().status, WaitlistStatus::Expired);
        // the waiting entry is untouched
        assert_eq!(m.get(&b.entry_id).unwrap().status, WaitlistStatus::Waiting);
    }

    #[test]
    fn terminal_entries_reject_further_transitions() {
        let m = manager();
        let a = join(&m, 2);
        m.mark_converted(&a.entry_id).unwrap();

        let err = m.remove(&a.entry_id).unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition(_)));
        let err = m.set_rank(&a.entry_id, 0).unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition(_)));
    }
}
