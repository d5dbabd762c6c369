//! redb-based storage for the reservation ledger and waitlist
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `reservations` | `reservation_id` | `Reservation` | Primary records |
//! | `reservation_day_index` | `(restaurant\|date, id)` | `()` | Per-day lookup |
//! | `waitlist` | `entry_id` | `WaitlistEntry` | Primary records |
//! | `waitlist_day_index` | `(restaurant\|date, id)` | `()` | Per-day lookup |
//! | `counters` | name | `u64` | Join sequence, confirmation counter |
//!
//! # Durability
//!
//! redb commits are durable as soon as `commit()` returns (copy-on-write
//! with atomic pointer swap), so a confirmed reservation survives power
//! loss. Write transactions are single-writer: the overlap check and the
//! claim insert execute as one serialized atomic unit.
//!
//! A reservation's restaurant and date never change (status is the only
//! mutation), so day-index rows are written once and never moved.

use chrono::NaiveDate;
use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use shared::booking::{BookingError, Reservation, WaitlistEntry};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Primary reservation records: key = reservation_id, value = JSON
const RESERVATIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("reservations");

/// Day index: key = ("restaurant_id|YYYY-MM-DD", reservation_id)
const RESERVATION_DAY_INDEX: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("reservation_day_index");

/// Primary waitlist records: key = entry_id, value = JSON
const WAITLIST_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("waitlist");

/// Day index: key = ("restaurant_id|YYYY-MM-DD", entry_id)
const WAITLIST_DAY_INDEX: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("waitlist_day_index");

/// Monotonic counters: waitlist join sequence, confirmation number
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

const WAITLIST_SEQ_KEY: &str = "waitlist_seq";
const RESERVATION_COUNT_KEY: &str = "reservation_count";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for BookingError {
    fn from(err: StorageError) -> Self {
        BookingError::Storage(err.to_string())
    }
}

/// Composite day key. Record ids ("restaurant:uuid") never contain `|`,
/// so the separator is unambiguous.
fn day_key(restaurant_id: &str, date: NaiveDate) -> String {
    format!("{}|{}", restaurant_id, date.format("%Y-%m-%d"))
}

/// Ledger storage backed by redb
#[derive(Clone)]
pub struct LedgerStorage {
    db: Arc<Database>,
}

impl LedgerStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(RESERVATIONS_TABLE)?;
            let _ = write_txn.open_table(RESERVATION_DAY_INDEX)?;
            let _ = write_txn.open_table(WAITLIST_TABLE)?;
            let _ = write_txn.open_table(WAITLIST_DAY_INDEX)?;
            let _ = write_txn.open_table(COUNTERS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction (blocks until it is the sole writer)
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Reservation Operations ==========

    /// Insert or update a reservation and its day-index row
    pub fn put_reservation(
        &self,
        txn: &WriteTransaction,
        reservation: &Reservation,
    ) -> StorageResult<()> {
        let value = serde_json::to_vec(reservation)?;
        {
            let mut table = txn.open_table(RESERVATIONS_TABLE)?;
            table.insert(reservation.reservation_id.as_str(), value.as_slice())?;
        }
        {
            let mut index = txn.open_table(RESERVATION_DAY_INDEX)?;
            let key = day_key(&reservation.restaurant_id, reservation.date);
            index.insert(
                (key.as_str(), reservation.reservation_id.as_str()),
                (),
            )?;
        }
        Ok(())
    }

    /// Get a reservation by id
    pub fn get_reservation(&self, reservation_id: &str) -> StorageResult<Option<Reservation>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESERVATIONS_TABLE)?;
        match table.get(reservation_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Get a reservation by id within a write transaction
    pub fn get_reservation_txn(
        &self,
        txn: &WriteTransaction,
        reservation_id: &str,
    ) -> StorageResult<Option<Reservation>> {
        let table = txn.open_table(RESERVATIONS_TABLE)?;
        match table.get(reservation_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All reservations of a restaurant on a date (snapshot read)
    pub fn reservations_for_day(
        &self,
        restaurant_id: &str,
        date: NaiveDate,
    ) -> StorageResult<Vec<Reservation>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(RESERVATION_DAY_INDEX)?;
        let primary = read_txn.open_table(RESERVATIONS_TABLE)?;
        collect_day(&index, &primary, &day_key(restaurant_id, date))
    }

    /// All reservations of a restaurant on a date, inside a write
    /// transaction, the view the overlap check must run against.
    pub fn reservations_for_day_txn(
        &self,
        txn: &WriteTransaction,
        restaurant_id: &str,
        date: NaiveDate,
    ) -> StorageResult<Vec<Reservation>> {
        let index = txn.open_table(RESERVATION_DAY_INDEX)?;
        let primary = txn.open_table(RESERVATIONS_TABLE)?;
        collect_day(&index, &primary, &day_key(restaurant_id, date))
    }

    /// Increment and return the confirmation-number counter
    pub fn next_reservation_count(&self) -> StorageResult<u64> {
        let txn = self.db.begin_write()?;
        let next = {
            let mut table = txn.open_table(COUNTERS_TABLE)?;
            let current = table
                .get(RESERVATION_COUNT_KEY)?
                .map(|g| g.value())
                .unwrap_or(0);
            let next = current + 1;
            table.insert(RESERVATION_COUNT_KEY, next)?;
            next
        };
        txn.commit()?;
        Ok(next)
    }

    // ========== Waitlist Operations ==========

    /// Insert or update a waitlist entry and its day-index row
    pub fn put_waitlist_entry(
        &self,
        txn: &WriteTransaction,
        entry: &WaitlistEntry,
    ) -> StorageResult<()> {
        let value = serde_json::to_vec(entry)?;
        {
            let mut table = txn.open_table(WAITLIST_TABLE)?;
            table.insert(entry.entry_id.as_str(), value.as_slice())?;
        }
        {
            let mut index = txn.open_table(WAITLIST_DAY_INDEX)?;
            let key = day_key(&entry.restaurant_id, entry.date);
            index.insert((key.as_str(), entry.entry_id.as_str()), ())?;
        }
        Ok(())
    }

    /// Get a waitlist entry by id
    pub fn get_waitlist_entry(&self, entry_id: &str) -> StorageResult<Option<WaitlistEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WAITLIST_TABLE)?;
        match table.get(entry_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Get a waitlist entry by id within a write transaction
    pub fn get_waitlist_entry_txn(
        &self,
        txn: &WriteTransaction,
        entry_id: &str,
    ) -> StorageResult<Option<WaitlistEntry>> {
        let table = txn.open_table(WAITLIST_TABLE)?;
        match table.get(entry_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All waitlist entries of a restaurant on a date
    pub fn waitlist_for_day(
        &self,
        restaurant_id: &str,
        date: NaiveDate,
    ) -> StorageResult<Vec<WaitlistEntry>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(WAITLIST_DAY_INDEX)?;
        let primary = read_txn.open_table(WAITLIST_TABLE)?;

        let key = day_key(restaurant_id, date);
        let mut entries = Vec::new();
        for row in index.range((key.as_str(), "")..)? {
            let (k, _) = row?;
            let (day, entry_id) = k.value();
            if day != key {
                break;
            }
            if let Some(guard) = primary.get(entry_id)? {
                entries.push(serde_json::from_slice(guard.value())?);
            }
        }
        Ok(entries)
    }

    /// Notified entries whose hold has lapsed (full scan; the notified
    /// set is small at any moment)
    pub fn overdue_notified(
        &self,
        now: chrono::DateTime<chrono::Utc>,
    ) -> StorageResult<Vec<WaitlistEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WAITLIST_TABLE)?;

        let mut overdue = Vec::new();
        for row in table.iter()? {
            let (_, guard) = row?;
            let entry: WaitlistEntry = serde_json::from_slice(guard.value())?;
            if entry.status == shared::booking::WaitlistStatus::Notified
                && entry.notify_expires_at.is_some_and(|t| t <= now)
            {
                overdue.push(entry);
            }
        }
        Ok(overdue)
    }

    /// Increment and return the waitlist join sequence (within the
    /// caller's transaction, so the joined entry and its sequence commit
    /// together)
    pub fn next_waitlist_seq(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table
            .get(WAITLIST_SEQ_KEY)?
            .map(|g| g.value())
            .unwrap_or(0);
        let next = current + 1;
        table.insert(WAITLIST_SEQ_KEY, next)?;
        Ok(next)
    }
}

/// Resolve a day-index range against the primary table
fn collect_day<I, P>(index: &I, primary: &P, key: &str) -> StorageResult<Vec<Reservation>>
where
    I: ReadableTable<(&'static str, &'static str), ()>,
    P: ReadableTable<&'static str, &'static [u8]>,
{
    let mut reservations = Vec::new();
    for row in index.range((key, "")..)? {
        let (k, _) = row?;
        let (day, reservation_id) = k.value();
        if day != key {
            break;
        }
        if let Some(guard) = primary.get(reservation_id)? {
            reservations.push(serde_json::from_slice(guard.value())?);
        }
    }
    Ok(reservations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use shared::booking::CustomerContact;

    fn reservation(restaurant: &str, date: NaiveDate, start_h: u32) -> Reservation {
        Reservation::draft(
            restaurant,
            "RSV-TEST",
            date,
            NaiveTime::from_hms_opt(start_h, 0, 0).unwrap(),
            90,
            2,
            CustomerContact::default(),
        )
    }

    #[test]
    fn day_index_scopes_by_restaurant_and_date() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let other_date = NaiveDate::from_ymd_opt(2026, 9, 2).unwrap();

        let txn = storage.begin_write().unwrap();
        storage.put_reservation(&txn, &reservation("restaurant:a", date, 18)).unwrap();
        storage.put_reservation(&txn, &reservation("restaurant:a", date, 20)).unwrap();
        storage.put_reservation(&txn, &reservation("restaurant:a", other_date, 18)).unwrap();
        storage.put_reservation(&txn, &reservation("restaurant:b", date, 18)).unwrap();
        txn.commit().unwrap();

        let day = storage.reservations_for_day("restaurant:a", date).unwrap();
        assert_eq!(day.len(), 2);
        assert!(day.iter().all(|r| r.restaurant_id == "restaurant:a" && r.date == date));

        let other = storage.reservations_for_day("restaurant:b", date).unwrap();
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn put_is_idempotent_per_id() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let mut r = reservation("restaurant:a", date, 18);

        let txn = storage.begin_write().unwrap();
        storage.put_reservation(&txn, &r).unwrap();
        txn.commit().unwrap();

        r.status = shared::booking::ReservationStatus::Confirmed;
        let txn = storage.begin_write().unwrap();
        storage.put_reservation(&txn, &r).unwrap();
        txn.commit().unwrap();

        let day = storage.reservations_for_day("restaurant:a", date).unwrap();
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].status, shared::booking::ReservationStatus::Confirmed);
    }

    #[test]
    fn counters_are_monotonic() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        assert_eq!(storage.next_reservation_count().unwrap(), 1);
        assert_eq!(storage.next_reservation_count().unwrap(), 2);

        let txn = storage.begin_write().unwrap();
        let a = storage.next_waitlist_seq(&txn).unwrap();
        let b = storage.next_waitlist_seq(&txn).unwrap();
        txn.commit().unwrap();
        assert!(b > a);
    }
}
