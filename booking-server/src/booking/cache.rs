//! Availability cache
//!
//! Short-TTL derived view of slot computations, keyed by
//! (restaurant, date, party size). Writers must invalidate (never update)
//! the affected restaurant/date group before acknowledging a mutation, so
//! readers never see a stale "available" past a successful claim.

use chrono::NaiveDate;
use dashmap::DashMap;
use shared::booking::AvailabilitySlot;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    restaurant_id: String,
    date: NaiveDate,
    party_size: u32,
}

struct CachedSlots {
    stored_at: Instant,
    slots: Vec<AvailabilitySlot>,
}

pub struct AvailabilityCache {
    entries: DashMap<CacheKey, CachedSlots>,
    ttl: Duration,
}

impl AvailabilityCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(
        &self,
        restaurant_id: &str,
        date: NaiveDate,
        party_size: u32,
    ) -> Option<Vec<AvailabilitySlot>> {
        let key = CacheKey {
            restaurant_id: restaurant_id.to_string(),
            date,
            party_size,
        };
        let entry = self.entries.get(&key)?;
        if entry.stored_at.elapsed() >= self.ttl {
            drop(entry);
            self.entries.remove(&key);
            return None;
        }
        Some(entry.slots.clone())
    }

    pub fn put(
        &self,
        restaurant_id: &str,
        date: NaiveDate,
        party_size: u32,
        slots: Vec<AvailabilitySlot>,
    ) {
        self.entries.insert(
            CacheKey {
                restaurant_id: restaurant_id.to_string(),
                date,
                party_size,
            },
            CachedSlots {
                stored_at: Instant::now(),
                slots,
            },
        );
    }

    /// Drop every party-size bucket of a restaurant/date
    pub fn invalidate_day(&self, restaurant_id: &str, date: NaiveDate) {
        self.entries
            .retain(|k, _| !(k.restaurant_id == restaurant_id && k.date == date));
    }

    /// Drop everything cached for a restaurant (inventory or calendar
    /// changed, every date is suspect)
    pub fn invalidate_restaurant(&self, restaurant_id: &str) {
        self.entries.retain(|k, _| k.restaurant_id != restaurant_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()
    }

    fn slot() -> AvailabilitySlot {
        AvailabilitySlot {
            date: date(),
            start: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            duration_minutes: 90,
            remaining_tables: 2,
        }
    }

    #[test]
    fn hit_within_ttl_miss_after_invalidation() {
        let cache = AvailabilityCache::new(Duration::from_secs(60));
        cache.put("restaurant:a", date(), 2, vec![slot()]);
        cache.put("restaurant:a", date(), 4, vec![]);
        cache.put("restaurant:b", date(), 2, vec![slot()]);

        assert_eq!(cache.get("restaurant:a", date(), 2).unwrap().len(), 1);

        // invalidation drops every bucket of that restaurant/date only
        cache.invalidate_day("restaurant:a", date());
        assert!(cache.get("restaurant:a", date(), 2).is_none());
        assert!(cache.get("restaurant:a", date(), 4).is_none());
        assert!(cache.get("restaurant:b", date(), 2).is_some());
    }

    #[test]
    fn zero_ttl_never_serves() {
        let cache = AvailabilityCache::new(Duration::ZERO);
        cache.put("restaurant:a", date(), 2, vec![slot()]);
        assert!(cache.get("restaurant:a", date(), 2).is_none());
        assert!(cache.is_empty());
    }
}
