//! Waitlist notification handoff
//!
//! The engine decides *that* a notification is due and *who* it is for;
//! delivery (SMS/email, retries) belongs to an external collaborator
//! behind [`NotificationDispatcher`]. Dispatch is fire-and-forget: the
//! `notified` transition completes regardless of delivery.

use chrono::{DateTime, NaiveDate, Utc};
use shared::booking::{CustomerContact, WaitlistEntry};

/// A due notification for a promoted waitlist party
#[derive(Debug, Clone)]
pub struct WaitlistNotification {
    pub entry_id: String,
    pub restaurant_id: String,
    pub date: NaiveDate,
    pub party_size: u32,
    pub contact: CustomerContact,
    /// When the offered hold lapses
    pub expires_at: DateTime<Utc>,
}

impl WaitlistNotification {
    pub fn for_entry(entry: &WaitlistEntry) -> Self {
        Self {
            entry_id: entry.entry_id.clone(),
            restaurant_id: entry.restaurant_id.clone(),
            date: entry.date,
            party_size: entry.party_size,
            contact: entry.contact.clone(),
            // mark_notified 先于 dispatch，deadline 必然已写入
            expires_at: entry.notify_expires_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Delivery collaborator seam
pub trait NotificationDispatcher: Send + Sync {
    /// Hand off a due notification. Must not block on delivery.
    fn dispatch(&self, notification: WaitlistNotification);
}

/// Default dispatcher: records the due notification for the delivery
/// pipeline to pick up from the log stream.
pub struct LogDispatcher;

impl NotificationDispatcher for LogDispatcher {
    fn dispatch(&self, notification: WaitlistNotification) {
        tracing::info!(
            target: "notifications",
            entry_id = %notification.entry_id,
            restaurant_id = %notification.restaurant_id,
            date = %notification.date,
            party_size = notification.party_size,
            expires_at = %notification.expires_at,
            "Waitlist notification due"
        );
    }
}
