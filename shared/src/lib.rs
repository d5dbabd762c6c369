//! Shared types for the Coral booking engine
//!
//! Domain vocabulary used across crates: reservations, waitlist entries,
//! availability slots, operating hours and the booking error taxonomy.

pub mod booking;
pub mod types;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use booking::{BookingError, BookingResult};
pub use types::Tenant;
