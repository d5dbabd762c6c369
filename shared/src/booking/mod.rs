//! Booking domain types
//!
//! Shared vocabulary of the reservation & availability engine:
//! reservations, waitlist entries, availability slots, operating hours,
//! booking policy and the error taxonomy.

pub mod error;
pub mod hours;
pub mod policy;
pub mod reservation;
pub mod slot;
pub mod table;
pub mod waitlist;

// Re-exports
pub use error::{BookingError, BookingResult};
pub use hours::{SpecialDay, TimeRange, WeeklyHours};
pub use policy::{BookingPolicy, BufferMode};
pub use reservation::{
    CustomerContact, OccupancyWindow, Reservation, ReservationStatus, TableAssignment,
};
pub use slot::AvailabilitySlot;
pub use table::{TableSpec, TableStatus};
pub use waitlist::{WaitlistEntry, WaitlistStatus};
