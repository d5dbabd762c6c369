//! Booking error taxonomy
//!
//! Expected outcomes ("fully booked", "slot just taken") are tagged
//! variants, not exceptions: callers match on them for control flow.

use thiserror::Error;

/// Errors surfaced by the booking engine
///
/// | Variant | Caller reaction |
/// |---------|-----------------|
/// | `InvalidRequest` | fix the request, do not retry |
/// | `NoCapacity` | offer the waitlist |
/// | `Conflict` | recompute availability, retry bounded |
/// | `InvalidTransition` | caller bug or genuine race on the same entity |
/// | `NotFound` | unknown id within the tenant scope |
/// | `Storage` | infrastructure failure |
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No table available for the requested slot")]
    NoCapacity,

    #[error("Slot was claimed by a concurrent booking")]
    Conflict,

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Ledger storage error: {0}")]
    Storage(String),
}

impl BookingError {
    /// 校验失败的便捷构造
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn transition(from: impl std::fmt::Debug, to: impl std::fmt::Debug) -> Self {
        Self::InvalidTransition(format!("{:?} -> {:?}", from, to))
    }
}

/// Result type for booking engine operations
pub type BookingResult<T> = Result<T, BookingError>;
