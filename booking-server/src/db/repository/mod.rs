//! Repository Module
//!
//! CRUD access to the embedded SurrealDB tables. Every query is scoped
//! to an owning restaurant or organization; cross-tenant reads are a
//! correctness violation here, not just a privacy one.

pub mod dining_table;
pub mod restaurant;

// Re-exports
pub use dining_table::DiningTableRepository;
pub use restaurant::RestaurantRepository;

use shared::booking::BookingError;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

impl From<RepoError> for BookingError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => BookingError::NotFound(msg),
            RepoError::Duplicate(msg) | RepoError::Validation(msg) => {
                BookingError::InvalidRequest(msg)
            }
            RepoError::Database(msg) => BookingError::Storage(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// ID convention: "table:id" strings end to end, parsed into
// surrealdb::RecordId at the repository boundary.

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}
