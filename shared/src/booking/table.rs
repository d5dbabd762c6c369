//! Table inventory projection consumed by the engine

use serde::{Deserialize, Serialize};

/// Physical table state (桌台状态)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    #[default]
    Active,
    /// Hidden from booking but retains history
    Inactive,
    /// Temporarily unavailable (repair, deep clean)
    OutOfService,
}

impl TableStatus {
    pub fn is_bookable(&self) -> bool {
        matches!(self, TableStatus::Active)
    }
}

/// The slice of a dining table the availability/assignment algorithms need.
///
/// Repositories project their storage models into this; the engine core
/// never touches the database layer directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub table_id: String,
    pub name: String,
    /// Smallest party this table is set for
    pub min_covers: u32,
    /// Largest party this table seats
    pub max_covers: u32,
    /// Staff-declared join group for large parties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combine_group: Option<String>,
}

impl TableSpec {
    /// Whether this single table seats the party on its own
    pub fn seats(&self, party_size: u32) -> bool {
        party_size >= self.min_covers && party_size <= self.max_covers
    }
}
