//! Dining Table Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use shared::booking::{TableSpec, TableStatus};
use surrealdb::RecordId;

/// Dining table entity (桌台)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTable {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Owning restaurant reference
    #[serde(with = "serde_helpers::record_id")]
    pub restaurant: RecordId,
    pub name: String,
    #[serde(default = "default_min_covers")]
    pub min_covers: u32,
    pub max_covers: u32,
    /// Staff-declared join group for large parties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combine_group: Option<String>,
    #[serde(default)]
    pub status: TableStatus,
}

fn default_min_covers() -> u32 {
    1
}

impl DiningTable {
    /// Engine projection; `None` until the table has a persisted id
    pub fn to_spec(&self) -> Option<TableSpec> {
        self.id.as_ref().map(|id| TableSpec {
            table_id: id.to_string(),
            name: self.name.clone(),
            min_covers: self.min_covers,
            max_covers: self.max_covers,
            combine_group: self.combine_group.clone(),
        })
    }
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableCreate {
    pub name: String,
    pub min_covers: Option<u32>,
    pub max_covers: u32,
    pub combine_group: Option<String>,
}

/// Update dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_covers: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_covers: Option<u32>,
    /// Some("") clears the group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combine_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TableStatus>,
}
