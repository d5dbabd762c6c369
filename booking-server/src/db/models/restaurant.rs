//! Restaurant Model

use super::serde_helpers;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::booking::{BookingPolicy, SpecialDay, WeeklyHours};
use surrealdb::RecordId;

use crate::booking::OperatingCalendar;

/// Restaurant entity (餐厅)
///
/// Owns the operating calendar and the booking policy the engine runs
/// under. Never deleted while active reservations exist; deactivated
/// restaurants stay readable for history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Owning organization (tenant scope)
    pub org: String,
    pub name: String,
    /// IANA timezone, e.g. "Europe/Madrid"
    pub timezone: String,
    #[serde(default)]
    pub hours: WeeklyHours,
    #[serde(default)]
    pub special_days: Vec<SpecialDay>,
    #[serde(default)]
    pub policy: BookingPolicy,
    #[serde(
        default = "default_true",
        deserialize_with = "serde_helpers::bool_true"
    )]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Restaurant {
    /// Canonical "restaurant:id" string, empty until persisted
    pub fn id_string(&self) -> String {
        self.id.as_ref().map(|t| t.to_string()).unwrap_or_default()
    }

    /// Parsed timezone, UTC when the stored value is unknown
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!(timezone = %self.timezone, "Unknown timezone, falling back to UTC");
            chrono_tz::UTC
        })
    }

    /// Today in the restaurant's local timezone
    pub fn local_today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz()).date_naive()
    }

    /// Operating calendar over weekly hours and date overrides
    pub fn calendar(&self) -> OperatingCalendar<'_> {
        OperatingCalendar::new(&self.hours, &self.special_days)
    }
}

/// Create restaurant payload (org is taken from the tenant context)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantCreate {
    pub name: String,
    pub timezone: String,
    #[serde(default)]
    pub hours: WeeklyHours,
    #[serde(default)]
    pub special_days: Vec<SpecialDay>,
    #[serde(default)]
    pub policy: BookingPolicy,
}

/// Update restaurant payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<WeeklyHours>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_days: Option<Vec<SpecialDay>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<BookingPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}
