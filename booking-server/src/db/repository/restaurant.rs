//! Restaurant Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Restaurant, RestaurantCreate, RestaurantUpdate};
use shared::booking::BookingPolicy;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "restaurant";

#[derive(Clone)]
pub struct RestaurantRepository {
    base: BaseRepository,
}

impl RestaurantRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all active restaurants of an organization
    pub async fn find_all_for_org(&self, org: &str) -> RepoResult<Vec<Restaurant>> {
        let restaurants: Vec<Restaurant> = self
            .base
            .db()
            .query("SELECT * FROM restaurant WHERE org = $org AND is_active = true ORDER BY name")
            .bind(("org", org.to_string()))
            .await?
            .take(0)?;
        Ok(restaurants)
    }

    /// Find restaurant by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Restaurant>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let restaurant: Option<Restaurant> = self.base.db().select(thing).await?;
        Ok(restaurant)
    }

    /// Create a new restaurant under the given organization
    pub async fn create(&self, org: &str, data: RestaurantCreate) -> RepoResult<Restaurant> {
        if data.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(RepoError::Validation(format!(
                "Unknown timezone: {}",
                data.timezone
            )));
        }
        validate_policy(&data.policy)?;

        let restaurant = Restaurant {
            id: None,
            org: org.to_string(),
            name: data.name,
            timezone: data.timezone,
            hours: data.hours,
            special_days: data.special_days,
            policy: data.policy,
            is_active: true,
        };

        let created: Option<Restaurant> = self.base.db().create(TABLE).content(restaurant).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create restaurant".to_string()))
    }

    /// Update a restaurant
    pub async fn update(&self, id: &str, data: RestaurantUpdate) -> RepoResult<Restaurant> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Restaurant {} not found", id)))?;

        if let Some(tz) = &data.timezone
            && tz.parse::<chrono_tz::Tz>().is_err()
        {
            return Err(RepoError::Validation(format!("Unknown timezone: {}", tz)));
        }
        if let Some(policy) = &data.policy {
            validate_policy(policy)?;
        }

        // 手动构建 UPDATE 语句，避免 id 字段被序列化进 content
        let name = data.name.unwrap_or(existing.name);
        let timezone = data.timezone.unwrap_or(existing.timezone);
        let hours = data.hours.unwrap_or(existing.hours);
        let special_days = data.special_days.unwrap_or(existing.special_days);
        let policy = data.policy.unwrap_or(existing.policy);
        let is_active = data.is_active.unwrap_or(existing.is_active);

        self.base
            .db()
            .query(
                "UPDATE $thing SET name = $name, timezone = $timezone, hours = $hours, \
                 special_days = $special_days, policy = $policy, is_active = $is_active",
            )
            .bind(("thing", thing))
            .bind(("name", name))
            .bind(("timezone", timezone))
            .bind(("hours", hours))
            .bind(("special_days", special_days))
            .bind(("policy", policy))
            .bind(("is_active", is_active))
            .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Restaurant {} not found", id)))
    }
}

/// Reject policy values the slot generator cannot work with
fn validate_policy(policy: &BookingPolicy) -> RepoResult<()> {
    if policy.slot_granularity_minutes == 0 {
        return Err(RepoError::Validation(
            "slot_granularity_minutes must be positive".into(),
        ));
    }
    if policy.default_duration_minutes == 0 {
        return Err(RepoError::Validation(
            "default_duration_minutes must be positive".into(),
        ));
    }
    if policy.max_party_size == 0 {
        return Err(RepoError::Validation("max_party_size must be positive".into()));
    }
    Ok(())
}
