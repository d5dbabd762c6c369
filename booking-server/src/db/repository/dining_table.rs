//! Dining Table Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{DiningTable, DiningTableCreate, DiningTableUpdate};
use shared::booking::TableStatus;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "dining_table";

#[derive(Clone)]
pub struct DiningTableRepository {
    base: BaseRepository,
}

impl DiningTableRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// All tables of a restaurant, any status (staff view)
    pub async fn find_all_for_restaurant(&self, restaurant_id: &str) -> RepoResult<Vec<DiningTable>> {
        let restaurant = parse_id(restaurant_id)?;
        let tables: Vec<DiningTable> = self
            .base
            .db()
            .query("SELECT * FROM dining_table WHERE restaurant = $restaurant ORDER BY name")
            .bind(("restaurant", restaurant))
            .await?
            .take(0)?;
        Ok(tables)
    }

    /// Tables the engine may book: ACTIVE status only
    pub async fn find_bookable(&self, restaurant_id: &str) -> RepoResult<Vec<DiningTable>> {
        let restaurant = parse_id(restaurant_id)?;
        let tables: Vec<DiningTable> = self
            .base
            .db()
            .query(
                "SELECT * FROM dining_table WHERE restaurant = $restaurant AND status = 'ACTIVE' ORDER BY name",
            )
            .bind(("restaurant", restaurant))
            .await?
            .take(0)?;
        Ok(tables)
    }

    /// Find table by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<DiningTable>> {
        let thing = parse_id(id)?;
        let table: Option<DiningTable> = self.base.db().select(thing).await?;
        Ok(table)
    }

    /// Find table by name within a restaurant
    pub async fn find_by_name(
        &self,
        restaurant: &RecordId,
        name: &str,
    ) -> RepoResult<Option<DiningTable>> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM dining_table WHERE restaurant = $restaurant AND name = $name LIMIT 1",
            )
            .bind(("restaurant", restaurant.clone()))
            .bind(("name", name.to_string()))
            .await?;
        let tables: Vec<DiningTable> = result.take(0)?;
        Ok(tables.into_iter().next())
    }

    /// Create a new dining table
    pub async fn create(
        &self,
        restaurant_id: &str,
        data: DiningTableCreate,
    ) -> RepoResult<DiningTable> {
        let restaurant = parse_id(restaurant_id)?;

        let min_covers = data.min_covers.unwrap_or(1);
        if data.max_covers == 0 || min_covers > data.max_covers {
            return Err(RepoError::Validation(format!(
                "Invalid covers range: {}..{}",
                min_covers, data.max_covers
            )));
        }

        // Check duplicate name in the same restaurant
        if self.find_by_name(&restaurant, &data.name).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Table '{}' already exists in this restaurant",
                data.name
            )));
        }

        let table = DiningTable {
            id: None,
            restaurant,
            name: data.name,
            min_covers,
            max_covers: data.max_covers,
            combine_group: data.combine_group.filter(|g| !g.is_empty()),
            status: TableStatus::Active,
        };

        let created: Option<DiningTable> = self.base.db().create(TABLE).content(table).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create dining table".to_string()))
    }

    /// Update a dining table
    pub async fn update(&self, id: &str, data: DiningTableUpdate) -> RepoResult<DiningTable> {
        let thing = parse_id(id)?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Dining table {} not found", id)))?;

        // Check duplicate name when renaming
        if let Some(name) = &data.name
            && *name != existing.name
            && let Some(found) = self.find_by_name(&existing.restaurant, name).await?
            && found.id != existing.id
        {
            return Err(RepoError::Duplicate(format!(
                "Table '{}' already exists in this restaurant",
                name
            )));
        }

        let name = data.name.unwrap_or(existing.name);
        let min_covers = data.min_covers.unwrap_or(existing.min_covers);
        let max_covers = data.max_covers.unwrap_or(existing.max_covers);
        if max_covers == 0 || min_covers > max_covers {
            return Err(RepoError::Validation(format!(
                "Invalid covers range: {}..{}",
                min_covers, max_covers
            )));
        }
        // Some("") clears the group
        let combine_group = match data.combine_group {
            Some(g) if g.is_empty() => None,
            Some(g) => Some(g),
            None => existing.combine_group,
        };
        let status = data.status.unwrap_or(existing.status);

        // 手动构建 UPDATE 语句，避免 restaurant 引用被序列化为字符串
        self.base
            .db()
            .query(
                "UPDATE $thing SET name = $name, min_covers = $min_covers, \
                 max_covers = $max_covers, combine_group = $combine_group, status = $status",
            )
            .bind(("thing", thing))
            .bind(("name", name))
            .bind(("min_covers", min_covers))
            .bind(("max_covers", max_covers))
            .bind(("combine_group", combine_group))
            .bind(("status", status))
            .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Dining table {} not found", id)))
    }

    /// Soft delete: deactivate, keep history
    pub async fn deactivate(&self, id: &str) -> RepoResult<DiningTable> {
        self.update(
            id,
            DiningTableUpdate {
                name: None,
                min_covers: None,
                max_covers: None,
                combine_group: None,
                status: Some(TableStatus::Inactive),
            },
        )
        .await
    }
}

fn parse_id(id: &str) -> RepoResult<RecordId> {
    id.parse()
        .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))
}
