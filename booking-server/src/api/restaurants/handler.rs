//! Restaurant API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Restaurant, RestaurantCreate, RestaurantUpdate};
use crate::db::repository::RestaurantRepository;
use crate::utils::{AppError, AppResult};

/// GET /api/restaurants - 当前组织的所有餐厅
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Restaurant>>> {
    let repo = RestaurantRepository::new(state.db.clone());
    let restaurants = repo.find_all_for_org(&user.org_id).await?;
    Ok(Json(restaurants))
}

/// GET /api/restaurants/{id} - 获取单个餐厅 (租户范围内)
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Restaurant>> {
    let restaurant = state.engine.get_restaurant(&user.tenant(), &id).await?;
    Ok(Json(restaurant))
}

/// POST /api/restaurants - 创建餐厅 (归属当前组织)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<RestaurantCreate>,
) -> AppResult<Json<Restaurant>> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("name must not be empty"));
    }
    let repo = RestaurantRepository::new(state.db.clone());
    let restaurant = repo.create(&user.org_id, payload).await?;
    tracing::info!(
        restaurant_id = %restaurant.id_string(),
        org = %user.org_id,
        "Restaurant created"
    );
    Ok(Json(restaurant))
}

/// PUT /api/restaurants/{id} - 更新餐厅 (时段/政策变化使缓存失效)
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<RestaurantUpdate>,
) -> AppResult<Json<Restaurant>> {
    // 租户范围检查先于一切写入
    state.engine.get_restaurant(&user.tenant(), &id).await?;

    let repo = RestaurantRepository::new(state.db.clone());
    let restaurant = repo.update(&id, payload).await?;

    // 营业时段或政策可能已变化，所有派生视图作废
    state.engine.invalidate_restaurant_cache(&id);
    Ok(Json(restaurant))
}
