//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{DiningTable, DiningTableCreate, DiningTableUpdate};
use crate::db::repository::DiningTableRepository;
use crate::utils::{AppError, AppResult};

/// GET /api/restaurants/{id}/tables - 餐厅的所有桌台 (含停用)
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(restaurant_id): Path<String>,
) -> AppResult<Json<Vec<DiningTable>>> {
    state
        .engine
        .get_restaurant(&user.tenant(), &restaurant_id)
        .await?;
    let repo = DiningTableRepository::new(state.db.clone());
    let tables = repo.find_all_for_restaurant(&restaurant_id).await?;
    Ok(Json(tables))
}

/// POST /api/restaurants/{id}/tables - 创建桌台
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(restaurant_id): Path<String>,
    Json(payload): Json<DiningTableCreate>,
) -> AppResult<Json<DiningTable>> {
    state
        .engine
        .get_restaurant(&user.tenant(), &restaurant_id)
        .await?;
    let repo = DiningTableRepository::new(state.db.clone());
    let table = repo.create(&restaurant_id, payload).await?;

    // 新桌台改变可用容量
    state.engine.invalidate_restaurant_cache(&restaurant_id);
    Ok(Json(table))
}

/// PUT /api/tables/{id} - 更新桌台
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<DiningTableUpdate>,
) -> AppResult<Json<DiningTable>> {
    let repo = DiningTableRepository::new(state.db.clone());
    let restaurant_id = owned_restaurant_of(&state, &user, &repo, &id).await?;

    let table = repo.update(&id, payload).await?;
    state.engine.invalidate_restaurant_cache(&restaurant_id);
    Ok(Json(table))
}

/// DELETE /api/tables/{id} - 停用桌台 (软删除，保留历史)
pub async fn deactivate(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<DiningTable>> {
    let repo = DiningTableRepository::new(state.db.clone());
    let restaurant_id = owned_restaurant_of(&state, &user, &repo, &id).await?;

    let table = repo.deactivate(&id).await?;
    state.engine.invalidate_restaurant_cache(&restaurant_id);
    Ok(Json(table))
}

/// 校验桌台归属当前租户，返回其餐厅 id
async fn owned_restaurant_of(
    state: &ServerState,
    user: &CurrentUser,
    repo: &DiningTableRepository,
    table_id: &str,
) -> AppResult<String> {
    let table = repo
        .find_by_id(table_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Table {} not found", table_id)))?;
    let restaurant_id = table.restaurant.to_string();
    state
        .engine
        .get_restaurant(&user.tenant(), &restaurant_id)
        .await
        .map_err(|_| AppError::not_found(format!("Table {} not found", table_id)))?;
    Ok(restaurant_id)
}
