//! Reservation API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use shared::booking::{CustomerContact, Reservation};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::booking::AssignRequest;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReservationPayload {
    pub date: NaiveDate,
    /// Seating start, "HH:MM:SS"
    pub time: NaiveTime,
    #[validate(range(min = 1, message = "party_size must be at least 1"))]
    pub party_size: u32,
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub contact: CustomerContact,
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: NaiveDate,
}

/// POST /api/restaurants/{id}/reservations - 确认预订
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(restaurant_id): Path<String>,
    Json(payload): Json<CreateReservationPayload>,
) -> AppResult<Json<Reservation>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let reservation = state
        .engine
        .assign_table(
            &user.tenant(),
            &restaurant_id,
            AssignRequest {
                date: payload.date,
                start: payload.time,
                party_size: payload.party_size,
                duration_minutes: payload.duration_minutes,
                contact: payload.contact,
            },
        )
        .await?;
    Ok(Json(reservation))
}

/// GET /api/restaurants/{id}/reservations?date= - 某日的预订列表
pub async fn list_for_day(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(restaurant_id): Path<String>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<Vec<Reservation>>> {
    let reservations = state
        .engine
        .reservations_for_day(&user.tenant(), &restaurant_id, query.date)
        .await?;
    Ok(Json(reservations))
}

/// GET /api/reservations/{id} - 查询单个预订
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Reservation>> {
    let reservation = state.engine.get_reservation(&user.tenant(), &id).await?;
    Ok(Json(reservation))
}

/// POST /api/reservations/{id}/cancel - 取消 (触发等位递补)
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Reservation>> {
    let reservation = state.engine.cancel_reservation(&user.tenant(), &id).await?;
    Ok(Json(reservation))
}

/// POST /api/reservations/{id}/seat - 顾客入座
pub async fn seat(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Reservation>> {
    let reservation = state.engine.seat_reservation(&user.tenant(), &id).await?;
    Ok(Json(reservation))
}

/// POST /api/reservations/{id}/no-show - 标记未到 (触发等位递补)
pub async fn no_show(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Reservation>> {
    let reservation = state.engine.mark_no_show(&user.tenant(), &id).await?;
    Ok(Json(reservation))
}

/// POST /api/reservations/{id}/complete - 用餐完成
pub async fn complete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Reservation>> {
    let reservation = state
        .engine
        .complete_reservation(&user.tenant(), &id)
        .await?;
    Ok(Json(reservation))
}

/// POST /api/reservations/{id}/reinstate - 恢复已取消的预订
///
/// 重新激活桌台占用；窗口已被抢走时返回 409 冲突。
pub async fn reinstate(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Reservation>> {
    let reservation = state
        .engine
        .reinstate_reservation(&user.tenant(), &id)
        .await?;
    Ok(Json(reservation))
}
