//! Waitlist API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use shared::booking::{CustomerContact, Reservation, WaitlistEntry};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::booking::JoinWaitlistRequest;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize, Validate)]
pub struct JoinWaitlistPayload {
    pub date: NaiveDate,
    #[validate(range(min = 1, message = "party_size must be at least 1"))]
    pub party_size: u32,
    /// Earliest acceptable seating start, "HH:MM:SS"
    pub window_start: NaiveTime,
    /// Latest acceptable seating start
    pub window_end: NaiveTime,
    #[serde(default)]
    pub contact: CustomerContact,
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct RankPayload {
    pub rank: u64,
}

/// POST /api/restaurants/{id}/waitlist - 加入等位队列
pub async fn join(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(restaurant_id): Path<String>,
    Json(payload): Json<JoinWaitlistPayload>,
) -> AppResult<Json<WaitlistEntry>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let entry = state
        .engine
        .join_waitlist(
            &user.tenant(),
            &restaurant_id,
            JoinWaitlistRequest {
                date: payload.date,
                party_size: payload.party_size,
                window_start: payload.window_start,
                window_end: payload.window_end,
                contact: payload.contact,
            },
        )
        .await?;
    Ok(Json(entry))
}

/// GET /api/restaurants/{id}/waitlist?date= - 某日队列 (优先级序)
pub async fn list_for_day(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(restaurant_id): Path<String>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<Vec<WaitlistEntry>>> {
    let entries = state
        .engine
        .waitlist_for_day(&user.tenant(), &restaurant_id, query.date)
        .await?;
    Ok(Json(entries))
}

/// DELETE /api/waitlist/{id} - 退出队列
pub async fn remove(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<WaitlistEntry>> {
    let entry = state.engine.remove_from_waitlist(&user.tenant(), &id).await?;
    Ok(Json(entry))
}

/// PUT /api/waitlist/{id}/rank - 员工优先级调整 (VIP)
pub async fn set_rank(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<RankPayload>,
) -> AppResult<Json<WaitlistEntry>> {
    let entry = state
        .engine
        .set_waitlist_rank(&user.tenant(), &id, payload.rank)
        .await?;
    Ok(Json(entry))
}

/// POST /api/waitlist/{id}/convert - 接受通知，转为正式预订
///
/// 竞争失败 (NoCapacity/Conflict) 时，条目回到 waiting 且保留原有
/// 优先级。
pub async fn convert(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Reservation>> {
    let reservation = state
        .engine
        .convert_waitlist_entry(&user.tenant(), &id)
        .await?;
    Ok(Json(reservation))
}
