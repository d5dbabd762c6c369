//! Availability API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::booking::AvailabilitySlot;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppResult;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub party_size: u32,
    /// Override of the restaurant's default seating duration
    pub duration_minutes: Option<u32>,
}

/// GET /api/restaurants/{id}/availability?date=&party_size= - 可订时段
pub async fn compute(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(restaurant_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<Vec<AvailabilitySlot>>> {
    let slots = state
        .engine
        .compute_availability(
            &user.tenant(),
            &restaurant_id,
            query.date,
            query.party_size,
            query.duration_minutes,
        )
        .await?;
    Ok(Json(slots))
}
