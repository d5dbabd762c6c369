//! Availability API 模块

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    // 查询可用性仅需登录；公共预订 UI 与员工日历共用
    Router::new().route(
        "/api/restaurants/{id}/availability",
        get(handler::compute),
    )
}
