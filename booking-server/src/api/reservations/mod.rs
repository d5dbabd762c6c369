//! Reservation API 模块

mod handler;

use axum::{Router, middleware, routing::{get, post}};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    // 顾客路径：下单、查询、取消
    let booking_routes = Router::new()
        .route(
            "/api/restaurants/{id}/reservations",
            post(handler::create).get(handler::list_for_day),
        )
        .route("/api/reservations/{id}", get(handler::get_by_id))
        .route("/api/reservations/{id}/cancel", post(handler::cancel));

    // 员工路径：入座、未到、完成、恢复
    let staff_routes = Router::new()
        .route("/api/reservations/{id}/seat", post(handler::seat))
        .route("/api/reservations/{id}/no-show", post(handler::no_show))
        .route("/api/reservations/{id}/complete", post(handler::complete))
        .route("/api/reservations/{id}/reinstate", post(handler::reinstate))
        .layer(middleware::from_fn(require_permission("reservations:manage")));

    booking_routes.merge(staff_routes)
}
