//! Restaurant API 模块

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/api/restaurants", get(handler::list))
        .route("/api/restaurants/{id}", get(handler::get_by_id));

    let manage_routes = Router::new()
        .route("/api/restaurants", axum::routing::post(handler::create))
        .route("/api/restaurants/{id}", axum::routing::put(handler::update))
        .layer(middleware::from_fn(require_permission("restaurants:manage")));

    read_routes.merge(manage_routes)
}
