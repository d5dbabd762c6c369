//! Dining Table API 模块

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/api/restaurants/{id}/tables", get(handler::list));

    let manage_routes = Router::new()
        .route(
            "/api/restaurants/{id}/tables",
            axum::routing::post(handler::create),
        )
        .route(
            "/api/tables/{id}",
            axum::routing::put(handler::update).delete(handler::deactivate),
        )
        .layer(middleware::from_fn(require_permission("tables:manage")));

    read_routes.merge(manage_routes)
}
