//! Waitlist API 模块

mod handler;

use axum::{Router, middleware, routing::{delete, get, post, put}};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    // 顾客路径：加入、退出、接受转化
    let public_routes = Router::new()
        .route("/api/restaurants/{id}/waitlist", post(handler::join))
        .route("/api/waitlist/{id}", delete(handler::remove))
        .route("/api/waitlist/{id}/convert", post(handler::convert));

    // 员工路径：队列视图与优先级调整
    let staff_routes = Router::new()
        .route("/api/restaurants/{id}/waitlist", get(handler::list_for_day))
        .route("/api/waitlist/{id}/rank", put(handler::set_rank))
        .layer(middleware::from_fn(require_permission("waitlist:manage")));

    public_routes.merge(staff_routes)
}
