//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`restaurants`] - 餐厅配置接口
//! - [`tables`] - 桌台库存接口
//! - [`availability`] - 可订时段查询接口
//! - [`reservations`] - 预订与状态流转接口
//! - [`waitlist`] - 等位队列接口

pub mod availability;
pub mod health;
pub mod reservations;
pub mod restaurants;
pub mod tables;
pub mod waitlist;

use axum::{Router, middleware};
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::core::ServerState;

/// Assemble the full application router
pub fn router(state: ServerState) -> Router {
    let timeout = Duration::from_millis(state.config.request_timeout_ms);
    Router::new()
        .merge(health::router())
        .merge(restaurants::router())
        .merge(tables::router())
        .merge(availability::router())
        .merge(reservations::router())
        .merge(waitlist::router())
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
