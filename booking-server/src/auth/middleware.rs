//! 认证中间件
//!
//! 为 JWT 认证和授权提供 Axum 中间件。
//!
//! 认证成功后将 [`CurrentUser`] 注入请求扩展；处理器通过
//! `user.tenant()` 取得显式租户参数传入引擎。

use std::pin::Pin;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::utils::AppError;

/// 认证中间件 - 要求调用者携带有效 JWT
///
/// # 跳过认证的路径
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径
/// - `/api/health`
///
/// # 错误处理
///
/// | 错误 | HTTP 状态码 |
/// |------|------------|
/// | 无 Authorization 头 | 401 Unauthorized |
/// | 令牌过期 | 401 TokenExpired |
/// | 无效令牌 | 401 InvalidToken |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    // CORS 预检直接放行
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // 非 API 路由跳过认证 (让它们正常返回 404)
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    if path == "/api/health" {
        return Ok(next.run(req).await);
    }

    let jwt_service = state.get_jwt_service();
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            tracing::warn!(target: "security", uri = %req.uri(), "Missing authorization header");
            return Err(AppError::unauthorized());
        }
    };

    match jwt_service.validate_token(token) {
        Ok(claims) => {
            let user = CurrentUser::from(claims);
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(e) => {
            tracing::warn!(target: "security", error = %e, uri = %req.uri(), "Token validation failed");
            match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}

/// 权限检查中间件
///
/// 要求 [`require_auth`] 已在外层注入 [`CurrentUser`]。
///
/// ```ignore
/// Router::new()
///     .route("/", post(handler::create))
///     .layer(middleware::from_fn(require_permission("tables:manage")))
/// ```
pub fn require_permission(
    permission: &'static str,
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>> + Clone
{
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or_else(AppError::unauthorized)?;

            if !user.has_permission(permission) {
                tracing::warn!(
                    target: "security",
                    user = %user.user_id,
                    permission,
                    "Permission denied"
                );
                return Err(AppError::forbidden(format!(
                    "Missing permission: {}",
                    permission
                )));
            }

            Ok(next.run(req).await)
        })
    }
}

/// CurrentUser 提取器
///
/// 中间件已注入时直接复用；否则独立验证 Authorization 头。
impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(AppError::unauthorized)?;

        let token = JwtService::extract_from_header(auth_header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

        match state.get_jwt_service().validate_token(token) {
            Ok(claims) => {
                let user = CurrentUser::from(claims);
                parts.extensions.insert(user.clone());
                Ok(user)
            }
            Err(JwtError::ExpiredToken) => Err(AppError::token_expired()),
            Err(_) => Err(AppError::invalid_token("Invalid token")),
        }
    }
}
