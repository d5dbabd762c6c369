//! 认证授权模块
//!
//! 提供 JWT 认证、租户上下文和中间件：
//! - [`JwtService`] - JWT 令牌服务
//! - [`CurrentUser`] - 当前调用者上下文 (携带组织租户范围)
//! - [`require_auth`] - 认证中间件
//! - [`require_permission`] - 权限检查中间件
//!
//! 权限字符串：`reservations:manage`、`tables:manage`、
//! `waitlist:manage`、`restaurants:manage`；`all` 为超级权限。

pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_auth, require_permission};
