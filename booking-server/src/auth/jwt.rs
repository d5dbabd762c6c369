//! JWT 令牌服务
//!
//! 处理 JWT 令牌的生成、验证和解析。令牌由外层身份系统签发，
//! 携带组织租户范围；引擎侧只做验证与解析。

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use shared::Tenant;
use thiserror::Error;

/// JWT 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// JWT 密钥 (应至少 32 字节)
    pub secret: String,
    /// 令牌过期时间 (分钟)
    pub expiration_minutes: i64,
    /// 令牌签发者
    pub issuer: String,
    /// 令牌受众
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        let secret = match std::env::var("JWT_SECRET") {
            Ok(s) if s.len() >= 32 => s,
            Ok(_) => {
                panic!("🚨 FATAL: JWT_SECRET must be at least 32 bytes");
            }
            Err(_) => {
                #[cfg(debug_assertions)]
                {
                    tracing::warn!("JWT_SECRET not set, using development key");
                    "coral-booking-development-secret-key-only".to_string()
                }
                #[cfg(not(debug_assertions))]
                {
                    panic!("🚨 FATAL: JWT_SECRET must be set in release builds");
                }
            }
        };

        Self {
            secret,
            expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1440), // 默认 24 小时
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "booking-server".to_string()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "booking-clients".to_string()),
        }
    }
}

/// 存储在令牌中的 JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 用户 ID (Subject)
    pub sub: String,
    /// 显示名
    pub name: String,
    /// 所属组织 (租户范围)
    pub org: String,
    /// 权限列表 (逗号分隔)
    pub permissions: String,
    /// 过期时间戳
    pub exp: i64,
    /// 签发时间戳
    pub iat: i64,
    /// 签发者
    pub iss: String,
    /// 受众
    pub aud: String,
}

/// JWT 错误
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("无效令牌: {0}")]
    InvalidToken(String),

    #[error("令牌已过期")]
    ExpiredToken,

    #[error("令牌编码失败: {0}")]
    EncodingFailed(String),
}

/// 已认证的调用者上下文
///
/// 由中间件注入请求扩展；`tenant()` 产出传入引擎的显式租户参数。
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
    pub name: String,
    pub org_id: String,
    pub permissions: Vec<String>,
}

impl CurrentUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == "all" || p == permission)
    }

    /// 显式租户范围 - 引擎调用的参数，绝非环境状态
    pub fn tenant(&self) -> Tenant {
        Tenant::new(self.org_id.clone())
    }
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            name: claims.name,
            org_id: claims.org,
            permissions: claims
                .permissions
                .split(',')
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// JWT 令牌服务
#[derive(Debug, Clone, Default)]
pub struct JwtService {
    config: JwtConfig,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    /// 从 `Authorization: Bearer <token>` 头中提取令牌
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ").filter(|t| !t.is_empty())
    }

    /// 生成令牌 (测试与运维工具使用；生产令牌由身份系统签发)
    pub fn generate_token(
        &self,
        user_id: &str,
        name: &str,
        org_id: &str,
        permissions: &[&str],
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            name: name.to_string(),
            org: org_id.to_string(),
            permissions: permissions.join(","),
            exp: (now + Duration::minutes(self.config.expiration_minutes)).timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )
        .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// 验证令牌并返回 Claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
            _ => JwtError::InvalidToken(e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::new(JwtConfig {
            secret: "unit-test-secret-key-of-sufficient-len".to_string(),
            expiration_minutes: 5,
            issuer: "booking-server".to_string(),
            audience: "booking-clients".to_string(),
        })
    }

    #[test]
    fn round_trip_claims() {
        let svc = test_service();
        let token = svc
            .generate_token("emp:1", "Ana", "org:acme", &["reservations:manage"])
            .unwrap();
        let claims = svc.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "emp:1");
        assert_eq!(claims.org, "org:acme");

        let user = CurrentUser::from(claims);
        assert!(user.has_permission("reservations:manage"));
        assert!(!user.has_permission("tables:manage"));
        assert_eq!(user.tenant(), Tenant::new("org:acme"));
    }

    #[test]
    fn all_permission_grants_everything() {
        let svc = test_service();
        let token = svc.generate_token("emp:2", "Bo", "org:acme", &["all"]).unwrap();
        let user = CurrentUser::from(svc.validate_token(&token).unwrap());
        assert!(user.has_permission("waitlist:manage"));
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
        assert_eq!(JwtService::extract_from_header("Bearer "), None);
    }
}
