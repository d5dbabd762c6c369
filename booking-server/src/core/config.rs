use crate::auth::JwtConfig;
use std::path::PathBuf;

/// 服务器配置 - 预订引擎节点的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/coral/booking | 工作目录 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | AVAILABILITY_CACHE_TTL_SECS | 15 | 可用性缓存 TTL (秒) |
/// | ASSIGN_MAX_ATTEMPTS | 3 | 桌台分配冲突重试上限 |
/// | WAITLIST_SWEEP_INTERVAL_SECS | 60 | 等位过期巡检间隔 (秒) |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/coral HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、台账和日志
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,

    /// 可用性缓存 TTL (秒)
    pub availability_cache_ttl_secs: u64,
    /// 桌台分配在冲突时的最大重试次数
    pub assign_max_attempts: u32,
    /// 等位通知过期巡检间隔 (秒)
    pub waitlist_sweep_interval_secs: u64,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/coral/booking".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            availability_cache_ttl_secs: std::env::var("AVAILABILITY_CACHE_TTL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(15),
            assign_max_attempts: std::env::var("ASSIGN_MAX_ATTEMPTS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3),
            waitlist_sweep_interval_secs: std::env::var("WAITLIST_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(60),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            shutdown_timeout_ms: std::env::var("SHUTDOWN_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10000),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    // ========== 工作目录结构 ==========

    /// 嵌入式数据库目录 (餐厅/桌台)
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 预订台账目录 (redb)
    pub fn ledger_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("ledger")
    }

    /// 日志目录
    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.ledger_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
