//! Coral Booking Server - 餐厅预订与可用性引擎
//!
//! # 架构概述
//!
//! 本模块是预订节点的主入口，提供以下核心功能：
//!
//! - **预订引擎** (`booking`): 可订时段计算、桌台原子分配、等位队列
//! - **数据库** (`db`): 嵌入式 SurrealDB (餐厅/桌台) + redb 台账
//! - **认证** (`auth`): JWT 租户上下文与权限中间件
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! booking-server/src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── auth/          # JWT 认证、租户范围、权限
//! ├── api/           # HTTP 路由和处理器
//! ├── utils/         # 错误类型、日志
//! ├── db/            # 库存数据库层
//! └── booking/       # 预订与可用性引擎
//! ```

pub mod api;
pub mod auth;
pub mod booking;
pub mod core;
pub mod db;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use booking::{BookingEngine, BookingEvent, LedgerStorage, ReservationLedger};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境 (dotenv, 工作目录, 日志)
pub fn setup_environment() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    config.ensure_work_dir_structure()?;

    let log_dir = config.logs_dir();
    let log_level = std::env::var("LOG_LEVEL").ok();
    if config.is_production() {
        init_logger_with_file(log_level.as_deref(), log_dir.to_str());
    } else {
        init_logger_with_file(log_level.as_deref(), None);
    }

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   ______                __
  / ____/___  _________ _/ /
 / /   / __ \/ ___/ __ `/ /
/ /___/ /_/ / /  / /_/ / /
\____/\____/_/   \__,_/_/
    ____              __   _
   / __ )____  ____  / /__(_)___  ____ _
  / __  / __ \/ __ \/ //_/ / __ \/ __ `/
 / /_/ / /_/ / /_/ / ,< / / / / / /_/ /
/_____/\____/\____/_/|_/_/_/ /_/\__, /
                               /____/
    "#
    );
}
