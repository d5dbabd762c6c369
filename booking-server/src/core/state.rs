use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::booking::{BookingEngine, EngineOptions, LedgerStorage, LogDispatcher};
use crate::core::Config;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::db::DbService;

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是预订节点的核心数据结构，使用 Arc/浅拷贝在
/// handler 之间共享。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 (餐厅/桌台) |
/// | engine | BookingEngine | 预订与可用性引擎 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// 预订与可用性引擎
    pub engine: BookingEngine,
    /// JWT 认证服务
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 库存数据库 (work_dir/database/inventory.db)
    /// 3. 预订台账 (work_dir/ledger/reservations.redb)
    /// 4. 引擎与 JWT 服务
    ///
    /// # Panics
    ///
    /// 存储初始化失败时 panic，没有台账就没有引擎可言
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_dir().join("inventory.db");
        let db_service = DbService::new(&db_path.to_string_lossy())
            .await
            .expect("Failed to initialize database");
        let db = db_service.db;

        let ledger_path = config.ledger_dir().join("reservations.redb");
        let storage =
            LedgerStorage::open(&ledger_path).expect("Failed to open reservation ledger");

        let engine = BookingEngine::new(
            db.clone(),
            storage,
            EngineOptions {
                cache_ttl: Duration::from_secs(config.availability_cache_ttl_secs),
                assign_max_attempts: config.assign_max_attempts,
            },
            Arc::new(LogDispatcher),
        );

        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));

        Self {
            config: config.clone(),
            db,
            engine,
            jwt_service,
        }
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 中调用；返回的管理器负责 graceful
    /// shutdown。
    ///
    /// 启动的任务：
    /// - 等位通知过期巡检 (Periodic)
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();
        let token = tasks.shutdown_token();

        let engine = self.engine.clone();
        let interval = Duration::from_secs(self.config.waitlist_sweep_interval_secs.max(1));
        tasks.spawn("waitlist_sweeper", TaskKind::Periodic, async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {
                        match engine.expire_overdue_notifications().await {
                            Ok(0) => {}
                            Ok(count) => {
                                tracing::info!(count, "Expired overdue waitlist notifications");
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Waitlist expiry sweep failed");
                            }
                        }
                    }
                }
            }
        });

        tasks
    }

    /// 获取数据库实例
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// 获取工作目录
    pub fn work_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.work_dir)
    }
}
