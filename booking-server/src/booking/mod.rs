//! Reservation & availability engine
//!
//! # 模块结构
//!
//! ```text
//! booking/
//! ├── calendar.rs      # 营业日历（每周时段 + 日期覆盖）
//! ├── storage.rs       # redb 台账存储（预订 + 等位）
//! ├── ledger.rs        # 预订台账：状态机 + 无重叠不变量
//! ├── availability.rs  # 可订时段计算（纯函数）
//! ├── assign.rs        # 桌台分配：最优匹配 + 原子占用
//! ├── waitlist.rs      # 等位队列状态机
//! ├── cache.rs         # 可用性缓存（TTL + 显式失效）
//! ├── notify.rs        # 通知交接（fire-and-forget）
//! └── engine.rs        # BookingEngine 编排门面
//! ```

pub mod assign;
pub mod availability;
pub mod cache;
pub mod calendar;
pub mod engine;
pub mod ledger;
pub mod notify;
pub mod storage;
pub mod waitlist;

// Re-exports
pub use assign::TableAssignmentResolver;
pub use availability::{SlotQuery, compute_slots};
pub use cache::AvailabilityCache;
pub use calendar::OperatingCalendar;
pub use engine::{AssignRequest, BookingEngine, BookingEvent, EngineOptions, JoinWaitlistRequest};
pub use ledger::ReservationLedger;
pub use notify::{LogDispatcher, NotificationDispatcher, WaitlistNotification};
pub use storage::{LedgerStorage, StorageError};
pub use waitlist::WaitlistManager;
