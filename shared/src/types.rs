//! Tenant scope types

use serde::{Deserialize, Serialize};

/// Organization scope for a call into the booking engine.
///
/// 租户上下文 - 由外层认证层解析后作为显式参数传入每个引擎调用，
/// 引擎不读取任何环境/会话状态。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tenant {
    /// Owning organization id
    pub org_id: String,
}

impl Tenant {
    pub fn new(org_id: impl Into<String>) -> Self {
        Self {
            org_id: org_id.into(),
        }
    }

    /// Whether this tenant owns the given organization id
    pub fn owns(&self, org_id: &str) -> bool {
        self.org_id == org_id
    }
}
