//! LogicMonitor API client

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub mod auth;
pub mod logicmonitor;
#[cfg(test)]
pub mod mock;
pub mod pagination;
pub mod rate_limit;
pub mod retry;

pub use logicmonitor::LogicMonitorClient;
#[cfg(test)]
pub use mock::MockLogicMonitorClient;
pub use pagination::{PageRequest, Pager};
pub use retry::RetryPolicy;

/// Read-only access to LogicMonitor REST resources.
///
/// Implementations own signing, retries and throttling; callers only see the
/// decoded JSON payload of a successful response.
#[async_trait]
pub trait LogicMonitorApi: Send + Sync {
    /// GET `resource_path` (relative to `/santaba/rest`) with query parameters.
    async fn get_json(&self, resource_path: &str, query: &[(&'static str, String)])
    -> Result<Value>;
}
