use anyhow::Result;
use async_trait::async_trait;

/// Read-only introspection over a task's scheduling state
///
/// Dashboards and controllers poll these periodically; implementations must
/// never mutate anything, and no change notifications are provided.
#[async_trait]
pub trait SchedulerMonitor: Send + Sync {
    /// Number of accepted requests waiting to be polled
    async fn left_request_count(&self, task: &str) -> Result<u64>;

    /// Number of distinct URLs ever accepted for the task, including those
    /// already polled
    async fn total_request_count(&self, task: &str) -> Result<u64>;
}
