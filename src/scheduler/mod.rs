pub mod dedup;
pub mod keys;
pub mod request;

// Re-export common types
pub use dedup::DuplicateRemover;
pub use keys::KeySpace;
pub use request::{Request, RequestBody};

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::monitor::SchedulerMonitor;
use crate::scheduler::request::url_digest;
use crate::store::Store;

/// How accepted requests are ordered for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierPolicy {
    /// Single FIFO queue, insertion order
    Fifo,

    /// Three tiers: positive priorities first (highest score wins), then
    /// zero-priority FIFO, then negative priorities (least negative wins)
    Priority,
}

/// Distributed request scheduler over a shared key-value store
///
/// Many worker processes push and poll against the same task namespace.
/// A URL is accepted at most once per task (until the dedup set is reset);
/// requests that carry more than a URL keep their metadata in a side hash,
/// consumed exactly once by the poll that retrieves it. The side-metadata
/// entry is deleted before the request reaches the caller, so a crash in
/// that window loses the extra fields but never delivers a URL twice.
pub struct RedisScheduler {
    store: Arc<dyn Store>,
    keys: KeySpace,
    dedup: DuplicateRemover,
    policy: TierPolicy,
}

impl RedisScheduler {
    /// Create a scheduler with the given key prefix and ordering policy
    pub fn new(store: Arc<dyn Store>, prefix: &str, policy: TierPolicy) -> Self {
        let keys = KeySpace::new(prefix);
        let dedup = DuplicateRemover::new(store.clone(), keys.clone());

        Self {
            store,
            keys,
            dedup,
            policy,
        }
    }

    /// Create a plain FIFO scheduler
    pub fn fifo(store: Arc<dyn Store>, prefix: &str) -> Self {
        Self::new(store, prefix, TierPolicy::Fifo)
    }

    /// Create a priority-tiered scheduler
    pub fn priority(store: Arc<dyn Store>, prefix: &str) -> Self {
        Self::new(store, prefix, TierPolicy::Priority)
    }

    /// Push a request for a task
    ///
    /// Returns true if the request was enqueued, false if its URL was
    /// already seen for this task and the request was discarded. Store
    /// failures surface as errors; no retry happens here.
    pub async fn push(&self, request: &Request, task: &str) -> Result<bool> {
        if request.url.trim().is_empty() {
            anyhow::bail!("Request URL must not be empty");
        }

        if self.dedup.is_duplicate(request, task).await? {
            debug!("Discarding duplicate URL for task {}: {}", task, request.url);
            return Ok(false);
        }

        self.enqueue(request, task).await?;

        if request.has_extra_metadata() {
            let value = serde_json::to_string(request)
                .context("Failed to serialize request metadata")?;

            self.store
                .hash_set(&self.keys.item_hash(task), &url_digest(&request.url), &value)
                .await
                .context("Failed to store request metadata")?;
        }

        debug!("Pushed URL for task {}: {}", task, request.url);

        Ok(true)
    }

    /// Poll the next request for a task, or None if nothing is pending
    ///
    /// Never blocks waiting for work; callers decide their own re-poll
    /// cadence.
    pub async fn poll(&self, task: &str) -> Result<Option<Request>> {
        let url = match self.policy {
            TierPolicy::Fifo => self.store.list_pop(&self.keys.queue(task)).await?,
            TierPolicy::Priority => self.pop_by_tier(task).await?,
        };

        let url = match url {
            Some(url) if !url.trim().is_empty() => url,
            _ => return Ok(None),
        };

        let request = self.take_metadata(&url, task).await?;

        debug!("Polled URL for task {}: {}", task, url);

        Ok(Some(request))
    }

    /// Number of accepted requests not yet polled
    pub async fn left_request_count(&self, task: &str) -> Result<u64> {
        match self.policy {
            TierPolicy::Fifo => self.store.list_len(&self.keys.queue(task)).await,
            TierPolicy::Priority => {
                let mut count = self.store.list_len(&self.keys.zero_queue(task)).await?;
                count += self.store.zset_len(&self.keys.plus_zset(task)).await?;
                count += self.store.zset_len(&self.keys.minus_zset(task)).await?;
                Ok(count)
            }
        }
    }

    /// Number of distinct URLs ever accepted, polled or not
    pub async fn total_request_count(&self, task: &str) -> Result<u64> {
        self.dedup.total_count(task).await
    }

    /// Clear the task's dedup set so previously seen URLs are accepted again
    ///
    /// Leaves the queue and tier structures untouched.
    pub async fn reset_duplicate_check(&self, task: &str) -> Result<()> {
        self.dedup.reset(task).await
    }

    /// Route an accepted request into its tier
    async fn enqueue(&self, request: &Request, task: &str) -> Result<()> {
        match self.policy {
            TierPolicy::Fifo => {
                self.store
                    .list_push(&self.keys.queue(task), &request.url)
                    .await
            }
            TierPolicy::Priority => {
                if request.priority > 0 {
                    self.store
                        .zset_add(&self.keys.plus_zset(task), &request.url, request.priority)
                        .await
                } else if request.priority < 0 {
                    self.store
                        .zset_add(&self.keys.minus_zset(task), &request.url, request.priority)
                        .await
                } else {
                    self.store
                        .list_push(&self.keys.zero_queue(task), &request.url)
                        .await
                }
            }
        }
    }

    /// Select the next URL under the priority policy
    ///
    /// Positive tier first, then the zero-priority queue, then the negative
    /// tier. Each probe is a single atomic store call, so two pollers can
    /// never take the same member.
    async fn pop_by_tier(&self, task: &str) -> Result<Option<String>> {
        if let Some(url) = self.store.zset_pop_max(&self.keys.plus_zset(task)).await? {
            return Ok(Some(url));
        }

        if let Some(url) = self.store.list_pop(&self.keys.zero_queue(task)).await? {
            if !url.trim().is_empty() {
                return Ok(Some(url));
            }
        }

        self.store.zset_pop_max(&self.keys.minus_zset(task)).await
    }

    /// Reattach side-stored metadata to a polled URL
    ///
    /// The hash entry is deleted as soon as it is read; if it is missing or
    /// undecodable the bare URL is returned instead.
    async fn take_metadata(&self, url: &str, task: &str) -> Result<Request> {
        let key = self.keys.item_hash(task);
        let field = url_digest(url);

        let Some(raw) = self.store.hash_get(&key, &field).await? else {
            return Ok(Request::new(url));
        };

        self.store
            .hash_del(&key, &field)
            .await
            .context("Failed to delete request metadata")?;

        match serde_json::from_str(&raw) {
            Ok(request) => Ok(request),
            Err(e) => {
                warn!("Undecodable metadata for URL {}, using bare URL: {}", url, e);
                Ok(Request::new(url))
            }
        }
    }
}

#[async_trait]
impl SchedulerMonitor for RedisScheduler {
    async fn left_request_count(&self, task: &str) -> Result<u64> {
        RedisScheduler::left_request_count(self, task).await
    }

    async fn total_request_count(&self, task: &str) -> Result<u64> {
        RedisScheduler::total_request_count(self, task).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, MockStore};
    use serde_json::json;

    const TASK: &str = "job1";

    fn fifo_scheduler() -> RedisScheduler {
        RedisScheduler::fifo(Arc::new(MemoryStore::new()), "")
    }

    fn priority_scheduler() -> RedisScheduler {
        RedisScheduler::priority(Arc::new(MemoryStore::new()), "")
    }

    #[tokio::test]
    async fn fifo_polls_in_push_order() {
        let scheduler = fifo_scheduler();

        for url in ["http://a.example/1", "http://a.example/2", "http://a.example/3"] {
            assert!(scheduler.push(&Request::new(url), TASK).await.unwrap());
        }

        for url in ["http://a.example/1", "http://a.example/2", "http://a.example/3"] {
            let polled = scheduler.poll(TASK).await.unwrap().unwrap();
            assert_eq!(polled.url, url);
        }

        assert!(scheduler.poll(TASK).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_pushes_are_discarded() {
        let scheduler = fifo_scheduler();
        let request = Request::new("http://a.example/1");

        assert!(scheduler.push(&request, TASK).await.unwrap());
        assert!(!scheduler.push(&request, TASK).await.unwrap());
        assert!(!scheduler.push(&request, TASK).await.unwrap());

        assert_eq!(scheduler.left_request_count(TASK).await.unwrap(), 1);
        assert_eq!(scheduler.total_request_count(TASK).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_url_is_rejected() {
        let scheduler = fifo_scheduler();

        assert!(scheduler.push(&Request::new(""), TASK).await.is_err());
        assert!(scheduler.push(&Request::new("   "), TASK).await.is_err());
        assert_eq!(scheduler.total_request_count(TASK).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn priority_tiers_drain_in_order() {
        let scheduler = priority_scheduler();

        let pushes = [
            ("http://a.example/p5", 5),
            ("http://a.example/z1", 0),
            ("http://a.example/m3", -3),
            ("http://a.example/z2", 0),
        ];
        for (url, priority) in pushes {
            let request = Request::new(url).with_priority(priority);
            assert!(scheduler.push(&request, TASK).await.unwrap());
        }

        let expected = [
            "http://a.example/p5",
            "http://a.example/z1",
            "http://a.example/z2",
            "http://a.example/m3",
        ];
        for url in expected {
            let polled = scheduler.poll(TASK).await.unwrap().unwrap();
            assert_eq!(polled.url, url);
        }

        assert!(scheduler.poll(TASK).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn higher_positive_priority_wins() {
        let scheduler = priority_scheduler();

        scheduler
            .push(&Request::new("http://a.example/p1").with_priority(1), TASK)
            .await
            .unwrap();
        scheduler
            .push(&Request::new("http://a.example/p9").with_priority(9), TASK)
            .await
            .unwrap();

        assert_eq!(
            scheduler.poll(TASK).await.unwrap().unwrap().url,
            "http://a.example/p9"
        );
    }

    #[tokio::test]
    async fn least_negative_priority_drains_first() {
        let scheduler = priority_scheduler();

        scheduler
            .push(&Request::new("http://a.example/m9").with_priority(-9), TASK)
            .await
            .unwrap();
        scheduler
            .push(&Request::new("http://a.example/m1").with_priority(-1), TASK)
            .await
            .unwrap();

        assert_eq!(
            scheduler.poll(TASK).await.unwrap().unwrap().url,
            "http://a.example/m1"
        );
        assert_eq!(
            scheduler.poll(TASK).await.unwrap().unwrap().url,
            "http://a.example/m9"
        );
    }

    #[tokio::test]
    async fn left_count_tracks_all_tiers() {
        let scheduler = priority_scheduler();

        scheduler
            .push(&Request::new("http://a.example/p5").with_priority(5), TASK)
            .await
            .unwrap();
        scheduler
            .push(&Request::new("http://a.example/z1"), TASK)
            .await
            .unwrap();
        scheduler
            .push(&Request::new("http://a.example/m3").with_priority(-3), TASK)
            .await
            .unwrap();

        assert_eq!(scheduler.left_request_count(TASK).await.unwrap(), 3);

        scheduler.poll(TASK).await.unwrap();
        assert_eq!(scheduler.left_request_count(TASK).await.unwrap(), 2);

        scheduler.poll(TASK).await.unwrap();
        scheduler.poll(TASK).await.unwrap();
        assert_eq!(scheduler.left_request_count(TASK).await.unwrap(), 0);

        // Polled URLs still count toward the total
        assert_eq!(scheduler.total_request_count(TASK).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn metadata_round_trips_through_the_side_hash() {
        let scheduler = priority_scheduler();

        let mut request = Request::new("http://a.example/form")
            .with_priority(2)
            .with_depth(4)
            .with_header("Accept", "text/html")
            .with_cookie("session", "abc")
            .with_extra("label", json!("seed"));
        request.method = Some("POST".to_string());
        request.charset = Some("utf-8".to_string());
        request.body = Some(RequestBody {
            content_type: "application/x-www-form-urlencoded".to_string(),
            content: b"q=rust".to_vec(),
        });

        assert!(scheduler.push(&request, TASK).await.unwrap());

        let polled = scheduler.poll(TASK).await.unwrap().unwrap();
        assert_eq!(polled, request);

        // Metadata is consumed exactly once: a second push+poll of the same
        // URL after a reset comes back bare.
        scheduler.reset_duplicate_check(TASK).await.unwrap();
        assert!(scheduler.push(&Request::new("http://a.example/form"), TASK).await.unwrap());
        let polled = scheduler.poll(TASK).await.unwrap().unwrap();
        assert!(!polled.has_extra_metadata());
    }

    #[tokio::test]
    async fn plain_requests_skip_the_side_hash() {
        let store = Arc::new(MemoryStore::new());
        let scheduler = RedisScheduler::fifo(store.clone(), "");
        let keys = KeySpace::new("");

        let url = "http://a.example/plain";
        scheduler.push(&Request::new(url), TASK).await.unwrap();

        let field = url_digest(url);
        assert_eq!(
            store.hash_get(&keys.item_hash(TASK), &field).await.unwrap(),
            None
        );

        let polled = scheduler.poll(TASK).await.unwrap().unwrap();
        assert_eq!(polled, Request::new(url));
    }

    #[tokio::test]
    async fn empty_poll_returns_none_and_mutates_nothing() {
        let scheduler = priority_scheduler();

        assert!(scheduler.poll(TASK).await.unwrap().is_none());
        assert_eq!(scheduler.left_request_count(TASK).await.unwrap(), 0);
        assert_eq!(scheduler.total_request_count(TASK).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reset_readmits_a_rejected_url() {
        let scheduler = fifo_scheduler();
        let request = Request::new("http://a.example/1");

        assert!(scheduler.push(&request, TASK).await.unwrap());
        scheduler.poll(TASK).await.unwrap();
        assert!(!scheduler.push(&request, TASK).await.unwrap());

        scheduler.reset_duplicate_check(TASK).await.unwrap();
        assert!(scheduler.push(&request, TASK).await.unwrap());
        assert_eq!(scheduler.left_request_count(TASK).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn blank_queue_entries_read_as_empty() {
        let store = Arc::new(MemoryStore::new());
        let scheduler = RedisScheduler::fifo(store.clone(), "");
        let keys = KeySpace::new("");

        // Simulates a foreign writer leaving a blank entry in the queue
        store.list_push(&keys.queue(TASK), " ").await.unwrap();

        assert!(scheduler.poll(TASK).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn undecodable_metadata_degrades_to_bare_url() {
        let store = Arc::new(MemoryStore::new());
        let scheduler = RedisScheduler::fifo(store.clone(), "");
        let keys = KeySpace::new("");

        let url = "http://a.example/broken";
        store.list_push(&keys.queue(TASK), url).await.unwrap();
        store
            .hash_set(&keys.item_hash(TASK), &url_digest(url), "not json")
            .await
            .unwrap();

        let polled = scheduler.poll(TASK).await.unwrap().unwrap();
        assert_eq!(polled, Request::new(url));
    }

    #[tokio::test]
    async fn key_prefix_isolates_fleets() {
        let store = Arc::new(MemoryStore::new());
        let fleet_a = RedisScheduler::fifo(store.clone(), "a:");
        let fleet_b = RedisScheduler::fifo(store.clone(), "b:");
        let request = Request::new("http://a.example/1");

        assert!(fleet_a.push(&request, TASK).await.unwrap());
        assert!(fleet_b.push(&request, TASK).await.unwrap());

        assert_eq!(fleet_a.left_request_count(TASK).await.unwrap(), 1);
        assert_eq!(fleet_b.left_request_count(TASK).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn store_failure_on_push_surfaces_as_error() {
        let mut store = MockStore::new();
        store
            .expect_set_add()
            .returning(|_, _| Err(anyhow::anyhow!("connection refused")));

        let scheduler = RedisScheduler::fifo(Arc::new(store), "");
        let result = scheduler.push(&Request::new("http://a.example/1"), TASK).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn store_failure_on_poll_surfaces_as_error() {
        let mut store = MockStore::new();
        store
            .expect_zset_pop_max()
            .returning(|_| Err(anyhow::anyhow!("connection refused")));

        let scheduler = RedisScheduler::priority(Arc::new(store), "");

        assert!(scheduler.poll(TASK).await.is_err());
    }
}
