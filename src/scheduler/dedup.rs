use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

use crate::scheduler::keys::KeySpace;
use crate::scheduler::request::Request;
use crate::store::Store;

/// Fleet-wide duplicate suppression backed by a per-task set in the store
///
/// Membership is exact-string on the URL, so false positives are impossible.
/// The check-and-insert is a single atomic set-add, so an already-pushed URL
/// is never re-admitted regardless of how many workers race on it.
pub struct DuplicateRemover {
    store: Arc<dyn Store>,
    keys: KeySpace,
}

impl DuplicateRemover {
    pub fn new(store: Arc<dyn Store>, keys: KeySpace) -> Self {
        Self { store, keys }
    }

    /// Record the request's URL for the task and report whether it was
    /// already known. `true` means "already seen, reject".
    pub async fn is_duplicate(&self, request: &Request, task: &str) -> Result<bool> {
        let newly_added = self
            .store
            .set_add(&self.keys.dedup_set(task), &request.url)
            .await
            .context("Failed to update dedup set")?;

        Ok(!newly_added)
    }

    /// Clear the task's dedup set, re-admitting every URL as fresh
    pub async fn reset(&self, task: &str) -> Result<()> {
        self.store
            .del(&self.keys.dedup_set(task))
            .await
            .context("Failed to clear dedup set")?;

        debug!("Cleared dedup set for task: {}", task);

        Ok(())
    }

    /// Number of distinct URLs ever accepted for the task
    pub async fn total_count(&self, task: &str) -> Result<u64> {
        self.store
            .set_len(&self.keys.dedup_set(task))
            .await
            .context("Failed to get dedup set size")
    }
}
