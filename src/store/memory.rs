use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::sync::Mutex;

use crate::store::Store;

/// In-process implementation of the Store trait
///
/// Backs single-node deployments and tests where running a Redis server is
/// not worth it. Semantics mirror the Redis implementation, including the
/// pop-max tie-break: among equal scores the lexicographically greatest
/// member pops first.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    lists: HashMap<String, VecDeque<String>>,
    sets: HashMap<String, HashSet<String>>,
    zsets: HashMap<String, HashMap<String, i64>>,
    hashes: HashMap<String, HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_push(&self, key: &str, value: &str) -> Result<()> {
        let mut tables = self.inner.lock().await;
        tables
            .lists
            .entry(key.to_string())
            .or_default()
            .push_back(value.to_string());
        Ok(())
    }

    async fn list_pop(&self, key: &str) -> Result<Option<String>> {
        let mut tables = self.inner.lock().await;
        Ok(tables.lists.get_mut(key).and_then(VecDeque::pop_front))
    }

    async fn list_len(&self, key: &str) -> Result<u64> {
        let tables = self.inner.lock().await;
        Ok(tables.lists.get(key).map_or(0, |l| l.len() as u64))
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool> {
        let mut tables = self.inner.lock().await;
        Ok(tables
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    async fn set_len(&self, key: &str) -> Result<u64> {
        let tables = self.inner.lock().await;
        Ok(tables.sets.get(key).map_or(0, |s| s.len() as u64))
    }

    async fn zset_add(&self, key: &str, member: &str, score: i64) -> Result<()> {
        let mut tables = self.inner.lock().await;
        tables
            .zsets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string(), score);
        Ok(())
    }

    async fn zset_pop_max(&self, key: &str) -> Result<Option<String>> {
        let mut tables = self.inner.lock().await;

        let Some(zset) = tables.zsets.get_mut(key) else {
            return Ok(None);
        };

        let best = zset
            .iter()
            .max_by(|(ma, sa), (mb, sb)| sa.cmp(sb).then_with(|| ma.cmp(mb)))
            .map(|(member, _)| member.clone());

        if let Some(member) = &best {
            zset.remove(member);
        }

        Ok(best)
    }

    async fn zset_len(&self, key: &str) -> Result<u64> {
        let tables = self.inner.lock().await;
        Ok(tables.zsets.get(key).map_or(0, |z| z.len() as u64))
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<()> {
        let mut tables = self.inner.lock().await;
        tables
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>> {
        let tables = self.inner.lock().await;
        Ok(tables
            .hashes
            .get(key)
            .and_then(|h| h.get(field))
            .cloned())
    }

    async fn hash_del(&self, key: &str, field: &str) -> Result<()> {
        let mut tables = self.inner.lock().await;
        if let Some(hash) = tables.hashes.get_mut(key) {
            hash.remove(field);
        }
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut tables = self.inner.lock().await;
        tables.lists.remove(key);
        tables.sets.remove(key);
        tables.zsets.remove(key);
        tables.hashes.remove(key);
        Ok(())
    }
}
