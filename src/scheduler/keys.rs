/// Store key naming for a task's scheduler structures
///
/// All keys share an optional deployment prefix so several fleets can share
/// one store. The `_zore` spelling in the zero-priority queue suffix is
/// historical and kept so existing deployments keep draining their queues.
#[derive(Debug, Clone)]
pub struct KeySpace {
    prefix: String,
}

impl KeySpace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Set of every URL ever accepted for the task
    pub fn dedup_set(&self, task: &str) -> String {
        format!("{}set_{}", self.prefix, task)
    }

    /// FIFO queue used by the base scheduling policy
    pub fn queue(&self, task: &str) -> String {
        format!("{}queue_{}", self.prefix, task)
    }

    /// Hash of serialized requests, keyed by URL digest
    pub fn item_hash(&self, task: &str) -> String {
        format!("{}item_{}", self.prefix, task)
    }

    /// Sorted set holding positive-priority URLs
    pub fn plus_zset(&self, task: &str) -> String {
        format!("{}zset_{}_plus", self.prefix, task)
    }

    /// FIFO queue holding zero-priority URLs under the priority policy
    pub fn zero_queue(&self, task: &str) -> String {
        format!("{}queue_{}_zore", self.prefix, task)
    }

    /// Sorted set holding negative-priority URLs
    pub fn minus_zset(&self, task: &str) -> String {
        format!("{}zset_{}_minus", self.prefix, task)
    }
}
