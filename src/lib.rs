pub mod cli;
pub mod monitor;
pub mod scheduler;
pub mod store;
pub mod utils;

// Re-export common types
pub use monitor::SchedulerMonitor;
pub use scheduler::request::{Request, RequestBody};
pub use scheduler::{RedisScheduler, TierPolicy};
pub use store::{MemoryStore, RedisStore, Store, StoreFactory};
