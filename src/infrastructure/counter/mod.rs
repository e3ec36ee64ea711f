//! Counter store implementations

mod in_memory;
mod redis;

pub use in_memory::InMemoryCounterStore;
pub use redis::{RedisCounterStore, RedisCounterStoreConfig};
