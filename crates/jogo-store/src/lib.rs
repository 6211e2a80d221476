//! Coordination Store: single source of truth for global pack stock,
//! per-player inventories and the durable 2PC transaction log, plus the
//! pub/sub primitive the Event Bus layers on top of (SPEC_FULL.md §4.1).

pub mod error;
pub mod keys;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use store::CoordinationStore;

#[cfg(any(test, feature = "test-utils"))]
pub use store::MockCoordinationStore;
