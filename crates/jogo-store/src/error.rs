use thiserror::Error;

/// Coordination Store errors, with CAS outcomes distinguished from backend
/// failures (SPEC_FULL.md §4.1: "distinguished insufficient vs contended
/// return").
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("adjustment would drive packs_remaining below zero")]
    Insufficient,

    #[error("CAS retry budget exhausted under concurrent contention")]
    Contention,

    #[error("coordination store backend error: {0}")]
    Backend(String),

    #[error("failed to (de)serialize record: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Backend(err.to_string())
    }
}
