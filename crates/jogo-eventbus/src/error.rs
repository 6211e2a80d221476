use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("event bus redis connection failed: {0}")]
    Redis(#[from] redis::RedisError),
}
