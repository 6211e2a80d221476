use thiserror::Error;

#[derive(Debug, Error)]
pub enum LatencyError {
    #[error("udp probe timed out")]
    Timeout,

    #[error("udp probe failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("udp probe failed: {0}")]
    Other(String),
}
