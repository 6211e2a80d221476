use thiserror::Error;

/// Domain errors a client-facing endpoint can surface, mirroring the
/// precondition/coordination-failure split in spec.md §7.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("player {0} is unknown")]
    UnknownPlayer(String),

    #[error("player {0} has no packs available to open")]
    NoPacksAvailable(String),

    #[error("player {player} does not hold card {card_id}")]
    CardAbsent { player: String, card_id: String },

    #[error("insufficient global stock")]
    InsufficientStock,

    #[error("2PC transaction aborted: {0}")]
    TransactionAborted(String),
}
