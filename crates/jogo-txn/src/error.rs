use jogo_core::DomainError;
use jogo_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the Transaction Engine, split along the taxonomy in
/// spec.md §7: precondition failures the client should see verbatim,
/// coordination failures that imply a guaranteed rollback, and store-level
/// failures bubbled up from the Coordination Store.
#[derive(Debug, Error)]
pub enum TxnError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// At least one participant voted `VOTE_ABORT` or was unreachable during
    /// prepare; the transaction is guaranteed rolled back.
    #[error("transaction {tx_id} aborted: {reason}")]
    Aborted { tx_id: String, reason: String },

    #[error("unknown transaction {0}")]
    UnknownTransaction(String),

    #[error("peer {peer} unreachable: {source}")]
    PeerUnreachable { peer: String, source: String },
}
