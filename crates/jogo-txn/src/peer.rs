use async_trait::async_trait;
use jogo_core::{DecisionMessage, Transaction, VoteMessage};

use crate::error::TxnError;

/// Outbound half of the RPC Mesh, from the Transaction Engine's point of
/// view. `jogo-rpc` provides the real `reqwest`-backed implementation; tests
/// use an in-process implementation that calls peer `TransactionEngine`s
/// directly, skipping the network entirely.
///
/// Keeping this as a trait (rather than `jogo-txn` depending on `jogo-rpc`
/// directly) avoids a dependency cycle: `jogo-rpc` depends on `jogo-txn` to
/// drive both the coordinator and participant request handlers.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Send a phase-1 prepare to `peer_url`. A network error or non-200
    /// reply should be translated by the implementation into a synthetic
    /// `VOTE_ABORT` — per spec.md §4.2.1, a timeout is indistinguishable
    /// from an explicit abort at tally time.
    async fn send_prepare(&self, peer_url: &str, tx: &Transaction) -> VoteMessage;

    /// Send a phase-2 decision to `peer_url`. `tx` is passed alongside the
    /// decision envelope only so an HTTP implementation can route to the
    /// operation-specific endpoint (spec.md §4.3 has a distinct
    /// `commit_abort` route per operation kind); it carries no information
    /// the peer should trust over what it reads back from the Coordination
    /// Store. Delivery failure is logged by the caller and never changes the
    /// decision (spec.md §4.2.1 step 5) — the peer recovers by reading the
    /// Coordination Store.
    async fn send_decision(
        &self,
        peer_url: &str,
        tx: &Transaction,
        decision: &DecisionMessage,
    ) -> Result<(), TxnError>;
}
