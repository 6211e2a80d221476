use dashmap::{DashMap, DashSet};
use jogo_core::{Transaction, TransactionStatus};

/// In-memory cache of Transaction records this node has seen, whether as
/// coordinator or participant. Never the source of truth — the
/// Coordination Store is — but lets the recovery sweeper find candidates
/// without scanning the whole CS on every tick (spec.md §5: "in-memory
/// per-node maps... are caches only; truth is in CS").
///
/// Named after, and structurally mirroring, `CoordinatorManager` in
/// `cross_shard_2pc.rs`, simplified: we don't need block-height-driven
/// timeout sweeps here, just a PREPARING-status scan on a wall-clock tick.
#[derive(Default)]
pub struct TransactionLedger {
    entries: DashMap<String, Transaction>,
    /// `tx_id`s whose decide side effects have been claimed by some caller.
    /// `handle_decide` (an incoming `commit_abort` POST) and `recover_once`
    /// (the sweeper replaying from `preparing_ids`) can both reach the same
    /// still-cached `tx_id` concurrently — this set makes the race a single
    /// winner instead of a double apply (spec.md §8 "idempotent decide").
    /// Entries are never removed: a `tx_id` is a one-shot UUID, so once its
    /// decide has been claimed there is nothing left for this node to retry
    /// locally — any remaining divergence is recovered from the CS record,
    /// not replayed again here.
    claimed: DashSet<String>,
}

impl TransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, tx: Transaction) {
        self.entries.insert(tx.tx_id.clone(), tx);
    }

    pub fn get(&self, tx_id: &str) -> Option<Transaction> {
        self.entries.get(tx_id).map(|entry| entry.clone())
    }

    pub fn forget(&self, tx_id: &str) {
        self.entries.remove(tx_id);
    }

    /// Atomically claims `tx_id` for decide application. Returns `true` only
    /// for the first caller; a second concurrent caller — `handle_decide`
    /// racing the recovery sweeper on the same `tx_id` — gets `false` and
    /// must treat the decide as already being applied elsewhere, rather than
    /// re-running store mutations that are not all naturally idempotent
    /// (e.g. the abort-side relative stock release).
    pub fn claim_decide(&self, tx_id: &str) -> bool {
        self.claimed.insert(tx_id.to_string())
    }

    /// `tx_id`s this node still believes are in flight, oldest registration
    /// first is not tracked — order is incidental, the sweeper treats each
    /// independently.
    pub fn preparing_ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.value().status == TransactionStatus::Preparing)
            .map(|entry| entry.key().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jogo_core::TransactionPayload;

    fn sample_tx(tx_id: &str) -> Transaction {
        Transaction {
            tx_id: tx_id.to_string(),
            coordinator_url: "http://n1".to_string(),
            status: TransactionStatus::Preparing,
            payload: TransactionPayload::OpenPack {
                player_id: "p1".into(),
                quantity: 1,
                packs_available_before: 1,
            },
        }
    }

    #[test]
    fn records_and_forgets_roundtrip() {
        let ledger = TransactionLedger::new();
        ledger.record(sample_tx("tx-1"));
        assert!(ledger.get("tx-1").is_some());
        assert_eq!(ledger.preparing_ids(), vec!["tx-1".to_string()]);

        ledger.forget("tx-1");
        assert!(ledger.get("tx-1").is_none());
    }

    #[test]
    fn preparing_ids_excludes_terminal_transactions() {
        let ledger = TransactionLedger::new();
        let mut committed = sample_tx("tx-2");
        committed.status = TransactionStatus::Committed;
        ledger.record(committed);
        assert!(ledger.preparing_ids().is_empty());
    }
}
