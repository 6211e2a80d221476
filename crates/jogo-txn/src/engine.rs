use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use jogo_core::{
    mint_pack, Decision, DecisionMessage, DomainError, Transaction, TransactionPayload,
    TransactionStatus, Vote, VoteMessage,
};
use jogo_store::{CoordinationStore, StoreError};
use tracing::{debug, error, info, instrument, warn};

use crate::error::TxnError;
use crate::ledger::TransactionLedger;
use crate::locks::PlayerLocks;
use crate::peer::PeerTransport;

/// Bounded retry budget for the inventory CAS loop in `apply_decide_trade`
/// (spec.md §9: "a single primitive with a bounded retry budget").
const MAX_TRADE_CAS_ATTEMPTS: u32 = 5;

/// The 2PC state machine: coordinator for locally-originated requests,
/// participant for every request (including its own, via the same code
/// path). Grounded on `TwoPhaseCommitCoordinator` in `cross_shard_2pc.rs`,
/// generalized from a fixed shard set to a fixed peer-server list and from
/// block-height timeouts to wall-clock ones.
pub struct TransactionEngine {
    self_url: String,
    /// Full static participant list, INCLUDING `self_url`, in the
    /// configured order — iteration order is deterministic (spec.md §4.2.1).
    peer_urls: Vec<String>,
    store: Arc<dyn CoordinationStore>,
    transport: Arc<dyn PeerTransport>,
    ledger: TransactionLedger,
    player_locks: PlayerLocks,
}

impl TransactionEngine {
    pub fn new(
        self_url: impl Into<String>,
        peer_urls: Vec<String>,
        store: Arc<dyn CoordinationStore>,
        transport: Arc<dyn PeerTransport>,
    ) -> Self {
        TransactionEngine {
            self_url: self_url.into(),
            peer_urls,
            store,
            transport,
            ledger: TransactionLedger::new(),
            player_locks: PlayerLocks::new(),
        }
    }

    pub fn self_url(&self) -> &str {
        &self.self_url
    }

    pub fn peer_urls(&self) -> &[String] {
        &self.peer_urls
    }

    fn vote(&self, tx: &Transaction, vote: Vote, message: Option<String>) -> VoteMessage {
        VoteMessage {
            tx_id: tx.tx_id.clone(),
            server_url: self.self_url.clone(),
            vote,
            message,
        }
    }

    // ---- Coordinator entry points --------------------------------------

    /// Drives `open_pack` as coordinator (spec.md §4.2.1, §4.2.2). The pack
    /// reservation and the player's local `packs_available` consumption
    /// happen here, eagerly, before any peer is contacted — they are
    /// strictly local acts, not part of the global vote (spec.md §4.2.2,
    /// last paragraph).
    #[instrument(skip(self), fields(player_id = %player_id, quantity))]
    pub async fn open_pack(
        &self,
        player_id: &str,
        quantity: u32,
    ) -> Result<jogo_core::Inventory, TxnError> {
        let guard = self.player_locks.lock_one(player_id).await;

        let mut inventory = self
            .store
            .get_inventory(player_id)
            .await?
            .ok_or_else(|| DomainError::UnknownPlayer(player_id.to_string()))?;

        if inventory.packs_available == 0 {
            return Err(DomainError::NoPacksAvailable(player_id.to_string()).into());
        }

        self.store
            .atomic_adjust_stock(-(quantity as i64))
            .await
            .map_err(|err| match err {
                StoreError::Insufficient => TxnError::Domain(DomainError::InsufficientStock),
                other => TxnError::Store(other),
            })?;

        let packs_available_before = inventory.packs_available;
        inventory.packs_available -= 1;
        inventory.touch();
        self.store.set_inventory(inventory).await?;
        drop(guard);

        let payload = TransactionPayload::OpenPack {
            player_id: player_id.to_string(),
            quantity,
            packs_available_before,
        };
        let tx = Transaction::new(self.self_url.clone(), payload);
        self.store.set_transaction(tx.clone()).await?;
        self.ledger.record(tx.clone());

        let decision = self.drive_prepare_phase(&tx).await?;
        self.drive_decide_phase(&tx, decision).await;

        match decision {
            Decision::Commit => {
                info!(tx_id = %tx.tx_id, "open_pack committed");
                self.store
                    .get_inventory(player_id)
                    .await?
                    .ok_or_else(|| TxnError::UnknownTransaction(tx.tx_id.clone()))
            }
            Decision::Abort => {
                warn!(tx_id = %tx.tx_id, "open_pack aborted by peer vote");
                Err(TxnError::Aborted {
                    tx_id: tx.tx_id.clone(),
                    reason: "a participant voted VOTE_ABORT or was unreachable".to_string(),
                })
            }
        }
    }

    /// Drives `trade_cards` as coordinator (spec.md §4.2.1, §4.2.3). No
    /// local resource is reserved up front — the only precondition
    /// (card ownership) is checked symmetrically by every participant
    /// during prepare.
    #[instrument(skip(self), fields(player_a = %player_a, card_a = %card_a, player_b = %player_b, card_b = %card_b))]
    pub async fn trade_cards(
        &self,
        player_a: &str,
        card_a: &str,
        player_b: &str,
        card_b: &str,
    ) -> Result<(), TxnError> {
        let payload = TransactionPayload::TradeCards {
            player_a: player_a.to_string(),
            card_a: card_a.to_string(),
            player_b: player_b.to_string(),
            card_b: card_b.to_string(),
        };
        let tx = Transaction::new(self.self_url.clone(), payload);
        self.store.set_transaction(tx.clone()).await?;
        self.ledger.record(tx.clone());

        let decision = self.drive_prepare_phase(&tx).await?;
        self.drive_decide_phase(&tx, decision).await;

        match decision {
            Decision::Commit => {
                info!(tx_id = %tx.tx_id, "trade_cards committed");
                Ok(())
            }
            Decision::Abort => {
                warn!(tx_id = %tx.tx_id, "trade_cards aborted by peer vote");
                Err(TxnError::Aborted {
                    tx_id: tx.tx_id.clone(),
                    reason: "a participant voted VOTE_ABORT or was unreachable".to_string(),
                })
            }
        }
    }

    // ---- Phase 1: prepare ------------------------------------------------

    async fn drive_prepare_phase(&self, tx: &Transaction) -> Result<Decision, TxnError> {
        let votes = join_all(self.peer_urls.iter().map(|peer_url| {
            let tx = tx.clone();
            async move {
                if peer_url == &self.self_url {
                    self.local_prepare(&tx).await
                } else {
                    self.transport.send_prepare(peer_url, &tx).await
                }
            }
        }))
        .await;

        let decision = if votes.iter().all(|v| v.vote == Vote::Commit) {
            Decision::Commit
        } else {
            Decision::Abort
        };

        let mut persisted = tx.clone();
        persisted.status = match decision {
            Decision::Commit => TransactionStatus::Committed,
            Decision::Abort => TransactionStatus::Aborted,
        };
        self.store.set_transaction(persisted).await?;

        Ok(decision)
    }

    async fn local_prepare(&self, tx: &Transaction) -> VoteMessage {
        match &tx.payload {
            TransactionPayload::OpenPack { .. } => self.handle_prepare_open_pack(tx.clone()).await,
            TransactionPayload::TradeCards { .. } => self.handle_prepare_trade(tx.clone()).await,
        }
    }

    /// Participant prepare for `open_pack`. The reservation already
    /// happened once, at the coordinator, before this transaction was even
    /// built — every other participant's role is to witness and record the
    /// transaction locally (spec.md §4.2.2 parenthetical). A participant
    /// that cannot be reached at all never runs this; the coordinator
    /// treats the timeout as the NO vote instead.
    pub async fn handle_prepare_open_pack(&self, tx: Transaction) -> VoteMessage {
        self.ledger.record(tx.clone());
        self.vote(&tx, Vote::Commit, None)
    }

    /// Participant prepare for `trade_cards`: verify both named cards are
    /// still held by their claimed owners (spec.md §4.2.3).
    pub async fn handle_prepare_trade(&self, tx: Transaction) -> VoteMessage {
        self.ledger.record(tx.clone());

        let (player_a, card_a, player_b, card_b) = match &tx.payload {
            TransactionPayload::TradeCards {
                player_a,
                card_a,
                player_b,
                card_b,
            } => (
                player_a.clone(),
                card_a.clone(),
                player_b.clone(),
                card_b.clone(),
            ),
            TransactionPayload::OpenPack { .. } => {
                return self.vote(
                    &tx,
                    Vote::Abort,
                    Some("malformed payload for troca_cartas".to_string()),
                )
            }
        };

        let holds_a = matches!(
            self.store.get_inventory(&player_a).await,
            Ok(Some(inv)) if inv.has_card(&card_a)
        );
        let holds_b = matches!(
            self.store.get_inventory(&player_b).await,
            Ok(Some(inv)) if inv.has_card(&card_b)
        );

        if !holds_a || !holds_b {
            return self.vote(
                &tx,
                Vote::Abort,
                Some(format!(
                    "card {card_a} or {card_b} is no longer held by its claimed owner"
                )),
            );
        }

        self.vote(&tx, Vote::Commit, None)
    }

    // ---- Phase 2: decide --------------------------------------------------

    async fn drive_decide_phase(&self, tx: &Transaction, decision: Decision) {
        let decision_msg = DecisionMessage {
            tx_id: tx.tx_id.clone(),
            server_url: self.self_url.clone(),
            decision,
        };

        let results = join_all(self.peer_urls.iter().map(|peer_url| {
            let decision_msg = decision_msg.clone();
            async move {
                if peer_url == &self.self_url {
                    self.apply_decide(tx, decision).await;
                    Ok(())
                } else {
                    self.transport.send_decision(peer_url, tx, &decision_msg).await
                }
            }
        }))
        .await;

        for (peer_url, result) in self.peer_urls.iter().zip(results) {
            if let Err(err) = result {
                // Not a protocol error: the peer recovers by reading the CS
                // record on its own sweep (spec.md §4.2.1 step 5).
                warn!(tx_id = %tx.tx_id, peer = %peer_url, error = %err, "decide delivery failed, peer will recover via CS sweep");
            }
        }

        self.store.remove_transaction(&tx.tx_id).await.ok();
        self.ledger.forget(&tx.tx_id);
    }

    /// Entry point for a peer-originated decide call (`POST
    /// .../commit_abort`), and for the recovery sweeper's replay. Reads the
    /// authoritative record from CS rather than trusting the caller's
    /// payload for anything beyond `tx_id`/`decision`, so the full operation
    /// payload is always the one the coordinator actually persisted.
    pub async fn handle_decide(&self, decision: DecisionMessage) -> Result<(), TxnError> {
        let tx = match self.store.get_transaction(&decision.tx_id).await? {
            Some(tx) => tx,
            None => {
                // Already applied and cleaned up by an earlier delivery, or
                // recovery already converged — idempotent no-op (spec.md §8).
                self.ledger.forget(&decision.tx_id);
                return Ok(());
            }
        };
        self.apply_decide(&tx, decision.decision).await;
        self.ledger.forget(&decision.tx_id);
        Ok(())
    }

    /// Gated on `TransactionLedger::claim_decide` so that `handle_decide`
    /// (an incoming decide delivery) and `recover_once` (the sweeper
    /// replaying the same still-cached `tx_id`) cannot both run these store
    /// mutations for the same transaction — the abort-side stock release in
    /// `apply_decide_open_pack` is a relative adjustment, not a set, so a
    /// second concurrent application would release the reservation twice
    /// (spec.md §4.2.2, §8 "idempotent decide").
    async fn apply_decide(&self, tx: &Transaction, decision: Decision) {
        if !self.ledger.claim_decide(&tx.tx_id) {
            debug!(tx_id = %tx.tx_id, "decide already claimed by a concurrent delivery, skipping");
            return;
        }
        match &tx.payload {
            TransactionPayload::OpenPack {
                player_id,
                quantity,
                packs_available_before,
            } => {
                self.apply_decide_open_pack(tx, decision, player_id, *quantity, *packs_available_before)
                    .await;
            }
            TransactionPayload::TradeCards {
                player_a,
                card_a,
                player_b,
                card_b,
            } => {
                self.apply_decide_trade(tx, decision, player_a, card_a, player_b, card_b)
                    .await;
            }
        }
    }

    /// Only the coordinator acts here — other participants only witnessed
    /// the vote (spec.md §4.2.2: "other participants do nothing on commit").
    /// Card minting is deterministic in `tx_id`, and cards already present
    /// are skipped on add, so a replayed commit (recovery, or a duplicate
    /// decide delivery) never duplicates a card.
    async fn apply_decide_open_pack(
        &self,
        tx: &Transaction,
        decision: Decision,
        player_id: &str,
        quantity: u32,
        packs_available_before: u32,
    ) {
        if tx.coordinator_url != self.self_url {
            return;
        }

        let _guard = self.player_locks.lock_one(player_id).await;

        match decision {
            Decision::Commit => {
                let inventory = match self.store.get_inventory(player_id).await {
                    Ok(Some(inv)) => inv,
                    Ok(None) => {
                        warn!(tx_id = %tx.tx_id, player_id, "commit skipped: inventory missing");
                        return;
                    }
                    Err(err) => {
                        error!(tx_id = %tx.tx_id, %err, "failed to read inventory for commit");
                        return;
                    }
                };
                let mut inventory = inventory;
                for card in mint_pack(&tx.tx_id, quantity) {
                    if !inventory.has_card(&card.card_id) {
                        inventory.add_card(card);
                    }
                }
                inventory.touch();
                if let Err(err) = self.store.set_inventory(inventory).await {
                    error!(tx_id = %tx.tx_id, %err, "failed to persist minted cards");
                }
            }
            Decision::Abort => {
                if let Err(err) = self.store.atomic_adjust_stock(quantity as i64).await {
                    error!(tx_id = %tx.tx_id, %err, "failed to release reserved stock");
                }
                match self.store.get_inventory(player_id).await {
                    Ok(Some(mut inventory)) => {
                        inventory.packs_available = packs_available_before;
                        inventory.touch();
                        if let Err(err) = self.store.set_inventory(inventory).await {
                            error!(tx_id = %tx.tx_id, %err, "failed to restore packs_available");
                        }
                    }
                    Ok(None) => {}
                    Err(err) => error!(tx_id = %tx.tx_id, %err, "failed to read inventory for abort"),
                }
            }
        }
    }

    /// Every participant that holds either inventory applies the swap; in
    /// this architecture the Coordination Store is shared, so every
    /// participant observes both. `player_locks` serializes concurrent
    /// applications on this node; the version-token CAS on each write
    /// (spec.md §9 Open Question 3) is what protects against the same race
    /// across two different node processes, where no in-memory lock is
    /// shared. The presence check before mutating makes the whole operation
    /// idempotent: a replay, or the loser of a concurrent race on the same
    /// card (spec.md §8 Seed Scenario 4), finds nothing left to do and
    /// returns without effect (spec.md §4.2.3).
    async fn apply_decide_trade(
        &self,
        tx: &Transaction,
        decision: Decision,
        player_a: &str,
        card_a: &str,
        player_b: &str,
        card_b: &str,
    ) {
        if decision == Decision::Abort {
            return;
        }

        let (_guard_a, _guard_b) = self.player_locks.lock_pair(player_a, player_b).await;

        for attempt in 0..MAX_TRADE_CAS_ATTEMPTS {
            let inv_a = self.store.get_inventory(player_a).await;
            let inv_b = self.store.get_inventory(player_b).await;
            let (mut inv_a, mut inv_b) = match (inv_a, inv_b) {
                (Ok(Some(a)), Ok(Some(b))) => (a, b),
                _ => {
                    warn!(tx_id = %tx.tx_id, "trade commit skipped: an inventory is missing");
                    return;
                }
            };

            if !inv_a.has_card(card_a) || !inv_b.has_card(card_b) {
                // Already applied by a previous delivery, or the other side
                // of a concurrent race on this card already won.
                return;
            }

            let token_a = inv_a.lock_token;
            let token_b = inv_b.lock_token;

            let taken_a = inv_a.remove_card(card_a).expect("presence just checked above");
            let taken_b = inv_b.remove_card(card_b).expect("presence just checked above");
            inv_a.add_card(taken_b.clone());
            inv_b.add_card(taken_a.clone());
            inv_a.touch();
            inv_b.touch();

            let written_a = match self.store.compare_and_set_inventory(token_a, inv_a.clone()).await {
                Ok(written) => written,
                Err(err) => {
                    error!(tx_id = %tx.tx_id, %err, "failed to CAS-write inventory A during trade");
                    return;
                }
            };
            if !written_a {
                // Inventory A moved under us since we read it; retry fresh.
                continue;
            }

            let written_b = match self.store.compare_and_set_inventory(token_b, inv_b).await {
                Ok(written) => written,
                Err(err) => {
                    error!(tx_id = %tx.tx_id, %err, "failed to CAS-write inventory B during trade");
                    return;
                }
            };
            if written_b {
                return;
            }

            // Inventory B lost its race after A already committed; undo A's
            // half so the swap does not leave card_b duplicated in both
            // inventories, then retry from a fresh read on the next loop.
            warn!(tx_id = %tx.tx_id, "trade B-side CAS lost the race, compensating A-side write");
            let mut revert_a = inv_a;
            revert_a.remove_card(&taken_b.card_id);
            revert_a.add_card(taken_a);
            revert_a.touch();
            if let Err(err) = self.store.set_inventory(revert_a).await {
                error!(tx_id = %tx.tx_id, %err, "failed to compensate inventory A after a lost trade race");
                return;
            }
        }

        error!(tx_id = %tx.tx_id, attempts = MAX_TRADE_CAS_ATTEMPTS, "trade commit exhausted CAS retry budget");
    }

    // ---- Recovery ---------------------------------------------------------

    /// One sweep over locally-cached PREPARING transactions (spec.md
    /// §4.2.4). Grounded on `RecoveryOrchestrator::execute_recovery` in
    /// `cross_shard_recovery.rs`, simplified to the single retry policy
    /// spec.md calls for: re-read CS, replay decide if terminal, otherwise
    /// keep waiting.
    pub async fn recover_once(&self) {
        for tx_id in self.ledger.preparing_ids() {
            match self.store.get_transaction(&tx_id).await {
                Ok(Some(tx)) => match tx.status {
                    TransactionStatus::Preparing => {
                        // Coordinator still deciding, or unreachable. This is
                        // the standard 2PC blocking window (spec.md §4.2.4);
                        // there is no third party to break it.
                    }
                    TransactionStatus::Committed => {
                        info!(tx_id = %tx_id, "recovery: replaying commit");
                        self.apply_decide(&tx, Decision::Commit).await;
                        self.ledger.forget(&tx_id);
                    }
                    TransactionStatus::Aborted => {
                        info!(tx_id = %tx_id, "recovery: replaying abort");
                        self.apply_decide(&tx, Decision::Abort).await;
                        self.ledger.forget(&tx_id);
                    }
                },
                Ok(None) => {
                    // Coordinator already finished and cleaned up; we missed
                    // delivery but there is nothing left to converge on.
                    self.ledger.forget(&tx_id);
                }
                Err(err) => {
                    warn!(tx_id = %tx_id, %err, "recovery sweep failed to read transaction");
                }
            }
        }
    }

    /// Spawns the background sweeper task. Returned handle is owned by the
    /// caller (`src/bin/servidor.rs`) so it can be aborted on shutdown.
    pub fn spawn_recovery_sweeper(self: Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                self.recover_once().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use jogo_core::Inventory;
    use jogo_store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-process transport that calls peer engines directly, keyed by URL.
    /// Each "peer" is really just another `TransactionEngine` sharing the
    /// same `MemoryStore`, standing in for a cluster of nodes against one
    /// Redis in tests.
    struct LoopbackTransport {
        peers: dashmap::DashMap<String, Arc<TransactionEngine>>,
        dead: std::sync::Mutex<std::collections::HashSet<String>>,
    }

    impl LoopbackTransport {
        fn new() -> Self {
            LoopbackTransport {
                peers: dashmap::DashMap::new(),
                dead: std::sync::Mutex::new(std::collections::HashSet::new()),
            }
        }

        fn register(&self, url: &str, engine: Arc<TransactionEngine>) {
            self.peers.insert(url.to_string(), engine);
        }

        fn kill(&self, url: &str) {
            self.dead.lock().unwrap().insert(url.to_string());
        }
    }

    #[async_trait]
    impl PeerTransport for LoopbackTransport {
        async fn send_prepare(&self, peer_url: &str, tx: &Transaction) -> VoteMessage {
            if self.dead.lock().unwrap().contains(peer_url) {
                return VoteMessage {
                    tx_id: tx.tx_id.clone(),
                    server_url: peer_url.to_string(),
                    vote: Vote::Abort,
                    message: Some("unreachable".to_string()),
                };
            }
            let peer = self.peers.get(peer_url).expect("unknown peer").clone();
            peer.local_prepare(tx).await
        }

        async fn send_decision(
            &self,
            peer_url: &str,
            _tx: &Transaction,
            decision: &DecisionMessage,
        ) -> Result<(), TxnError> {
            if self.dead.lock().unwrap().contains(peer_url) {
                return Err(TxnError::PeerUnreachable {
                    peer: peer_url.to_string(),
                    source: "unreachable".to_string(),
                });
            }
            let peer = self.peers.get(peer_url).expect("unknown peer").clone();
            peer.handle_decide(decision.clone()).await
        }
    }

    fn build_cluster(urls: &[&str]) -> (Arc<MemoryStore>, Arc<LoopbackTransport>, Vec<Arc<TransactionEngine>>) {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(LoopbackTransport::new());
        let peer_urls: Vec<String> = urls.iter().map(|s| s.to_string()).collect();

        let mut engines = Vec::new();
        for url in urls {
            let engine = Arc::new(TransactionEngine::new(
                *url,
                peer_urls.clone(),
                store.clone() as Arc<dyn CoordinationStore>,
                transport.clone() as Arc<dyn PeerTransport>,
            ));
            transport.register(url, engine.clone());
            engines.push(engine);
        }
        (store, transport, engines)
    }

    #[tokio::test]
    async fn open_pack_commits_and_mints_three_cards_per_pack() {
        let (store, _transport, engines) = build_cluster(&["http://n1", "http://n2", "http://n3"]);
        store
            .set_inventory(Inventory::with_starting_pack("alice"))
            .await
            .unwrap();

        let inventory = engines[0].open_pack("alice", 1).await.unwrap();
        assert_eq!(inventory.cards.len(), 3);
        assert_eq!(inventory.packs_available, 0);
        assert_eq!(store.get_stock().await.unwrap().packs_remaining, 49);
    }

    #[tokio::test]
    async fn open_pack_without_packs_available_is_a_precondition_error() {
        let (store, _transport, engines) = build_cluster(&["http://n1", "http://n2"]);
        store.set_inventory(Inventory::new("bob")).await.unwrap();

        let err = engines[0].open_pack("bob", 1).await.unwrap_err();
        assert!(matches!(
            err,
            TxnError::Domain(DomainError::NoPacksAvailable(_))
        ));
    }

    #[tokio::test]
    async fn open_pack_aborts_and_restores_state_when_a_peer_is_unreachable() {
        let (store, transport, engines) = build_cluster(&["http://n1", "http://n2", "http://n3"]);
        store
            .set_inventory(Inventory::with_starting_pack("carol"))
            .await
            .unwrap();
        transport.kill("http://n3");

        let err = engines[0].open_pack("carol", 1).await.unwrap_err();
        assert!(matches!(err, TxnError::Aborted { .. }));

        let inventory = store.get_inventory("carol").await.unwrap().unwrap();
        assert_eq!(inventory.packs_available, 1, "pack quota must be restored");
        assert_eq!(inventory.cards.len(), 0);
        assert_eq!(
            store.get_stock().await.unwrap().packs_remaining,
            jogo_core::GlobalStock::initial().packs_remaining,
            "stock reservation must be released"
        );
    }

    #[tokio::test]
    async fn trade_cards_swaps_both_inventories() {
        let (store, _transport, engines) = build_cluster(&["http://n1", "http://n2"]);
        let mut alice = Inventory::new("alice");
        let card_a = jogo_core::mint_card("seed", 0);
        alice.add_card(card_a.clone());
        let mut bob = Inventory::new("bob");
        let card_b = jogo_core::mint_card("seed", 1);
        bob.add_card(card_b.clone());
        store.set_inventory(alice).await.unwrap();
        store.set_inventory(bob).await.unwrap();

        engines[0]
            .trade_cards("alice", &card_a.card_id, "bob", &card_b.card_id)
            .await
            .unwrap();

        let alice = store.get_inventory("alice").await.unwrap().unwrap();
        let bob = store.get_inventory("bob").await.unwrap().unwrap();
        assert!(alice.has_card(&card_b.card_id));
        assert!(!alice.has_card(&card_a.card_id));
        assert!(bob.has_card(&card_a.card_id));
        assert!(!bob.has_card(&card_b.card_id));
    }

    #[tokio::test]
    async fn trade_cards_aborts_when_card_is_absent() {
        let (store, _transport, engines) = build_cluster(&["http://n1", "http://n2"]);
        store.set_inventory(Inventory::new("alice")).await.unwrap();
        store.set_inventory(Inventory::new("bob")).await.unwrap();

        let err = engines[0]
            .trade_cards("alice", "CARTA-nope", "bob", "CARTA-nope-2")
            .await
            .unwrap_err();
        assert!(matches!(err, TxnError::Aborted { .. }));
    }

    #[tokio::test]
    async fn handle_decide_is_idempotent() {
        let (store, _transport, engines) = build_cluster(&["http://n1"]);
        store
            .set_inventory(Inventory::with_starting_pack("alice"))
            .await
            .unwrap();
        engines[0].open_pack("alice", 1).await.unwrap();
        let cards_after_first = store
            .get_inventory("alice")
            .await
            .unwrap()
            .unwrap()
            .cards
            .len();

        // Replaying a decide for a tx no longer in the CS must be a no-op,
        // not an error, and must not duplicate cards.
        let bogus = DecisionMessage {
            tx_id: "does-not-exist".to_string(),
            server_url: "http://n1".to_string(),
            decision: Decision::Commit,
        };
        engines[0].handle_decide(bogus).await.unwrap();
        assert_eq!(
            store
                .get_inventory("alice")
                .await
                .unwrap()
                .unwrap()
                .cards
                .len(),
            cards_after_first
        );
    }

    #[tokio::test]
    async fn oversell_stress_matches_seed_scenario_one() {
        let urls: Vec<String> = (0..5).map(|i| format!("http://n{i}")).collect();
        let url_refs: Vec<&str> = urls.iter().map(String::as_str).collect();
        let (store, _transport, engines) = build_cluster(&url_refs);

        for i in 0..60 {
            let player_id = format!("player-{i}");
            store
                .set_inventory(Inventory::with_starting_pack(&player_id))
                .await
                .unwrap();
        }

        let successes = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for i in 0..60 {
            let engine = engines[i % engines.len()].clone();
            let successes = successes.clone();
            handles.push(tokio::spawn(async move {
                let player_id = format!("player-{i}");
                if engine.open_pack(&player_id, 1).await.is_ok() {
                    successes.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(successes.load(Ordering::SeqCst), 50);
        assert_eq!(store.get_stock().await.unwrap().packs_remaining, 0);

        let mut total_cards = 0;
        for i in 0..60 {
            let inv = store
                .get_inventory(&format!("player-{i}"))
                .await
                .unwrap()
                .unwrap();
            total_cards += inv.cards.len();
        }
        assert_eq!(total_cards, 150);
    }

    /// Seed Scenario 4 (spec.md §8): two transactions both attempt to give
    /// away Alice's card to different recipients at the same time. Exactly
    /// one recipient ends up holding the card; Alice ends up holding
    /// neither the card nor a duplicate of anything.
    #[tokio::test]
    async fn concurrent_trade_race_on_the_same_card_resolves_to_exactly_one_winner() {
        let (store, _transport, engines) = build_cluster(&["http://n1", "http://n2", "http://n3"]);

        let mut alice = Inventory::new("alice");
        let contested = jogo_core::mint_card("seed", 0);
        alice.add_card(contested.clone());
        let mut carol = Inventory::new("carol");
        carol.add_card(jogo_core::mint_card("seed", 1));
        let mut dave = Inventory::new("dave");
        dave.add_card(jogo_core::mint_card("seed", 2));
        store.set_inventory(alice).await.unwrap();
        store.set_inventory(carol.clone()).await.unwrap();
        store.set_inventory(dave.clone()).await.unwrap();

        let engine_a = engines[0].clone();
        let engine_b = engines[1].clone();
        let card_id = contested.card_id.clone();
        let card_id_2 = contested.card_id.clone();
        let carol_card = carol.cards[0].card_id.clone();
        let dave_card = dave.cards[0].card_id.clone();

        let (result_1, result_2) = tokio::join!(
            tokio::spawn(
                async move { engine_a.trade_cards("alice", &card_id, "carol", &carol_card).await }
            ),
            tokio::spawn(
                async move { engine_b.trade_cards("alice", &card_id_2, "dave", &dave_card).await }
            ),
        );
        let result_1 = result_1.unwrap();
        let result_2 = result_2.unwrap();

        let alice = store.get_inventory("alice").await.unwrap().unwrap();
        let carol = store.get_inventory("carol").await.unwrap().unwrap();
        let dave = store.get_inventory("dave").await.unwrap().unwrap();

        assert!(!alice.has_card(&contested.card_id), "alice must no longer hold the contested card");
        let winner_count = [carol.has_card(&contested.card_id), dave.has_card(&contested.card_id)]
            .iter()
            .filter(|&&won| won)
            .count();
        assert_eq!(winner_count, 1, "exactly one recipient must end up with the card");

        // Whichever side actually landed the swap must have succeeded at
        // its own coordinator; 2PC votes for both transactions can both be
        // VOTE_COMMIT since the card is still present at prepare time for
        // both, but only one decide application may ever mutate state.
        assert!(result_1.is_ok() || result_2.is_ok());
    }

    /// `proptest`-based check that `trade_cards` never changes the total
    /// number of distinct cards in play, across any sequence of concurrent
    /// trade attempts touching a shared card pool (SPEC_FULL.md §8).
    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(16))]
        #[test]
        fn trade_preserves_total_card_cardinality(n_trades in 1usize..6) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let (store, _transport, engines) = build_cluster(&["http://n1", "http://n2"]);
                let mut alice = Inventory::new("alice");
                let mut bob = Inventory::new("bob");
                let mut card_ids = Vec::new();
                for i in 0..n_trades {
                    let card = jogo_core::mint_card("pt-seed", i as u64);
                    card_ids.push(card.card_id.clone());
                    if i % 2 == 0 {
                        alice.add_card(card);
                    } else {
                        bob.add_card(card);
                    }
                }
                store.set_inventory(alice).await.unwrap();
                store.set_inventory(bob).await.unwrap();

                for card_id in &card_ids {
                    // Attempt to trade every card from whichever side holds it;
                    // absent-card attempts abort harmlessly (spec.md §4.2.3).
                    let _ = engines[0].trade_cards("alice", card_id, "bob", card_id).await;
                }

                let alice_after = store.get_inventory("alice").await.unwrap().unwrap();
                let bob_after = store.get_inventory("bob").await.unwrap().unwrap();
                let total_after = alice_after.cards.len() + bob_after.cards.len();
                assert_eq!(total_after, card_ids.len());
            });
        }
    }

    /// `mockall`-based check that a CAS `Contention` error from the
    /// Coordination Store surfaces as `TxnError::Store`, never silently
    /// swallowed, when reserving stock for `open_pack` (SPEC_FULL.md §8).
    #[tokio::test]
    async fn open_pack_surfaces_store_contention_as_a_txn_error() {
        let mut mock_store = jogo_store::MockCoordinationStore::new();
        mock_store
            .expect_get_inventory()
            .returning(|_| Ok(Some(Inventory::with_starting_pack("alice"))));
        mock_store
            .expect_atomic_adjust_stock()
            .returning(|_| Err(StoreError::Contention));

        let store: Arc<dyn CoordinationStore> = Arc::new(mock_store);
        let transport = Arc::new(LoopbackTransport::new());
        let engine = Arc::new(TransactionEngine::new(
            "http://n1",
            vec!["http://n1".to_string()],
            store,
            transport.clone() as Arc<dyn PeerTransport>,
        ));
        transport.register("http://n1", engine.clone());

        let err = engine.open_pack("alice", 1).await.unwrap_err();
        assert!(matches!(err, TxnError::Store(StoreError::Contention)));
    }

    /// Regression for a maintainer-reported race: `handle_decide` (a
    /// `commit_abort` delivery) and a concurrent second delivery of the
    /// same decision for the same `tx_id` must not release the reserved
    /// stock twice on abort. `TransactionLedger::claim_decide` is what
    /// makes the loser a no-op (spec.md §4.2.2, §8).
    #[tokio::test]
    async fn concurrent_decide_delivery_releases_reserved_stock_exactly_once() {
        let (store, _transport, engines) = build_cluster(&["http://n1"]);
        let quantity = 1u32;

        // Simulate a reservation already taken out of stock before decide.
        store.atomic_adjust_stock(-(quantity as i64)).await.unwrap();
        let stock_before_release = store.get_stock().await.unwrap().packs_remaining;

        store
            .set_inventory(Inventory::with_starting_pack("alice"))
            .await
            .unwrap();
        store
            .set_transaction(Transaction {
                tx_id: "tx-abort-race".to_string(),
                coordinator_url: "http://n1".to_string(),
                status: TransactionStatus::Aborted,
                payload: TransactionPayload::OpenPack {
                    player_id: "alice".to_string(),
                    quantity,
                    packs_available_before: 1,
                },
            })
            .await
            .unwrap();

        let decision = DecisionMessage {
            tx_id: "tx-abort-race".to_string(),
            server_url: "http://n1".to_string(),
            decision: Decision::Abort,
        };

        let engine_a = engines[0].clone();
        let engine_b = engines[0].clone();
        let decision_a = decision.clone();
        let decision_b = decision.clone();
        let (r1, r2) = tokio::join!(
            tokio::spawn(async move { engine_a.handle_decide(decision_a).await }),
            tokio::spawn(async move { engine_b.handle_decide(decision_b).await }),
        );
        r1.unwrap().unwrap();
        r2.unwrap().unwrap();

        let stock_after = store.get_stock().await.unwrap().packs_remaining;
        assert_eq!(
            stock_after,
            stock_before_release + quantity as u64,
            "concurrent decide delivery must release the reservation exactly once"
        );
    }
}
