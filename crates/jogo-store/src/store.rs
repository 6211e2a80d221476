use async_trait::async_trait;
use jogo_core::{GlobalStock, Inventory, Transaction};

use crate::error::StoreError;

/// Single source of truth for global stock, per-player inventories and the
/// durable transaction log, plus the cross-node pub/sub primitive.
///
/// Mirrors the seam `ConsensusEngine` occupies in a consensus engine: callers
/// (the transaction engine, in our case) never touch Redis directly, so a
/// `MemoryStore` can stand in during tests without any behavioural surprise.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    async fn get_stock(&self) -> Result<GlobalStock, StoreError>;

    /// Atomically adjusts `packs_remaining` by `delta`, failing with
    /// `StoreError::Insufficient` rather than going negative. `delta` is
    /// negative for a reservation, positive for a release on abort.
    async fn atomic_adjust_stock(&self, delta: i64) -> Result<(), StoreError>;

    async fn get_inventory(&self, player_id: &str) -> Result<Option<Inventory>, StoreError>;

    async fn set_inventory(&self, inventory: Inventory) -> Result<(), StoreError>;

    /// Writes `inventory` only if the record currently stored for
    /// `inventory.player_id` still carries `expected_token` as its
    /// `lock_token` (or is absent and `expected_token == 0`). Returns
    /// `false` on a token mismatch instead of erroring — the caller
    /// (`trade_cards` decide) re-reads and retries, which is what resolves
    /// the concurrent-trade race in spec.md §9 Open Question 3: two trades
    /// racing on the same card can no longer both believe they applied the
    /// swap, because only one's expected token survives to the write.
    async fn compare_and_set_inventory(
        &self,
        expected_token: u64,
        inventory: Inventory,
    ) -> Result<bool, StoreError>;

    async fn get_transaction(&self, tx_id: &str) -> Result<Option<Transaction>, StoreError>;

    async fn set_transaction(&self, transaction: Transaction) -> Result<(), StoreError>;

    async fn remove_transaction(&self, tx_id: &str) -> Result<(), StoreError>;

    /// Every in-flight transaction record, used by the recovery sweeper to
    /// find PREPARING transactions that outlived their coordinator.
    async fn list_transactions(&self) -> Result<Vec<Transaction>, StoreError>;

    async fn publish(&self, channel: &str, payload: &serde_json::Value) -> Result<(), StoreError>;
}
