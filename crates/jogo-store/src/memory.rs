use std::collections::HashMap;

use async_trait::async_trait;
use jogo_core::{GlobalStock, Inventory, Transaction};
use parking_lot::Mutex;

use crate::error::StoreError;
use crate::store::CoordinationStore;

/// In-process Coordination Store backed by lock-guarded `HashMap`s, in the
/// style of `bleep-core::mempool::Mempool`. Used in tests and single-process
/// demos; gives every participant exactly the behaviour a shared Redis
/// instance would, minus the network hop.
pub struct MemoryStore {
    stock: Mutex<GlobalStock>,
    inventories: Mutex<HashMap<String, Inventory>>,
    transactions: Mutex<HashMap<String, Transaction>>,
    published: Mutex<Vec<(String, serde_json::Value)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            stock: Mutex::new(GlobalStock::initial()),
            inventories: Mutex::new(HashMap::new()),
            transactions: Mutex::new(HashMap::new()),
            published: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of everything published so far, for assertions in tests.
    pub fn published_events(&self) -> Vec<(String, serde_json::Value)> {
        self.published.lock().clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CoordinationStore for MemoryStore {
    async fn get_stock(&self) -> Result<GlobalStock, StoreError> {
        Ok(*self.stock.lock())
    }

    async fn atomic_adjust_stock(&self, delta: i64) -> Result<(), StoreError> {
        let mut stock = self.stock.lock();
        if !stock.can_adjust(delta) {
            return Err(StoreError::Insufficient);
        }
        stock.packs_remaining = (stock.packs_remaining as i64 + delta) as u64;
        Ok(())
    }

    async fn get_inventory(&self, player_id: &str) -> Result<Option<Inventory>, StoreError> {
        Ok(self.inventories.lock().get(player_id).cloned())
    }

    async fn set_inventory(&self, inventory: Inventory) -> Result<(), StoreError> {
        self.inventories
            .lock()
            .insert(inventory.player_id.clone(), inventory);
        Ok(())
    }

    async fn compare_and_set_inventory(
        &self,
        expected_token: u64,
        inventory: Inventory,
    ) -> Result<bool, StoreError> {
        let mut inventories = self.inventories.lock();
        let current_token = inventories.get(&inventory.player_id).map(|inv| inv.lock_token);
        let matches = match current_token {
            Some(token) => token == expected_token,
            None => expected_token == 0,
        };
        if !matches {
            return Ok(false);
        }
        inventories.insert(inventory.player_id.clone(), inventory);
        Ok(true)
    }

    async fn get_transaction(&self, tx_id: &str) -> Result<Option<Transaction>, StoreError> {
        Ok(self.transactions.lock().get(tx_id).cloned())
    }

    async fn set_transaction(&self, transaction: Transaction) -> Result<(), StoreError> {
        self.transactions
            .lock()
            .insert(transaction.tx_id.clone(), transaction);
        Ok(())
    }

    async fn remove_transaction(&self, tx_id: &str) -> Result<(), StoreError> {
        self.transactions.lock().remove(tx_id);
        Ok(())
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>, StoreError> {
        Ok(self.transactions.lock().values().cloned().collect())
    }

    async fn publish(&self, channel: &str, payload: &serde_json::Value) -> Result<(), StoreError> {
        self.published
            .lock()
            .push((channel.to_string(), payload.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn atomic_adjust_stock_rejects_negative_overshoot() {
        let store = MemoryStore::new();
        let remaining = store.get_stock().await.unwrap().packs_remaining;
        let err = store
            .atomic_adjust_stock(-(remaining as i64) - 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Insufficient));
    }

    #[tokio::test]
    async fn atomic_adjust_stock_applies_within_bounds() {
        let store = MemoryStore::new();
        store.atomic_adjust_stock(-3).await.unwrap();
        assert_eq!(
            store.get_stock().await.unwrap().packs_remaining,
            GlobalStock::initial().packs_remaining - 3
        );
    }

    #[tokio::test]
    async fn set_then_get_inventory_round_trips() {
        let store = MemoryStore::new();
        let inv = Inventory::new("jogador-1".to_string());
        store.set_inventory(inv.clone()).await.unwrap();
        let fetched = store.get_inventory("jogador-1").await.unwrap().unwrap();
        assert_eq!(fetched.player_id, inv.player_id);
    }

    #[tokio::test]
    async fn missing_transaction_is_none() {
        let store = MemoryStore::new();
        assert!(store.get_transaction("nope").await.unwrap().is_none());
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(32))]
        #[test]
        fn atomic_adjust_stock_never_goes_negative(deltas in proptest::collection::vec(-5i64..5, 1..20)) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let store = MemoryStore::new();
                for delta in deltas {
                    let before = store.get_stock().await.unwrap().packs_remaining;
                    match store.atomic_adjust_stock(delta).await {
                        Ok(()) => {
                            let after = store.get_stock().await.unwrap().packs_remaining;
                            assert_eq!(after as i64, before as i64 + delta);
                        }
                        Err(StoreError::Insufficient) => {
                            let after = store.get_stock().await.unwrap().packs_remaining;
                            assert_eq!(after, before, "a rejected adjustment must not mutate stock");
                        }
                        Err(other) => panic!("unexpected error: {other}"),
                    }
                }
            });
        }
    }
}
