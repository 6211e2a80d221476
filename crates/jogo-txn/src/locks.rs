use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-player mutex registry serializing inventory reads-then-writes during
/// decide application. The Coordination Store only guarantees linearizable
/// *single-key* writes (spec.md §4.1) — a trade touching two inventories, or
/// two racing trades touching the same one, still needs an application-level
/// guard against a lost update between `get_inventory` and `set_inventory`.
#[derive(Default)]
pub struct PlayerLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl PlayerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, player_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(player_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub async fn lock_one(&self, player_id: &str) -> OwnedMutexGuard<()> {
        self.handle(player_id).lock_owned().await
    }

    /// Locks both players in lexical order regardless of call-site order, so
    /// two concurrent trades touching the same pair from opposite directions
    /// never deadlock. Assumes `a != b` — trade_cards rejects a player
    /// trading with themselves during prepare.
    pub async fn lock_pair(&self, a: &str, b: &str) -> (OwnedMutexGuard<()>, OwnedMutexGuard<()>) {
        debug_assert_ne!(a, b, "trade_cards requires two distinct players");
        if a < b {
            let guard_a = self.lock_one(a).await;
            let guard_b = self.lock_one(b).await;
            (guard_a, guard_b)
        } else {
            let guard_b = self.lock_one(b).await;
            let guard_a = self.lock_one(a).await;
            (guard_a, guard_b)
        }
    }
}
