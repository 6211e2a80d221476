use async_trait::async_trait;
use jogo_core::{GlobalStock, Inventory, Transaction};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::StoreError;
use crate::keys::{inventory_key, transaction_key, STOCK_KEY};
use crate::store::CoordinationStore;

/// Default CAS retry budget. `servico_coordenacao.py`'s
/// `decrementar_estoque_atomico` retries on `WatchError` forever; we bound it
/// so a pathologically contended stock key fails loudly instead of hanging a
/// request forever (SPEC_FULL.md §4.1 deviation).
const DEFAULT_CAS_ATTEMPTS: u32 = 10;

/// Redis-backed Coordination Store. `manager` is one multiplexed
/// `ConnectionManager` per process, shared across requests, for plain
/// single-command ops — it reconnects transparently, so callers never see a
/// dead-connection error, only `StoreError::Backend` for genuine command
/// failures.
///
/// `client` is kept alongside it to hand every CAS operation
/// (`atomic_adjust_stock`, `compare_and_set_inventory`) a fresh, dedicated
/// connection for its `WATCH`→`EXEC` span. `WATCH`/`MULTI`/`EXEC` state is
/// per-connection: on the shared multiplexed connection, one task's `EXEC`
/// implicitly `UNWATCH`es keys a different concurrent task `WATCH`ed moments
/// earlier on that same connection, letting the second `EXEC` succeed
/// unconditionally against an empty watch set and silently clobber the
/// first task's write. `servico_coordenacao.py` avoids this by checking out
/// a dedicated connection (`redis_client.pipeline()`) per transaction; a
/// one-shot `get_async_connection()` per call is the equivalent here.
pub struct RedisStore {
    client: redis::Client,
    manager: ConnectionManager,
    cas_attempts: u32,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let manager = client.get_connection_manager().await?;
        Ok(RedisStore {
            client,
            manager,
            cas_attempts: DEFAULT_CAS_ATTEMPTS,
        })
    }

    pub fn with_cas_attempts(mut self, attempts: u32) -> Self {
        self.cas_attempts = attempts;
        self
    }
}

#[async_trait]
impl CoordinationStore for RedisStore {
    async fn get_stock(&self) -> Result<GlobalStock, StoreError> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = conn.get(STOCK_KEY).await?;
        Ok(match raw {
            Some(raw) => serde_json::from_str(&raw)?,
            None => GlobalStock::initial(),
        })
    }

    async fn atomic_adjust_stock(&self, delta: i64) -> Result<(), StoreError> {
        for _attempt in 0..self.cas_attempts {
            // A dedicated connection per attempt: WATCH/MULTI/EXEC state is
            // per-connection, so sharing one across concurrent callers would
            // let one caller's EXEC silently UNWATCH another's key.
            let mut conn = self.client.get_async_connection().await?;

            redis::cmd("WATCH")
                .arg(STOCK_KEY)
                .query_async::<_, ()>(&mut conn)
                .await?;

            let raw: Option<String> = conn.get(STOCK_KEY).await?;
            let stock: GlobalStock = match raw {
                Some(raw) => serde_json::from_str(&raw)?,
                None => GlobalStock::initial(),
            };

            if !stock.can_adjust(delta) {
                redis::cmd("UNWATCH").query_async::<_, ()>(&mut conn).await?;
                return Err(StoreError::Insufficient);
            }

            let updated = GlobalStock {
                packs_remaining: (stock.packs_remaining as i64 + delta) as u64,
            };
            let encoded = serde_json::to_string(&updated)?;

            let mut pipe = redis::pipe();
            pipe.atomic().set(STOCK_KEY, encoded);

            // `EXEC` on a MULTI whose watched key changed underneath it
            // returns Nil, which the redis crate surfaces as `None` here
            // rather than an error — that is the signal to retry, not a bug.
            let result: Option<Vec<()>> = pipe.query_async(&mut conn).await?;
            if result.is_some() {
                return Ok(());
            }
        }

        Err(StoreError::Contention)
    }

    async fn get_inventory(&self, player_id: &str) -> Result<Option<Inventory>, StoreError> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = conn.get(inventory_key(player_id)).await?;
        Ok(match raw {
            Some(raw) => Some(serde_json::from_str(&raw)?),
            None => None,
        })
    }

    async fn set_inventory(&self, inventory: Inventory) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        let encoded = serde_json::to_string(&inventory)?;
        conn.set(inventory_key(&inventory.player_id), encoded)
            .await?;
        Ok(())
    }

    async fn compare_and_set_inventory(
        &self,
        expected_token: u64,
        inventory: Inventory,
    ) -> Result<bool, StoreError> {
        // Same reasoning as `atomic_adjust_stock`: this WATCH/GET/EXEC span
        // needs a connection no other concurrent caller can touch.
        let mut conn = self.client.get_async_connection().await?;
        let key = inventory_key(&inventory.player_id);

        redis::cmd("WATCH").arg(&key).query_async::<_, ()>(&mut conn).await?;

        let raw: Option<String> = conn.get(&key).await?;
        let current_token = match &raw {
            Some(raw) => serde_json::from_str::<Inventory>(raw)?.lock_token,
            None => 0,
        };

        if current_token != expected_token {
            redis::cmd("UNWATCH").query_async::<_, ()>(&mut conn).await?;
            return Ok(false);
        }

        let encoded = serde_json::to_string(&inventory)?;
        let mut pipe = redis::pipe();
        pipe.atomic().set(&key, encoded);
        let result: Option<Vec<()>> = pipe.query_async(&mut conn).await?;
        Ok(result.is_some())
    }

    async fn get_transaction(&self, tx_id: &str) -> Result<Option<Transaction>, StoreError> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = conn.get(transaction_key(tx_id)).await?;
        Ok(match raw {
            Some(raw) => Some(serde_json::from_str(&raw)?),
            None => None,
        })
    }

    async fn set_transaction(&self, transaction: Transaction) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        let encoded = serde_json::to_string(&transaction)?;
        conn.set(transaction_key(&transaction.tx_id), encoded)
            .await?;
        Ok(())
    }

    async fn remove_transaction(&self, tx_id: &str) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        conn.del(transaction_key(tx_id)).await?;
        Ok(())
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>, StoreError> {
        let mut conn = self.manager.clone();
        let keys: Vec<String> = conn.keys("transacao_2pc:*").await?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<Option<String>> = conn.get(keys).await?;
        raw.into_iter()
            .flatten()
            .map(|raw| serde_json::from_str(&raw).map_err(StoreError::from))
            .collect()
    }

    async fn publish(&self, channel: &str, payload: &serde_json::Value) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        let encoded = serde_json::to_string(payload)?;
        let _subscribers: i64 = conn.publish(channel, encoded).await?;
        Ok(())
    }
}
