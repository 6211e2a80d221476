use std::sync::Arc;

use futures::StreamExt;
use jogo_store::CoordinationStore;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::channels::{GENERAL_EVENTS, MATCH_EVENTS_PATTERN, PLAYER_NOTIFICATIONS_PATTERN};
use crate::error::EventBusError;

/// Default bound for the local broadcast channel. A slow subscriber lags
/// and drops old events rather than ever blocking a publisher — matching
/// spec.md §4.4's "delivery is at-most-once; consumers must be idempotent".
const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct BusEvent {
    pub channel: String,
    pub payload: serde_json::Value,
}

/// Thin wrapper over the Coordination Store's pub/sub primitive
/// (SPEC_FULL.md §4.4): publishing always goes through `CoordinationStore`
/// so a single node sees its own events without a network round trip, and a
/// `RedisBridge` (below) relays events originated by *other* nodes into the
/// same local broadcast channel. A publish failure is logged and dropped,
/// never surfaced to the caller — the transaction that triggered it has
/// already committed or aborted by the time an event is published (spec.md
/// §7: "Pub/sub failures are logged but never fail the transaction").
pub struct EventBus {
    store: Arc<dyn CoordinationStore>,
    local: broadcast::Sender<BusEvent>,
}

impl EventBus {
    pub fn new(store: Arc<dyn CoordinationStore>) -> Self {
        Self::with_capacity(store, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(store: Arc<dyn CoordinationStore>, capacity: usize) -> Self {
        let (local, _rx) = broadcast::channel(capacity);
        EventBus { store, local }
    }

    /// Subscribe for this process's lifetime. Each subscriber gets its own
    /// queue; a lagged subscriber silently skips ahead rather than stalling
    /// publishers (spec.md §4.4 "no ordering guarantee... at-most-once").
    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.local.subscribe()
    }

    /// Clone of the local broadcast sender, handed to `RedisBridge::spawn`
    /// so events published by other nodes land in the same local channel
    /// this process's own subscribers read from.
    pub fn sender(&self) -> broadcast::Sender<BusEvent> {
        self.local.clone()
    }

    pub async fn publish(&self, channel: impl Into<String>, payload: serde_json::Value) {
        let channel = channel.into();

        if self
            .local
            .send(BusEvent {
                channel: channel.clone(),
                payload: payload.clone(),
            })
            .is_err()
        {
            debug!(channel = %channel, "event bus: no local subscribers");
        }

        if let Err(err) = self.store.publish(&channel, &payload).await {
            warn!(channel = %channel, error = %err, "event bus: cross-node publish failed");
        }
    }

    pub async fn publish_general(&self, payload: serde_json::Value) {
        self.publish(GENERAL_EVENTS, payload).await;
    }
}

/// Relays events published by *other* nodes (via Redis pub/sub, directly —
/// not through the `CoordinationStore` trait, since subscribing is a
/// long-lived streaming operation the CAS-oriented trait doesn't model) into
/// this process's local broadcast channel, so a subscriber on this node sees
/// the whole cluster's event stream, not just its own publishes.
pub struct RedisBridge;

impl RedisBridge {
    /// Spawns the bridge task. Returns the `JoinHandle` so callers can abort
    /// it on shutdown; a connection failure at startup is fatal (mirrors
    /// spec.md §7's "Fatal: CS unreachable at startup").
    pub async fn spawn(
        redis_url: &str,
        local: broadcast::Sender<BusEvent>,
    ) -> Result<tokio::task::JoinHandle<()>, EventBusError> {
        let client = redis::Client::open(redis_url)?;
        let mut pubsub = client.get_async_pubsub().await?;
        pubsub.subscribe(GENERAL_EVENTS).await?;
        pubsub.psubscribe(PLAYER_NOTIFICATIONS_PATTERN).await?;
        pubsub.psubscribe(MATCH_EVENTS_PATTERN).await?;

        let handle = tokio::spawn(async move {
            let mut stream = pubsub.on_message();
            while let Some(msg) = stream.next().await {
                let channel = msg.get_channel_name().to_string();
                let raw: String = match msg.get_payload() {
                    Ok(raw) => raw,
                    Err(err) => {
                        warn!(channel = %channel, %err, "event bus: undecodable pub/sub payload");
                        continue;
                    }
                };
                let payload: serde_json::Value = match serde_json::from_str(&raw) {
                    Ok(payload) => payload,
                    Err(err) => {
                        warn!(channel = %channel, %err, "event bus: non-JSON pub/sub payload");
                        continue;
                    }
                };
                if local.send(BusEvent { channel, payload }).is_err() {
                    // No local subscribers right now; nothing to relay to.
                }
            }
        });

        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jogo_store::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn publish_reaches_local_subscribers() {
        let store = Arc::new(MemoryStore::new());
        let bus = EventBus::new(store);
        let mut rx = bus.subscribe();

        bus.publish("eventos_gerais", json!({"tipo": "jogador_entrou"}))
            .await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.channel, "eventos_gerais");
        assert_eq!(event.payload["tipo"], "jogador_entrou");
    }

    #[tokio::test]
    async fn publish_without_subscribers_does_not_error() {
        let store = Arc::new(MemoryStore::new());
        let bus = EventBus::new(store);
        bus.publish_general(json!({"tipo": "jogador_entrou"})).await;
    }
}
