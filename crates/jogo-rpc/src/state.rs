use std::sync::Arc;

use jogo_eventbus::EventBus;
use jogo_store::CoordinationStore;
use jogo_txn::TransactionEngine;

/// Everything a route handler needs, cloned cheaply (every field is an
/// `Arc`) into each `warp` filter chain. Mirrors the "per-node state owned
/// by the TE instance; treat as cache of CS" guidance (spec.md §9) — `jogo-
/// rpc` itself holds no authoritative state at all, only handles to the
/// components that do.
#[derive(Clone)]
pub struct AppState {
    pub node_name: String,
    pub self_url: String,
    pub peer_urls: Vec<String>,
    pub store: Arc<dyn CoordinationStore>,
    pub engine: Arc<TransactionEngine>,
    pub events: Arc<EventBus>,
}

impl AppState {
    pub fn new(
        node_name: impl Into<String>,
        self_url: impl Into<String>,
        peer_urls: Vec<String>,
        store: Arc<dyn CoordinationStore>,
        engine: Arc<TransactionEngine>,
        events: Arc<EventBus>,
    ) -> Self {
        AppState {
            node_name: node_name.into(),
            self_url: self_url.into(),
            peer_urls,
            store,
            engine,
            events,
        }
    }
}

/// `warp` filter that clones `AppState` into a handler's argument list.
pub fn with_state(
    state: AppState,
) -> impl warp::Filter<Extract = (AppState,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || state.clone())
}
