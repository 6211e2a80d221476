use serde_json::json;
use warp::{Filter, Rejection, Reply};

use crate::error::RpcError;
use crate::state::{with_state, AppState};

/// `GET /` — node status, including `estoque_global` (spec.md §4.3).
pub fn raiz(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path::end()
        .and(warp::get())
        .and(with_state(state))
        .and_then(|state: AppState| async move {
            let stock = state
                .store
                .get_stock()
                .await
                .map_err(RpcError::from)
                .map_err(warp::reject::custom)?;

            Ok::<_, Rejection>(warp::reply::json(&json!({
                "servidor": state.node_name,
                "estoque_global": stock.packs_remaining,
                "pares": state.peer_urls,
            })))
        })
}

/// `GET /servidores` — the configured peer URL list, for client-side
/// diagnostics (SPEC_FULL.md §4.3, supplement from the original's
/// `main.py`).
pub fn servidores(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("servidores")
        .and(warp::get())
        .and(with_state(state))
        .and_then(|state: AppState| async move {
            Ok::<_, Rejection>(warp::reply::json(&state.peer_urls))
        })
}

pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    raiz(state.clone()).or(servidores(state))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use jogo_core::{DecisionMessage, Transaction, Vote, VoteMessage};
    use jogo_eventbus::EventBus;
    use jogo_store::{CoordinationStore, MemoryStore};
    use jogo_txn::{PeerTransport, TransactionEngine, TxnError};

    use super::*;

    /// No peers ever actually get called in these route tests; this
    /// transport exists only to satisfy `TransactionEngine::new`'s
    /// constructor.
    struct NoopTransport;

    #[async_trait]
    impl PeerTransport for NoopTransport {
        async fn send_prepare(&self, peer_url: &str, tx: &Transaction) -> VoteMessage {
            VoteMessage {
                tx_id: tx.tx_id.clone(),
                server_url: peer_url.to_string(),
                vote: Vote::Commit,
                message: None,
            }
        }

        async fn send_decision(
            &self,
            _peer_url: &str,
            _tx: &Transaction,
            _decision: &DecisionMessage,
        ) -> Result<(), TxnError> {
            Ok(())
        }
    }

    fn test_state() -> AppState {
        let store: Arc<dyn CoordinationStore> = Arc::new(MemoryStore::new());
        let engine = Arc::new(TransactionEngine::new(
            "http://n1",
            vec!["http://n1".to_string()],
            store.clone(),
            Arc::new(NoopTransport) as Arc<dyn PeerTransport>,
        ));
        let events = Arc::new(EventBus::new(store.clone()));
        AppState::new("n1", "http://n1", vec!["http://n1".to_string()], store, engine, events)
    }

    #[tokio::test]
    async fn raiz_reports_initial_stock() {
        let filter = routes(test_state());
        let reply = warp::test::request().method("GET").path("/").reply(&filter).await;
        assert_eq!(reply.status(), 200);
        let body: serde_json::Value = serde_json::from_slice(reply.body()).unwrap();
        assert_eq!(body["estoque_global"], 50);
        assert_eq!(body["servidor"], "n1");
    }

    #[tokio::test]
    async fn servidores_lists_the_configured_peers() {
        let filter = routes(test_state());
        let reply = warp::test::request()
            .method("GET")
            .path("/servidores")
            .reply(&filter)
            .await;
        assert_eq!(reply.status(), 200);
        let body: Vec<String> = serde_json::from_slice(reply.body()).unwrap();
        assert_eq!(body, vec!["http://n1".to_string()]);
    }
}
