use jogo_core::{DecisionMessage, Transaction};
use warp::{Filter, Rejection, Reply};

use crate::error::RpcError;
use crate::state::{with_state, AppState};

/// `POST /transacao/abrir_pacote/prepare` — participant prepare for
/// `open_pack` (spec.md §4.2.2, §4.3). Safe to replay: prepare only records
/// the transaction locally and votes commit, it never mutates shared state.
pub fn prepare_abrir_pacote(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("transacao" / "abrir_pacote" / "prepare")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state))
        .and_then(|tx: Transaction, state: AppState| async move {
            let vote = state.engine.handle_prepare_open_pack(tx).await;
            Ok::<_, Rejection>(warp::reply::json(&vote))
        })
}

/// `POST /transacao/abrir_pacote/commit_abort` — phase-2 decide for
/// `open_pack` (spec.md §4.2.2, §4.3).
pub fn commit_abort_abrir_pacote(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("transacao" / "abrir_pacote" / "commit_abort")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state))
        .and_then(|decision: DecisionMessage, state: AppState| async move {
            state
                .engine
                .handle_decide(decision)
                .await
                .map_err(RpcError::from)
                .map_err(warp::reject::custom)?;
            Ok::<_, Rejection>(warp::reply::json(&serde_json::json!({"ok": true})))
        })
}

/// `POST /inventario/troca/prepare` — participant prepare for
/// `trade_cards` (spec.md §4.2.3, §4.3).
pub fn prepare_troca(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("inventario" / "troca" / "prepare")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state))
        .and_then(|tx: Transaction, state: AppState| async move {
            let vote = state.engine.handle_prepare_trade(tx).await;
            Ok::<_, Rejection>(warp::reply::json(&vote))
        })
}

/// `POST /inventario/troca/commit_abort` — phase-2 decide for
/// `trade_cards` (spec.md §4.2.3, §4.3).
pub fn commit_abort_troca(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("inventario" / "troca" / "commit_abort")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state))
        .and_then(|decision: DecisionMessage, state: AppState| async move {
            state
                .engine
                .handle_decide(decision)
                .await
                .map_err(RpcError::from)
                .map_err(warp::reject::custom)?;
            Ok::<_, Rejection>(warp::reply::json(&serde_json::json!({"ok": true})))
        })
}

pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    prepare_abrir_pacote(state.clone())
        .or(commit_abort_abrir_pacote(state.clone()))
        .or(prepare_troca(state.clone()))
        .or(commit_abort_troca(state))
}
