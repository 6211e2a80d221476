use serde_json::json;
use warp::{Filter, Rejection, Reply};

use crate::error::RpcError;
use crate::state::{with_state, AppState};

/// `POST /pacote/abrir/{player_id}` — triggers the `open_pack` 2PC as
/// coordinator (spec.md §4.2.2, §4.3). A single pack is opened per call;
/// `quantity` is fixed at 1 to match the client-facing route's signature
/// (spec.md §4.3 names no quantity parameter on this endpoint — the
/// `quantity` field in the payload exists for the general shape of the
/// operation, but the client surface only ever requests one at a time).
pub fn abrir(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("pacote" / "abrir" / String)
        .and(warp::post())
        .and(with_state(state))
        .and_then(|player_id: String, state: AppState| async move {
            let result = state.engine.open_pack(&player_id, 1).await;

            match result {
                Ok(inventory) => {
                    state
                        .events
                        .publish(
                            jogo_eventbus::channels::player_channel(&player_id),
                            json!({"tipo": "pacote_aberto", "status": "sucesso", "player_id": player_id}),
                        )
                        .await;
                    Ok::<_, Rejection>(warp::reply::json(&inventory))
                }
                Err(err) => {
                    state
                        .events
                        .publish(
                            jogo_eventbus::channels::player_channel(&player_id),
                            json!({
                                "tipo": "pacote_aberto",
                                "status": "falha",
                                "player_id": player_id,
                                "motivo": err.to_string(),
                            }),
                        )
                        .await;
                    Err(warp::reject::custom(RpcError::from(err)))
                }
            }
        })
}

pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    abrir(state)
}
