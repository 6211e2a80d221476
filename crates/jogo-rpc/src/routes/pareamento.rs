use jogo_core::{PairingRequest, PairingResponse, Partida, PartidaStatus};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use warp::{Filter, Rejection, Reply};

use crate::state::{with_state, AppState};

/// A single move in an ongoing match, relayed verbatim through the event
/// bus (spec.md §1 Non-goals: match-play logic itself lives outside the
/// coordination core, this endpoint only publishes).
#[derive(Debug, Deserialize)]
struct JogadaRequest {
    match_id: String,
    player_id: String,
    #[serde(default)]
    jogada: serde_json::Value,
}

/// `POST /pareamento/solicitar` — pairing handshake (SPEC_FULL.md §3
/// `Partida`). Matchmaking itself is out of scope (spec.md §1); this node
/// always accepts and publishes the formed match to `partida_{match_id}` so
/// whichever peer region the other player is on can pick it up — no card or
/// stock mutation is reachable from this path.
pub fn solicitar(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("pareamento" / "solicitar")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state))
        .and_then(|req: PairingRequest, state: AppState| async move {
            let match_id = Uuid::new_v4().to_string();
            let partida = Partida {
                match_id: match_id.clone(),
                player1_id: req.requesting_player_id.clone(),
                player2_id: String::new(),
                server1_url: req.requesting_server_url.clone(),
                server2_url: state.self_url.clone(),
                status: PartidaStatus::Iniciada,
                move_history: Vec::new(),
                winner_id: None,
            };

            state
                .events
                .publish(
                    jogo_eventbus::channels::match_channel(&match_id),
                    json!({"tipo": "partida_formada", "partida": partida}),
                )
                .await;

            let response = PairingResponse {
                accepted: true,
                message: format!("pareamento aceito por {}", state.node_name),
                match_id: Some(match_id),
            };
            Ok::<_, Rejection>(warp::reply::json(&response))
        })
}

/// `POST /partida/jogada` — relays one move to the match's event channel.
pub fn jogada(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("partida" / "jogada")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state))
        .and_then(|req: JogadaRequest, state: AppState| async move {
            state
                .events
                .publish(
                    jogo_eventbus::channels::match_channel(&req.match_id),
                    json!({
                        "tipo": "jogada",
                        "match_id": req.match_id,
                        "player_id": req.player_id,
                        "jogada": req.jogada,
                    }),
                )
                .await;
            Ok::<_, Rejection>(warp::reply::json(&json!({"ok": true})))
        })
}

pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    solicitar(state.clone()).or(jogada(state))
}
