use std::collections::HashMap;

use serde_json::json;
use warp::{Filter, Rejection, Reply};

use crate::error::RpcError;
use crate::state::{with_state, AppState};

/// `POST /inventario/troca/{player_a}/{player_b}?id_carta_a=...&id_carta_b=...`
/// — triggers `trade_cards` as coordinator (spec.md §4.2.3, §4.3).
pub fn troca(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("inventario" / "troca" / String / String)
        .and(warp::post())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_state(state))
        .and_then(
            |player_a: String, player_b: String, query: HashMap<String, String>, state: AppState| async move {
                let card_a = query.get("id_carta_a").cloned().unwrap_or_default();
                let card_b = query.get("id_carta_b").cloned().unwrap_or_default();

                let result = state
                    .engine
                    .trade_cards(&player_a, &card_a, &player_b, &card_b)
                    .await;

                let (status, motivo) = match &result {
                    Ok(()) => ("sucesso", None),
                    Err(err) => ("falha", Some(err.to_string())),
                };

                for player_id in [&player_a, &player_b] {
                    let mut payload = json!({
                        "tipo": "troca_cartas",
                        "status": status,
                        "player_a": player_a,
                        "player_b": player_b,
                    });
                    if let Some(motivo) = &motivo {
                        payload["motivo"] = json!(motivo);
                    }
                    state
                        .events
                        .publish(jogo_eventbus::channels::player_channel(player_id), payload)
                        .await;
                }

                match result {
                    Ok(()) => Ok::<_, Rejection>(warp::reply::json(&json!({"resultado": "SUCESSO_TROCA"}))),
                    Err(err) => Err(warp::reject::custom(RpcError::from(err))),
                }
            },
        )
}

pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    troca(state)
}
