use std::collections::HashMap;

use jogo_core::{Inventory, Player};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;
use warp::{Filter, Rejection, Reply};

use crate::error::RpcError;
use crate::state::{with_state, AppState};

#[derive(Serialize)]
struct EntrarResponse {
    player: Player,
    inventory: Inventory,
}

/// `POST /jogador/entrar?nome_jogador=...` — creates a player and its
/// starting Inventory (spec.md §4.3). The player's home region is this
/// node; `packs_available` starts at one, matching the original
/// deployment's welcome grant.
pub fn entrar(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("jogador" / "entrar")
        .and(warp::post())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_state(state))
        .and_then(
            |query: HashMap<String, String>, state: AppState| async move {
                let display_name = query
                    .get("nome_jogador")
                    .cloned()
                    .unwrap_or_else(|| "Jogador".to_string());
                let player_id = Uuid::new_v4().to_string();

                let player = Player::new(player_id.clone(), display_name, state.node_name.clone());
                let inventory = Inventory::with_starting_pack(player_id);

                state
                    .store
                    .set_inventory(inventory.clone())
                    .await
                    .map_err(RpcError::from)
                    .map_err(warp::reject::custom)?;

                state
                    .events
                    .publish_general(json!({
                        "tipo": "jogador_entrou",
                        "player_id": player.player_id,
                        "display_name": player.display_name,
                    }))
                    .await;

                Ok::<_, Rejection>(warp::reply::json(&EntrarResponse { player, inventory }))
            },
        )
}

/// `GET /inventario/{player_id}` — Inventory or 404.
pub fn inventario(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("inventario" / String)
        .and(warp::get())
        .and(with_state(state))
        .and_then(|player_id: String, state: AppState| async move {
            let inventory = state
                .store
                .get_inventory(&player_id)
                .await
                .map_err(RpcError::from)
                .map_err(warp::reject::custom)?
                .ok_or_else(|| warp::reject::custom(RpcError::NotFound))?;

            Ok::<_, Rejection>(warp::reply::json(&inventory))
        })
}

pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    entrar(state.clone()).or(inventario(state))
}
