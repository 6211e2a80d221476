//! RPC Mesh endpoint surface (spec.md §4.3): client-facing routes under
//! `jogador`/`inventario`/`pacote`, peer-facing prepare/decide routes under
//! `transacao`/`inventario/troca`, plus the out-of-core `pareamento`/
//! `partida` and `status` supplements.

pub mod jogador;
pub mod pacote;
pub mod pareamento;
pub mod peer;
pub mod status;
pub mod troca;

use warp::{Filter, Rejection, Reply};

use crate::state::AppState;

/// Every route this node exposes, combined into a single filter.
pub fn all(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    status::routes(state.clone())
        .or(jogador::routes(state.clone()))
        .or(pacote::routes(state.clone()))
        .or(troca::routes(state.clone()))
        .or(pareamento::routes(state.clone()))
        .or(peer::routes(state))
}
