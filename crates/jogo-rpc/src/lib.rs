//! RPC Mesh: the client-facing and peer-facing HTTP endpoints described in
//! spec.md §4.3, built with `warp` (matching `bleep-rpc`'s filter-combinator
//! style) plus the `reqwest`-backed outbound transport the Transaction
//! Engine uses to reach its peers.

pub mod error;
pub mod routes;
pub mod state;
pub mod transport;

pub use error::{handle_rejection, RpcError};
pub use state::AppState;
pub use transport::ReqwestTransport;

use warp::{Filter, Reply};

/// Builds the full route table for a node, with structured logging and
/// JSON error mapping applied, ready to be handed to `warp::serve`.
pub fn build_routes(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = std::convert::Infallible> + Clone {
    routes::all(state)
        .recover(error::handle_rejection)
        .with(warp::log("jogo_rpc"))
}
