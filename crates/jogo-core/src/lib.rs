//! Shared data model for the distributed pack/trade game backend.
//!
//! Every other crate in the workspace (`jogo-store`, `jogo-txn`, `jogo-rpc`,
//! `jogo-eventbus`, `jogo-probe`) depends on this crate for the wire types
//! described in spec.md §3 and §6.

pub mod card;
pub mod error;
pub mod inventory;
pub mod partida;
pub mod player;
pub mod stock;
pub mod transaction;

pub use card::{mint_card, mint_pack, Card, CardKind, Rarity};
pub use error::DomainError;
pub use inventory::Inventory;
pub use partida::{PairingRequest, PairingResponse, Partida, PartidaStatus};
pub use player::Player;
pub use stock::GlobalStock;
pub use transaction::{
    Decision, DecisionMessage, Transaction, TransactionPayload, TransactionStatus, Vote,
    VoteMessage,
};
