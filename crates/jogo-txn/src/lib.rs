//! Transaction Engine: the dynamically-coordinated 2PC state machine driving
//! `open_pack` and `trade_cards` across the static peer mesh (SPEC_FULL.md
//! §4.2).

pub mod engine;
pub mod error;
pub mod ledger;
pub mod locks;
pub mod peer;

pub use engine::TransactionEngine;
pub use error::TxnError;
pub use ledger::TransactionLedger;
pub use peer::PeerTransport;
