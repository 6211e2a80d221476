//! Event Bus: a thin wrapper over the Coordination Store's pub/sub
//! primitive, fanned out locally via `tokio::sync::broadcast` (SPEC_FULL.md
//! §4.4).

pub mod bus;
pub mod channels;
pub mod error;

pub use bus::{BusEvent, EventBus, RedisBridge};
pub use error::EventBusError;
