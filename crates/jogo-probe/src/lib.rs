//! Latency Probe: a stateless UDP echo endpoint nodes expose on their HTTP
//! port number, plus the client-side round-trip measurement helper
//! (SPEC_FULL.md §4.5).

pub mod client;
pub mod echo;
pub mod error;

pub use client::measure_latency;
pub use echo::run_echo_server;
pub use error::LatencyError;
