//! Structured logging setup shared by every jogo-* binary.
//!
//! Replaces the original deployment's bare `print()` diagnostics with
//! `tracing`, upgraded in mechanism but not in spirit (SPEC_FULL.md §7):
//! every coordinator/participant/recovery transition is still logged at
//! `info`/`warn`/`error`, just with `tx_id` and friends carried as
//! structured fields instead of interpolated into the message string.

use tracing_subscriber::EnvFilter;

/// Initializes the global `tracing` subscriber for a node process.
///
/// `RUST_LOG` overrides the default filter (`info` for this crate family,
/// `warn` for dependencies), matching `bleep-rpc`'s
/// `tracing_subscriber::fmt::init()` but with an explicit default so a node
/// started with no environment still logs something useful.
pub fn init(node_name: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,jogo_txn=info,jogo_rpc=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    tracing::info!(node = node_name, "structured logging initialized");
}
