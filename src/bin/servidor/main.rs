//! Node process entry point: wires the Coordination Store, Transaction
//! Engine, Event Bus, RPC Mesh and Latency Probe together (spec.md §2) and
//! runs them concurrently until shutdown.

mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use jogo_eventbus::EventBus;
use jogo_probe::run_echo_server;
use jogo_rpc::{build_routes, AppState, ReqwestTransport};
use jogo_store::{CoordinationStore, RedisStore};
use jogo_txn::TransactionEngine;
use tracing::{error, info};

use crate::config::{Cli, NodeConfig};

/// How often the recovery sweeper re-reads locally-cached PREPARING
/// transactions against the Coordination Store (spec.md §4.2.4: "A
/// background sweeper retries periodically").
const RECOVERY_SWEEP_PERIOD: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = NodeConfig::load(&cli)?;

    jogo_telemetry::init(&cfg.nome_servidor);

    let peer_urls = cfg.peer_urls();
    let self_url = cfg.self_url()?;
    info!(node = %cfg.nome_servidor, %self_url, peers = ?peer_urls, "node configuration loaded");

    // CS unreachable at startup is fatal (spec.md §7).
    let store: Arc<dyn CoordinationStore> = Arc::new(
        RedisStore::connect(&cfg.redis_url())
            .await
            .with_context(|| format!("could not reach coordination store at {}", cfg.redis_url()))?,
    );

    // Ensures the `estoque_global` key exists without assuming this process
    // is the first node to ever boot against this Redis instance (spec.md
    // §3: "initialized once on first node bootstrap"). A zero-delta
    // adjustment is a no-op on value but still performs the read-watch-
    // write cycle, so it writes the key through if absent and leaves an
    // existing value untouched.
    if let Err(err) = store.atomic_adjust_stock(0).await {
        error!(%err, "failed to bootstrap estoque_global key");
    }

    let transport = Arc::new(ReqwestTransport::new());
    let engine = Arc::new(TransactionEngine::new(
        self_url.clone(),
        peer_urls.clone(),
        store.clone(),
        transport,
    ));
    let events = Arc::new(EventBus::new(store.clone()));

    if let Err(err) = jogo_eventbus::RedisBridge::spawn(&cfg.redis_url(), events.sender()).await {
        error!(%err, "event bus cross-node bridge failed to start");
    }

    let recovery_handle = engine.clone().spawn_recovery_sweeper(RECOVERY_SWEEP_PERIOD);

    let udp_handle = tokio::spawn(run_echo_server(cfg.porta_servidor));

    let state = AppState::new(
        cfg.nome_servidor.clone(),
        self_url.clone(),
        peer_urls.clone(),
        store.clone(),
        engine.clone(),
        events.clone(),
    );
    let routes = build_routes(state);
    let addr: SocketAddr = ([0, 0, 0, 0], cfg.porta_servidor).into();

    info!(%addr, "jogo-servidor listening");
    let serve = warp::serve(routes).run(addr);

    tokio::select! {
        _ = serve => {}
        result = udp_handle => {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!(%err, "udp echo server exited with an error"),
                Err(err) => error!(%err, "udp echo task panicked"),
            }
        }
    }

    recovery_handle.abort();
    Ok(())
}
