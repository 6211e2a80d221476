use anyhow::{Context, Result};
use clap::Parser;
use config::{Config, Environment};
use serde::Deserialize;

/// Local overrides for development ergonomics. These are sugar over the
/// environment-variable contract in spec.md §6, never a second source of
/// truth — every field mirrors one of `NOME_SERVIDOR`, `PORTA_SERVIDOR`,
/// `SERVIDORES_JOGO`, `REDIS_HOST`, `REDIS_PORT` (SPEC_FULL.md §6).
#[derive(Debug, Parser)]
#[command(name = "jogo-servidor", about = "Distributed pack/trade game backend node")]
pub struct Cli {
    #[arg(long)]
    pub nome_servidor: Option<String>,

    #[arg(long)]
    pub porta_servidor: Option<u16>,

    #[arg(long)]
    pub servidores_jogo: Option<String>,

    #[arg(long)]
    pub redis_host: Option<String>,

    #[arg(long)]
    pub redis_port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub nome_servidor: String,
    pub porta_servidor: u16,
    pub servidores_jogo: String,
    pub redis_host: String,
    pub redis_port: u16,
}

impl NodeConfig {
    /// Loads from the environment (`config` crate, matching the dependency
    /// already declared at the workspace root) with CLI flags layered on
    /// top for local overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let built = Config::builder()
            .set_default("redis_host", "127.0.0.1")?
            .set_default("redis_port", 6379)?
            .add_source(Environment::default().try_parsing(true))
            .build()
            .context("failed to assemble configuration from environment")?;

        let mut cfg: NodeConfig = built
            .try_deserialize()
            .context("NOME_SERVIDOR, PORTA_SERVIDOR and SERVIDORES_JOGO must be set")?;

        if let Some(value) = &cli.nome_servidor {
            cfg.nome_servidor = value.clone();
        }
        if let Some(value) = cli.porta_servidor {
            cfg.porta_servidor = value;
        }
        if let Some(value) = &cli.servidores_jogo {
            cfg.servidores_jogo = value.clone();
        }
        if let Some(value) = &cli.redis_host {
            cfg.redis_host = value.clone();
        }
        if let Some(value) = cli.redis_port {
            cfg.redis_port = value;
        }

        Ok(cfg)
    }

    /// `SERVIDORES_JOGO` is a comma-separated peer URL list INCLUDING self;
    /// order is significant — it drives the deterministic peer iteration
    /// order spec.md §4.2.1 requires (SPEC_FULL.md §6).
    pub fn peer_urls(&self) -> Vec<String> {
        self.servidores_jogo
            .split(',')
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Identifies which configured peer URL is this process, by matching
    /// the listening port. `SERVIDORES_JOGO` carries URLs, not node
    /// identities, so this is the only reliable way to find "self" in the
    /// list without requiring an operator to repeat the port in
    /// `NOME_SERVIDOR` too.
    pub fn self_url(&self) -> Result<String> {
        let suffix = format!(":{}", self.porta_servidor);
        self.peer_urls()
            .into_iter()
            .find(|url| url.ends_with(&suffix))
            .context("no entry in SERVIDORES_JOGO matches PORTA_SERVIDOR; this node cannot find itself in the peer list")
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}", self.redis_host, self.redis_port)
    }
}
