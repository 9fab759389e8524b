use crate::config::NodeConfig;
use crate::peer_client::HttpChainSource;
use anyhow::{Context, Result};
use ledger_core::{ConsensusResolver, Ledger, PeerRegistry};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Everything the handlers share. Locks are only taken for short, non-async
/// sections; proof search and peer fetches run without them.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Mutex<Ledger>>,
    pub peers: Arc<Mutex<PeerRegistry>>,
    pub resolver: Arc<ConsensusResolver<HttpChainSource>>,
    pub config: Arc<NodeConfig>,
}

impl AppState {
    pub fn new(config: NodeConfig) -> Result<Self> {
        let mut peers = PeerRegistry::new();
        let seeded = peers
            .extend(&config.peers)
            .context("invalid peer in configuration")?;
        if seeded > 0 {
            info!(peers = seeded, "seeded peers from configuration");
        }
        let source = HttpChainSource::new(config.peer_timeout)?;
        Ok(Self {
            ledger: Arc::new(Mutex::new(Ledger::new())),
            peers: Arc::new(Mutex::new(peers)),
            resolver: Arc::new(ConsensusResolver::new(source, config.peer_timeout)),
            config: Arc::new(config),
        })
    }
}
