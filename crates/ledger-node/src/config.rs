use crate::constants::{DEFAULT_LISTEN, DEFAULT_OWNER, DEFAULT_PEER_TIMEOUT_MS, DEFAULT_REWARD};
use crate::logging::LogFormat;
use anyhow::{bail, Context, Result};
use clap::Parser;
use ledger_core::Reward;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "ledger-node")]
#[command(about = "Proof-of-work ledger node with longest-chain consensus")]
pub struct Args {
    /// Address to listen on, e.g. 127.0.0.1:5000
    #[arg(long, env = "LEDGER_LISTEN", default_value = DEFAULT_LISTEN)]
    pub listen: String,

    /// Name reported as `owner` by /get_chain
    #[arg(long, env = "LEDGER_OWNER", default_value = DEFAULT_OWNER)]
    pub owner: String,

    /// Receiver of the mining reward (defaults to the owner)
    #[arg(long, env = "LEDGER_BENEFICIARY")]
    pub beneficiary: Option<String>,

    /// Amount minted into every mined block
    #[arg(long, env = "LEDGER_REWARD", default_value_t = DEFAULT_REWARD)]
    pub reward: u64,

    /// Identity used as the reward sender (random if unset)
    #[arg(long, env = "LEDGER_NODE_ID")]
    pub node_id: Option<String>,

    /// Peer URL to connect at startup; repeatable
    #[arg(long = "peer", env = "LEDGER_PEERS", value_delimiter = ',')]
    pub peers: Vec<String>,

    /// Per-peer timeout for chain fetches, in milliseconds
    #[arg(long, env = "LEDGER_PEER_TIMEOUT_MS", default_value_t = DEFAULT_PEER_TIMEOUT_MS)]
    pub peer_timeout_ms: u64,

    /// Log output format
    #[arg(long, env = "LEDGER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Human)]
    pub log_format: LogFormat,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, env = "LEDGER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Validated node settings.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub listen: SocketAddr,
    pub owner: String,
    pub node_id: String,
    pub beneficiary: String,
    pub reward: u64,
    pub peers: Vec<String>,
    pub peer_timeout: Duration,
}

impl NodeConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        let listen: SocketAddr = args
            .listen
            .parse()
            .with_context(|| format!("invalid listen address {:?}", args.listen))?;
        if args.owner.trim().is_empty() {
            bail!("owner must not be empty");
        }
        if args.peer_timeout_ms == 0 {
            bail!("peer timeout must be greater than zero");
        }
        let node_id = match &args.node_id {
            Some(id) if !id.trim().is_empty() => id.clone(),
            Some(_) => bail!("node id must not be empty"),
            None => uuid::Uuid::new_v4().simple().to_string(),
        };
        let beneficiary = args.beneficiary.clone().unwrap_or_else(|| args.owner.clone());
        Ok(Self {
            listen,
            owner: args.owner.clone(),
            node_id,
            beneficiary,
            reward: args.reward,
            peers: args.peers.clone(),
            peer_timeout: Duration::from_millis(args.peer_timeout_ms),
        })
    }

    pub fn reward(&self) -> Reward {
        Reward::new(self.node_id.clone(), self.beneficiary.clone(), self.reward)
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> NodeConfig {
    NodeConfig {
        listen: ([127, 0, 0, 1], 0).into(),
        owner: "tester".into(),
        node_id: "node-test".into(),
        beneficiary: "tester".into(),
        reward: DEFAULT_REWARD,
        peers: vec![],
        peer_timeout: Duration::from_millis(2_000),
    }
}
