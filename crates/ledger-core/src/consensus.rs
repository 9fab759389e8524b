//! Longest-valid-chain reconciliation with peers.
//!
//! Every peer is asked for its chain concurrently, each request under its own
//! timeout. A peer that errors, times out, reports a length that does not match
//! the chain it sent, or sends an invalid chain is skipped. Among the rest the
//! longest chain wins; equal lengths go to the peer that comes first in
//! registry order. Validation runs on the blocking pool.

use crate::chain::VerifiedChain;
use crate::error::PeerError;
use crate::peers::PeerRegistry;
use crate::Block;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Body of `GET /get_chain`; the wire format between nodes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainReport {
    #[serde(default)]
    pub owner: Option<String>,
    pub chain: Vec<Block>,
    pub length: usize,
}

/// Where peer chains come from. The node implements this over HTTP.
pub trait ChainSource: Send + Sync {
    fn fetch_chain(&self, authority: &str) -> impl Future<Output = Result<ChainReport, PeerError>> + Send;
}

#[derive(Clone, Debug)]
pub struct Candidate {
    pub peer: String,
    pub chain: VerifiedChain,
}

pub struct ConsensusResolver<S> {
    source: S,
    peer_timeout: Duration,
}

impl<S: ChainSource> ConsensusResolver<S> {
    pub fn new(source: S, peer_timeout: Duration) -> Self {
        Self { source, peer_timeout }
    }

    /// Best valid chain strictly longer than `local_len` among all peers, if any.
    pub async fn longest_valid_chain(&self, peers: &PeerRegistry, local_len: usize) -> Option<Candidate> {
        let fetches = peers.all().map(|peer| async move {
            let outcome = tokio::time::timeout(self.peer_timeout, self.source.fetch_chain(peer)).await;
            (peer, outcome)
        });
        let reports = join_all(fetches).await;

        let mut contenders = Vec::new();
        for (peer, outcome) in reports {
            let report = match outcome {
                Ok(Ok(report)) => report,
                Ok(Err(err)) => {
                    warn!(%peer, %err, "skipping peer");
                    continue;
                }
                Err(_) => {
                    warn!(%peer, timeout_ms = self.peer_timeout.as_millis() as u64, "peer timed out");
                    continue;
                }
            };
            if report.length != report.chain.len() {
                warn!(%peer, reported = report.length, actual = report.chain.len(), "length mismatch");
                continue;
            }
            if report.length <= local_len {
                debug!(%peer, length = report.length, local = local_len, "not longer");
                continue;
            }
            contenders.push((peer.to_string(), report.chain));
        }
        if contenders.is_empty() {
            return None;
        }

        // Stable: equal lengths stay in registry order.
        contenders.sort_by_key(|(_, chain)| Reverse(chain.len()));
        match tokio::task::spawn_blocking(move || first_valid(contenders)).await {
            Ok(best) => best,
            Err(err) => {
                warn!(%err, "chain validation task failed");
                None
            }
        }
    }

    /// Fetches the longest valid peer chain and hands it to `install`, which
    /// decides under whatever lock guards the ledger whether it is still longer.
    /// Returns whether the chain was replaced.
    pub async fn resolve<F>(&self, peers: &PeerRegistry, local_len: usize, install: F) -> bool
    where
        F: FnOnce(VerifiedChain) -> bool,
    {
        let Some(Candidate { peer, chain }) = self.longest_valid_chain(peers, local_len).await else {
            return false;
        };
        let length = chain.len();
        let replaced = install(chain);
        if replaced {
            info!(%peer, length, "adopted peer chain");
        } else {
            debug!(%peer, length, "local chain moved on, candidate dropped");
        }
        replaced
    }
}

fn first_valid(contenders: Vec<(String, Vec<Block>)>) -> Option<Candidate> {
    for (peer, chain) in contenders {
        let length = chain.len();
        match VerifiedChain::verify(chain) {
            Some(chain) => {
                debug!(%peer, length, "best candidate");
                return Some(Candidate { peer, chain });
            }
            None => warn!(%peer, length, "invalid chain"),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Ledger, Reward, Transaction};
    use std::collections::HashMap;

    #[derive(Clone)]
    enum Reply {
        Chain(Vec<Block>),
        Lie { chain: Vec<Block>, length: usize },
        Fail,
        Hang,
    }

    #[derive(Default)]
    struct FakePeers {
        replies: HashMap<String, Reply>,
    }

    impl FakePeers {
        fn with(mut self, authority: &str, reply: Reply) -> Self {
            self.replies.insert(authority.to_string(), reply);
            self
        }
    }

    impl ChainSource for FakePeers {
        async fn fetch_chain(&self, authority: &str) -> Result<ChainReport, PeerError> {
            let fail = || PeerError::Fetch {
                peer: authority.to_string(),
                reason: "connection refused".into(),
            };
            match self.replies.get(authority).cloned().ok_or_else(fail)? {
                Reply::Chain(chain) => Ok(ChainReport {
                    owner: Some(authority.to_string()),
                    length: chain.len(),
                    chain,
                }),
                Reply::Lie { chain, length } => Ok(ChainReport { owner: None, chain, length }),
                Reply::Fail => Err(fail()),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(fail())
                }
            }
        }
    }

    fn reward(miner: &str) -> Reward {
        Reward::new(miner, "miner", 10u64)
    }

    fn mined_chain(blocks: usize, miner: &str) -> Vec<Block> {
        let mut ledger = Ledger::new();
        while ledger.len() < blocks {
            ledger.mine(&reward(miner));
        }
        ledger.chain().to_vec()
    }

    fn local_ledger(blocks: usize) -> Ledger {
        let mut ledger = Ledger::new();
        while ledger.len() < blocks {
            ledger.mine(&reward("local"));
        }
        ledger
    }

    fn registry(addresses: &[&str]) -> PeerRegistry {
        let mut peers = PeerRegistry::new();
        peers.extend(addresses.iter().map(|a| format!("http://{a}"))).unwrap();
        peers
    }

    fn resolver(source: FakePeers) -> ConsensusResolver<FakePeers> {
        ConsensusResolver::new(source, Duration::from_millis(200))
    }

    async fn resolve(resolver: &ConsensusResolver<FakePeers>, ledger: &mut Ledger, peers: &PeerRegistry) -> bool {
        resolver.resolve(peers, ledger.len(), |chain| ledger.replace_chain(chain)).await
    }

    #[tokio::test]
    async fn adopts_longer_valid_chain() {
        let peer_chain = mined_chain(5, "peer");
        let resolver = resolver(FakePeers::default().with("peer:1", Reply::Chain(peer_chain.clone())));
        let mut ledger = local_ledger(3);

        assert!(resolve(&resolver, &mut ledger, &registry(&["peer:1"])).await);
        assert_eq!(ledger.len(), 5);
        assert_eq!(ledger.chain().as_slice(), peer_chain.as_slice());
        assert!(ledger.is_valid());
    }

    #[tokio::test]
    async fn rejects_longer_invalid_chain() {
        let mut forged = mined_chain(10, "peer");
        forged[4].transactions.push(Transaction::new("eve", "eve", 1_000_000u64));
        let resolver = resolver(FakePeers::default().with("evil:1", Reply::Chain(forged)));
        let mut ledger = local_ledger(3);
        let before = ledger.chain();

        assert!(!resolve(&resolver, &mut ledger, &registry(&["evil:1"])).await);
        assert_eq!(ledger.chain(), before);
    }

    #[tokio::test]
    async fn equal_length_never_replaces() {
        let resolver = resolver(FakePeers::default().with("peer:1", Reply::Chain(mined_chain(3, "peer"))));
        let mut ledger = local_ledger(3);
        let before = ledger.chain();

        assert!(!resolve(&resolver, &mut ledger, &registry(&["peer:1"])).await);
        assert_eq!(ledger.chain(), before);
    }

    #[tokio::test]
    async fn bad_peers_do_not_block_good_ones() {
        let good = mined_chain(4, "good");
        let source = FakePeers::default()
            .with("a-fail:1", Reply::Fail)
            .with("b-hang:1", Reply::Hang)
            .with("c-good:1", Reply::Chain(good.clone()));
        let resolver = resolver(source);
        let peers = registry(&["a-fail:1", "b-hang:1", "c-good:1", "d-missing:1"]);
        let mut ledger = local_ledger(2);

        assert!(resolve(&resolver, &mut ledger, &peers).await);
        assert_eq!(ledger.chain().as_slice(), good.as_slice());
    }

    #[tokio::test]
    async fn inflated_length_is_ignored() {
        let short = mined_chain(2, "liar");
        let resolver = resolver(FakePeers::default().with("liar:1", Reply::Lie { chain: short, length: 50 }));
        let mut ledger = local_ledger(3);

        assert!(!resolve(&resolver, &mut ledger, &registry(&["liar:1"])).await);
        assert_eq!(ledger.len(), 3);
    }

    #[tokio::test]
    async fn longest_wins_and_first_seen_breaks_ties() {
        let first = mined_chain(4, "first");
        let second = mined_chain(4, "second");
        let source = FakePeers::default()
            .with("a:1", Reply::Chain(mined_chain(3, "short")))
            .with("b:1", Reply::Chain(first.clone()))
            .with("c:1", Reply::Chain(second));
        let resolver = resolver(source);

        let candidate = resolver
            .longest_valid_chain(&registry(&["c:1", "a:1", "b:1"]), 2)
            .await
            .unwrap();
        assert_eq!(candidate.peer, "b:1");
        assert_eq!(candidate.chain.blocks(), first.as_slice());
    }

    #[tokio::test]
    async fn longer_invalid_chain_does_not_shadow_valid_one() {
        let mut forged = mined_chain(6, "forger");
        forged[3].proof += 1;
        let honest = mined_chain(4, "honest");
        let source = FakePeers::default()
            .with("a:1", Reply::Chain(forged))
            .with("b:1", Reply::Chain(honest.clone()));
        let resolver = resolver(source);

        let candidate = resolver
            .longest_valid_chain(&registry(&["a:1", "b:1"]), 2)
            .await
            .unwrap();
        assert_eq!(candidate.peer, "b:1");
        assert_eq!(candidate.chain.blocks(), honest.as_slice());
    }

    #[tokio::test]
    async fn install_can_refuse_when_local_chain_grew() {
        let resolver = resolver(FakePeers::default().with("peer:1", Reply::Chain(mined_chain(3, "peer"))));
        let mut ledger = local_ledger(2);
        let peers = registry(&["peer:1"]);
        let local_len = ledger.len();
        ledger.mine(&reward("local"));
        ledger.mine(&reward("local"));

        assert!(!resolver.resolve(&peers, local_len, |chain| ledger.replace_chain(chain)).await);
        assert_eq!(ledger.len(), 4);
    }

    #[tokio::test]
    async fn second_resolve_is_a_no_op() {
        let resolver = resolver(FakePeers::default().with("peer:1", Reply::Chain(mined_chain(4, "peer"))));
        let peers = registry(&["peer:1"]);
        let mut ledger = local_ledger(2);

        assert!(resolve(&resolver, &mut ledger, &peers).await);
        let after_first = ledger.chain();
        assert!(!resolve(&resolver, &mut ledger, &peers).await);
        assert_eq!(ledger.chain(), after_first);
    }

    #[tokio::test]
    async fn no_peers_leaves_chain_alone() {
        let resolver = resolver(FakePeers::default());
        let mut ledger = local_ledger(2);
        assert!(!resolve(&resolver, &mut ledger, &PeerRegistry::new()).await);
        assert_eq!(ledger.len(), 2);
    }
}
