use crate::{hash, pow, Block};
use tracing::debug;

/// Walks `chain` from the second block on, checking that each block links to the
/// digest of its predecessor and that its proof satisfies the work predicate
/// against the predecessor's proof. Empty and genesis-only chains are valid.
pub fn is_chain_valid(chain: &[Block]) -> bool {
    for (position, pair) in chain.windows(2).enumerate() {
        let (previous, block) = (&pair[0], &pair[1]);
        if block.previous_hash != hash::digest(previous) {
            debug!(position = position + 1, index = block.index, "broken hash link");
            return false;
        }
        if !pow::is_valid(block.proof, previous.proof) {
            debug!(position = position + 1, index = block.index, proof = block.proof, "invalid proof");
            return false;
        }
    }
    true
}

/// A chain that has passed [`is_chain_valid`]. Installing one only needs a
/// length comparison, so validation can happen before any lock is taken.
#[derive(Clone, Debug, PartialEq)]
pub struct VerifiedChain(Vec<Block>);

impl VerifiedChain {
    pub fn verify(chain: Vec<Block>) -> Option<Self> {
        is_chain_valid(&chain).then_some(Self(chain))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.0
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{genesis_block, Ledger, Reward, Transaction};

    fn reward() -> Reward {
        Reward::new("node-a", "miner", 10u64)
    }

    #[test]
    fn empty_and_genesis_chains_are_valid() {
        assert!(is_chain_valid(&[]));
        assert!(is_chain_valid(&[genesis_block()]));
    }

    #[test]
    fn mined_chain_is_valid() {
        let mut ledger = Ledger::new();
        for _ in 0..3 {
            ledger.mine(&reward());
        }
        let chain = ledger.chain();
        assert_eq!(chain.len(), 4);
        assert!(is_chain_valid(&chain));
        for pair in chain.windows(2) {
            assert_eq!(pair[1].previous_hash, pair[0].hash());
            assert!(pow::is_valid(pair[1].proof, pair[0].proof));
        }
    }

    #[test]
    fn tampered_transaction_breaks_the_link() {
        let mut ledger = Ledger::new();
        ledger.add_transaction("A", "B", 5u64);
        ledger.mine(&reward());
        ledger.mine(&reward());
        let mut chain = ledger.chain().to_vec();
        chain[1].transactions[0] = Transaction::new("A", "B", 500u64);
        assert!(!is_chain_valid(&chain));
    }

    #[test]
    fn wrong_proof_is_rejected() {
        let mut ledger = Ledger::new();
        ledger.mine(&reward());
        let mut chain = ledger.chain().to_vec();
        chain[1].proof += 1;
        assert!(!is_chain_valid(&chain));
    }

    #[test]
    fn verified_chain_only_wraps_valid_chains() {
        let mut ledger = Ledger::new();
        ledger.mine(&reward());
        let chain = ledger.chain().to_vec();

        let verified = VerifiedChain::verify(chain.clone()).unwrap();
        assert_eq!(verified.len(), 2);
        assert_eq!(verified.blocks(), chain.as_slice());

        let mut broken = chain;
        broken[1].previous_hash = "0".into();
        assert!(VerifiedChain::verify(broken).is_none());
    }

    #[test]
    fn forged_link_with_bad_proof_is_rejected() {
        let genesis = genesis_block();
        let forged = Block::new(2, 2, genesis.hash(), vec![]);
        assert!(!pow::is_valid(2, genesis.proof));
        assert!(!is_chain_valid(&[genesis, forged]));
    }
}
