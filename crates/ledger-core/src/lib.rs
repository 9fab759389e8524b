pub mod chain;
pub mod consensus;
pub mod constants;
pub mod error;
pub mod hash;
pub mod ledger;
pub mod peers;
pub mod pow;

use serde::{Deserialize, Serialize};
use serde_json::Number;

pub use chain::{is_chain_valid, VerifiedChain};
pub use consensus::{Candidate, ChainReport, ChainSource, ConsensusResolver};
pub use error::{LedgerError, PeerError};
pub use ledger::{Ledger, MiningJob, Reward};
pub use peers::PeerRegistry;
pub use pow::CancelToken;

use constants::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF, TIMESTAMP_FORMAT};

// Fields of `Transaction` and `Block` are declared in sorted key order.
// The canonical encoding in `hash` serializes them as declared, so keep it that way.

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub amount: Number,
    pub receiver: String,
    pub sender: String,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, amount: impl Into<Number>) -> Self {
        Self {
            amount: amount.into(),
            receiver: receiver.into(),
            sender: sender.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub previous_hash: String,
    pub proof: u64,
    pub timestamp: String,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(
        index: u64,
        proof: u64,
        previous_hash: impl Into<String>,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            index,
            previous_hash: previous_hash.into(),
            proof,
            timestamp: now_timestamp(),
            transactions,
        }
    }

    /// Hex SHA-256 of the canonical encoding; what the next block links to.
    pub fn hash(&self) -> String {
        hash::digest(self)
    }
}

/// The first block of every chain: proof 1, sentinel previous hash, no transactions.
pub fn genesis_block() -> Block {
    Block::new(1, GENESIS_PROOF, GENESIS_PREVIOUS_HASH, vec![])
}

/// Local wall-clock time with microseconds, e.g. `2024-01-01 12:00:00.000000`.
pub fn now_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}
