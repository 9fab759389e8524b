use crate::chain::{is_chain_valid, VerifiedChain};
use crate::error::LedgerError;
use crate::pow::{self, CancelToken};
use crate::{genesis_block, Block, Transaction};
use serde_json::Number;
use std::mem;
use std::sync::Arc;
use tracing::{debug, info};

/// The fixed transfer minted into every block this node mines.
#[derive(Clone, Debug, PartialEq)]
pub struct Reward {
    pub sender: String,
    pub receiver: String,
    pub amount: Number,
}

impl Reward {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, amount: impl Into<Number>) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            amount: amount.into(),
        }
    }
}

/// Snapshot of the chain tip a proof search runs against.
#[derive(Clone, Debug)]
pub struct MiningJob {
    pub previous_index: u64,
    pub previous_proof: u64,
    pub previous_hash: String,
    cancel: CancelToken,
}

impl MiningJob {
    /// Set when the tip this job was taken from is no longer the tip.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}

/// Chain plus pending pool.
///
/// The chain is an immutable snapshot behind an `Arc`: readers clone the `Arc`
/// and never observe a half-applied change. Appending goes through
/// `Arc::make_mut`, so a snapshot handed out earlier is left untouched.
#[derive(Debug)]
pub struct Ledger {
    chain: Arc<Vec<Block>>,
    pending: Vec<Transaction>,
    tip_epoch: CancelToken,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// A ledger holding only a fresh genesis block and an empty pool.
    pub fn new() -> Self {
        Self {
            chain: Arc::new(vec![genesis_block()]),
            pending: Vec::new(),
            tip_epoch: CancelToken::new(),
        }
    }

    pub fn chain(&self) -> Arc<Vec<Block>> {
        Arc::clone(&self.chain)
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    /// The last block. The chain always holds at least the genesis block.
    pub fn get_previous_block(&self) -> &Block {
        &self.chain[self.chain.len() - 1]
    }

    /// Appends a block carrying the whole pending pool and empties the pool.
    pub fn create_block(&mut self, proof: u64, previous_hash: impl Into<String>) -> Block {
        let index = self.chain.len() as u64 + 1;
        let transactions = mem::take(&mut self.pending);
        let block = Block::new(index, proof, previous_hash, transactions);
        Arc::make_mut(&mut self.chain).push(block.clone());
        self.advance_epoch();
        debug!(index, proof, txs = block.transactions.len(), "block appended");
        block
    }

    /// Queues a transaction and returns the index of the block it is expected
    /// to land in. Purely advisory: more transactions may arrive first.
    pub fn add_transaction(
        &mut self,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: impl Into<Number>,
    ) -> u64 {
        self.push_transaction(Transaction::new(sender, receiver, amount))
    }

    pub fn push_transaction(&mut self, tx: Transaction) -> u64 {
        self.pending.push(tx);
        self.get_previous_block().index + 1
    }

    /// Solves the proof for the next block, mints the reward and commits the block.
    pub fn mine(&mut self, reward: &Reward) -> Block {
        let previous = self.get_previous_block();
        let proof = pow::solve(previous.proof);
        let previous_hash = previous.hash();
        self.add_transaction(reward.sender.clone(), reward.receiver.clone(), reward.amount.clone());
        let block = self.create_block(proof, previous_hash);
        info!(index = block.index, proof, "mined block");
        block
    }

    /// Tip snapshot for a search that runs without holding the ledger.
    pub fn mining_job(&self) -> MiningJob {
        let previous = self.get_previous_block();
        MiningJob {
            previous_index: previous.index,
            previous_proof: previous.proof,
            previous_hash: previous.hash(),
            cancel: self.tip_epoch.clone(),
        }
    }

    /// Commits a block for a proof found outside the ledger. Fails with
    /// [`LedgerError::StaleTip`] if the chain moved since `job` was taken.
    pub fn commit_mined(&mut self, job: &MiningJob, proof: u64, reward: &Reward) -> Result<Block, LedgerError> {
        let previous = self.get_previous_block();
        if previous.index != job.previous_index || previous.hash() != job.previous_hash {
            return Err(LedgerError::StaleTip {
                expected: job.previous_index,
                actual: previous.index,
            });
        }
        if !pow::is_valid(proof, job.previous_proof) {
            return Err(LedgerError::InvalidProof {
                proof,
                previous_proof: job.previous_proof,
            });
        }
        self.add_transaction(reward.sender.clone(), reward.receiver.clone(), reward.amount.clone());
        let block = self.create_block(proof, job.previous_hash.clone());
        info!(index = block.index, proof, "mined block");
        Ok(block)
    }

    pub fn is_valid(&self) -> bool {
        is_chain_valid(&self.chain)
    }

    /// Installs `candidate` if it is strictly longer than the local chain. The
    /// pending pool is kept either way.
    pub fn replace_chain(&mut self, candidate: VerifiedChain) -> bool {
        if candidate.len() <= self.chain.len() {
            debug!(local = self.chain.len(), candidate = candidate.len(), "candidate not longer");
            return false;
        }
        info!(from = self.chain.len(), to = candidate.len(), "replacing chain");
        self.chain = Arc::new(candidate.into_blocks());
        self.advance_epoch();
        true
    }

    /// Stops searches running against the old tip.
    fn advance_epoch(&mut self) {
        let old = mem::take(&mut self.tip_epoch);
        old.cancel();
    }
}
