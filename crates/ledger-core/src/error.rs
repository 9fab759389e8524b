use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("chain tip moved from block {expected} to block {actual} while mining")]
    StaleTip { expected: u64, actual: u64 },

    #[error("proof {proof} does not satisfy the work predicate for previous proof {previous_proof}")]
    InvalidProof { proof: u64, previous_proof: u64 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PeerError {
    #[error("invalid node address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("request to {peer} failed: {reason}")]
    Fetch { peer: String, reason: String },

    #[error("{peer} answered with status {status}")]
    Status { peer: String, status: u16 },

    #[error("{peer} sent a malformed chain: {reason}")]
    Malformed { peer: String, reason: String },
}
