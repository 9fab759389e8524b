pub(crate) const DEFAULT_LISTEN: &str = "127.0.0.1:5000";
pub(crate) const DEFAULT_OWNER: &str = "Fatih";
pub(crate) const DEFAULT_REWARD: u64 = 10;
pub(crate) const DEFAULT_PEER_TIMEOUT_MS: u64 = 5_000;

pub(crate) const HELP_TEXT: &str =
    "Go to /mine_block to mine a block or /get_chain to display the chain.";
pub(crate) const MINED_MESSAGE: &str = "Congratulations, you just mined a block!";
pub(crate) const VALID_MESSAGE: &str = "All good. The Blockchain is valid.";
pub(crate) const INVALID_MESSAGE: &str = "The Blockchain is not valid.";
pub(crate) const MISSING_TX_FIELDS: &str = "Some elements of the transaction are missing";
pub(crate) const MISSING_NODES: &str = "No node";
pub(crate) const CONNECTED_MESSAGE: &str =
    "All the nodes are now connected. The blockchain now contains the following nodes:";
pub(crate) const REPLACED_MESSAGE: &str =
    "The nodes had different chains so the chain was replaced by the longest one.";
pub(crate) const KEPT_MESSAGE: &str = "All good. The chain is the largest one.";
