pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const GENESIS_PROOF: u64 = 1;
pub const GENESIS_PREVIOUS_HASH: &str = "0";
pub const POW_TARGET_ZEROS: usize = 4;
pub const POW_SEARCH_BATCH: u64 = 1 << 14;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
