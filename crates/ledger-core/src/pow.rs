use crate::constants::{POW_SEARCH_BATCH, POW_TARGET_ZEROS};
use crate::hash::sha256_hex;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag a host sets to abandon a running proof search.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// `candidate² − previous²` as decimal text, or `None` when the squares do not fit in i128.
fn challenge(candidate: u64, previous_proof: u64) -> Option<String> {
    let c = i128::from(candidate);
    let p = i128::from(previous_proof);
    let diff = c.checked_mul(c)?.checked_sub(p.checked_mul(p)?)?;
    Some(diff.to_string())
}

/// True if the hex digest of `candidate² − previous_proof²` starts with
/// `POW_TARGET_ZEROS` zero characters.
pub fn is_valid(candidate: u64, previous_proof: u64) -> bool {
    match challenge(candidate, previous_proof) {
        Some(text) => leading_zero_chars(&sha256_hex(text.as_bytes())) >= POW_TARGET_ZEROS,
        None => false,
    }
}

pub fn leading_zero_chars(hex_digest: &str) -> usize {
    hex_digest.bytes().take_while(|b| *b == b'0').count()
}

/// Smallest proof `>= 1` that satisfies [`is_valid`] against `previous_proof`.
pub fn solve(previous_proof: u64) -> u64 {
    solve_cancellable(previous_proof, &CancelToken::new())
        .expect("proof space exhausted (practically impossible)")
}

/// Same search as [`solve`], spread over the rayon pool in ordered batches.
/// Returns `None` once `cancel` is set.
pub fn solve_cancellable(previous_proof: u64, cancel: &CancelToken) -> Option<u64> {
    let mut start = 1u64;
    loop {
        if cancel.is_cancelled() {
            return None;
        }
        let end = start.saturating_add(POW_SEARCH_BATCH);
        // find_first keeps the lowest match in the batch, so the answer does
        // not depend on how rayon schedules the work.
        let found = (start..end)
            .into_par_iter()
            .find_first(|candidate| is_valid(*candidate, previous_proof));
        if found.is_some() {
            return found;
        }
        if end == u64::MAX {
            return None;
        }
        start = end;
    }
}
