use std::sync::atomic::{AtomicBool, Ordering};

use super::block::block_hash;
use crate::transaction::Transaction;

/// Does `hash` carry at least `difficulty` leading zero hex chars?
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    hash.len() >= difficulty as usize
        && hash.chars().take(difficulty as usize).all(|c| c == '0')
}

/// Nonce search: iterate from 0 until the block hash meets `difficulty`.
///
/// Unbounded and CPU-bound; callers run it off the validating path (the miner
/// binary uses a blocking worker). The `cancel` flag is checked every
/// iteration so the search can be restarted when the chain tip moves.
/// Returns the winning `(nonce, hash)`, or `None` if cancelled.
pub fn search(
    index: u64,
    timestamp: &str,
    transactions: &[Transaction],
    previous_hash: &str,
    difficulty: u32,
    cancel: &AtomicBool,
) -> Option<(u64, String)> {
    let mut nonce: u64 = 0;
    loop {
        if cancel.load(Ordering::Relaxed) {
            return None;
        }
        let hash = block_hash(index, timestamp, transactions, previous_hash, nonce);
        if meets_difficulty(&hash, difficulty) {
            return Some((nonce, hash));
        }
        nonce = nonce.wrapping_add(1);
    }
}
