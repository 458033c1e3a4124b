use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::transaction::Transaction;

/// A single block in the chain. `timestamp` is kept as the string the miner
/// stamped, because it is part of the hash preimage byte-for-byte.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: String, // seconds since epoch, string-encoded
    pub transactions: Vec<Transaction>,
    pub previous_hash: String,
    pub nonce: u64,
    pub hash: String,
}

/// Compute the canonical SHA-256 hash of a block's contents.
///
/// The preimage is the decimal index, the raw timestamp string, the JSON
/// serialization of the transaction list, the previous hash and the decimal
/// nonce, adjacent with no separators. Miner and validator must call this
/// exact function; any divergence in serialization breaks consensus.
pub fn block_hash(
    index: u64,
    timestamp: &str,
    transactions: &[Transaction],
    previous_hash: &str,
    nonce: u64,
) -> String {
    let txs_json = serde_json::to_string(transactions).expect("serialize txs");
    let preimage = format!("{index}{timestamp}{txs_json}{previous_hash}{nonce}");
    let mut hasher = Sha256::new();
    hasher.update(preimage.as_bytes());
    hex::encode(hasher.finalize())
}

impl Block {
    /// Recompute this block's hash from its stated fields
    /// (excluding the cached `hash` itself).
    pub fn compute_hash(&self) -> String {
        block_hash(
            self.index,
            &self.timestamp,
            &self.transactions,
            &self.previous_hash,
            self.nonce,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Block, block_hash};
    use crate::transaction::Transaction;

    fn sample_tx() -> Transaction {
        Transaction {
            sender: "alice".into(),
            recipient: "bob".into(),
            amount: 10,
            fee: 1,
            public_key: "02aa".into(),
            signature: "3044".into(),
        }
    }

    #[test]
    fn hash_is_deterministic() {
        let txs = vec![sample_tx()];
        let a = block_hash(0, "1700000000", &txs, "0", 42);
        let b = block_hash(0, "1700000000", &txs, "0", 42);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn any_field_change_changes_the_digest() {
        let txs = vec![sample_tx()];
        let base = block_hash(0, "1700000000", &txs, "0", 42);

        assert_ne!(base, block_hash(1, "1700000000", &txs, "0", 42));
        assert_ne!(base, block_hash(0, "1700000001", &txs, "0", 42));
        assert_ne!(base, block_hash(0, "1700000000", &txs, "1", 42));
        assert_ne!(base, block_hash(0, "1700000000", &txs, "0", 43));

        let mut tampered = sample_tx();
        tampered.amount = 11;
        assert_ne!(base, block_hash(0, "1700000000", &[tampered], "0", 42));
    }

    #[test]
    fn compute_hash_matches_free_function() {
        let block = Block {
            index: 3,
            timestamp: "1700000000".into(),
            transactions: vec![sample_tx()],
            previous_hash: "abc".into(),
            nonce: 7,
            hash: String::new(),
        };
        assert_eq!(
            block.compute_hash(),
            block_hash(3, "1700000000", &block.transactions, "abc", 7)
        );
    }
}
