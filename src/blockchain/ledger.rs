use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::difficulty::compute_difficulty;
use super::pow::meets_difficulty;
use super::{Block, GENESIS_PREV_HASH, MINER_REWARD};
use crate::transaction::Transaction;
use crate::wallet::verify_signature_hex;

/// Terminal rejection reasons. None of them leaves partial side effects;
/// shared state changes only on the accepted path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("missing fields")]
    MissingFields,
    #[error("invalid transaction signature")]
    InvalidSignature,
    #[error("block index {got} does not follow current height {expected}")]
    IndexMismatch { expected: u64, got: u64 },
    #[error("previous hash does not match the current tip")]
    PreviousHashMismatch,
    #[error("stated hash does not match block contents")]
    HashMismatch,
    #[error("hash does not meet difficulty {difficulty}")]
    InsufficientWork { difficulty: u32 },
    #[error("invalid transaction signature inside block")]
    InvalidTransactionSignature,
    #[error("block {index} not found")]
    BlockNotFound { index: u64 },
}

/// A pending transaction plus the opaque id it was keyed under on insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolEntry {
    pub id: String,
    pub transaction: Transaction,
}

/// The validating authority's state: the accepted chain and the pending
/// pool. Single writer; callers wrap it in a lock and hold the write side
/// across a whole submit call.
#[derive(Debug, Default)]
pub struct Ledger {
    chain: Vec<Block>,
    mempool: Vec<PoolEntry>,
}

impl Ledger {
    /// Start with an empty chain: the first mined block has index 0 and the
    /// `"0"` previous-hash sentinel. There is no pre-built genesis block.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn height(&self) -> usize {
        self.chain.len()
    }

    pub fn tip(&self) -> Option<&Block> {
        self.chain.last()
    }

    pub fn mempool(&self) -> &[PoolEntry] {
        &self.mempool
    }

    /// FIFO snapshot of pending transactions, as a miner would include them.
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.mempool.iter().map(|e| e.transaction.clone()).collect()
    }

    pub fn block_by_index(&self, index: u64) -> Result<&Block, LedgerError> {
        self.chain
            .get(index as usize)
            .ok_or(LedgerError::BlockNotFound { index })
    }

    /// Difficulty required of the next block, derived from current history.
    pub fn difficulty(&self) -> u32 {
        compute_difficulty(&self.chain)
    }

    /// Admit a signed transfer into the pool. Returns the pool id.
    pub fn submit_transaction(&mut self, tx: Transaction) -> Result<String, LedgerError> {
        if !tx.has_required_fields() {
            return Err(LedgerError::MissingFields);
        }

        let verified = verify_signature_hex(&tx.public_key, &tx.signature, &tx.signing_message())
            .unwrap_or(false);
        if !verified {
            return Err(LedgerError::InvalidSignature);
        }

        let id = Uuid::new_v4().to_string();
        self.mempool.push(PoolEntry {
            id: id.clone(),
            transaction: tx,
        });
        Ok(id)
    }

    /// Validate a mined candidate and, if it passes every check, commit it:
    /// append the synthesized reward, push the block and clear the whole
    /// pool as one indivisible step. Returns the difficulty that was
    /// enforced.
    pub fn submit_block(
        &mut self,
        mut candidate: Block,
        miner_address: &str,
    ) -> Result<u32, LedgerError> {
        if candidate.timestamp.is_empty()
            || candidate.previous_hash.is_empty()
            || candidate.hash.is_empty()
            || miner_address.is_empty()
        {
            return Err(LedgerError::MissingFields);
        }

        // The candidate must extend the tip we hold right now, not whatever
        // tip the miner saw when it started searching.
        let expected_index = self.chain.len() as u64;
        if candidate.index != expected_index {
            return Err(LedgerError::IndexMismatch {
                expected: expected_index,
                got: candidate.index,
            });
        }
        let expected_prev = self
            .tip()
            .map(|b| b.hash.as_str())
            .unwrap_or(GENESIS_PREV_HASH);
        if candidate.previous_hash != expected_prev {
            return Err(LedgerError::PreviousHashMismatch);
        }

        // Hash equality is checked before the difficulty of that hash.
        let recomputed = candidate.compute_hash();
        if recomputed != candidate.hash {
            return Err(LedgerError::HashMismatch);
        }

        // Difficulty is re-derived here; the miner's assumption is not trusted.
        let difficulty = compute_difficulty(&self.chain);
        if !meets_difficulty(&recomputed, difficulty) {
            return Err(LedgerError::InsufficientWork { difficulty });
        }

        // Every submitted transaction must carry a valid signature. Rewards
        // only exist once the protocol appends them, so nothing in a
        // candidate is exempt.
        for tx in &candidate.transactions {
            let verified =
                verify_signature_hex(&tx.public_key, &tx.signature, &tx.signing_message())
                    .unwrap_or(false);
            if !verified {
                return Err(LedgerError::InvalidTransactionSignature);
            }
        }

        // Commit. The stored hash keeps covering the transaction list as
        // mined; the reward is appended after the fact.
        let fees: u64 = candidate.transactions.iter().map(|tx| tx.fee).sum();
        candidate
            .transactions
            .push(Transaction::reward(miner_address, MINER_REWARD + fees));
        self.chain.push(candidate);
        self.mempool.clear();

        Ok(difficulty)
    }

    /// Re-check linkage, indices and hash integrity of every accepted block.
    /// A trailing reward transaction is excluded from the recomputed hash,
    /// since it was appended after the proof-of-work was sealed.
    pub fn validate_chain(&self) -> bool {
        for (i, block) in self.chain.iter().enumerate() {
            if block.index != i as u64 {
                return false;
            }
            let expected_prev = if i == 0 {
                GENESIS_PREV_HASH
            } else {
                self.chain[i - 1].hash.as_str()
            };
            if block.previous_hash != expected_prev {
                return false;
            }

            let mined_txs = match block.transactions.last() {
                Some(last) if last.is_reward() => {
                    &block.transactions[..block.transactions.len() - 1]
                }
                _ => &block.transactions[..],
            };
            let recomputed = super::block::block_hash(
                block.index,
                &block.timestamp,
                mined_txs,
                &block.previous_hash,
                block.nonce,
            );
            if recomputed != block.hash {
                return false;
            }
        }
        true
    }

    /// Scan-derived balance: senders pay amount plus fee, recipients gain
    /// the amount. May go negative; the protocol never checks funds.
    pub fn balance_of(&self, address: &str) -> i128 {
        let mut balance: i128 = 0;
        for block in &self.chain {
            for tx in &block.transactions {
                if tx.sender == address {
                    balance -= tx.amount as i128 + tx.fee as i128;
                }
                if tx.recipient == address {
                    balance += tx.amount as i128;
                }
            }
        }
        balance
    }
}

#[cfg(test)]
mod tests {
    use super::{Ledger, LedgerError};
    use crate::blockchain::{Block, GENESIS_PREV_HASH, MINER_REWARD, pow};
    use crate::transaction::Transaction;
    use crate::wallet::{generate_keypair_hex, sign_message_hex};
    use std::sync::atomic::AtomicBool;

    fn signed_tx(recipient: &str, amount: u64, fee: u64) -> Transaction {
        let (sk, pk, address) = generate_keypair_hex();
        let mut tx = Transaction {
            sender: address,
            recipient: recipient.to_string(),
            amount,
            fee,
            public_key: pk,
            signature: String::new(),
        };
        tx.signature = sign_message_hex(&sk, &tx.signing_message()).expect("sign");
        tx
    }

    /// Mine a candidate extending the ledger's current tip, the way the
    /// miner binary does: snapshot pool order, stamp a timestamp, search.
    fn mine_candidate(ledger: &Ledger, transactions: Vec<Transaction>) -> Block {
        let index = ledger.height() as u64;
        let previous_hash = ledger
            .tip()
            .map(|b| b.hash.clone())
            .unwrap_or_else(|| GENESIS_PREV_HASH.to_string());
        let timestamp = "1700000000".to_string();
        let difficulty = ledger.difficulty();
        let cancel = AtomicBool::new(false);
        let (nonce, hash) = pow::search(
            index,
            &timestamp,
            &transactions,
            &previous_hash,
            difficulty,
            &cancel,
        )
        .expect("search not cancelled");
        Block {
            index,
            timestamp,
            transactions,
            previous_hash,
            nonce,
            hash,
        }
    }

    #[test]
    fn transaction_admission_requires_all_fields() {
        let mut ledger = Ledger::new();
        let mut tx = signed_tx("bob", 10, 1);
        tx.signature = String::new();
        assert_eq!(
            ledger.submit_transaction(tx),
            Err(LedgerError::MissingFields)
        );
        assert!(ledger.mempool().is_empty());
    }

    #[test]
    fn tampered_amount_invalidates_the_signature() {
        let mut ledger = Ledger::new();
        let mut tx = signed_tx("bob", 10, 1);
        tx.amount = 90;
        assert_eq!(
            ledger.submit_transaction(tx),
            Err(LedgerError::InvalidSignature)
        );
        assert!(ledger.mempool().is_empty());
    }

    #[test]
    fn accepted_transaction_is_pooled_under_a_fresh_id() {
        let mut ledger = Ledger::new();
        let id_a = ledger
            .submit_transaction(signed_tx("bob", 10, 1))
            .expect("accepted");
        let id_b = ledger
            .submit_transaction(signed_tx("carol", 5, 0))
            .expect("accepted");
        assert_ne!(id_a, id_b);
        assert_eq!(ledger.mempool().len(), 2);
        // FIFO order is preserved for miners
        assert_eq!(ledger.pending_transactions()[0].recipient, "bob");
    }

    #[test]
    fn first_block_is_accepted_and_rewarded() {
        let mut ledger = Ledger::new();
        ledger
            .submit_transaction(signed_tx("bob", 10, 1))
            .expect("accepted");

        let candidate = mine_candidate(&ledger, ledger.pending_transactions());
        let difficulty = ledger
            .submit_block(candidate, "miner-addr")
            .expect("accepted");

        assert_eq!(difficulty, 4);
        assert_eq!(ledger.height(), 1);
        assert!(ledger.mempool().is_empty());

        let block = ledger.block_by_index(0).expect("present");
        assert_eq!(block.transactions.len(), 2);
        let reward = &block.transactions[1];
        assert!(reward.is_reward());
        assert_eq!(reward.recipient, "miner-addr");
        assert_eq!(reward.amount, MINER_REWARD + 1);
    }

    #[test]
    fn stale_previous_hash_is_rejected() {
        let mut ledger = Ledger::new();
        let mut candidate = mine_candidate(&ledger, Vec::new());
        candidate.previous_hash = "deadbeef".into();
        candidate.hash = candidate.compute_hash();
        // hash was recomputed over the forged field, so only the tip check trips
        assert_eq!(
            ledger.submit_block(candidate, "miner-addr"),
            Err(LedgerError::PreviousHashMismatch)
        );
        assert_eq!(ledger.height(), 0);
    }

    #[test]
    fn stated_hash_must_match_contents() {
        let mut ledger = Ledger::new();
        let mut candidate = mine_candidate(&ledger, Vec::new());
        // tamper with the tail so the leading zeros still look fine
        let tail = if candidate.hash.ends_with('f') { "0000" } else { "ffff" };
        candidate.hash.replace_range(60..64, tail);
        let result = ledger.submit_block(candidate, "miner-addr");
        assert_eq!(result, Err(LedgerError::HashMismatch));
        assert_eq!(ledger.height(), 0);
    }

    #[test]
    fn unworked_hash_is_rejected() {
        let mut ledger = Ledger::new();
        // deliberately pick a nonce whose honest hash misses the target
        let timestamp = "1700000000".to_string();
        let mut nonce = 0u64;
        let hash = loop {
            let h = crate::blockchain::block::block_hash(0, &timestamp, &[], "0", nonce);
            if !pow::meets_difficulty(&h, ledger.difficulty()) {
                break h;
            }
            nonce += 1;
        };
        let candidate = Block {
            index: 0,
            timestamp,
            transactions: Vec::new(),
            previous_hash: "0".into(),
            nonce,
            hash,
        };
        assert_eq!(
            ledger.submit_block(candidate, "miner-addr"),
            Err(LedgerError::InsufficientWork { difficulty: 4 })
        );
        assert_eq!(ledger.height(), 0);
    }

    #[test]
    fn forged_transaction_inside_block_is_rejected() {
        let mut ledger = Ledger::new();
        let mut tx = signed_tx("bob", 10, 1);
        tx.amount = 90; // signature no longer covers this
        let candidate = mine_candidate(&ledger, vec![tx]);
        assert_eq!(
            ledger.submit_block(candidate, "miner-addr"),
            Err(LedgerError::InvalidTransactionSignature)
        );
        assert_eq!(ledger.height(), 0);
        assert!(ledger.mempool().is_empty());
    }

    #[test]
    fn acceptance_clears_the_whole_pool() {
        let mut ledger = Ledger::new();
        ledger
            .submit_transaction(signed_tx("bob", 10, 1))
            .expect("accepted");
        ledger
            .submit_transaction(signed_tx("carol", 5, 2))
            .expect("accepted");

        // The winning block only includes the first pending transaction,
        // yet acceptance drops the second one as well.
        let included = vec![ledger.pending_transactions()[0].clone()];
        let candidate = mine_candidate(&ledger, included);
        ledger.submit_block(candidate, "miner-addr").expect("accepted");

        assert!(ledger.mempool().is_empty());
        assert_eq!(ledger.block_by_index(0).expect("present").transactions.len(), 2);
    }

    #[test]
    fn resubmitting_an_accepted_block_is_rejected() {
        let mut ledger = Ledger::new();
        let candidate = mine_candidate(&ledger, Vec::new());
        let replay = candidate.clone();
        ledger.submit_block(candidate, "miner-addr").expect("accepted");

        assert_eq!(
            ledger.submit_block(replay, "miner-addr"),
            Err(LedgerError::IndexMismatch {
                expected: 1,
                got: 0
            })
        );
        assert_eq!(ledger.height(), 1);
    }

    #[test]
    fn consecutive_blocks_link_and_validate() {
        let mut ledger = Ledger::new();
        let first = mine_candidate(&ledger, Vec::new());
        ledger.submit_block(first, "miner-addr").expect("accepted");

        ledger
            .submit_transaction(signed_tx("bob", 3, 0))
            .expect("accepted");
        let second = mine_candidate(&ledger, ledger.pending_transactions());
        ledger.submit_block(second, "miner-addr").expect("accepted");

        assert_eq!(ledger.height(), 2);
        let chain = ledger.chain();
        assert_eq!(chain[1].index, chain[0].index + 1);
        assert_eq!(chain[1].previous_hash, chain[0].hash);
        assert!(ledger.validate_chain());
    }

    #[test]
    fn tampering_with_history_fails_validation() {
        let mut ledger = Ledger::new();
        let candidate = mine_candidate(&ledger, Vec::new());
        ledger.submit_block(candidate, "miner-addr").expect("accepted");
        assert!(ledger.validate_chain());

        ledger.chain[0].nonce += 1;
        assert!(!ledger.validate_chain());
    }

    #[test]
    fn missing_block_lookup_reports_the_index() {
        let ledger = Ledger::new();
        assert_eq!(
            ledger.block_by_index(7).unwrap_err(),
            LedgerError::BlockNotFound { index: 7 }
        );
    }

    #[test]
    fn balances_are_derived_by_scanning_the_chain() {
        let mut ledger = Ledger::new();
        let tx = signed_tx("bob", 10, 1);
        let sender = tx.sender.clone();
        ledger.submit_transaction(tx).expect("accepted");

        let candidate = mine_candidate(&ledger, ledger.pending_transactions());
        ledger.submit_block(candidate, "miner-addr").expect("accepted");

        assert_eq!(ledger.balance_of(&sender), -11);
        assert_eq!(ledger.balance_of("bob"), 10);
        assert_eq!(ledger.balance_of("miner-addr"), (MINER_REWARD + 1) as i128);
        assert_eq!(ledger.balance_of("nobody"), 0);
    }
}
