use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::blockchain::ledger::PoolEntry;
use crate::blockchain::{Block, Ledger, LedgerError};
use crate::transaction::Transaction;

/// Shared application state. Read endpoints take the read side; the two
/// submit endpoints hold the write side across validate-and-commit, so
/// concurrent candidates are serialized against the same tip.
pub struct AppState {
    pub ledger: RwLock<Ledger>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            ledger: RwLock::new(Ledger::new()),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Map a rejection to its HTTP shape. Lookup misses are 404; everything
/// else is a caller error.
pub fn reject(err: &LedgerError) -> HttpResponse {
    let body = ErrorResponse {
        message: err.to_string(),
    };
    match err {
        LedgerError::BlockNotFound { .. } => HttpResponse::NotFound().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse<'a> {
    pub length: usize,
    pub difficulty: u32,
    pub chain: &'a [Block],
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
}

#[derive(Serialize)]
pub struct DifficultyResponse {
    pub difficulty: u32,
}

/* ---------- TX API Models ---------- */

#[derive(Serialize)]
pub struct TxAcceptedResponse {
    pub id: String,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct MempoolResponse<'a> {
    pub size: usize,
    pub transactions: &'a [PoolEntry],
}

/* ---------- Mining API Models ---------- */

#[derive(Serialize, Deserialize)]
pub struct SubmitBlockRequest {
    pub index: u64,
    pub timestamp: String,
    pub transactions: Vec<Transaction>,
    pub previous_hash: String,
    pub nonce: u64,
    pub hash: String,
    pub miner_address: String,
}

impl SubmitBlockRequest {
    pub fn into_parts(self) -> (Block, String) {
        let block = Block {
            index: self.index,
            timestamp: self.timestamp,
            transactions: self.transactions,
            previous_hash: self.previous_hash,
            nonce: self.nonce,
            hash: self.hash,
        };
        (block, self.miner_address)
    }
}

#[derive(Serialize)]
pub struct SubmitBlockResponse {
    pub message: &'static str,
    pub index: u64,
    pub difficulty: u32,
}

/* ---------- Balance / Stats ---------- */

#[derive(Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: i128,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub height: usize,
    pub difficulty: u32,
    pub target_block_time_secs: f64,
    pub retarget_window: usize,
    pub mempool_size: usize,
}
