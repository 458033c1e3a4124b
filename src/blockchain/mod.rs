pub mod block;
pub mod difficulty;
pub mod ledger;
pub mod pow;

pub use block::Block;
pub use ledger::{Ledger, LedgerError};

/// Base Proof-of-Work difficulty (leading zero hex chars); the retarget
/// always adjusts relative to this anchor.
pub const BASE_DIFFICULTY: u32 = 4;

/// Target seconds per block.
pub const BLOCK_TIME_SECS: f64 = 10.0;

/// How many recent blocks the retarget window spans.
pub const RETARGET_WINDOW: usize = 10;

/// Fixed miner subsidy, before fees.
pub const MINER_REWARD: u64 = 50;

/// Sender address of synthesized reward transactions.
pub const REWARD_SENDER: &str = "BLOCKCHAIN";

/// `previous_hash` sentinel for the block at index 0.
pub const GENESIS_PREV_HASH: &str = "0";
