pub mod api;
pub mod blockchain;
pub mod transaction;
pub mod wallet;
