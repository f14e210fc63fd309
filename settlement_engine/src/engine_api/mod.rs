pub mod config;
pub mod errors;
mod finalize;
pub mod reconciliation_api;
pub mod settlement_api;
pub mod settlement_objects;
pub mod wallet_api;
