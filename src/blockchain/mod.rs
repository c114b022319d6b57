// src/blockchain/mod.rs
//! Ledger access: gateway trait, JSON-RPC client, revert handling and transaction
//! building.

pub mod ledger;
pub mod revert;
pub mod rpc_ledger;
pub mod transaction;
