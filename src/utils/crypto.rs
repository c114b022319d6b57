// src/utils/crypto.rs
//! Keccak-256 helpers.

use ethers::types::H256;
use ethers::utils::keccak256;

/// Computes a Keccak-256 hash of the input data.
pub fn hash_data(data: &[u8]) -> [u8; 32] {
    keccak256(data)
}

/// Hash of a signed, RLP-serialized transaction as the ledger reports it.
pub fn transaction_hash(raw: &[u8]) -> H256 {
    H256::from(hash_data(raw))
}
