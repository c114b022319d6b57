// src/wallet/key_management.rs
//! Raw-key handling for registry writes.
//!
//! Keys are supplied by the caller for every write and never stored: each helper here
//! takes the key by reference and keeps nothing once it returns. `k256` zeroizes
//! `SigningKey` on drop.
//!
//! Uses the following primitives:
//! - secp256k1 curve (via `k256` crate)
//! - legacy/EIP-155 transaction signing (via `ethers` `LocalWallet`)

use crate::error::{ResolverError, Result};
use ethers::signers::LocalWallet;
use ethers::types::{transaction::eip2718::TypedTransaction, Address, Bytes};
use ethers::utils::{hex, secret_key_to_address};
use k256::ecdsa::SigningKey;

/// Parses a raw 32-byte secp256k1 private key.
///
/// # Errors
/// `InvalidKey` if the slice has the wrong length or is not a valid scalar
/// (zero or above the curve order).
pub fn parse_signing_key(raw: &[u8]) -> Result<SigningKey> {
    if raw.len() != 32 {
        return Err(ResolverError::InvalidKey(format!(
            "expected 32 bytes, got {}",
            raw.len()
        )));
    }
    SigningKey::from_slice(raw).map_err(|e| ResolverError::InvalidKey(e.to_string()))
}

/// Parses a hex-encoded private key, with or without `0x` prefix.
pub fn signing_key_from_hex(encoded: &str) -> Result<SigningKey> {
    let digits = encoded.strip_prefix("0x").unwrap_or(encoded);
    let raw = hex::decode(digits).map_err(|e| ResolverError::InvalidKey(e.to_string()))?;
    parse_signing_key(&raw)
}

/// Ledger address controlled by `key`.
pub fn address_of(key: &SigningKey) -> Address {
    secret_key_to_address(key)
}

/// Signs a transaction envelope and returns its RLP wire encoding.
///
/// The envelope's chain id, when set, is used for EIP-155 replay protection.
///
/// # Errors
/// `InvalidKey` if signing fails.
pub fn sign(key: &SigningKey, envelope: &TypedTransaction) -> Result<Bytes> {
    let wallet = LocalWallet::from(key.clone());
    let signature = wallet
        .sign_transaction_sync(envelope)
        .map_err(|e| ResolverError::InvalidKey(e.to_string()))?;
    Ok(envelope.rlp_signed(&signature))
}
