// src/blockchain/transaction.rs
//! Transaction builder.
//!
//! Turns encoded registry call data plus a caller-supplied raw key into a signed,
//! submittable transaction.
//!
//! The nonce is read from the ledger at call time. Two concurrent writes signed with the
//! same key can therefore pick the same nonce and one of them will fail; callers must
//! keep a single writer per key.

use crate::blockchain::ledger::Ledger;
use crate::error::{ResolverError, Result};
use crate::utils::crypto::transaction_hash;
use crate::wallet::key_management::{address_of, parse_signing_key, sign};
use ethers::types::{
    transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest, H256, U256,
};
use log::debug;

/// Fixed gas parameters of a resolver instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasSettings {
    pub gas_limit: U256,
    /// Gas price in wei.
    pub gas_price: U256,
}

impl GasSettings {
    pub fn new(gas_limit: u64, gas_price: u64) -> Self {
        GasSettings {
            gas_limit: gas_limit.into(),
            gas_price: gas_price.into(),
        }
    }
}

/// A signed transaction ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCall {
    /// RLP wire encoding
    pub raw: Bytes,
    pub from: Address,
    pub nonce: U256,
    pub hash: H256,
}

/// Assembles the unsigned legacy envelope.
pub fn envelope(
    to: Address,
    data: Bytes,
    nonce: U256,
    gas: &GasSettings,
    chain_id: u64,
) -> TypedTransaction {
    TransactionRequest::new()
        .to(to)
        .data(data)
        .nonce(nonce)
        .gas(gas.gas_limit)
        .gas_price(gas.gas_price)
        .chain_id(chain_id)
        .into()
}

/// Builds and signs a call to `to` on behalf of `raw_key`.
///
/// # Arguments
/// * `ledger` - Ledger used for the nonce (and chain id, when not configured)
/// * `raw_key` - 32-byte secp256k1 private key
/// * `to` - Destination contract
/// * `data` - Encoded call data, passed through unchecked
/// * `gas` - Gas limit and price
/// * `chain_id` - Configured chain id, fetched from the ledger when `None`
///
/// # Errors
/// - `InvalidKey` if `raw_key` is malformed
/// - `NonceFetch` if the sender's transaction count cannot be read
/// - `Transport` if the chain id lookup fails
pub async fn build_signed_call<L: Ledger + ?Sized>(
    ledger: &L,
    raw_key: &[u8],
    to: Address,
    data: Bytes,
    gas: &GasSettings,
    chain_id: Option<u64>,
) -> Result<SignedCall> {
    let key = parse_signing_key(raw_key)?;
    let from = address_of(&key);

    let nonce_fetch = async {
        ledger
            .transaction_count(from)
            .await
            .map_err(|e| ResolverError::NonceFetch {
                address: from,
                reason: e.to_string(),
            })
    };
    let chain_fetch = async {
        match chain_id {
            Some(id) => Ok(id),
            None => ledger.chain_id().await,
        }
    };
    let (nonce, chain_id) = futures::try_join!(nonce_fetch, chain_fetch)?;

    let tx = envelope(to, data, nonce, gas, chain_id);
    let raw = sign(&key, &tx)?;
    let hash = transaction_hash(&raw);
    debug!(
        "signed transaction {:?} from {:?} with nonce {} on chain {}",
        hash, from, nonce, chain_id
    );

    Ok(SignedCall {
        raw,
        from,
        nonce,
        hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_carries_fixed_gas() {
        let gas = GasSettings::new(250_000, 20_000_000_000);
        let tx = envelope(
            Address::repeat_byte(0x42),
            Bytes::from(vec![0x01]),
            U256::from(3),
            &gas,
            1337,
        );
        assert_eq!(tx.gas(), Some(&U256::from(250_000)));
        assert_eq!(tx.gas_price(), Some(U256::from(20_000_000_000u64)));
        assert_eq!(tx.nonce(), Some(&U256::from(3)));
        assert_eq!(tx.chain_id(), Some(1337u64.into()));
        assert_eq!(tx.to_addr(), Some(&Address::repeat_byte(0x42)));
    }
}
