// src/contracts/identity_registry.rs
//! Identity Registry smart contract interface.
//!
//! The registry exposes a fixed surface: `getIdentity`, `setIdentity`, `setRecovery` and
//! the `Updated` event. The interface is parsed once from its human-readable ABI and
//! every call is encoded through typed helpers, so no method is looked up by name at
//! the call site.

use crate::error::Result;
use crate::models::identity::{ChangeEvent, IdentityRecord};
use crate::utils::time::timestamp_to_datetime;
use ethers::types::{
    transaction::eip2718::TypedTransaction, Address, BlockNumber, Bytes, Filter, Log,
    TransactionRequest, H256, U256,
};
use ethers_contract::BaseContract;
use ethers_core::abi::parse_abi;
use once_cell::sync::Lazy;

/// Human-readable registry ABI.
const REGISTRY_ABI: &[&str] = &[
    "function getIdentity(bytes32 did) external view returns (address owner, address recovery, string serviceHash)",
    "function setIdentity(bytes32 did, address owner, string serviceHash) external",
    "function setRecovery(bytes32 did, address recovery) external",
    "event Updated(bytes32 indexed did, uint256 timestamp)",
];

static REGISTRY: Lazy<BaseContract> = Lazy::new(|| {
    BaseContract::from(parse_abi(REGISTRY_ABI).expect("registry ABI is valid"))
});

/// Name of the change-log event.
pub const UPDATED_EVENT: &str = "Updated";

/// Returns the parsed registry interface.
pub fn registry_abi() -> &'static BaseContract {
    &REGISTRY
}

/// Topic0 of the `Updated` event.
pub fn updated_topic() -> H256 {
    REGISTRY
        .abi()
        .event(UPDATED_EVENT)
        .map(|event| event.signature())
        .expect("Updated event is declared")
}

/// Typed handle on a deployed identity registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityRegistry {
    address: Address,
}

impl IdentityRegistry {
    pub fn new(address: Address) -> Self {
        IdentityRegistry { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Builds the read-only `getIdentity` call for `key`.
    pub fn get_identity(&self, key: H256) -> Result<TypedTransaction> {
        let data = REGISTRY.encode("getIdentity", (key,))?;
        Ok(TransactionRequest::new().to(self.address).data(data).into())
    }

    /// Decodes `getIdentity` output, translating the zero-address recovery sentinel.
    pub fn decode_identity(&self, output: &Bytes) -> Result<IdentityRecord> {
        let (owner, recovery, service_hash): (Address, Address, String) =
            REGISTRY.decode_output("getIdentity", output)?;
        Ok(IdentityRecord::from_registry(owner, recovery, service_hash))
    }

    /// Encodes `setIdentity(key, owner, serviceHash)` call data.
    pub fn set_identity(&self, key: H256, owner: Address, service_hash: &str) -> Result<Bytes> {
        Ok(REGISTRY.encode("setIdentity", (key, owner, service_hash.to_string()))?)
    }

    /// Encodes `setRecovery(key, recovery)` call data.
    pub fn set_recovery(&self, key: H256, recovery: Address) -> Result<Bytes> {
        Ok(REGISTRY.encode("setRecovery", (key, recovery))?)
    }

    /// Log filter for `Updated` events of `key` over `[from, to]`.
    ///
    /// The topic filter is only a hint to the node; results still have to be matched
    /// against `key` locally.
    pub fn updated_filter(&self, key: H256, from: BlockNumber, to: BlockNumber) -> Filter {
        Filter::new()
            .address(self.address)
            .topic0(updated_topic())
            .topic1(key)
            .from_block(from)
            .to_block(to)
    }

    /// Decodes an `Updated` log entry.
    ///
    /// Returns `Ok(None)` for logs that are not `Updated` events of this registry.
    pub fn parse_updated(&self, log: &Log) -> Result<Option<ChangeEvent>> {
        if log.address != self.address || log.topics.first() != Some(&updated_topic()) {
            return Ok(None);
        }

        let (identifier, timestamp): (H256, U256) =
            REGISTRY.decode_event(UPDATED_EVENT, log.topics.clone(), log.data.clone())?;

        Ok(Some(ChangeEvent {
            identifier,
            timestamp: timestamp_to_datetime(timestamp)?,
            block_number: log.block_number.map(|n| n.as_u64()),
            log_index: log.log_index.map(|i| i.as_u64()),
            transaction_hash: log.transaction_hash,
        }))
    }
}
