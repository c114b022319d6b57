// src/models/identity.rs
//! Identity registry data model.
//!
//! These types are the resolver's view of ledger-owned state. None of them is persisted
//! locally; every value is read through from the registry on demand.

use chrono::{DateTime, Utc};
use ethers::types::{Address, H256};
use serde::{Deserialize, Serialize};

/// The registry's record for one identifier.
///
/// # Fields
/// - `owner`: address currently authorized to update the record
/// - `recovery`: address allowed to take over ownership, `None` when unset
/// - `service_hash`: opaque content pointer to off-chain service metadata
///
/// The registry reports an unset recovery key as the zero address. That sentinel is
/// converted to `None` in [`IdentityRecord::from_registry`] and never exposed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    pub owner: Address,
    pub recovery: Option<Address>,
    /// An empty string means "no service data".
    pub service_hash: String,
}

impl IdentityRecord {
    /// Builds a record from the raw `getIdentity` outputs.
    pub fn from_registry(owner: Address, recovery: Address, service_hash: String) -> Self {
        IdentityRecord {
            owner,
            recovery: (!recovery.is_zero()).then_some(recovery),
            service_hash,
        }
    }

    pub fn has_recovery(&self) -> bool {
        self.recovery.is_some()
    }
}

/// One entry of the registry's `Updated` change log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// Registry key the event was emitted for.
    pub identifier: H256,
    /// Block timestamp recorded by the registry.
    pub timestamp: DateTime<Utc>,
    pub block_number: Option<u64>,
    pub log_index: Option<u64>,
    pub transaction_hash: Option<H256>,
}

/// Result of a confirmed registry write.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    pub transaction_hash: H256,
    pub block_number: Option<u64>,
    /// Timestamp of the `Updated` event carried by the receipt, when the registry
    /// emitted one for this identifier.
    pub updated_at: Option<DateTime<Utc>>,
}
