// src/services/resolver.rs
//! Resolver facade.
//!
//! Public entry point of the crate. Composes the DID codec, the transaction builder,
//! the ledger gateway and the history aggregator into the resolver operations:
//! - `resolve_did` / `get_recovery_key`: read the current registry record
//! - `update_identity` / `set_recovery_key`: signed registry writes
//! - `get_created` / `get_updated` / `get_updated_count` / `history`: change log
//!
//! The resolver performs no authorization checks of its own. Whether a key may write a
//! record is decided by the registry and reported back as `RegistryRejected`. Writes
//! are never retried: after a `Transport` error the transaction may still be mined, so
//! the caller has to inspect ledger state before submitting again.

use crate::blockchain::ledger::Ledger;
use crate::blockchain::rpc_ledger::RpcLedger;
use crate::blockchain::transaction::{build_signed_call, GasSettings};
use crate::config::ResolverConfig;
use crate::contracts::identity_registry::IdentityRegistry;
use crate::error::{ResolverError, Result};
use crate::models::did::registry_key;
use crate::models::identity::{IdentityRecord, WriteOutcome};
use crate::services::history::{ChangeHistory, HistoryAggregator};
use chrono::{DateTime, Utc};
use ethers::providers::Http;
use ethers::types::{Address, Bytes, H256};
use log::{debug, info, warn};
use std::sync::Arc;

/// Client for an on-chain identity registry.
///
/// Holds only configuration and a shared ledger handle; cloning is cheap and every
/// operation takes `&self`, so one instance can serve concurrent tasks.
pub struct Resolver<L: ?Sized = RpcLedger> {
    /// Shared ledger gateway
    ledger: Arc<L>,
    /// Registry the resolver reads and writes
    registry: IdentityRegistry,
    /// Fixed gas parameters for writes
    gas: GasSettings,
    /// Configured chain id, looked up per write when `None`
    chain_id: Option<u64>,
    history: HistoryAggregator<L>,
}

impl<L: ?Sized> Clone for Resolver<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            registry: self.registry,
            gas: self.gas,
            chain_id: self.chain_id,
            history: self.history.clone(),
        }
    }
}

impl Resolver<RpcLedger> {
    /// Creates a resolver talking JSON-RPC over HTTP to `config.rpc_url`.
    ///
    /// # Errors
    /// `Transport` if the endpoint url is invalid.
    pub fn connect(config: &ResolverConfig) -> Result<Self> {
        let ledger = RpcLedger::<Http>::connect(config)?;
        Ok(Self::with_ledger(Arc::new(ledger), config))
    }
}

impl<L: Ledger + ?Sized> Resolver<L> {
    /// Creates a resolver over an arbitrary ledger gateway.
    pub fn with_ledger(ledger: Arc<L>, config: &ResolverConfig) -> Self {
        let registry = IdentityRegistry::new(config.registry_address);
        let history = HistoryAggregator::new(
            ledger.clone(),
            registry,
            config.from_block,
            config.max_block_range,
        );
        Resolver {
            ledger,
            registry,
            gas: GasSettings::new(config.gas_limit, config.gas_price),
            chain_id: config.chain_id,
            history,
        }
    }

    pub fn registry_address(&self) -> Address {
        self.registry.address()
    }

    /// Reads the current registry record of `did`.
    ///
    /// # Errors
    /// - `MalformedDid` if the identifier is not a hex key of at most 32 bytes
    /// - `NotFound` if the registry holds no record (zero owner)
    /// - `RegistryRejected` if the registry reverts the read
    /// - `Transport` on network failure
    pub async fn resolve_did(&self, did: &str) -> Result<IdentityRecord> {
        let key = registry_key(did)?;
        debug!("resolving {} as {:?}", did, key);

        let output = self.ledger.call(&self.registry.get_identity(key)?).await?;
        let record = self.registry.decode_identity(&output)?;
        if record.owner.is_zero() {
            return Err(ResolverError::NotFound(did.to_string()));
        }
        Ok(record)
    }

    /// Recovery address currently set for `did`, if any.
    pub async fn get_recovery_key(&self, did: &str) -> Result<Option<Address>> {
        Ok(self.resolve_did(did).await?.recovery)
    }

    /// Sets owner and service hash of `did`, signed with `signing_key`.
    ///
    /// The first write registers the identifier. Afterwards the registry accepts the
    /// current owner, or the recovery key (which transfers ownership and clears the
    /// recovery key).
    ///
    /// # Arguments
    /// * `signing_key` - Raw 32-byte secp256k1 private key, used for this call only
    /// * `did` - DID whose record is written
    /// * `owner` - New owner address
    /// * `service_hash` - Content pointer to service metadata, may be empty
    ///
    /// # Returns
    /// Hash, block and `Updated` timestamp of the confirmed transaction
    pub async fn update_identity(
        &self,
        signing_key: &[u8],
        did: &str,
        owner: Address,
        service_hash: &str,
    ) -> Result<WriteOutcome> {
        let key = registry_key(did)?;
        let data = self.registry.set_identity(key, owner, service_hash)?;
        let outcome = self.write(signing_key, key, data).await?;
        info!("identity of {} set to owner {:?}", did, owner);
        Ok(outcome)
    }

    /// Sets the recovery address of `did`, signed with `signing_key`.
    ///
    /// The registry only accepts this from the current owner, and only once.
    pub async fn set_recovery_key(
        &self,
        signing_key: &[u8],
        did: &str,
        recovery: Address,
    ) -> Result<WriteOutcome> {
        let key = registry_key(did)?;
        let data = self.registry.set_recovery(key, recovery)?;
        let outcome = self.write(signing_key, key, data).await?;
        info!("recovery key of {} set to {:?}", did, recovery);
        Ok(outcome)
    }

    /// Ordered change history of `did`.
    pub async fn history(&self, did: &str) -> Result<ChangeHistory> {
        self.history.history(registry_key(did)?).await
    }

    /// Time of the first write to `did`, `None` if it was never written.
    pub async fn get_created(&self, did: &str) -> Result<Option<DateTime<Utc>>> {
        self.history.created(registry_key(did)?).await
    }

    /// Time of the latest write to `did`, `None` if it was never written.
    pub async fn get_updated(&self, did: &str) -> Result<Option<DateTime<Utc>>> {
        self.history.updated(registry_key(did)?).await
    }

    /// Number of writes to `did`, `None` if it was never written.
    pub async fn get_updated_count(&self, did: &str) -> Result<Option<usize>> {
        self.history.updated_count(registry_key(did)?).await
    }

    async fn write(&self, signing_key: &[u8], key: H256, data: Bytes) -> Result<WriteOutcome> {
        let signed = build_signed_call(
            self.ledger.as_ref(),
            signing_key,
            self.registry.address(),
            data,
            &self.gas,
            self.chain_id,
        )
        .await?;

        let receipt = self.ledger.submit(signed.raw).await?;

        // The write is committed at this point; a log that fails to decode only costs
        // the timestamp.
        let mut updated_at = None;
        for log in &receipt.logs {
            match self.registry.parse_updated(log) {
                Ok(Some(event)) if event.identifier == key => updated_at = Some(event.timestamp),
                Ok(_) => {}
                Err(e) => warn!(
                    "skipping undecodable log in receipt {:?}: {}",
                    receipt.transaction_hash, e
                ),
            }
        }

        Ok(WriteOutcome {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number.map(|n| n.as_u64()),
            updated_at,
        })
    }
}
