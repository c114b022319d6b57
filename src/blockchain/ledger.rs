// src/blockchain/ledger.rs
//! Ledger gateway abstraction.
//!
//! Everything the resolver needs from the remote ledger goes through [`Ledger`]:
//! read-only calls, nonce and chain id lookups, raw transaction submission with
//! confirmation waiting, and change-log queries. [`RpcLedger`](super::rpc_ledger::RpcLedger)
//! implements it over JSON-RPC.

use crate::error::Result;
use async_trait::async_trait;
use ethers::types::{
    transaction::eip2718::TypedTransaction, Address, Bytes, Filter, Log, TransactionReceipt,
    U256,
};

/// Remote ledger operations used by the resolver.
///
/// Implementations map network failures to `ResolverError::Transport` and revert
/// outcomes to `ResolverError::RegistryRejected` carrying the verbatim reason.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Chain id used for EIP-155 replay protection.
    async fn chain_id(&self) -> Result<u64>;

    /// Number of transactions sent by `address`, i.e. its next nonce.
    async fn transaction_count(&self, address: Address) -> Result<U256>;

    /// Executes a read-only call against current state.
    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes>;

    /// Broadcasts a signed transaction and resolves once it is confirmed.
    ///
    /// A transaction included with a failed status is reported as
    /// `RegistryRejected`, never as a successful receipt.
    async fn submit(&self, raw: Bytes) -> Result<TransactionReceipt>;

    /// Latest block number.
    async fn block_number(&self) -> Result<u64>;

    /// Log entries matching `filter`.
    ///
    /// The node's filtering is not authoritative: results may include entries that do
    /// not match the requested topics, so callers must re-check every entry.
    async fn logs(&self, filter: &Filter) -> Result<Vec<Log>>;
}
