// src/blockchain/rpc_ledger.rs
//! JSON-RPC ledger client.
//!
//! Implements [`Ledger`] on top of an `ethers` provider:
//! - read-only contract calls
//! - nonce and chain id lookups
//! - raw transaction broadcast with confirmation waiting
//! - change-log queries

use crate::blockchain::ledger::Ledger;
use crate::blockchain::revert::classify;
use crate::config::ResolverConfig;
use crate::error::{ResolverError, Result};
use crate::utils::crypto::transaction_hash;
use async_trait::async_trait;
use ethers::providers::{Http, JsonRpcClient, Middleware, Provider};
use ethers::types::{
    transaction::eip2718::TypedTransaction, Address, BlockId, BlockNumber, Bytes, Filter, Log,
    TransactionReceipt, U256, U64,
};
use ethers_core::utils::rlp::Rlp;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Reason reported when a mined transaction failed and replaying it yields nothing.
const UNKNOWN_REVERT: &str = "transaction reverted without a reason";

/// Ledger gateway backed by a JSON-RPC provider.
///
/// Cloning is cheap; the provider is shared.
#[derive(Debug)]
pub struct RpcLedger<P = Http> {
    /// JSON-RPC provider
    provider: Arc<Provider<P>>,
    /// Blocks to wait for on top of the inclusion block
    confirmations: usize,
    /// Upper bound on the wait for confirmation
    confirmation_timeout: Duration,
}

impl<P> Clone for RpcLedger<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            confirmations: self.confirmations,
            confirmation_timeout: self.confirmation_timeout,
        }
    }
}

impl RpcLedger<Http> {
    /// Creates an HTTP ledger client for the configured endpoint.
    ///
    /// # Errors
    /// `Transport` if the RPC url cannot be parsed.
    pub fn connect(config: &ResolverConfig) -> Result<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| {
                ResolverError::Transport(format!("invalid RPC url `{}`: {}", config.rpc_url, e))
            })?
            .interval(config.poll_interval());
        Ok(Self::new(provider, config))
    }
}

impl<P: JsonRpcClient + 'static> RpcLedger<P> {
    /// Wraps an existing provider.
    pub fn new(provider: Provider<P>, config: &ResolverConfig) -> Self {
        RpcLedger {
            provider: Arc::new(provider),
            confirmations: config.confirmations,
            confirmation_timeout: config.confirmation_timeout(),
        }
    }

    /// Re-executes a failed transaction as a call at its inclusion block to recover the
    /// revert reason, which receipts do not carry.
    async fn replay_reason(&self, raw: &Bytes, receipt: &TransactionReceipt) -> String {
        let (mut tx, signature) = match TypedTransaction::decode_signed(&Rlp::new(raw.as_ref())) {
            Ok(decoded) => decoded,
            Err(e) => {
                debug!("cannot decode submitted transaction for replay: {}", e);
                return UNKNOWN_REVERT.to_string();
            }
        };
        if let Ok(from) = signature.recover(tx.sighash()) {
            tx.set_from(from);
        }

        let block = receipt
            .block_number
            .map(|n| BlockId::Number(BlockNumber::Number(n)));
        match self.provider.call(&tx, block).await.map_err(classify) {
            Err(ResolverError::RegistryRejected { reason }) => reason,
            Err(e) => {
                debug!("replay of {:?} failed: {}", receipt.transaction_hash, e);
                UNKNOWN_REVERT.to_string()
            }
            Ok(_) => UNKNOWN_REVERT.to_string(),
        }
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> Ledger for RpcLedger<P> {
    async fn chain_id(&self) -> Result<u64> {
        let chain_id = self.provider.get_chainid().await.map_err(classify)?;
        Ok(chain_id.as_u64())
    }

    async fn transaction_count(&self, address: Address) -> Result<U256> {
        self.provider
            .get_transaction_count(address, None)
            .await
            .map_err(classify)
    }

    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes> {
        debug!("eth_call to {:?}", tx.to_addr());
        self.provider.call(tx, None).await.map_err(classify)
    }

    async fn submit(&self, raw: Bytes) -> Result<TransactionReceipt> {
        let hash = transaction_hash(&raw);
        debug!("broadcasting transaction {:?}", hash);

        let pending = self
            .provider
            .send_raw_transaction(raw.clone())
            .await
            .map_err(classify)?
            .confirmations(self.confirmations);

        let receipt = tokio::time::timeout(self.confirmation_timeout, pending)
            .await
            .map_err(|_| {
                warn!(
                    "transaction {:?} not confirmed within {:?}; it may still be mined",
                    hash, self.confirmation_timeout
                );
                ResolverError::Transport(format!(
                    "transaction {:?} not confirmed within {:?}",
                    hash, self.confirmation_timeout
                ))
            })?
            .map_err(classify)?
            .ok_or_else(|| {
                ResolverError::Transport(format!("transaction {:?} was dropped", hash))
            })?;

        if receipt.status == Some(U64::zero()) {
            let reason = self.replay_reason(&raw, &receipt).await;
            warn!("transaction {:?} reverted: {}", hash, reason);
            return Err(ResolverError::RegistryRejected { reason });
        }

        info!(
            "transaction {:?} confirmed in block {:?}",
            receipt.transaction_hash, receipt.block_number
        );
        Ok(receipt)
    }

    async fn block_number(&self) -> Result<u64> {
        let number = self.provider.get_block_number().await.map_err(classify)?;
        Ok(number.as_u64())
    }

    async fn logs(&self, filter: &Filter) -> Result<Vec<Log>> {
        self.provider.get_logs(filter).await.map_err(classify)
    }
}
