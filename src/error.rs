// src/error.rs
//! Error taxonomy for the DID registry resolver.
//!
//! Every failure surfaces to the caller; nothing is swallowed. The variants mirror the
//! outcomes a caller can act on:
//! - `MalformedDid` / `InvalidKey`: bad input, fix it and call again
//! - `Transport`: the ledger could not be reached, reads may be retried
//! - `RegistryRejected`: the registry executed and reverted the call, never retry as-is
//! - `NotFound`: the identifier has no registry record

use ethers::types::Address;
use thiserror::Error;

/// Errors produced by resolver operations.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// The DID identifier cannot be turned into a registry key.
    #[error("malformed DID `{did}`: {reason}")]
    MalformedDid { did: String, reason: String },

    /// The signing key is not a valid secp256k1 private key.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    /// The sender's transaction count could not be fetched.
    #[error("failed to fetch nonce for {address:?}: {reason}")]
    NonceFetch { address: Address, reason: String },

    /// Network, timeout or connection failure talking to the ledger.
    #[error("transport error: {0}")]
    Transport(String),

    /// The registry executed the call and reverted it. `reason` is verbatim.
    #[error("registry rejected the call: {reason}")]
    RegistryRejected { reason: String },

    /// No registry record exists for the identifier.
    #[error("DID `{0}` is not registered")]
    NotFound(String),

    /// The ledger returned data that does not match the registry interface.
    #[error("failed to decode registry data: {0}")]
    Decode(String),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ResolverError {
    /// Returns the verbatim revert reason for `RegistryRejected`.
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            ResolverError::RegistryRejected { reason } => Some(reason),
            _ => None,
        }
    }

    /// True for failures of the transport itself.
    ///
    /// Read operations are idempotent and safe to retry when this holds. Writes are not:
    /// the transaction may already have been broadcast, so check the sender's nonce or
    /// the registry state before resubmitting.
    pub fn is_transport(&self) -> bool {
        matches!(self, ResolverError::Transport(_))
    }
}

impl From<ethers_contract::AbiError> for ResolverError {
    fn from(err: ethers_contract::AbiError) -> Self {
        ResolverError::Decode(err.to_string())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ResolverError>;
