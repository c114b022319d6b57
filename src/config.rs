// src/config.rs
//! Resolver configuration.
//!
//! Values are read from `DID_RESOLVER_*` environment variables (a `.env` file is honoured)
//! through the `config` crate:
//!
//! | Variable                              | Default        |
//! |---------------------------------------|----------------|
//! | `DID_RESOLVER_RPC_URL`                | required       |
//! | `DID_RESOLVER_REGISTRY_ADDRESS`       | required       |
//! | `DID_RESOLVER_GAS_LIMIT`              | 250000         |
//! | `DID_RESOLVER_GAS_PRICE`              | 20 gwei        |
//! | `DID_RESOLVER_CHAIN_ID`               | `eth_chainId`  |
//! | `DID_RESOLVER_CONFIRMATIONS`          | 1              |
//! | `DID_RESOLVER_CONFIRMATION_TIMEOUT_SECS` | 120         |
//! | `DID_RESOLVER_POLL_INTERVAL_MS`       | 500            |
//! | `DID_RESOLVER_FROM_BLOCK`             | 0              |
//! | `DID_RESOLVER_MAX_BLOCK_RANGE`        | unbounded      |

use crate::error::Result;
use config::{Config, Environment};
use ethers::types::Address;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const ENV_PREFIX: &str = "DID_RESOLVER";

pub const DEFAULT_GAS_LIMIT: u64 = 250_000;
pub const DEFAULT_GAS_PRICE: u64 = 20_000_000_000;

/// Settings owned by a resolver instance for its lifetime.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ResolverConfig {
    /// JSON-RPC endpoint of the ledger.
    pub rpc_url: String,
    /// Address of the deployed identity registry.
    pub registry_address: Address,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    /// Gas price in wei.
    #[serde(default = "default_gas_price")]
    pub gas_price: u64,
    /// Chain id used for EIP-155 signing. Fetched from the ledger when unset.
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default = "default_confirmations")]
    pub confirmations: usize,
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// First block scanned for change-log events, usually the deployment block.
    #[serde(default)]
    pub from_block: u64,
    /// Largest block span per `eth_getLogs` request.
    #[serde(default)]
    pub max_block_range: Option<u64>,
}

fn default_gas_limit() -> u64 {
    DEFAULT_GAS_LIMIT
}

fn default_gas_price() -> u64 {
    DEFAULT_GAS_PRICE
}

fn default_confirmations() -> usize {
    1
}

fn default_confirmation_timeout_secs() -> u64 {
    120
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl ResolverConfig {
    /// Configuration with defaults for everything but the endpoint and registry.
    pub fn new(rpc_url: impl Into<String>, registry_address: Address) -> Self {
        ResolverConfig {
            rpc_url: rpc_url.into(),
            registry_address,
            gas_limit: DEFAULT_GAS_LIMIT,
            gas_price: DEFAULT_GAS_PRICE,
            chain_id: None,
            confirmations: default_confirmations(),
            confirmation_timeout_secs: default_confirmation_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            from_block: 0,
            max_block_range: None,
        }
    }

    /// Loads the configuration from the process environment and `.env`.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::load(None)
    }

    /// Loads the configuration from an explicit variable map instead of the process
    /// environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::load(Some(vars))
    }

    fn load(vars: Option<HashMap<String, String>>) -> Result<Self> {
        let settings = Config::builder()
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
