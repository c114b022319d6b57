// src/lib.rs

//! # DID Registry Resolver
//!
//! Client-side resolver for DIDs anchored in an on-chain identity registry.
//!
//! ## Architecture Overview
//! 1. **Models**: DID codec and registry record types
//! 2. **Contracts**: typed interface of the identity registry
//! 3. **Wallet**: per-call raw-key parsing and transaction signing
//! 4. **Blockchain**: ledger gateway, JSON-RPC client, transaction builder
//! 5. **Services**: history aggregation and the [`Resolver`] facade
//!
//! ## Example
//! ```no_run
//! use did_registry_resolver::{Resolver, ResolverConfig};
//!
//! # async fn run() -> did_registry_resolver::Result<()> {
//! let config = ResolverConfig::from_env()?;
//! let resolver = Resolver::connect(&config)?;
//! let record = resolver.resolve_did("did:jolo:bf8095f75ec116362eb31d5e68736be6688f82db616d1dd7df5e9f99047347b2").await?;
//! println!("owner: {:?}", record.owner);
//! # Ok(())
//! # }
//! ```

pub mod blockchain;
pub mod config;
pub mod contracts;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod wallet;

pub use blockchain::ledger::Ledger;
pub use blockchain::rpc_ledger::RpcLedger;
pub use config::ResolverConfig;
pub use error::{ResolverError, Result};
pub use models::did::{registry_key, strip_method_prefix};
pub use models::identity::{ChangeEvent, IdentityRecord, WriteOutcome};
pub use services::history::ChangeHistory;
pub use services::resolver::Resolver;
