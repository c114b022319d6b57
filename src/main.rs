// src/main.rs

//! # DID Registry Resolver - Command Line Entry Point
//!
//! Resolves one DID against the configured registry and prints its record and change
//! history as JSON.
//!
//! ## Usage
//! ```text
//! did-registry-resolver did:jolo:bf8095f75ec116362eb31d5e68736be6688f82db616d1dd7df5e9f99047347b2
//! ```
//!
//! ## Environment Variables Required
//! - `DID_RESOLVER_RPC_URL`: JSON-RPC endpoint of the ledger
//! - `DID_RESOLVER_REGISTRY_ADDRESS`: deployed identity registry address
//!
//! Optional settings are listed in [`did_registry_resolver::config`]. `RUST_LOG`
//! controls log output.

use anyhow::{bail, Context};
use did_registry_resolver::{Resolver, ResolverConfig};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let did = match std::env::args().nth(1) {
        Some(did) => did,
        None => bail!("usage: did-registry-resolver <did>"),
    };

    let config = ResolverConfig::from_env().context("failed to load resolver configuration")?;
    let resolver = Resolver::connect(&config)?;

    let record = resolver
        .resolve_did(&did)
        .await
        .with_context(|| format!("failed to resolve {}", did))?;
    let history = resolver.history(&did).await?;

    let output = json!({
        "did": did,
        "record": record,
        "created": history.created(),
        "updated": history.updated(),
        "updateCount": history.count(),
        "events": history.events(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
