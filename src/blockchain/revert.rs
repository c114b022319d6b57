// src/blockchain/revert.rs
//! Revert reason extraction.
//!
//! Nodes report reverts in several shapes: ABI-encoded `Error(string)` data (geth,
//! anvil), a textual marker in the error message (ganache, hardhat), or a nested
//! object keyed by transaction hash (older ganache). The reason is returned verbatim so
//! callers can match on the registry's policy text.

use crate::error::ResolverError;
use ethers::providers::{JsonRpcError, ProviderError, RpcError};
use ethers_core::abi::{decode, ParamType, Token};
use ethers_core::utils::hex;
use serde_json::Value;

/// Selector of `Error(string)`.
const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Message prefixes that precede a reason string, most specific first.
const REASON_MARKERS: [&str; 3] = [
    "reverted with reason string '",
    "execution reverted: ",
    "revert ",
];

/// Maps a provider failure onto the resolver taxonomy.
pub fn classify(err: ProviderError) -> ResolverError {
    if let Some(reason) = err.as_error_response().and_then(revert_reason) {
        return ResolverError::RegistryRejected { reason };
    }
    ResolverError::Transport(err.to_string())
}

/// Revert reason carried by a JSON-RPC error response, if it describes a revert.
pub fn revert_reason(err: &JsonRpcError) -> Option<String> {
    err.data
        .as_ref()
        .and_then(reason_from_data)
        .or_else(|| reason_from_message(&err.message))
}

/// Decodes ABI-encoded `Error(string)` revert data.
pub fn decode_revert_data(data: &[u8]) -> Option<String> {
    if data.len() < 4 || data[..4] != ERROR_STRING_SELECTOR {
        return None;
    }
    match decode(&[ParamType::String], &data[4..]).ok()?.pop()? {
        Token::String(reason) => Some(reason),
        _ => None,
    }
}

fn reason_from_data(data: &Value) -> Option<String> {
    match data {
        Value::String(encoded) => hex::decode(encoded.strip_prefix("0x").unwrap_or(encoded))
            .ok()
            .and_then(|bytes| decode_revert_data(&bytes)),
        Value::Object(map) => {
            if let Some(reason) = map.get("reason").and_then(Value::as_str) {
                return Some(reason.to_string());
            }
            map.get("data")
                .and_then(reason_from_data)
                .or_else(|| map.values().find_map(reason_from_data))
        }
        _ => None,
    }
}

fn reason_from_message(message: &str) -> Option<String> {
    for marker in REASON_MARKERS {
        if let Some(idx) = message.find(marker) {
            let reason = message[idx + marker.len()..].trim_end_matches('\'').trim();
            if !reason.is_empty() {
                return Some(reason.to_string());
            }
        }
    }
    // A revert without a reason string is still a revert.
    message.contains("revert").then(|| message.to_string())
}
