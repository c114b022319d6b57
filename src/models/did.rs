// src/models/did.rs
//! DID codec: maps `did:<method>:<identifier>` strings onto registry lookup keys.
//!
//! Only the identifier after the last `:` is significant. The method segment is not
//! validated here.

use crate::error::{ResolverError, Result};
use ethers_core::{types::H256, utils::hex};

/// Strips everything up to and including the last `:` and prefixes the remainder
/// with the `0x` byte-string marker.
///
/// A DID without any `:` is returned whole (prefixed).
///
/// # Example
/// ```
/// use did_registry_resolver::models::did::strip_method_prefix;
/// assert_eq!(strip_method_prefix("did:jolo:bf80"), "0xbf80");
/// ```
pub fn strip_method_prefix(did: &str) -> String {
    let start = did.rfind(':').map_or(0, |idx| idx + 1);
    format!("0x{}", &did[start..])
}

/// Converts a DID into the registry's `bytes32` key.
///
/// The identifier must be hex and at most 32 bytes. Shorter identifiers are
/// left-aligned and zero padded on the right, the way `bytes32` literals are padded.
/// An odd number of hex digits gets a leading `0` nibble.
///
/// # Errors
/// `MalformedDid` if the identifier is empty, not hex, or longer than 32 bytes.
pub fn registry_key(did: &str) -> Result<H256> {
    let key = strip_method_prefix(did);
    let digits = &key[2..];

    if digits.is_empty() {
        return Err(malformed(did, "empty identifier"));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(malformed(did, "identifier is not hex"));
    }

    let padded;
    let digits = if digits.len() % 2 == 1 {
        padded = format!("0{}", digits);
        padded.as_str()
    } else {
        digits
    };

    let bytes = hex::decode(digits).map_err(|e| malformed(did, &e.to_string()))?;
    if bytes.len() > H256::len_bytes() {
        return Err(malformed(
            did,
            &format!("identifier is {} bytes, at most 32 allowed", bytes.len()),
        ));
    }

    let mut out = [0u8; 32];
    out[..bytes.len()].copy_from_slice(&bytes);
    Ok(H256::from(out))
}

fn malformed(did: &str, reason: &str) -> ResolverError {
    ResolverError::MalformedDid {
        did: did.to_string(),
        reason: reason.to_string(),
    }
}
