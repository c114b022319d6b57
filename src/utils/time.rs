// src/utils/time.rs
//! Conversions between ledger timestamps and `chrono` dates.

use crate::error::{ResolverError, Result};
use chrono::{DateTime, TimeZone, Utc};
use ethers::types::U256;

/// Converts a `uint256` unix timestamp (seconds) into a UTC date.
///
/// # Errors
/// `Decode` if the value does not fit a representable date.
pub fn timestamp_to_datetime(seconds: U256) -> Result<DateTime<Utc>> {
    if seconds > U256::from(i64::MAX as u64) {
        return Err(ResolverError::Decode(format!(
            "timestamp {} out of range",
            seconds
        )));
    }
    Utc.timestamp_opt(seconds.as_u64() as i64, 0)
        .single()
        .ok_or_else(|| ResolverError::Decode(format!("timestamp {} out of range", seconds)))
}
