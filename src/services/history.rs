// src/services/history.rs
//! Change-history aggregation.
//!
//! Rebuilds the write history of one registry key from `Updated` log entries. Node-side
//! topic filtering has been seen to return entries for unrelated keys, so every entry
//! is matched against the key locally before it counts. Removed (reorged) entries are
//! dropped and the rest are ordered by block number and log index.

use crate::blockchain::ledger::Ledger;
use crate::contracts::identity_registry::IdentityRegistry;
use crate::error::Result;
use crate::models::identity::ChangeEvent;
use chrono::{DateTime, Utc};
use ethers::types::{BlockNumber, Log, H256};
use log::{debug, warn};
use serde::Serialize;
use std::sync::Arc;

/// Ordered change events of a single identifier.
///
/// An identifier that was never written has an empty history; `created`, `updated`
/// and `count` then all report "no history" instead of failing.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeHistory {
    events: Vec<ChangeEvent>,
}

impl ChangeHistory {
    pub fn events(&self) -> &[ChangeEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Timestamps in ledger order.
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.events.iter().map(|e| e.timestamp).collect()
    }

    /// Time of the first write.
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.events.first().map(|e| e.timestamp)
    }

    /// Time of the latest write.
    pub fn updated(&self) -> Option<DateTime<Utc>> {
        self.events.last().map(|e| e.timestamp)
    }

    /// Number of writes, `None` if there were none.
    pub fn count(&self) -> Option<usize> {
        (!self.events.is_empty()).then_some(self.events.len())
    }
}

/// Builds a [`ChangeHistory`] for `key` out of raw log entries.
///
/// Entries that are not `Updated` events of `registry`, that belong to another key, or
/// that were removed by a reorg are skipped.
pub fn aggregate(registry: &IdentityRegistry, key: H256, logs: &[Log]) -> Result<ChangeHistory> {
    let mut events = Vec::with_capacity(logs.len());
    let mut foreign = 0usize;

    for log in logs {
        if log.removed == Some(true) {
            continue;
        }
        match registry.parse_updated(log)? {
            Some(event) if event.identifier == key => events.push(event),
            _ => foreign += 1,
        }
    }

    if foreign > 0 {
        warn!(
            "dropped {} log entries not matching {:?} returned by the node filter",
            foreign, key
        );
    }

    events.sort_by_key(|e| (e.block_number, e.log_index));
    Ok(ChangeHistory { events })
}

/// Queries and aggregates registry change logs.
pub struct HistoryAggregator<L: ?Sized> {
    ledger: Arc<L>,
    registry: IdentityRegistry,
    from_block: u64,
    max_block_range: Option<u64>,
}

impl<L: ?Sized> Clone for HistoryAggregator<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            registry: self.registry,
            from_block: self.from_block,
            max_block_range: self.max_block_range,
        }
    }
}

impl<L: Ledger + ?Sized> HistoryAggregator<L> {
    /// # Arguments
    /// * `ledger` - Shared ledger gateway
    /// * `registry` - Registry whose `Updated` events are read
    /// * `from_block` - First block scanned
    /// * `max_block_range` - Largest span per log query, unbounded when `None`
    pub fn new(
        ledger: Arc<L>,
        registry: IdentityRegistry,
        from_block: u64,
        max_block_range: Option<u64>,
    ) -> Self {
        HistoryAggregator {
            ledger,
            registry,
            from_block,
            max_block_range,
        }
    }

    /// Full change history of `key`.
    ///
    /// # Errors
    /// `Transport` if a log query fails; a partial history is never returned.
    pub async fn history(&self, key: H256) -> Result<ChangeHistory> {
        let logs = match self.max_block_range {
            None => {
                let filter = self.registry.updated_filter(
                    key,
                    BlockNumber::Number(self.from_block.into()),
                    BlockNumber::Latest,
                );
                self.ledger.logs(&filter).await?
            }
            Some(span) => self.chunked_logs(key, span.max(1)).await?,
        };
        debug!("{} log entries returned for {:?}", logs.len(), key);
        aggregate(&self.registry, key, &logs)
    }

    /// Timestamps of every write to `key`, ascending.
    pub async fn change_timestamps(&self, key: H256) -> Result<Vec<DateTime<Utc>>> {
        Ok(self.history(key).await?.timestamps())
    }

    pub async fn created(&self, key: H256) -> Result<Option<DateTime<Utc>>> {
        Ok(self.history(key).await?.created())
    }

    pub async fn updated(&self, key: H256) -> Result<Option<DateTime<Utc>>> {
        Ok(self.history(key).await?.updated())
    }

    pub async fn updated_count(&self, key: H256) -> Result<Option<usize>> {
        Ok(self.history(key).await?.count())
    }

    async fn chunked_logs(&self, key: H256, span: u64) -> Result<Vec<Log>> {
        let latest = self.ledger.block_number().await?;
        let mut logs = Vec::new();
        let mut start = self.from_block;

        while start <= latest {
            let end = start.saturating_add(span - 1).min(latest);
            let filter = self.registry.updated_filter(
                key,
                BlockNumber::Number(start.into()),
                BlockNumber::Number(end.into()),
            );
            logs.extend(self.ledger.logs(&filter).await?);
            start = end + 1;
        }
        Ok(logs)
    }
}
