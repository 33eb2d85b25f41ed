//! Per-run reward ledger.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::data::{ItemDefinition, ItemId, ZoneType};
use crate::events::{EventSink, GameEvent};

/// Immutable copy of the ledger handed out on finalize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSnapshot {
    pub totals: BTreeMap<ItemId, u64>,
}

impl RewardSnapshot {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    #[must_use]
    pub fn distinct_items(&self) -> usize {
        self.totals.len()
    }

    #[must_use]
    pub fn total_for(&self, id: &ItemId) -> u64 {
        self.totals.get(id).copied().unwrap_or(0)
    }

    /// Sum of every item quantity, saturating.
    #[must_use]
    pub fn grand_total(&self) -> u64 {
        self.totals
            .values()
            .fold(0u64, |acc, amount| acc.saturating_add(*amount))
    }
}

/// Accumulates rewards won during a run. The only writer of the ledger.
#[derive(Debug, Clone, Default)]
pub struct RewardManager {
    ledger: BTreeMap<ItemId, u64>,
}

impl RewardManager {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ledger: BTreeMap::new(),
        }
    }

    /// Add `amount` of `item` to the ledger and announce the new total.
    ///
    /// A missing item or a zero amount is a content defect: it is logged and
    /// nothing changes.
    pub fn add_reward(
        &mut self,
        item: Option<&Arc<ItemDefinition>>,
        amount: u64,
        level: u32,
        zone_type: ZoneType,
        sink: &mut impl EventSink,
    ) {
        let Some(item) = item else {
            log::warn!("reward at level {level} has no item; ignoring");
            return;
        };
        if amount == 0 {
            log::warn!("reward `{}` at level {level} has zero amount; ignoring", item.id);
            return;
        }
        let entry = self.ledger.entry(item.id.clone()).or_insert(0);
        *entry = entry.saturating_add(amount);
        let total = *entry;
        sink.emit(GameEvent::RewardAdded {
            item: Arc::clone(item),
            delta: amount,
            total,
            level,
            zone_type,
        });
    }

    pub fn clear(&mut self, sink: &mut impl EventSink) {
        self.ledger.clear();
        sink.emit(GameEvent::RewardsReset);
    }

    /// Announce a snapshot of the ledger. The ledger itself is kept.
    pub fn finalize(&self, sink: &mut impl EventSink) -> RewardSnapshot {
        let snapshot = self.snapshot();
        sink.emit(GameEvent::RewardsFinalized {
            snapshot: snapshot.clone(),
            distinct_items: snapshot.distinct_items(),
        });
        snapshot
    }

    #[must_use]
    pub fn total_for(&self, id: &ItemId) -> u64 {
        self.ledger.get(id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn distinct_items(&self) -> usize {
        self.ledger.len()
    }

    #[must_use]
    pub const fn totals(&self) -> &BTreeMap<ItemId, u64> {
        &self.ledger
    }

    #[must_use]
    pub fn snapshot(&self) -> RewardSnapshot {
        RewardSnapshot {
            totals: self.ledger.clone(),
        }
    }
}
