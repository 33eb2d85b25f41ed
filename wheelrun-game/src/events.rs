//! Inputs consumed and announcements produced by the run orchestrator.
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::content::WheelOutcome;
use crate::data::{ItemDefinition, ZoneType};
use crate::orchestrator::RunState;
use crate::rewards::RewardSnapshot;
use crate::session::SessionSummary;

/// How the player pays for a revive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviveMethod {
    Currency,
    Advertisement,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// The player banked the ledger from an exit-eligible zone or the final level.
    Collected,
    /// The player gave up after a bomb; the ledger was discarded.
    GaveUp,
}

/// Player or presentation-layer input driving the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerInput {
    StartRun,
    SpinRequested,
    /// The wheel animation stopped; `landed_index` is whatever the
    /// presentation layer reports and is validated before use.
    SpinCompleted { landed_index: i64 },
    CollectRequested,
    GiveUpRequested,
    ReviveRequested(ReviveMethod),
    ResultAnimationCompleted,
    ItemsCollected,
}

/// Discriminant used to subscribe to a subset of announcements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    RunStarted,
    RunEnded,
    ZoneChanged,
    SafeZoneAhead,
    SuperZoneAhead,
    SpinStarted,
    BombHit,
    ReviveSucceeded,
    ReviveFailed,
    RewardAdded,
    RewardsReset,
    RewardsFinalized,
    StateChanged,
}

impl EventKind {
    pub const ALL: [Self; 13] = [
        Self::RunStarted,
        Self::RunEnded,
        Self::ZoneChanged,
        Self::SafeZoneAhead,
        Self::SuperZoneAhead,
        Self::SpinStarted,
        Self::BombHit,
        Self::ReviveSucceeded,
        Self::ReviveFailed,
        Self::RewardAdded,
        Self::RewardsReset,
        Self::RewardsFinalized,
        Self::StateChanged,
    ];
}

/// Announcement emitted by the core, in production order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEvent {
    RunStarted {
        levels: Vec<u32>,
        max_level: u32,
        starting_level: u32,
    },
    RunEnded {
        final_level: u32,
        outcome: RunOutcome,
        summary: SessionSummary,
        run: u32,
    },
    ZoneChanged {
        level: u32,
        zone_type: ZoneType,
    },
    SafeZoneAhead {
        level: u32,
    },
    SuperZoneAhead {
        level: u32,
        exclusive_reward: Option<Arc<ItemDefinition>>,
    },
    SpinStarted {
        outcomes: Vec<WheelOutcome>,
        target_index: usize,
        zone_type: ZoneType,
    },
    BombHit {
        level: u32,
        can_revive: bool,
        revive_cost: u32,
    },
    ReviveSucceeded {
        level: u32,
        method: ReviveMethod,
        cost: u32,
    },
    ReviveFailed {
        reason: String,
    },
    RewardAdded {
        item: Arc<ItemDefinition>,
        delta: u64,
        total: u64,
        level: u32,
        zone_type: ZoneType,
    },
    RewardsReset,
    RewardsFinalized {
        snapshot: RewardSnapshot,
        distinct_items: usize,
    },
    StateChanged {
        previous: RunState,
        current: RunState,
    },
}

impl GameEvent {
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::RunStarted { .. } => EventKind::RunStarted,
            Self::RunEnded { .. } => EventKind::RunEnded,
            Self::ZoneChanged { .. } => EventKind::ZoneChanged,
            Self::SafeZoneAhead { .. } => EventKind::SafeZoneAhead,
            Self::SuperZoneAhead { .. } => EventKind::SuperZoneAhead,
            Self::SpinStarted { .. } => EventKind::SpinStarted,
            Self::BombHit { .. } => EventKind::BombHit,
            Self::ReviveSucceeded { .. } => EventKind::ReviveSucceeded,
            Self::ReviveFailed { .. } => EventKind::ReviveFailed,
            Self::RewardAdded { .. } => EventKind::RewardAdded,
            Self::RewardsReset => EventKind::RewardsReset,
            Self::RewardsFinalized { .. } => EventKind::RewardsFinalized,
            Self::StateChanged { .. } => EventKind::StateChanged,
        }
    }
}

/// Destination for announcements produced while handling one input.
pub trait EventSink {
    fn emit(&mut self, event: GameEvent);
}

impl EventSink for Vec<GameEvent> {
    fn emit(&mut self, event: GameEvent) {
        self.push(event);
    }
}
