//! Run statistics and revive economics.
use serde::{Deserialize, Serialize};

use crate::numbers::{exponent_from_count, round_f64_to_u32};

/// Point-in-time copy of the session statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub death_count: u32,
    pub revive_count: u32,
    pub max_revives_allowed: u32,
    pub base_revive_cost: u32,
    pub revive_cost_multiplier: f64,
    pub max_zone_reached: u32,
    pub total_spins: u32,
    /// Level of the most recent death, 0 when the run has not died.
    pub death_zone_level: u32,
}

/// Tracks deaths, revives, spins and progress for the current run.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionManager {
    death_count: u32,
    revive_count: u32,
    max_zone_reached: u32,
    death_zone_level: u32,
    total_spins: u32,
    max_revives_allowed: u32,
    base_revive_cost: u32,
    revive_cost_multiplier: f64,
}

impl SessionManager {
    #[must_use]
    pub const fn new(
        max_revives_allowed: u32,
        base_revive_cost: u32,
        revive_cost_multiplier: f64,
    ) -> Self {
        Self {
            death_count: 0,
            revive_count: 0,
            max_zone_reached: 0,
            death_zone_level: 0,
            total_spins: 0,
            max_revives_allowed,
            base_revive_cost,
            revive_cost_multiplier,
        }
    }

    /// Zero the counters; the revive settings are kept.
    pub const fn reset(&mut self) {
        self.death_count = 0;
        self.revive_count = 0;
        self.max_zone_reached = 0;
        self.death_zone_level = 0;
        self.total_spins = 0;
    }

    #[must_use]
    pub const fn can_revive(&self) -> bool {
        self.revive_count < self.max_revives_allowed
    }

    /// Cost of the next revive: the base cost for the first, then
    /// `base * multiplier^revive_count` rounded to the nearest unit.
    #[must_use]
    pub fn current_revive_cost(&self) -> u32 {
        if self.revive_count == 0 {
            return self.base_revive_cost;
        }
        let scale = self
            .revive_cost_multiplier
            .powi(exponent_from_count(self.revive_count));
        round_f64_to_u32(f64::from(self.base_revive_cost) * scale)
    }

    pub fn record_death(&mut self, level: u32) {
        self.death_count = self.death_count.saturating_add(1);
        self.death_zone_level = level;
        log::debug!("death #{} at level {level}", self.death_count);
    }

    /// Count a revive. Callers check [`SessionManager::can_revive`] first;
    /// the count never exceeds the allowance.
    pub fn record_revive(&mut self) {
        if self.can_revive() {
            self.revive_count += 1;
        } else {
            log::warn!(
                "revive recorded past the allowance of {}",
                self.max_revives_allowed
            );
        }
    }

    pub const fn record_spin(&mut self) {
        self.total_spins = self.total_spins.saturating_add(1);
    }

    pub fn record_zone_progress(&mut self, level: u32) {
        self.max_zone_reached = self.max_zone_reached.max(level);
    }

    #[must_use]
    pub const fn death_count(&self) -> u32 {
        self.death_count
    }

    #[must_use]
    pub const fn revive_count(&self) -> u32 {
        self.revive_count
    }

    #[must_use]
    pub const fn max_revives_allowed(&self) -> u32 {
        self.max_revives_allowed
    }

    #[must_use]
    pub const fn max_zone_reached(&self) -> u32 {
        self.max_zone_reached
    }

    #[must_use]
    pub const fn total_spins(&self) -> u32 {
        self.total_spins
    }

    #[must_use]
    pub const fn death_zone_level(&self) -> u32 {
        self.death_zone_level
    }

    #[must_use]
    pub const fn summary(&self) -> SessionSummary {
        SessionSummary {
            death_count: self.death_count,
            revive_count: self.revive_count,
            max_revives_allowed: self.max_revives_allowed,
            base_revive_cost: self.base_revive_cost,
            revive_cost_multiplier: self.revive_cost_multiplier,
            max_zone_reached: self.max_zone_reached,
            total_spins: self.total_spins,
            death_zone_level: self.death_zone_level,
        }
    }
}
