//! Level classification and zone progression.
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::constants::{SAFE_ZONE_INTERVAL, SUPER_ZONE_INTERVAL};
use crate::data::{ZoneCatalog, ZoneDefinition, ZoneType};

/// Classify a level: every 30th is Super, every other 5th is Safe.
#[must_use]
pub const fn classify(level: u32) -> ZoneType {
    if level % SUPER_ZONE_INTERVAL == 0 {
        ZoneType::Super
    } else if level % SAFE_ZONE_INTERVAL == 0 {
        ZoneType::Safe
    } else {
        ZoneType::Normal
    }
}

/// Immutable entry of the per-run level list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRecord {
    pub level: u32,
    pub zone_type: ZoneType,
}

impl LevelRecord {
    #[must_use]
    pub const fn new(level: u32) -> Self {
        Self {
            level,
            zone_type: classify(level),
        }
    }

    #[must_use]
    pub const fn is_safe(&self) -> bool {
        self.zone_type.is_exit_eligible()
    }

    #[must_use]
    pub const fn is_super(&self) -> bool {
        matches!(self.zone_type, ZoneType::Super)
    }
}

/// Tracks the current level and maps levels onto catalog zone definitions.
#[derive(Debug, Clone)]
pub struct ZoneManager {
    catalog: Arc<ZoneCatalog>,
    current_level: u32,
    current_zone: ZoneType,
    levels: Vec<LevelRecord>,
    max_level: u32,
}

impl ZoneManager {
    /// Create an uninitialized manager; the current zone reads as Normal until
    /// [`ZoneManager::initialize`] runs.
    #[must_use]
    pub const fn new(catalog: Arc<ZoneCatalog>) -> Self {
        Self {
            catalog,
            current_level: 0,
            current_zone: ZoneType::Normal,
            levels: Vec::new(),
            max_level: 0,
        }
    }

    /// Build the level list for `1..=max_level` and move to `starting_level`.
    pub fn initialize(&mut self, starting_level: u32, max_level: u32) {
        self.max_level = max_level;
        self.current_level = starting_level;
        self.current_zone = classify(starting_level);
        self.levels = (1..=max_level).map(LevelRecord::new).collect();
    }

    /// Re-initialize with the previously configured maximum level.
    pub fn reset(&mut self, starting_level: u32) {
        self.initialize(starting_level, self.max_level);
    }

    pub fn advance(&mut self) {
        self.current_level = self.current_level.saturating_add(1);
        self.current_zone = classify(self.current_level);
    }

    #[must_use]
    pub const fn current_level(&self) -> u32 {
        self.current_level
    }

    #[must_use]
    pub const fn current_zone_type(&self) -> ZoneType {
        self.current_zone
    }

    #[must_use]
    pub fn current_zone(&self) -> &ZoneDefinition {
        self.catalog.zone(self.current_zone)
    }

    #[must_use]
    pub fn zone_for_level(&self, level: u32) -> &ZoneDefinition {
        self.catalog.zone(classify(level))
    }

    #[must_use]
    pub fn level_record(&self, level: u32) -> Option<&LevelRecord> {
        let index = usize::try_from(level.checked_sub(1)?).ok()?;
        self.levels.get(index)
    }

    #[must_use]
    pub fn levels(&self) -> &[LevelRecord] {
        &self.levels
    }

    #[must_use]
    pub const fn max_level(&self) -> u32 {
        self.max_level
    }

    #[must_use]
    pub const fn is_current_zone_super(&self) -> bool {
        matches!(self.current_zone, ZoneType::Super)
    }

    /// Next level above the current one with exit rights (Safe or Super).
    #[must_use]
    pub const fn next_safe_level(&self) -> u32 {
        let mut next = self.current_level.saturating_add(1);
        while matches!(classify(next), ZoneType::Normal) {
            next = next.saturating_add(1);
        }
        next
    }

    /// Smallest multiple of 30 strictly above the current level, saturating
    /// at `u32::MAX`.
    #[must_use]
    pub const fn next_super_level(&self) -> u32 {
        (self.current_level / SUPER_ZONE_INTERVAL + 1).saturating_mul(SUPER_ZONE_INTERVAL)
    }

    /// Sole collect-eligibility predicate.
    #[must_use]
    pub const fn can_exit_current_zone(&self) -> bool {
        self.current_zone.is_exit_eligible()
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<ZoneCatalog> {
        &self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ZoneManager {
        ZoneManager::new(Arc::new(ZoneCatalog::load_from_static()))
    }

    #[test]
    fn classification_follows_cadence() {
        for level in 1..=240 {
            let expected = if level % 30 == 0 {
                ZoneType::Super
            } else if level % 5 == 0 {
                ZoneType::Safe
            } else {
                ZoneType::Normal
            };
            assert_eq!(classify(level), expected, "level {level}");
        }
    }

    #[test]
    fn initialize_builds_level_list() {
        let mut zones = manager();
        zones.initialize(1, 60);
        assert_eq!(zones.levels().len(), 60);
        assert_eq!(zones.current_level(), 1);
        assert_eq!(zones.current_zone_type(), ZoneType::Normal);
        assert_eq!(zones.current_zone().zone_type, ZoneType::Normal);
        let thirty = zones.level_record(30).unwrap();
        assert!(thirty.is_super() && thirty.is_safe());
        assert!(zones.level_record(25).unwrap().is_safe());
        assert!(zones.level_record(0).is_none());
        assert!(zones.level_record(61).is_none());
    }

    #[test]
    fn next_super_level_scenario() {
        let mut zones = manager();
        zones.initialize(1, 60);
        assert_eq!(zones.next_super_level(), 30);
        for _ in 1..30 {
            zones.advance();
        }
        assert_eq!(zones.current_level(), 30);
        assert_eq!(zones.next_super_level(), 60);
    }

    #[test]
    fn lookahead_saturates_near_the_level_ceiling() {
        let mut zones = manager();
        zones.initialize(u32::MAX - 3, 0);
        assert!(zones.levels().is_empty());
        assert_eq!(zones.next_super_level(), u32::MAX);
        assert_eq!(zones.next_safe_level(), u32::MAX);
        zones.advance();
        zones.advance();
        zones.advance();
        zones.advance();
        assert_eq!(zones.current_level(), u32::MAX);
        assert_eq!(zones.next_super_level(), u32::MAX);
    }

    #[test]
    fn next_safe_level_counts_super_zones() {
        let mut zones = manager();
        zones.initialize(1, 60);
        assert_eq!(zones.next_safe_level(), 5);
        zones.initialize(5, 60);
        assert_eq!(zones.next_safe_level(), 10);
        zones.initialize(26, 60);
        assert_eq!(zones.next_safe_level(), 30);
    }

    #[test]
    fn exit_rights_follow_zone_type() {
        let mut zones = manager();
        assert!(!zones.can_exit_current_zone());
        zones.initialize(4, 60);
        assert!(!zones.can_exit_current_zone());
        zones.advance();
        assert_eq!(zones.current_level(), 5);
        assert!(zones.can_exit_current_zone());
        zones.initialize(30, 60);
        assert!(zones.can_exit_current_zone());
        assert!(zones.is_current_zone_super());
        zones.reset(1);
        assert_eq!(zones.max_level(), 60);
        assert!(!zones.can_exit_current_zone());
    }
}
