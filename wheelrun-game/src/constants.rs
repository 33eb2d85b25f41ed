//! Centralized defaults and tuning constants for Wheelrun game logic.
//!
//! These values define the deterministic math for zone progression, wheel
//! content and revive pricing. Run-level settings that designers may tune
//! per build live in [`crate::orchestrator::RunConfig`] and use these as
//! their serde defaults.

// Zone cadence -------------------------------------------------------------
pub const SUPER_ZONE_INTERVAL: u32 = 30;
pub const SAFE_ZONE_INTERVAL: u32 = 5;

// Run defaults -------------------------------------------------------------
pub const DEFAULT_WHEEL_ITEM_COUNT: usize = 8;
pub const DEFAULT_STARTING_LEVEL: u32 = 1;
pub const DEFAULT_MAX_LEVEL: u32 = 60;
pub const DEFAULT_MAX_REVIVES: u32 = 1;
pub const DEFAULT_BASE_REVIVE_COST: u32 = 25;
pub const DEFAULT_REVIVE_COST_MULTIPLIER: f64 = 2.0;

// Wheel content ------------------------------------------------------------
/// Levels over which the chance of an upper-half multiplier ramps to 100%.
pub(crate) const MULTIPLIER_RAMP_LEVELS: f32 = 20.0;
pub const DEFAULT_MAX_MULTIPLIER: u32 = 3;
pub const DEFAULT_COMMON_WEIGHT: f32 = 60.0;
pub const DEFAULT_RARE_WEIGHT: f32 = 25.0;
pub const DEFAULT_EPIC_WEIGHT: f32 = 10.0;
pub const DEFAULT_LEGENDARY_WEIGHT: f32 = 5.0;
pub(crate) const RARITY_WEIGHT_TARGET: f32 = 100.0;

// Dispatch ----------------------------------------------------------------
/// Upper bound on inputs handled by one dispatch, queued follow-ups included.
pub const DISPATCH_INPUT_LIMIT: usize = 100_000;

// Announcement text ----------------------------------------------------------
pub const REVIVE_FAILED_MAX_REACHED: &str = "Max revives reached";

// RNG stream domains ---------------------------------------------------------
pub(crate) const RNG_DOMAIN_CONTENT: &[u8] = b"content";
pub(crate) const RNG_DOMAIN_LANDING: &[u8] = b"landing";
