//! Wheel content generation: weighted reward picks, guaranteed slots,
//! level-scaled multipliers and bomb placement.
use rand::Rng;
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::Arc;

use crate::constants::MULTIPLIER_RAMP_LEVELS;
use crate::data::{ItemDefinition, RewardPoolEntry, ZoneDefinition};
use crate::numbers::u32_to_f32;

/// Outcome set for one spin; inline capacity matches the stock wheel.
pub type WheelOutcomes = SmallVec<[WheelOutcome; 8]>;

/// One slot on the wheel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WheelOutcome {
    Bomb,
    Reward {
        item: Arc<ItemDefinition>,
        multiplier: u32,
        amount: u32,
    },
}

impl WheelOutcome {
    #[must_use]
    pub const fn is_bomb(&self) -> bool {
        matches!(self, Self::Bomb)
    }

    #[must_use]
    pub const fn item(&self) -> Option<&Arc<ItemDefinition>> {
        match self {
            Self::Bomb => None,
            Self::Reward { item, .. } => Some(item),
        }
    }

    /// Final reward quantity; zero for bombs.
    #[must_use]
    pub const fn amount(&self) -> u32 {
        match self {
            Self::Bomb => 0,
            Self::Reward { amount, .. } => *amount,
        }
    }

    #[must_use]
    pub const fn multiplier(&self) -> u32 {
        match self {
            Self::Bomb => 0,
            Self::Reward { multiplier, .. } => *multiplier,
        }
    }

    /// Short label for logs and text front-ends.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Bomb => "BOMB!".to_string(),
            Self::Reward { item, amount, .. } => format!("{} x{amount}", item.display_name()),
        }
    }
}

/// Produces wheel outcome sets and landing targets for a fixed wheel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelContentGenerator {
    wheel_item_count: usize,
}

impl WheelContentGenerator {
    #[must_use]
    pub const fn new(wheel_item_count: usize) -> Self {
        Self { wheel_item_count }
    }

    #[must_use]
    pub const fn wheel_item_count(&self) -> usize {
        self.wheel_item_count
    }

    /// Pick one of the zone's super-exclusive rewards to advertise ahead of
    /// the next super level.
    pub fn pick_super_zone_reward<R>(
        &self,
        zone: &ZoneDefinition,
        rng: &mut R,
    ) -> Option<Arc<ItemDefinition>>
    where
        R: Rng + ?Sized,
    {
        let exclusive: Vec<&Arc<ItemDefinition>> = zone
            .reward_pool
            .iter()
            .filter(|entry| entry.super_zone_exclusive)
            .filter_map(|entry| entry.item.as_ref())
            .collect();
        if exclusive.is_empty() {
            return None;
        }
        Some(Arc::clone(exclusive[rng.gen_range(0..exclusive.len())]))
    }

    /// Generate the shuffled outcome set for one spin.
    ///
    /// Returns an empty set when the zone has no reward pool; callers treat
    /// that as a configuration defect.
    pub fn generate<R>(
        &self,
        zone: &ZoneDefinition,
        level: u32,
        guaranteed_super_reward: Option<&Arc<ItemDefinition>>,
        rng: &mut R,
    ) -> WheelOutcomes
    where
        R: Rng + ?Sized,
    {
        let mut outcomes = WheelOutcomes::new();
        if zone.reward_pool.is_empty() {
            log::warn!("{} zone has an empty reward pool", zone.zone_type);
            return outcomes;
        }

        let is_super = zone.is_super();
        let bomb_count = self.bomb_count(zone);
        let mut reward_slots = self.wheel_item_count - bomb_count;

        if is_super
            && reward_slots > 0
            && let Some(item) = guaranteed_super_reward
        {
            outcomes.push(self.reward_outcome(zone, level, item, rng));
            reward_slots -= 1;
        }

        for (index, entry) in zone.reward_pool.iter().enumerate() {
            if entry.item.is_none() {
                log::warn!(
                    "{} zone pool entry #{index} has no item; skipping",
                    zone.zone_type
                );
            }
        }

        let guaranteed: Vec<&Arc<ItemDefinition>> = zone
            .reward_pool
            .iter()
            .filter(|entry| entry.guaranteed && entry.is_eligible(is_super))
            .filter_map(|entry| entry.item.as_ref())
            .collect();
        let guaranteed_count = guaranteed.len().min(reward_slots);
        for item in guaranteed.iter().take(guaranteed_count) {
            outcomes.push(self.reward_outcome(zone, level, item, rng));
        }

        let remaining = reward_slots - guaranteed_count;
        let available = available_entries(&zone.reward_pool, is_super);
        if remaining > 0 && available.is_empty() {
            log::warn!(
                "{} zone has no eligible rewards to fill {remaining} slots",
                zone.zone_type
            );
        }
        for _ in 0..remaining {
            let Some(item) = select_reward_entry(&available, zone, rng) else {
                break;
            };
            outcomes.push(self.reward_outcome(zone, level, item, rng));
        }

        outcomes.extend(std::iter::repeat_n(WheelOutcome::Bomb, bomb_count));
        shuffle(&mut outcomes, rng);
        outcomes
    }

    /// Level-scaled multiplier in `[1, max_multiplier]`.
    ///
    /// The chance of drawing from the upper half ramps linearly from 0 at
    /// level 1 to 1 at level 21.
    pub fn multiplier<R>(&self, max_multiplier: u32, level: u32, rng: &mut R) -> u32
    where
        R: Rng + ?Sized,
    {
        let ramp = u32_to_f32(level.saturating_sub(1)) / MULTIPLIER_RAMP_LEVELS;
        let high_chance = ramp.clamp(0.0, 1.0);
        let half = max_multiplier / 2 + 1;
        if rng.r#gen::<f32>() < high_chance {
            if max_multiplier >= half {
                rng.gen_range(half..=max_multiplier)
            } else {
                half
            }
        } else {
            rng.gen_range(1..half.max(2))
        }
    }

    /// Choose the index the wheel will land on.
    ///
    /// With `avoid_bomb` set and outcomes available, only non-bomb slots are
    /// candidates; otherwise any slot of the wheel is.
    pub fn select_target_index<R>(
        &self,
        outcomes: Option<&[WheelOutcome]>,
        avoid_bomb: bool,
        rng: &mut R,
    ) -> usize
    where
        R: Rng + ?Sized,
    {
        let fallback = |rng: &mut R| {
            if self.wheel_item_count == 0 {
                0
            } else {
                rng.gen_range(0..self.wheel_item_count)
            }
        };
        let Some(outcomes) = outcomes.filter(|_| avoid_bomb) else {
            return fallback(rng);
        };
        let valid: Vec<usize> = outcomes
            .iter()
            .enumerate()
            .filter(|(_, outcome)| !outcome.is_bomb())
            .map(|(index, _)| index)
            .collect();
        if valid.is_empty() {
            fallback(rng)
        } else {
            valid[rng.gen_range(0..valid.len())]
        }
    }

    /// Bomb slots for a zone, never more than the wheel holds.
    #[must_use]
    pub fn bomb_count(&self, zone: &ZoneDefinition) -> usize {
        if !zone.has_bomb {
            return 0;
        }
        usize::try_from(zone.bomb_count)
            .unwrap_or(usize::MAX)
            .min(self.wheel_item_count)
    }

    fn reward_outcome<R>(
        &self,
        zone: &ZoneDefinition,
        level: u32,
        item: &Arc<ItemDefinition>,
        rng: &mut R,
    ) -> WheelOutcome
    where
        R: Rng + ?Sized,
    {
        let multiplier = self.multiplier(zone.max_multiplier, level, rng);
        let amount = item.roll_base_amount(rng).saturating_mul(multiplier);
        WheelOutcome::Reward {
            item: Arc::clone(item),
            multiplier,
            amount,
        }
    }
}

/// Non-guaranteed, zone-eligible entries; when a pool holds nothing but
/// guaranteed entries those are reused so the wheel still fills up.
fn available_entries(pool: &[RewardPoolEntry], is_super: bool) -> Vec<&RewardPoolEntry> {
    let eligible: Vec<&RewardPoolEntry> = pool
        .iter()
        .filter(|entry| entry.is_eligible(is_super))
        .collect();
    let regular: Vec<&RewardPoolEntry> = eligible
        .iter()
        .copied()
        .filter(|entry| !entry.guaranteed)
        .collect();
    if regular.is_empty() { eligible } else { regular }
}

fn select_reward_entry<'a, R>(
    available: &[&'a RewardPoolEntry],
    zone: &ZoneDefinition,
    rng: &mut R,
) -> Option<&'a Arc<ItemDefinition>>
where
    R: Rng + ?Sized,
{
    if available.is_empty() {
        return None;
    }
    let Some(rarity) = zone.rarity_weights.select_rarity(rng) else {
        return available[rng.gen_range(0..available.len())].item.as_ref();
    };
    let matching: Vec<&RewardPoolEntry> = available
        .iter()
        .copied()
        .filter(|entry| entry.item.as_ref().is_some_and(|item| item.rarity == rarity))
        .collect();
    let pick = if matching.is_empty() {
        available[rng.gen_range(0..available.len())]
    } else {
        matching[rng.gen_range(0..matching.len())]
    };
    pick.item.as_ref()
}

/// Unbiased in-place Fisher–Yates shuffle, last index down to 1.
fn shuffle<T, R>(items: &mut [T], rng: &mut R)
where
    R: Rng + ?Sized,
{
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Rarity, RarityWeights, ZoneType};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn item(id: &str, rarity: Rarity) -> Arc<ItemDefinition> {
        Arc::new(ItemDefinition::new(id, rarity, 1, 10))
    }

    fn normal_zone() -> ZoneDefinition {
        ZoneDefinition::new(ZoneType::Normal)
            .with_bombs(1)
            .with_pool(vec![
                RewardPoolEntry::new(item("gold", Rarity::Common)).guaranteed(),
                RewardPoolEntry::new(item("cash", Rarity::Common)),
                RewardPoolEntry::new(item("grenade", Rarity::Rare)),
                RewardPoolEntry::new(item("chest", Rarity::Epic)),
                RewardPoolEntry::new(item("crown", Rarity::Legendary)).super_exclusive(),
            ])
    }

    fn super_zone() -> ZoneDefinition {
        ZoneDefinition::new(ZoneType::Super)
            .with_bombs(0)
            .with_max_multiplier(10)
            .with_pool(vec![
                RewardPoolEntry::new(item("gold", Rarity::Common)),
                RewardPoolEntry::new(item("chest", Rarity::Epic)).guaranteed(),
                RewardPoolEntry::new(item("crown", Rarity::Legendary)).super_exclusive(),
                RewardPoolEntry::new(item("scepter", Rarity::Legendary))
                    .super_exclusive()
                    .guaranteed(),
            ])
    }

    fn ids(outcomes: &[WheelOutcome]) -> Vec<String> {
        outcomes
            .iter()
            .filter_map(WheelOutcome::item)
            .map(|item| item.id.to_string())
            .collect()
    }

    #[test]
    fn outcome_labels_read_for_text_front_ends() {
        assert_eq!(WheelOutcome::Bomb.label(), "BOMB!");
        let reward = WheelOutcome::Reward {
            item: item("gold", Rarity::Common),
            multiplier: 2,
            amount: 14,
        };
        assert_eq!(reward.label(), "gold x14");
    }

    #[test]
    fn generates_full_wheel_with_configured_bombs() {
        let generator = WheelContentGenerator::new(8);
        let zone = normal_zone();
        for seed in 0..32 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let outcomes = generator.generate(&zone, 3, None, &mut rng);
            assert_eq!(outcomes.len(), 8);
            assert_eq!(outcomes.iter().filter(|o| o.is_bomb()).count(), 1);
            assert!(ids(&outcomes).contains(&"gold".to_string()));
            assert!(!ids(&outcomes).contains(&"crown".to_string()));
        }
    }

    #[test]
    fn super_zone_includes_exclusives_and_preselected_reward() {
        let generator = WheelContentGenerator::new(8);
        let zone = super_zone();
        let preselected = zone.reward_pool[2].item.clone().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let outcomes = generator.generate(&zone, 30, Some(&preselected), &mut rng);
        assert_eq!(outcomes.len(), 8);
        assert!(outcomes.iter().all(|o| !o.is_bomb()));
        let names = ids(&outcomes);
        assert!(names.contains(&"crown".to_string()));
        assert!(names.contains(&"chest".to_string()));
        assert!(names.contains(&"scepter".to_string()));
    }

    #[test]
    fn preselected_reward_ignored_outside_super_zone() {
        let generator = WheelContentGenerator::new(4);
        let zone = ZoneDefinition::new(ZoneType::Normal)
            .with_bombs(0)
            .with_pool(vec![RewardPoolEntry::new(item("gold", Rarity::Common))]);
        let crown = item("crown", Rarity::Legendary);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let outcomes = generator.generate(&zone, 2, Some(&crown), &mut rng);
        assert_eq!(outcomes.len(), 4);
        assert!(ids(&outcomes).iter().all(|id| id == "gold"));
    }

    #[test]
    fn bombs_beyond_wheel_size_clamp_reward_slots_to_zero() {
        let generator = WheelContentGenerator::new(4);
        let zone = normal_zone().with_bombs(9);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let outcomes = generator.generate(&zone, 1, None, &mut rng);
        assert_eq!(outcomes.len(), 4);
        assert!(outcomes.iter().all(WheelOutcome::is_bomb));
        assert!(generator.select_target_index(Some(&outcomes), true, &mut rng) < 4);
    }

    #[test]
    fn empty_pool_yields_no_outcomes() {
        let generator = WheelContentGenerator::new(8);
        let zone = ZoneDefinition::new(ZoneType::Safe);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        assert!(generator.generate(&zone, 5, None, &mut rng).is_empty());
    }

    #[test]
    fn unresolved_entries_are_skipped() {
        let generator = WheelContentGenerator::new(6);
        let zone = ZoneDefinition::new(ZoneType::Normal)
            .with_bombs(1)
            .with_pool(vec![
                RewardPoolEntry::unresolved().guaranteed(),
                RewardPoolEntry::new(item("cash", Rarity::Common)),
            ]);
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let outcomes = generator.generate(&zone, 1, None, &mut rng);
        assert_eq!(outcomes.len(), 6);
        assert_eq!(ids(&outcomes).len(), 5);
    }

    #[test]
    fn pool_of_guaranteed_entries_still_fills_wheel() {
        let generator = WheelContentGenerator::new(8);
        let zone = ZoneDefinition::new(ZoneType::Safe)
            .with_bombs(0)
            .with_pool(vec![
                RewardPoolEntry::new(item("gold", Rarity::Common)).guaranteed(),
                RewardPoolEntry::new(item("cash", Rarity::Common)).guaranteed(),
            ]);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let outcomes = generator.generate(&zone, 5, None, &mut rng);
        assert_eq!(outcomes.len(), 8);
    }

    #[test]
    fn zero_weights_fall_back_to_uniform_pick() {
        let generator = WheelContentGenerator::new(8);
        let zone = normal_zone().with_weights(RarityWeights::new(0.0, 0.0, 0.0, 0.0));
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let outcomes = generator.generate(&zone, 1, None, &mut rng);
        assert_eq!(outcomes.len(), 8);
    }

    #[test]
    fn multiplier_stays_within_bounds_and_scales_with_level() {
        let generator = WheelContentGenerator::new(8);
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        for _ in 0..200 {
            let low = generator.multiplier(10, 1, &mut rng);
            assert!((1..=5).contains(&low), "level 1 multiplier {low}");
            let high = generator.multiplier(10, 21, &mut rng);
            assert!((6..=10).contains(&high), "level 21 multiplier {high}");
        }
        for _ in 0..50 {
            assert_eq!(generator.multiplier(1, 1, &mut rng), 1);
            assert!((1..=2).contains(&generator.multiplier(1, 40, &mut rng)));
            assert!((1..=3).contains(&generator.multiplier(3, 10, &mut rng)));
        }
    }

    #[test]
    fn target_never_lands_on_avoidable_bomb() {
        let generator = WheelContentGenerator::new(8);
        let zone = normal_zone().with_bombs(3);
        for seed in 0..64 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let outcomes = generator.generate(&zone, 7, None, &mut rng);
            let target = generator.select_target_index(Some(&outcomes), true, &mut rng);
            assert!(!outcomes[target].is_bomb());
            let any = generator.select_target_index(None, true, &mut rng);
            assert!(any < 8);
        }
    }

    #[test]
    fn super_reward_pick_uses_exclusive_entries_only() {
        let generator = WheelContentGenerator::new(8);
        let mut rng = ChaCha8Rng::seed_from_u64(14);
        for _ in 0..32 {
            let pick = generator
                .pick_super_zone_reward(&super_zone(), &mut rng)
                .unwrap();
            assert!(pick.id.as_str() == "crown" || pick.id.as_str() == "scepter");
        }
        let plain = ZoneDefinition::new(ZoneType::Super)
            .with_pool(vec![RewardPoolEntry::new(item("gold", Rarity::Common))]);
        assert!(generator.pick_super_zone_reward(&plain, &mut rng).is_none());
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(15);
        let mut values: Vec<u32> = (0..16).collect();
        shuffle(&mut values, &mut rng);
        let mut sorted = values.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..16).collect::<Vec<_>>());
    }
}
