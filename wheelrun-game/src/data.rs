//! Immutable content model: items, rarity weights, zone definitions and the
//! catalog that bundles one definition per zone type.
//!
//! Catalog JSON lists every item once and lets zone reward pools reference
//! items by id. References are resolved when the catalog is built; an id that
//! does not resolve is kept as an entry without an item so the run stays
//! playable and the generator can skip it with a warning.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::constants::{
    DEFAULT_COMMON_WEIGHT, DEFAULT_EPIC_WEIGHT, DEFAULT_LEGENDARY_WEIGHT, DEFAULT_MAX_MULTIPLIER,
    DEFAULT_RARE_WEIGHT, RARITY_WEIGHT_TARGET,
};

const DEFAULT_CATALOG_DATA: &str = include_str!("../assets/zones.json");

/// Stable identifier of an item definition; also the ledger key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    /// Construct an id from a string slice, trimming whitespace.
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rarity tier, ordered from most to least common.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Tiers in cumulative-selection order.
    pub const ALL: [Self; 4] = [Self::Common, Self::Rare, Self::Epic, Self::Legendary];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }
}

/// Immutable item definition owned by configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    pub rarity: Rarity,
    #[serde(default = "ItemDefinition::default_min_amount")]
    pub min_amount: u32,
    /// Exclusive upper bound of the base quantity roll.
    #[serde(default = "ItemDefinition::default_max_amount")]
    pub max_amount: u32,
}

impl ItemDefinition {
    const fn default_min_amount() -> u32 {
        1
    }

    const fn default_max_amount() -> u32 {
        100
    }

    #[must_use]
    pub fn new(id: &str, rarity: Rarity, min_amount: u32, max_amount: u32) -> Self {
        Self {
            id: ItemId::new(id),
            name: id.to_string(),
            rarity,
            min_amount,
            max_amount,
        }
    }

    /// Name shown to players, falling back to the id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }

    /// Roll the base quantity in `[min_amount, max_amount)`.
    ///
    /// A degenerate range (`max <= min`) always yields `min_amount`.
    pub fn roll_base_amount<R>(&self, rng: &mut R) -> u32
    where
        R: Rng + ?Sized,
    {
        if self.max_amount > self.min_amount {
            rng.gen_range(self.min_amount..self.max_amount)
        } else {
            self.min_amount
        }
    }
}

/// Relative drop weights per rarity tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RarityWeights {
    #[serde(default = "RarityWeights::default_common")]
    pub common: f32,
    #[serde(default = "RarityWeights::default_rare")]
    pub rare: f32,
    #[serde(default = "RarityWeights::default_epic")]
    pub epic: f32,
    #[serde(default = "RarityWeights::default_legendary")]
    pub legendary: f32,
}

impl Default for RarityWeights {
    fn default() -> Self {
        Self {
            common: Self::default_common(),
            rare: Self::default_rare(),
            epic: Self::default_epic(),
            legendary: Self::default_legendary(),
        }
    }
}

impl RarityWeights {
    const fn default_common() -> f32 {
        DEFAULT_COMMON_WEIGHT
    }

    const fn default_rare() -> f32 {
        DEFAULT_RARE_WEIGHT
    }

    const fn default_epic() -> f32 {
        DEFAULT_EPIC_WEIGHT
    }

    const fn default_legendary() -> f32 {
        DEFAULT_LEGENDARY_WEIGHT
    }

    #[must_use]
    pub const fn new(common: f32, rare: f32, epic: f32, legendary: f32) -> Self {
        Self {
            common,
            rare,
            epic,
            legendary,
        }
    }

    /// Weight for a tier; negative or non-finite weights count as zero.
    #[must_use]
    pub fn weight_for(&self, rarity: Rarity) -> f32 {
        let raw = match rarity {
            Rarity::Common => self.common,
            Rarity::Rare => self.rare,
            Rarity::Epic => self.epic,
            Rarity::Legendary => self.legendary,
        };
        if raw.is_finite() { raw.max(0.0) } else { 0.0 }
    }

    #[must_use]
    pub fn total(&self) -> f32 {
        Rarity::ALL.iter().map(|rarity| self.weight_for(*rarity)).sum()
    }

    /// Whether the weights read as percentages summing to 100.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        (self.total() - RARITY_WEIGHT_TARGET).abs() <= 0.01
    }

    /// Cumulative-weight rarity roll.
    ///
    /// Draws `u` in `[0, total]` and returns the first tier whose cumulative
    /// weight reaches `u`. Returns `None` when every weight is zero or the
    /// sum overflows, so callers can fall back to a uniform pick.
    pub fn select_rarity<R>(&self, rng: &mut R) -> Option<Rarity>
    where
        R: Rng + ?Sized,
    {
        let total = self.total();
        if !total.is_finite() || total <= 0.0 {
            return None;
        }
        let roll = rng.gen_range(0.0..=total);
        let mut cumulative = 0.0;
        for rarity in Rarity::ALL {
            cumulative += self.weight_for(rarity);
            if roll <= cumulative {
                return Some(rarity);
            }
        }
        Some(Rarity::Legendary)
    }
}

/// Zone classification applied to a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneType {
    Normal,
    Safe,
    Super,
}

impl ZoneType {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Safe => "safe",
            Self::Super => "super",
        }
    }

    /// Safe and Super zones both grant exit (collect) rights.
    #[must_use]
    pub const fn is_exit_eligible(self) -> bool {
        matches!(self, Self::Safe | Self::Super)
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Reward pool slot referencing one item definition.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardPoolEntry {
    /// `None` when the configured item reference did not resolve.
    pub item: Option<Arc<ItemDefinition>>,
    pub guaranteed: bool,
    pub super_zone_exclusive: bool,
}

impl RewardPoolEntry {
    #[must_use]
    pub fn new(item: Arc<ItemDefinition>) -> Self {
        Self {
            item: Some(item),
            guaranteed: false,
            super_zone_exclusive: false,
        }
    }

    /// Entry whose item reference is missing.
    #[must_use]
    pub const fn unresolved() -> Self {
        Self {
            item: None,
            guaranteed: false,
            super_zone_exclusive: false,
        }
    }

    #[must_use]
    pub const fn guaranteed(mut self) -> Self {
        self.guaranteed = true;
        self
    }

    #[must_use]
    pub const fn super_exclusive(mut self) -> Self {
        self.super_zone_exclusive = true;
        self
    }

    /// Whether the entry may appear on a wheel of the given zone type.
    #[must_use]
    pub fn is_eligible(&self, is_super_zone: bool) -> bool {
        self.item.is_some() && (is_super_zone || !self.super_zone_exclusive)
    }
}

/// Shared definition for every level of one zone type.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneDefinition {
    pub zone_type: ZoneType,
    /// Presentation label (e.g. `BRONZE SPIN`); carried through, never interpreted.
    pub spin_name: String,
    pub max_multiplier: u32,
    pub has_bomb: bool,
    pub bomb_count: u32,
    pub reward_pool: Vec<RewardPoolEntry>,
    pub rarity_weights: RarityWeights,
}

impl ZoneDefinition {
    /// Definition with the stock tuning: x3 multiplier, one bomb, empty pool.
    #[must_use]
    pub fn new(zone_type: ZoneType) -> Self {
        Self {
            zone_type,
            spin_name: String::new(),
            max_multiplier: DEFAULT_MAX_MULTIPLIER,
            has_bomb: true,
            bomb_count: 1,
            reward_pool: Vec::new(),
            rarity_weights: RarityWeights::default(),
        }
    }

    #[must_use]
    pub fn with_pool(mut self, reward_pool: Vec<RewardPoolEntry>) -> Self {
        self.reward_pool = reward_pool;
        self
    }

    #[must_use]
    pub const fn with_bombs(mut self, bomb_count: u32) -> Self {
        self.has_bomb = bomb_count > 0;
        self.bomb_count = bomb_count;
        self
    }

    #[must_use]
    pub const fn with_max_multiplier(mut self, max_multiplier: u32) -> Self {
        self.max_multiplier = max_multiplier;
        self
    }

    #[must_use]
    pub const fn with_weights(mut self, rarity_weights: RarityWeights) -> Self {
        self.rarity_weights = rarity_weights;
        self
    }

    #[must_use]
    pub const fn is_super(&self) -> bool {
        matches!(self.zone_type, ZoneType::Super)
    }

}

/// Errors raised when a catalog cannot be built.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("zone slot `{slot}` holds a `{found}` definition")]
    ZoneTypeMismatch { slot: ZoneType, found: ZoneType },
    #[error("item `{0}` is defined more than once")]
    DuplicateItem(ItemId),
}

/// Content defect found by [`ZoneCatalog::audit`]. Runs stay playable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogIssue {
    #[error("{zone} zone pool entry #{entry} references a missing item")]
    MissingItem { zone: ZoneType, entry: usize },
    #[error("{zone} zone has an empty reward pool")]
    EmptyPool { zone: ZoneType },
    #[error("{zone} zone has no item eligible for its wheel")]
    NoEligibleRewards { zone: ZoneType },
    #[error("{zone} zone places {bombs} bombs on a {wheel}-slot wheel")]
    BombsFillWheel {
        zone: ZoneType,
        bombs: u32,
        wheel: usize,
    },
    #[error("{zone} zone rarity weights sum to {total:.2}, expected 100")]
    UnbalancedWeights { zone: ZoneType, total: f32 },
    #[error("item `{item}` can roll a zero quantity (min {min}, max {max})")]
    ZeroQuantity { item: ItemId, min: u32, max: u32 },
}

/// One definition per zone type plus the item table they reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneCatalog {
    normal: ZoneDefinition,
    safe: ZoneDefinition,
    super_zone: ZoneDefinition,
    items: BTreeMap<ItemId, Arc<ItemDefinition>>,
}

impl ZoneCatalog {
    /// Build a catalog from explicit definitions.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ZoneTypeMismatch`] when a definition sits in
    /// the wrong slot.
    pub fn new(
        normal: ZoneDefinition,
        safe: ZoneDefinition,
        super_zone: ZoneDefinition,
    ) -> Result<Self, CatalogError> {
        for (slot, zone) in [
            (ZoneType::Normal, &normal),
            (ZoneType::Safe, &safe),
            (ZoneType::Super, &super_zone),
        ] {
            if zone.zone_type != slot {
                return Err(CatalogError::ZoneTypeMismatch {
                    slot,
                    found: zone.zone_type,
                });
            }
        }
        let mut items = BTreeMap::new();
        for zone in [&normal, &safe, &super_zone] {
            for item in zone.reward_pool.iter().filter_map(|entry| entry.item.as_ref()) {
                items
                    .entry(item.id.clone())
                    .or_insert_with(|| Arc::clone(item));
            }
        }
        Ok(Self {
            normal,
            safe,
            super_zone,
            items,
        })
    }

    /// Catalog with three empty zones; every spin yields no content.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            normal: ZoneDefinition::new(ZoneType::Normal),
            safe: ZoneDefinition::new(ZoneType::Safe).with_bombs(0),
            super_zone: ZoneDefinition::new(ZoneType::Super).with_bombs(0),
            items: BTreeMap::new(),
        }
    }

    /// Parse catalog JSON, resolving item references.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed, an item id repeats, or
    /// a zone declares the wrong type.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        file.into_catalog()
    }

    /// Load the catalog bundled with the crate.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_CATALOG_DATA).unwrap_or_else(|err| {
            log::error!("bundled zone catalog failed to load: {err}");
            Self::empty()
        })
    }

    #[must_use]
    pub const fn zone(&self, zone_type: ZoneType) -> &ZoneDefinition {
        match zone_type {
            ZoneType::Normal => &self.normal,
            ZoneType::Safe => &self.safe,
            ZoneType::Super => &self.super_zone,
        }
    }

    #[must_use]
    pub fn item(&self, id: &ItemId) -> Option<&Arc<ItemDefinition>> {
        self.items.get(id)
    }

    pub fn items(&self) -> impl Iterator<Item = &Arc<ItemDefinition>> {
        self.items.values()
    }

    /// Report content defects without rejecting the catalog.
    #[must_use]
    pub fn audit(&self, wheel_item_count: usize) -> Vec<CatalogIssue> {
        let mut issues = Vec::new();
        for zone in [&self.normal, &self.safe, &self.super_zone] {
            audit_zone(zone, wheel_item_count, &mut issues);
        }
        for item in self.items() {
            if item.min_amount == 0 {
                issues.push(CatalogIssue::ZeroQuantity {
                    item: item.id.clone(),
                    min: item.min_amount,
                    max: item.max_amount,
                });
            }
        }
        issues
    }
}

fn audit_zone(zone: &ZoneDefinition, wheel_item_count: usize, issues: &mut Vec<CatalogIssue>) {
    let kind = zone.zone_type;
    if zone.reward_pool.is_empty() {
        issues.push(CatalogIssue::EmptyPool { zone: kind });
    } else if !zone
        .reward_pool
        .iter()
        .any(|entry| entry.is_eligible(zone.is_super()))
    {
        issues.push(CatalogIssue::NoEligibleRewards { zone: kind });
    }
    for (entry, _) in zone
        .reward_pool
        .iter()
        .enumerate()
        .filter(|(_, pool_entry)| pool_entry.item.is_none())
    {
        issues.push(CatalogIssue::MissingItem { zone: kind, entry });
    }
    let bombs = if zone.has_bomb { zone.bomb_count } else { 0 };
    if bombs > 0 && usize::try_from(bombs).map_or(true, |count| count >= wheel_item_count) {
        issues.push(CatalogIssue::BombsFillWheel {
            zone: kind,
            bombs,
            wheel: wheel_item_count,
        });
    }
    if !zone.rarity_weights.is_balanced() {
        issues.push(CatalogIssue::UnbalancedWeights {
            zone: kind,
            total: zone.rarity_weights.total(),
        });
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    items: Vec<ItemDefinition>,
    zones: ZonesFile,
}

#[derive(Debug, Deserialize)]
struct ZonesFile {
    normal: ZoneFile,
    safe: ZoneFile,
    #[serde(rename = "super")]
    super_zone: ZoneFile,
}

#[derive(Debug, Deserialize)]
struct ZoneFile {
    zone_type: ZoneType,
    #[serde(default)]
    spin_name: String,
    #[serde(default = "ZoneFile::default_max_multiplier")]
    max_multiplier: u32,
    #[serde(default = "ZoneFile::default_has_bomb")]
    has_bomb: bool,
    #[serde(default = "ZoneFile::default_bomb_count")]
    bomb_count: u32,
    #[serde(default)]
    reward_pool: Vec<PoolEntryFile>,
    #[serde(default)]
    rarity_weights: RarityWeights,
}

impl ZoneFile {
    const fn default_max_multiplier() -> u32 {
        DEFAULT_MAX_MULTIPLIER
    }

    const fn default_has_bomb() -> bool {
        true
    }

    const fn default_bomb_count() -> u32 {
        1
    }

    fn resolve(self, items: &BTreeMap<ItemId, Arc<ItemDefinition>>) -> ZoneDefinition {
        let zone_type = self.zone_type;
        let reward_pool = self
            .reward_pool
            .into_iter()
            .map(|entry| {
                let item = items.get(&entry.item).cloned();
                if item.is_none() {
                    log::warn!(
                        "{zone_type} zone references unknown item `{}`",
                        entry.item
                    );
                }
                RewardPoolEntry {
                    item,
                    guaranteed: entry.guaranteed,
                    super_zone_exclusive: entry.super_zone_exclusive,
                }
            })
            .collect();
        ZoneDefinition {
            zone_type,
            spin_name: self.spin_name,
            max_multiplier: self.max_multiplier,
            has_bomb: self.has_bomb,
            bomb_count: self.bomb_count,
            reward_pool,
            rarity_weights: self.rarity_weights,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PoolEntryFile {
    item: ItemId,
    #[serde(default)]
    guaranteed: bool,
    #[serde(default)]
    super_zone_exclusive: bool,
}

impl CatalogFile {
    fn into_catalog(self) -> Result<ZoneCatalog, CatalogError> {
        let mut items = BTreeMap::new();
        for item in self.items {
            let id = item.id.clone();
            if items.insert(id.clone(), Arc::new(item)).is_some() {
                return Err(CatalogError::DuplicateItem(id));
            }
        }
        let normal = self.zones.normal.resolve(&items);
        let safe = self.zones.safe.resolve(&items);
        let super_zone = self.zones.super_zone.resolve(&items);
        let mut catalog = ZoneCatalog::new(normal, safe, super_zone)?;
        catalog.items = items;
        Ok(catalog)
    }
}
