//! Wheelrun Game Engine
//!
//! Platform-agnostic core logic for a wheel-spin progression game: zone
//! classification, wheel content generation, the reward ledger, revive
//! economics and the run state machine. Rendering and input devices live
//! outside this crate and talk to it through [`PlayerInput`] and
//! [`GameEvent`].

pub mod bus;
pub mod constants;
pub mod content;
pub mod data;
pub mod events;
pub mod numbers;
pub mod orchestrator;
pub mod rewards;
pub mod rng;
pub mod session;
pub mod zone;

use std::sync::Arc;

// Re-export commonly used types
pub use bus::{EventBus, EventHandler, InputQueue, SubscriptionId};
pub use content::{WheelContentGenerator, WheelOutcome, WheelOutcomes};
pub use data::{
    CatalogError, CatalogIssue, ItemDefinition, ItemId, Rarity, RarityWeights, RewardPoolEntry,
    ZoneCatalog, ZoneDefinition, ZoneType,
};
pub use events::{EventKind, EventSink, GameEvent, PlayerInput, ReviveMethod, RunOutcome};
pub use orchestrator::{ConfigError, GameOrchestrator, RunConfig, RunState};
pub use rewards::{RewardManager, RewardSnapshot};
pub use rng::RngBundle;
pub use session::{SessionManager, SessionSummary};
pub use zone::{LevelRecord, ZoneManager, classify};

/// Trait for abstracting catalog loading.
/// Platform-specific implementations should provide this.
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the zone catalog from the platform-specific source.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    fn load_catalog(&self) -> Result<ZoneCatalog, Self::Error>;
}

/// Loader serving the catalog embedded in this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalogLoader;

impl DataLoader for StaticCatalogLoader {
    type Error = std::convert::Infallible;

    fn load_catalog(&self) -> Result<ZoneCatalog, Self::Error> {
        Ok(ZoneCatalog::load_from_static())
    }
}

/// Main game engine that coordinates catalog loading and run setup.
#[derive(Debug, Clone)]
pub struct GameEngine<L>
where
    L: DataLoader,
{
    data_loader: L,
    config: RunConfig,
}

impl<L> GameEngine<L>
where
    L: DataLoader,
{
    /// Create a new engine with the provided loader and run configuration.
    pub const fn new(data_loader: L, config: RunConfig) -> Self {
        Self {
            data_loader,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Load the catalog and list its content defects for a wheel of the
    /// configured size.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    pub fn audit_catalog(&self) -> anyhow::Result<Vec<CatalogIssue>> {
        let catalog = self.data_loader.load_catalog()?;
        Ok(catalog.audit(self.config.wheel_item_count))
    }

    /// Build an idle orchestrator seeded with `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or the run
    /// configuration is invalid.
    pub fn create_orchestrator(&self, seed: u64) -> anyhow::Result<GameOrchestrator> {
        let catalog = Arc::new(self.data_loader.load_catalog()?);
        for issue in catalog.audit(self.config.wheel_item_count) {
            log::warn!("catalog: {issue}");
        }
        Ok(GameOrchestrator::new(self.config.clone(), catalog, seed)?)
    }
}
