use anyhow::{Result, bail};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;
use thiserror::Error;

use wheelrun_game::{
    CatalogError, DataLoader, EventBus, GameEngine, GameEvent, ItemId, PlayerInput, RunConfig,
    RunOutcome, RunState, ZoneCatalog, ZoneType,
};

use crate::logic::policy::{GameplayStrategy, PlayerPolicy, RunView};

/// Where the simulator reads its zone catalog from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CatalogSource {
    #[default]
    Bundled,
    File(PathBuf),
}

#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl DataLoader for CatalogSource {
    type Error = CatalogLoadError;

    fn load_catalog(&self) -> Result<ZoneCatalog, Self::Error> {
        match self {
            Self::Bundled => Ok(ZoneCatalog::load_from_static()),
            Self::File(path) => {
                let json = std::fs::read_to_string(path).map_err(|source| CatalogLoadError::Io {
                    path: path.clone(),
                    source,
                })?;
                Ok(ZoneCatalog::from_json(&json)?)
            }
        }
    }
}

/// Configuration for one seed/strategy simulation session.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub runs: u32,
    pub run_config: RunConfig,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(strategy: GameplayStrategy, seed: u64) -> Self {
        Self {
            seed,
            strategy,
            runs: 1,
            run_config: RunConfig {
                auto_restart: false,
                ..RunConfig::default()
            },
        }
    }

    #[must_use]
    pub const fn with_runs(mut self, runs: u32) -> Self {
        self.runs = runs;
        self
    }

    #[must_use]
    pub const fn with_max_level(mut self, max_level: u32) -> Self {
        self.run_config.max_level = max_level;
        self
    }
}

/// Summary of one finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunRecord {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub run: u32,
    pub outcome: RunOutcome,
    pub final_level: u32,
    pub max_zone_reached: u32,
    pub spins: u32,
    pub bombs: u32,
    pub revives: u32,
    pub revive_spend: u64,
    /// Item quantities banked; zero when the run was abandoned.
    pub banked_total: u64,
    pub banked_items: usize,
    /// Random draws the run consumed; equal across replays of one seed.
    pub rng_draws: u64,
}

/// Event-driven player: turns announcements into the next input.
struct Autopilot {
    seed: u64,
    strategy: GameplayStrategy,
    policy: Box<dyn PlayerPolicy>,
    level: u32,
    zone_type: ZoneType,
    max_level: u32,
    ledger: BTreeMap<ItemId, u64>,
    revives_used: u32,
    revive_spend: u64,
    banked: Option<(u64, usize)>,
    records: Vec<RunRecord>,
}

impl Autopilot {
    fn new(seed: u64, strategy: GameplayStrategy) -> Self {
        Self {
            seed,
            strategy,
            policy: strategy.create_policy(seed),
            level: 0,
            zone_type: ZoneType::Normal,
            max_level: 0,
            ledger: BTreeMap::new(),
            revives_used: 0,
            revive_spend: 0,
            banked: None,
            records: Vec::new(),
        }
    }

    fn view(&self) -> RunView {
        RunView {
            level: self.level,
            zone_type: self.zone_type,
            max_level: self.max_level,
            ledger_total: self.ledger.values().sum(),
            distinct_items: self.ledger.len(),
            revives_used: self.revives_used,
        }
    }

    fn react(&mut self, event: &GameEvent) -> Option<PlayerInput> {
        match event {
            GameEvent::RunStarted { max_level, .. } => {
                self.max_level = *max_level;
                self.revives_used = 0;
                self.revive_spend = 0;
                self.banked = None;
                None
            }
            GameEvent::ZoneChanged { level, zone_type } => {
                self.level = *level;
                self.zone_type = *zone_type;
                let view = self.view();
                if zone_type.is_exit_eligible() && self.policy.should_collect(&view) {
                    log::debug!("{}: collecting at level {level}", self.policy.name());
                    Some(PlayerInput::CollectRequested)
                } else {
                    Some(PlayerInput::SpinRequested)
                }
            }
            GameEvent::SpinStarted {
                outcomes,
                target_index,
                ..
            } => {
                if let Some(target) = outcomes.get(*target_index) {
                    log::debug!("level {}: landing on {}", self.level, target.label());
                }
                Some(PlayerInput::SpinCompleted {
                    landed_index: i64::try_from(*target_index).unwrap_or(i64::MAX),
                })
            }
            GameEvent::StateChanged {
                current: RunState::ShowingResult,
                ..
            } => Some(PlayerInput::ResultAnimationCompleted),
            GameEvent::RewardAdded { item, total, .. } => {
                self.ledger.insert(item.id.clone(), *total);
                None
            }
            GameEvent::RewardsReset => {
                self.ledger.clear();
                None
            }
            GameEvent::BombHit {
                can_revive,
                revive_cost,
                ..
            } => {
                let view = self.view();
                let method = if *can_revive {
                    self.policy.revive_with(&view, *revive_cost)
                } else {
                    None
                };
                Some(method.map_or(PlayerInput::GiveUpRequested, PlayerInput::ReviveRequested))
            }
            GameEvent::ReviveSucceeded { cost, .. } => {
                self.revives_used += 1;
                self.revive_spend += u64::from(*cost);
                None
            }
            GameEvent::ReviveFailed { reason } => {
                log::debug!("revive refused: {reason}");
                Some(PlayerInput::GiveUpRequested)
            }
            GameEvent::RewardsFinalized {
                snapshot,
                distinct_items,
            } => {
                self.banked = Some((snapshot.grand_total(), *distinct_items));
                Some(PlayerInput::ItemsCollected)
            }
            GameEvent::RunEnded {
                final_level,
                outcome,
                summary,
                run,
            } => {
                let (banked_total, banked_items) = match outcome {
                    RunOutcome::Collected => self.banked.unwrap_or_default(),
                    RunOutcome::GaveUp => (0, 0),
                };
                self.records.push(RunRecord {
                    seed: self.seed,
                    strategy: self.strategy,
                    run: *run,
                    outcome: *outcome,
                    final_level: *final_level,
                    max_zone_reached: summary.max_zone_reached,
                    spins: summary.total_spins,
                    bombs: summary.death_count,
                    revives: summary.revive_count,
                    revive_spend: self.revive_spend,
                    banked_total,
                    banked_items,
                    rng_draws: 0,
                });
                None
            }
            _ => None,
        }
    }
}

/// Play `config.runs` consecutive runs on one orchestrator and collect a
/// record per run.
///
/// # Errors
///
/// Returns an error if the catalog or configuration is rejected, or if a
/// run stalls before reaching game over.
pub fn simulate(config: &SimulationConfig, catalog: &CatalogSource) -> Result<Vec<RunRecord>> {
    let engine = GameEngine::new(catalog.clone(), config.run_config.clone());
    let mut game = engine.create_orchestrator(config.seed)?;
    let mut bus = EventBus::new();

    let pilot = Rc::new(RefCell::new(Autopilot::new(config.seed, config.strategy)));
    let driver = Rc::clone(&pilot);
    bus.subscribe_all(move |event, queue| {
        if let Some(input) = driver.borrow_mut().react(event) {
            queue.push(input);
        }
        Ok(())
    });

    for _ in 0..config.runs {
        game.start_new_run(&mut bus);
        if let Some(record) = pilot.borrow_mut().records.last_mut() {
            record.rng_draws = game.rng_draws();
        }
        if game.state() != RunState::GameOver {
            bail!(
                "seed {} / {}: run {} stalled in {} at level {}",
                config.seed,
                config.strategy,
                game.run_number(),
                game.state(),
                game.current_level()
            );
        }
    }

    let records = std::mem::take(&mut pilot.borrow_mut().records);
    Ok(records)
}
