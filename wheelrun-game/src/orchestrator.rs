//! Run state machine sequencing zones, spins, deaths and collection.
//!
//! The orchestrator owns one instance of every manager for the current run
//! and rebuilds them when a new run starts. Inputs are processed one at a
//! time: each input runs to completion, its announcements are published in
//! production order, and inputs queued by handlers are handled afterwards.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::bus::{EventBus, InputQueue};
use crate::constants::{
    DEFAULT_BASE_REVIVE_COST, DEFAULT_MAX_LEVEL, DEFAULT_MAX_REVIVES,
    DEFAULT_REVIVE_COST_MULTIPLIER, DEFAULT_STARTING_LEVEL, DEFAULT_WHEEL_ITEM_COUNT,
    DISPATCH_INPUT_LIMIT, REVIVE_FAILED_MAX_REACHED,
};
use crate::content::{WheelContentGenerator, WheelOutcome, WheelOutcomes};
use crate::data::{ItemDefinition, ZoneCatalog, ZoneType};
use crate::events::{EventSink, GameEvent, PlayerInput, ReviveMethod, RunOutcome};
use crate::numbers::index_within;
use crate::rewards::RewardManager;
use crate::rng::RngBundle;
use crate::session::SessionManager;
use crate::zone::ZoneManager;

/// Phase of the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    WaitingForSpin,
    Spinning,
    ShowingResult,
    Death,
    Collecting,
    GameOver,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::WaitingForSpin => "waiting_for_spin",
            Self::Spinning => "spinning",
            Self::ShowingResult => "showing_result",
            Self::Death => "death",
            Self::Collecting => "collecting",
            Self::GameOver => "game_over",
        };
        f.write_str(label)
    }
}

/// Run-level tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "RunConfig::default_wheel_item_count")]
    pub wheel_item_count: usize,
    #[serde(default = "RunConfig::default_starting_level")]
    pub starting_level: u32,
    #[serde(default = "RunConfig::default_max_level")]
    pub max_level: u32,
    #[serde(default = "RunConfig::default_max_revives")]
    pub max_revives: u32,
    #[serde(default = "RunConfig::default_base_revive_cost")]
    pub base_revive_cost: u32,
    #[serde(default = "RunConfig::default_revive_cost_multiplier")]
    pub revive_cost_multiplier: f64,
    /// Start a fresh run as soon as one ends.
    #[serde(default = "RunConfig::default_auto_restart")]
    pub auto_restart: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            wheel_item_count: Self::default_wheel_item_count(),
            starting_level: Self::default_starting_level(),
            max_level: Self::default_max_level(),
            max_revives: Self::default_max_revives(),
            base_revive_cost: Self::default_base_revive_cost(),
            revive_cost_multiplier: Self::default_revive_cost_multiplier(),
            auto_restart: Self::default_auto_restart(),
        }
    }
}

impl RunConfig {
    const fn default_wheel_item_count() -> usize {
        DEFAULT_WHEEL_ITEM_COUNT
    }

    const fn default_starting_level() -> u32 {
        DEFAULT_STARTING_LEVEL
    }

    const fn default_max_level() -> u32 {
        DEFAULT_MAX_LEVEL
    }

    const fn default_max_revives() -> u32 {
        DEFAULT_MAX_REVIVES
    }

    const fn default_base_revive_cost() -> u32 {
        DEFAULT_BASE_REVIVE_COST
    }

    const fn default_revive_cost_multiplier() -> f64 {
        DEFAULT_REVIVE_COST_MULTIPLIER
    }

    const fn default_auto_restart() -> bool {
        true
    }

    /// Parse a run configuration, applying defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check structural soundness.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wheel_item_count == 0 {
            return Err(ConfigError::ZeroWheelItems);
        }
        if self.starting_level == 0 {
            return Err(ConfigError::ZeroStartingLevel);
        }
        if self.max_level < self.starting_level {
            return Err(ConfigError::MaxBelowStarting {
                starting: self.starting_level,
                max: self.max_level,
            });
        }
        if !self.revive_cost_multiplier.is_finite() || self.revive_cost_multiplier < 0.0 {
            return Err(ConfigError::InvalidReviveMultiplier(
                self.revive_cost_multiplier,
            ));
        }
        Ok(())
    }
}

/// Structurally invalid [`RunConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("wheel must hold at least one item")]
    ZeroWheelItems,
    #[error("starting level must be at least 1")]
    ZeroStartingLevel,
    #[error("max level {max} is below starting level {starting}")]
    MaxBelowStarting { starting: u32, max: u32 },
    #[error("revive cost multiplier must be finite and non-negative, got {0}")]
    InvalidReviveMultiplier(f64),
}

/// Finite-state machine driving one run at a time.
#[derive(Debug, Clone)]
pub struct GameOrchestrator {
    config: RunConfig,
    seed: u64,
    run: u32,
    state: RunState,
    zones: ZoneManager,
    content: WheelContentGenerator,
    rewards: RewardManager,
    session: SessionManager,
    rng: RngBundle,
    outcomes: WheelOutcomes,
    target_index: Option<usize>,
    landed: Option<WheelOutcome>,
    /// Exclusive reward announced for an upcoming super level.
    announced_super_reward: Option<(u32, Arc<ItemDefinition>)>,
    /// Exclusive reward guaranteed on the current super level's wheel.
    active_super_reward: Option<Arc<ItemDefinition>>,
}

impl GameOrchestrator {
    /// Build an idle orchestrator. No run starts until
    /// [`PlayerInput::StartRun`] is dispatched.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when `config` fails validation.
    pub fn new(
        config: RunConfig,
        catalog: Arc<ZoneCatalog>,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut zones = ZoneManager::new(catalog);
        zones.initialize(config.starting_level, config.max_level);
        Ok(Self {
            content: WheelContentGenerator::new(config.wheel_item_count),
            session: SessionManager::new(
                config.max_revives,
                config.base_revive_cost,
                config.revive_cost_multiplier,
            ),
            rewards: RewardManager::new(),
            rng: RngBundle::for_run(seed, 0),
            zones,
            config,
            seed,
            run: 0,
            state: RunState::Idle,
            outcomes: WheelOutcomes::new(),
            target_index: None,
            landed: None,
            announced_super_reward: None,
            active_super_reward: None,
        })
    }

    /// Process `input` and every input handlers queue in response.
    ///
    /// Returns the number of inputs handled.
    pub fn dispatch(&mut self, input: PlayerInput, bus: &mut EventBus) -> usize {
        let mut queue = InputQueue::new();
        queue.push(input);
        let mut handled = 0usize;
        while let Some(next) = queue.pop() {
            if handled >= DISPATCH_INPUT_LIMIT {
                log::warn!(
                    "dispatch stopped after {handled} inputs; dropping {} queued",
                    queue.len() + 1
                );
                break;
            }
            handled += 1;
            let outbox = self.apply(next);
            for event in &outbox {
                bus.publish(event, &mut queue);
            }
        }
        handled
    }

    /// Handle a single input and return its announcements without publishing.
    pub fn apply(&mut self, input: PlayerInput) -> Vec<GameEvent> {
        let mut outbox = Vec::new();
        self.handle(input, &mut outbox);
        outbox
    }

    /// Start a fresh run, publishing its announcements on `bus`.
    pub fn start_new_run(&mut self, bus: &mut EventBus) -> usize {
        self.dispatch(PlayerInput::StartRun, bus)
    }

    fn handle(&mut self, input: PlayerInput, sink: &mut impl EventSink) {
        match input {
            PlayerInput::StartRun => self.begin_run(sink),
            PlayerInput::SpinRequested => self.spin(sink),
            PlayerInput::SpinCompleted { landed_index } => self.complete_spin(landed_index, sink),
            PlayerInput::CollectRequested => self.collect(sink),
            PlayerInput::GiveUpRequested => self.give_up(sink),
            PlayerInput::ReviveRequested(method) => self.revive(method, sink),
            PlayerInput::ResultAnimationCompleted => self.finish_result(sink),
            PlayerInput::ItemsCollected => self.finish_collecting(sink),
        }
    }

    fn begin_run(&mut self, sink: &mut impl EventSink) {
        self.run = self.run.saturating_add(1);
        self.rng = RngBundle::for_run(self.seed, self.run);
        self.zones
            .initialize(self.config.starting_level, self.config.max_level);
        self.rewards.clear(sink);
        self.session.reset();
        self.outcomes.clear();
        self.target_index = None;
        self.landed = None;
        self.announced_super_reward = None;
        self.active_super_reward = None;
        log::debug!("run {} started with seed {}", self.run, self.seed);

        sink.emit(GameEvent::RunStarted {
            levels: self.zones.levels().iter().map(|record| record.level).collect(),
            max_level: self.zones.max_level(),
            starting_level: self.config.starting_level,
        });
        sink.emit(GameEvent::SafeZoneAhead {
            level: self.zones.next_safe_level(),
        });
        self.announce_super_zone(sink);
        self.enter_zone(sink);
    }

    fn enter_zone(&mut self, sink: &mut impl EventSink) {
        let level = self.zones.current_level();
        let zone_type = self.zones.current_zone_type();
        if zone_type == ZoneType::Super
            && let Some((announced_level, item)) = self.announced_super_reward.take()
        {
            if announced_level == level {
                self.active_super_reward = Some(item);
            } else {
                self.announced_super_reward = Some((announced_level, item));
            }
        }

        self.set_state(RunState::WaitingForSpin, sink);
        self.session.record_zone_progress(level);
        sink.emit(GameEvent::ZoneChanged { level, zone_type });
        if self.is_at_max_level() {
            return;
        }
        match zone_type {
            ZoneType::Normal => {}
            ZoneType::Safe => sink.emit(GameEvent::SafeZoneAhead {
                level: self.zones.next_safe_level(),
            }),
            ZoneType::Super => {
                sink.emit(GameEvent::SafeZoneAhead {
                    level: self.zones.next_safe_level(),
                });
                self.announce_super_zone(sink);
            }
        }
    }

    fn announce_super_zone(&mut self, sink: &mut impl EventSink) {
        let level = self.zones.next_super_level();
        let catalog = Arc::clone(self.zones.catalog());
        let exclusive_reward = self
            .content
            .pick_super_zone_reward(catalog.zone(ZoneType::Super), self.rng.content());
        self.announced_super_reward = exclusive_reward
            .as_ref()
            .map(|item| (level, Arc::clone(item)));
        sink.emit(GameEvent::SuperZoneAhead {
            level,
            exclusive_reward,
        });
    }

    fn spin(&mut self, sink: &mut impl EventSink) {
        if self.state != RunState::WaitingForSpin {
            log::debug!("spin ignored while {}", self.state);
            return;
        }
        let level = self.zones.current_level();
        let catalog = Arc::clone(self.zones.catalog());
        let zone = catalog.zone(self.zones.current_zone_type());
        let guaranteed = if zone.is_super() {
            self.active_super_reward.as_ref()
        } else {
            None
        };
        let outcomes = self
            .content
            .generate(zone, level, guaranteed, self.rng.content());
        if outcomes.is_empty() {
            log::warn!(
                "{} zone produced no wheel outcomes at level {level}; spin ignored",
                zone.zone_type
            );
            return;
        }
        let avoid_bomb = !zone.has_bomb;
        let mut target = self
            .content
            .select_target_index(Some(&outcomes), avoid_bomb, self.rng.landing());
        if target >= outcomes.len() {
            target %= outcomes.len();
        }

        self.session.record_spin();
        self.outcomes = outcomes;
        self.target_index = Some(target);
        self.landed = None;
        self.set_state(RunState::Spinning, sink);
        sink.emit(GameEvent::SpinStarted {
            outcomes: self.outcomes.to_vec(),
            target_index: target,
            zone_type: zone.zone_type,
        });
    }

    fn complete_spin(&mut self, landed_index: i64, sink: &mut impl EventSink) {
        if self.state != RunState::Spinning {
            log::debug!("spin completion ignored while {}", self.state);
            return;
        }
        let index = match index_within(landed_index, self.outcomes.len()) {
            Some(index) => index,
            None => {
                log::debug!("landed index {landed_index} out of range; using target");
                self.target_index.unwrap_or(0)
            }
        };
        let Some(outcome) = self.outcomes.get(index).cloned() else {
            log::warn!("no outcome at index {index}; spin completion ignored");
            return;
        };
        self.landed = Some(outcome.clone());
        match outcome {
            WheelOutcome::Bomb if self.is_at_max_level() => self.begin_collecting(sink),
            WheelOutcome::Bomb => self.handle_bomb(sink),
            WheelOutcome::Reward { item, amount, .. } => {
                self.handle_reward(&item, u64::from(amount), sink);
            }
        }
    }

    fn handle_bomb(&mut self, sink: &mut impl EventSink) {
        let level = self.zones.current_level();
        self.set_state(RunState::Death, sink);
        self.session.record_death(level);
        sink.emit(GameEvent::BombHit {
            level,
            can_revive: self.session.can_revive(),
            revive_cost: self.session.current_revive_cost(),
        });
    }

    fn handle_reward(&mut self, item: &Arc<ItemDefinition>, amount: u64, sink: &mut impl EventSink) {
        self.set_state(RunState::ShowingResult, sink);
        self.rewards.add_reward(
            Some(item),
            amount,
            self.zones.current_level(),
            self.zones.current_zone_type(),
            sink,
        );
        if self.is_at_max_level() {
            self.begin_collecting(sink);
        }
    }

    fn finish_result(&mut self, sink: &mut impl EventSink) {
        if self.state != RunState::ShowingResult {
            log::debug!("result animation completion ignored while {}", self.state);
            return;
        }
        self.zones.advance();
        self.active_super_reward = None;
        self.enter_zone(sink);
    }

    fn collect(&mut self, sink: &mut impl EventSink) {
        if !self.can_collect() {
            log::debug!(
                "collect ignored at level {} while {}",
                self.zones.current_level(),
                self.state
            );
            return;
        }
        self.begin_collecting(sink);
    }

    fn begin_collecting(&mut self, sink: &mut impl EventSink) {
        self.set_state(RunState::Collecting, sink);
        self.rewards.finalize(sink);
    }

    fn finish_collecting(&mut self, sink: &mut impl EventSink) {
        if self.state != RunState::Collecting {
            log::debug!("items collected ignored while {}", self.state);
            return;
        }
        self.end_run(RunOutcome::Collected, sink);
    }

    fn give_up(&mut self, sink: &mut impl EventSink) {
        if self.state != RunState::Death {
            log::debug!("give up ignored while {}", self.state);
            return;
        }
        self.rewards.clear(sink);
        self.end_run(RunOutcome::GaveUp, sink);
    }

    fn revive(&mut self, method: ReviveMethod, sink: &mut impl EventSink) {
        if self.state != RunState::Death {
            log::debug!("revive ignored while {}", self.state);
            return;
        }
        if !self.session.can_revive() {
            sink.emit(GameEvent::ReviveFailed {
                reason: REVIVE_FAILED_MAX_REACHED.to_string(),
            });
            return;
        }
        let cost = self.session.current_revive_cost();
        self.session.record_revive();
        sink.emit(GameEvent::ReviveSucceeded {
            level: self.zones.current_level(),
            method,
            cost,
        });
        self.enter_zone(sink);
    }

    fn end_run(&mut self, outcome: RunOutcome, sink: &mut impl EventSink) {
        self.set_state(RunState::GameOver, sink);
        log::debug!(
            "run {} ended at level {} ({outcome:?})",
            self.run,
            self.zones.current_level()
        );
        sink.emit(GameEvent::RunEnded {
            final_level: self.zones.current_level(),
            outcome,
            summary: self.session.summary(),
            run: self.run,
        });
        if self.config.auto_restart {
            self.begin_run(sink);
        }
    }

    fn set_state(&mut self, next: RunState, sink: &mut impl EventSink) {
        if self.state == next {
            return;
        }
        let previous = self.state;
        self.state = next;
        log::debug!("state {previous} -> {next}");
        sink.emit(GameEvent::StateChanged {
            previous,
            current: next,
        });
    }

    fn is_at_max_level(&self) -> bool {
        self.zones.current_level() >= self.zones.max_level()
    }

    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    #[must_use]
    pub const fn current_level(&self) -> u32 {
        self.zones.current_level()
    }

    #[must_use]
    pub const fn current_zone_type(&self) -> ZoneType {
        self.zones.current_zone_type()
    }

    #[must_use]
    pub const fn can_spin(&self) -> bool {
        matches!(self.state, RunState::WaitingForSpin)
    }

    /// Whether a collect request would be honoured now.
    ///
    /// Any phase of a run in an exit-eligible zone qualifies, mid-spin
    /// included; Idle, Collecting and GameOver are excluded so the ledger is
    /// never finalized twice.
    #[must_use]
    pub fn can_collect(&self) -> bool {
        self.zones.can_exit_current_zone()
            && !matches!(
                self.state,
                RunState::Idle | RunState::Collecting | RunState::GameOver
            )
    }

    #[must_use]
    pub const fn zones(&self) -> &ZoneManager {
        &self.zones
    }

    #[must_use]
    pub const fn rewards(&self) -> &RewardManager {
        &self.rewards
    }

    #[must_use]
    pub const fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Outcome set of the most recent spin.
    #[must_use]
    pub fn outcomes(&self) -> &[WheelOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub const fn target_index(&self) -> Option<usize> {
        self.target_index
    }

    /// Outcome the wheel landed on in the most recent completed spin.
    #[must_use]
    pub const fn landed_outcome(&self) -> Option<&WheelOutcome> {
        self.landed.as_ref()
    }

    /// Exclusive reward announced for the next super level, if any.
    #[must_use]
    pub fn announced_super_reward(&self) -> Option<&Arc<ItemDefinition>> {
        self.announced_super_reward.as_ref().map(|(_, item)| item)
    }

    /// One-based number of the current run; 0 before the first run.
    #[must_use]
    pub const fn run_number(&self) -> u32 {
        self.run
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Random draws performed during the current run.
    #[must_use]
    pub const fn rng_draws(&self) -> u64 {
        self.rng.draws()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Rarity, RewardPoolEntry, ZoneDefinition};
    use crate::events::EventKind as K;

    fn item(id: &str) -> Arc<ItemDefinition> {
        Arc::new(ItemDefinition::new(id, Rarity::Common, 2, 5))
    }

    /// Catalog whose normal zone is nothing but bombs.
    fn bomb_catalog() -> Arc<ZoneCatalog> {
        let pool = vec![RewardPoolEntry::new(item("gold"))];
        Arc::new(
            ZoneCatalog::new(
                ZoneDefinition::new(ZoneType::Normal)
                    .with_bombs(8)
                    .with_pool(pool.clone()),
                ZoneDefinition::new(ZoneType::Safe)
                    .with_bombs(0)
                    .with_pool(pool.clone()),
                ZoneDefinition::new(ZoneType::Super)
                    .with_bombs(0)
                    .with_pool(pool),
            )
            .unwrap(),
        )
    }

    fn quiet_config() -> RunConfig {
        RunConfig {
            auto_restart: false,
            ..RunConfig::default()
        }
    }

    fn started(config: RunConfig, catalog: Arc<ZoneCatalog>) -> GameOrchestrator {
        let mut game = GameOrchestrator::new(config, catalog, 42).unwrap();
        game.apply(PlayerInput::StartRun);
        game
    }

    #[test]
    fn config_validation_rejects_structural_errors() {
        assert!(RunConfig::default().validate().is_ok());
        let bad = |edit: fn(&mut RunConfig)| {
            let mut config = RunConfig::default();
            edit(&mut config);
            config.validate().unwrap_err()
        };
        assert_eq!(bad(|c| c.wheel_item_count = 0), ConfigError::ZeroWheelItems);
        assert_eq!(bad(|c| c.starting_level = 0), ConfigError::ZeroStartingLevel);
        assert_eq!(
            bad(|c| c.max_level = 0),
            ConfigError::MaxBelowStarting { starting: 1, max: 0 }
        );
        assert!(matches!(
            bad(|c| c.revive_cost_multiplier = f64::NAN),
            ConfigError::InvalidReviveMultiplier(_)
        ));
    }

    #[test]
    fn config_json_fills_defaults() {
        let config = RunConfig::from_json(r#"{ "max_level": 10, "auto_restart": false }"#).unwrap();
        assert_eq!(config.max_level, 10);
        assert_eq!(config.wheel_item_count, 8);
        assert_eq!(config.base_revive_cost, 25);
        assert!(!config.auto_restart);
    }

    #[test]
    fn start_run_announces_in_order() {
        let mut game =
            GameOrchestrator::new(quiet_config(), Arc::new(ZoneCatalog::load_from_static()), 1)
                .unwrap();
        assert_eq!(game.state(), RunState::Idle);
        let events = game.apply(PlayerInput::StartRun);
        let kinds: Vec<_> = events.iter().map(GameEvent::kind).collect();
        assert_eq!(
            kinds,
            vec![
                K::RewardsReset,
                K::RunStarted,
                K::SafeZoneAhead,
                K::SuperZoneAhead,
                K::StateChanged,
                K::ZoneChanged,
            ]
        );
        assert!(matches!(events[2], GameEvent::SafeZoneAhead { level: 5 }));
        assert!(matches!(events[3], GameEvent::SuperZoneAhead { level: 30, .. }));
        assert_eq!(game.state(), RunState::WaitingForSpin);
        assert_eq!(game.run_number(), 1);
        assert!(game.announced_super_reward().is_some());
    }

    #[test]
    fn spin_is_ignored_unless_waiting() {
        let mut game = started(quiet_config(), Arc::new(ZoneCatalog::load_from_static()));
        let first = game.apply(PlayerInput::SpinRequested);
        assert!(!first.is_empty());
        assert_eq!(game.state(), RunState::Spinning);
        let outcomes = game.outcomes().to_vec();
        assert!(game.apply(PlayerInput::SpinRequested).is_empty());
        assert_eq!(game.outcomes(), outcomes.as_slice());
        assert_eq!(game.session().total_spins(), 1);
    }

    #[test]
    fn bomb_leads_to_death_with_revive_offer() {
        let mut game = started(quiet_config(), bomb_catalog());
        game.apply(PlayerInput::SpinRequested);
        let events = game.apply(PlayerInput::SpinCompleted { landed_index: 0 });
        assert_eq!(game.state(), RunState::Death);
        assert!(events.contains(&GameEvent::BombHit {
            level: 1,
            can_revive: true,
            revive_cost: 25,
        }));
        assert_eq!(game.session().death_count(), 1);
        assert_eq!(game.session().death_zone_level(), 1);
    }

    #[test]
    fn revive_then_refusal_keeps_death_until_give_up() {
        let mut game = started(quiet_config(), bomb_catalog());
        game.apply(PlayerInput::SpinRequested);
        game.apply(PlayerInput::SpinCompleted { landed_index: 3 });
        let revived = game.apply(PlayerInput::ReviveRequested(ReviveMethod::Currency));
        assert!(revived.contains(&GameEvent::ReviveSucceeded {
            level: 1,
            method: ReviveMethod::Currency,
            cost: 25,
        }));
        assert_eq!(game.state(), RunState::WaitingForSpin);

        game.apply(PlayerInput::SpinRequested);
        let second_death = game.apply(PlayerInput::SpinCompleted { landed_index: 3 });
        assert!(second_death.contains(&GameEvent::BombHit {
            level: 1,
            can_revive: false,
            revive_cost: 50,
        }));
        let refused = game.apply(PlayerInput::ReviveRequested(ReviveMethod::Advertisement));
        assert_eq!(
            refused,
            vec![GameEvent::ReviveFailed {
                reason: "Max revives reached".to_string()
            }]
        );
        assert_eq!(game.state(), RunState::Death);

        let ended = game.apply(PlayerInput::GiveUpRequested);
        assert_eq!(game.state(), RunState::GameOver);
        assert!(ended.iter().any(|event| matches!(
            event,
            GameEvent::RunEnded {
                outcome: RunOutcome::GaveUp,
                final_level: 1,
                ..
            }
        )));
    }

    #[test]
    fn out_of_range_landing_uses_target() {
        let mut game = started(quiet_config(), Arc::new(ZoneCatalog::load_from_static()));
        game.apply(PlayerInput::SpinRequested);
        let target = game.target_index().unwrap();
        let expected = game.outcomes()[target].clone();
        game.apply(PlayerInput::SpinCompleted { landed_index: -4 });
        assert_eq!(game.landed_outcome(), Some(&expected));
    }

    #[test]
    fn collect_requires_exit_rights() {
        let mut game = started(quiet_config(), Arc::new(ZoneCatalog::load_from_static()));
        assert!(!game.can_collect());
        assert!(game.apply(PlayerInput::CollectRequested).is_empty());

        let config = RunConfig {
            starting_level: 5,
            ..quiet_config()
        };
        let mut safe = started(config, Arc::new(ZoneCatalog::load_from_static()));
        assert!(safe.can_collect());
        let events = safe.apply(PlayerInput::CollectRequested);
        assert_eq!(safe.state(), RunState::Collecting);
        assert!(matches!(
            events.last(),
            Some(GameEvent::RewardsFinalized { distinct_items: 0, .. })
        ));
        let ended = safe.apply(PlayerInput::ItemsCollected);
        assert!(ended.iter().any(|event| matches!(
            event,
            GameEvent::RunEnded {
                outcome: RunOutcome::Collected,
                ..
            }
        )));
    }

    #[test]
    fn collect_mid_spin_in_safe_zone_finalizes_once() {
        let config = RunConfig {
            starting_level: 5,
            ..quiet_config()
        };
        let mut game = started(config, Arc::new(ZoneCatalog::load_from_static()));
        game.apply(PlayerInput::SpinRequested);
        assert_eq!(game.state(), RunState::Spinning);
        assert!(game.can_collect());

        let events = game.apply(PlayerInput::CollectRequested);
        assert_eq!(game.state(), RunState::Collecting);
        assert_eq!(
            events
                .iter()
                .filter(|event| event.kind() == K::RewardsFinalized)
                .count(),
            1
        );

        assert!(!game.can_collect());
        assert!(game.apply(PlayerInput::CollectRequested).is_empty());
        assert!(game.apply(PlayerInput::SpinCompleted { landed_index: 0 }).is_empty());
        assert_eq!(game.state(), RunState::Collecting);

        game.apply(PlayerInput::ItemsCollected);
        assert_eq!(game.state(), RunState::GameOver);
        assert!(game.apply(PlayerInput::CollectRequested).is_empty());
    }

    #[test]
    fn revive_and_give_up_are_ignored_outside_death() {
        let mut game = started(quiet_config(), bomb_catalog());
        for expected in [RunState::WaitingForSpin, RunState::Spinning] {
            assert_eq!(game.state(), expected);
            let level = game.current_level();
            for input in [
                PlayerInput::ReviveRequested(ReviveMethod::Currency),
                PlayerInput::ReviveRequested(ReviveMethod::Advertisement),
                PlayerInput::GiveUpRequested,
            ] {
                assert!(game.apply(input).is_empty(), "{input:?} while {expected}");
                assert_eq!(game.state(), expected);
                assert_eq!(game.current_level(), level);
            }
            assert_eq!(game.session().revive_count(), 0);
            assert_eq!(game.session().death_count(), 0);
            game.apply(PlayerInput::SpinRequested);
        }
    }

    #[test]
    fn max_level_bomb_forces_collecting() {
        let config = RunConfig {
            starting_level: 3,
            max_level: 3,
            ..quiet_config()
        };
        let mut game = started(config, bomb_catalog());
        game.apply(PlayerInput::SpinRequested);
        game.apply(PlayerInput::SpinCompleted { landed_index: 0 });
        assert_eq!(game.state(), RunState::Collecting);
        assert_eq!(game.session().death_count(), 0);
    }

    #[test]
    fn auto_restart_begins_next_run() {
        let mut game = started(RunConfig::default(), bomb_catalog());
        game.apply(PlayerInput::SpinRequested);
        game.apply(PlayerInput::SpinCompleted { landed_index: 0 });
        let events = game.apply(PlayerInput::GiveUpRequested);
        assert_eq!(game.run_number(), 2);
        assert_eq!(game.state(), RunState::WaitingForSpin);
        assert_eq!(game.session().death_count(), 0);
        assert!(events.iter().any(|event| matches!(event, GameEvent::RunStarted { .. })));
    }
}
