use anyhow::{Result, bail};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use std::fmt;

use wheelrun_game::{ReviveMethod, ZoneType};

/// What a policy sees when it has to make a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunView {
    pub level: u32,
    pub zone_type: ZoneType,
    pub max_level: u32,
    /// Sum of every item quantity banked so far this run.
    pub ledger_total: u64,
    pub distinct_items: usize,
    pub revives_used: u32,
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Whether to collect on an exit-eligible zone instead of spinning on.
    fn should_collect(&mut self, view: &RunView) -> bool;

    /// How to pay for a revive costing `cost`, or `None` to give up.
    fn revive_with(&mut self, view: &RunView, cost: u32) -> Option<ReviveMethod>;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameplayStrategy {
    Cautious,
    Greedy,
    Reviver,
    Random,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [Self::Cautious, Self::Greedy, Self::Reviver, Self::Random];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cautious => "Cautious",
            Self::Greedy => "Greedy",
            Self::Reviver => "Reviver",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy> {
        match self {
            Self::Cautious => Box::new(CautiousPolicy),
            Self::Greedy => Box::new(GreedyPolicy {
                revive_budget: GREEDY_REVIVE_BUDGET,
            }),
            Self::Reviver => Box::new(ReviverPolicy {
                bank_from_level: REVIVER_BANK_LEVEL,
            }),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "cautious" => Some(Self::Cautious),
            "greedy" => Some(Self::Greedy),
            "reviver" => Some(Self::Reviver),
            "random" => Some(Self::Random),
            _ => None,
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parse strategy tokens; `all` expands to every built-in strategy.
pub fn parse_strategies(tokens: &[String]) -> Result<Vec<GameplayStrategy>> {
    let mut strategies = Vec::new();
    for token in tokens {
        if token.eq_ignore_ascii_case("all") {
            strategies.extend(GameplayStrategy::ALL);
            continue;
        }
        let Some(strategy) = GameplayStrategy::parse(token) else {
            bail!("Unknown strategy: {token}");
        };
        strategies.push(strategy);
    }
    strategies.sort_unstable();
    strategies.dedup();
    if strategies.is_empty() {
        strategies.extend(GameplayStrategy::ALL);
    }
    Ok(strategies)
}

const GREEDY_REVIVE_BUDGET: u32 = 60;
const REVIVER_BANK_LEVEL: u32 = 25;
const RANDOM_COLLECT_CHANCE: f64 = 0.3;
const RANDOM_REVIVE_CHANCE: f64 = 0.5;

/// Banks at the first exit with anything in the ledger; revives only when
/// an advert pays for it.
struct CautiousPolicy;

/// Pushes for super zones and pays for revives within a budget.
struct GreedyPolicy {
    revive_budget: u32,
}

/// Always pays to revive and banks once deep enough.
struct ReviverPolicy {
    bank_from_level: u32,
}

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn should_collect(&mut self, view: &RunView) -> bool {
        view.ledger_total > 0
    }

    fn revive_with(&mut self, _view: &RunView, _cost: u32) -> Option<ReviveMethod> {
        Some(ReviveMethod::Advertisement)
    }
}

impl PlayerPolicy for GreedyPolicy {
    fn name(&self) -> &'static str {
        "Greedy"
    }

    fn should_collect(&mut self, view: &RunView) -> bool {
        view.zone_type == ZoneType::Super
    }

    fn revive_with(&mut self, _view: &RunView, cost: u32) -> Option<ReviveMethod> {
        (cost <= self.revive_budget).then_some(ReviveMethod::Currency)
    }
}

impl PlayerPolicy for ReviverPolicy {
    fn name(&self) -> &'static str {
        "Reviver"
    }

    fn should_collect(&mut self, view: &RunView) -> bool {
        view.level >= self.bank_from_level
    }

    fn revive_with(&mut self, _view: &RunView, _cost: u32) -> Option<ReviveMethod> {
        Some(ReviveMethod::Currency)
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn should_collect(&mut self, _view: &RunView) -> bool {
        self.rng.gen_bool(RANDOM_COLLECT_CHANCE)
    }

    fn revive_with(&mut self, _view: &RunView, _cost: u32) -> Option<ReviveMethod> {
        if !self.rng.gen_bool(RANDOM_REVIVE_CHANCE) {
            return None;
        }
        Some(if self.rng.r#gen::<bool>() {
            ReviveMethod::Currency
        } else {
            ReviveMethod::Advertisement
        })
    }
}
