pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;

pub use policy::{GameplayStrategy, PlayerPolicy, RunView, parse_strategies};
pub use reports::{StrategyAggregate, aggregate};
pub use seeds::resolve_seed_inputs;
pub use simulation::{CatalogSource, RunRecord, SimulationConfig, simulate};
