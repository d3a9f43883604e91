//! Draw-sim engine: streak tracking, binomial draw probabilities and
//! progressive-staking simulation over historical football results
//!
//! Provides:
//! - Per-team match series with draw / no-draw streak counters
//! - Streak and rolling-rate trigger policies
//! - Match-by-match staking state machine and outcome aggregation
//! - Multi-country simulation runner with shared progress
//! - football-data.co.uk, CSV directory and synthetic match sources

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod probability;
pub mod series;
pub mod simulation;
pub mod source;
pub mod staking;
pub mod stats;
pub mod synthetic;
pub mod types;

// Re-exports for convenience
pub use api::FootballDataClient;
pub use config::{
    strategies_hash, Country, EntryIndexRule, SimulationRequest, StakingConfig, StrategyConfig,
    TriggerConfig, COUNTRIES,
};
pub use error::{EngineError, EngineResult};
pub use metrics::{
    bottom_performers, cash_flow_extremes, group_by, max_drawdown, roi, summarize,
    top_performers, win_rate, GroupKey,
};
pub use policy::{build_policy, RollingRatePolicy, SessionStart, StreakPolicy, TriggerPolicy};
pub use probability::{
    cumulative_binomial, decimal_odds_to_probability, exact_binomial,
    fractional_odds_to_decimal, fractional_odds_to_probability, probability_to_decimal_odds,
    BinomialTails,
};
pub use series::{build_team_series, championship_teams, team_universe, DrawRateScope, TeamSeries};
pub use simulation::{
    run_simulation, simulate_country, FailedCountry, SimulationProgress, SimulationReport,
    SimulationStatus,
};
pub use source::{CsvDirectorySource, MatchSource, NameCorrections, SyntheticSource};
pub use staking::{BettingState, StakingEngine};
pub use stats::{no_draw_frequencies, team_stats, TeamStats};
pub use synthetic::{generate_league, LeagueSpec};
pub use types::*;
