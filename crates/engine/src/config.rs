//! Strategy and run configuration
//!
//! Everything here is plain serde data. `validate()` must pass before a
//! configuration reaches the staking engine: bad tables and odds are
//! rejected up front instead of being clamped during a run.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{EngineError, EngineResult};
use crate::series::DrawRateScope;

/// Minimum earlier matches before a rolling draw rate is defined
pub const DEFAULT_MIN_SAMPLE: usize = 3;

/// Leagues available from the football-data feed
pub const COUNTRIES: &[(&str, &str)] = &[
    ("greece", "G1"),
    ("england", "E0"),
    ("italy", "I1"),
    ("spain", "SP1"),
    ("germany", "D1"),
    ("france", "F1"),
];

/// A league: display name plus the feed's division code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    pub code: String,
}

impl Country {
    /// Look up a league by name, case-insensitively
    pub fn from_name(name: &str) -> EngineResult<Self> {
        let wanted = name.trim().to_lowercase();
        COUNTRIES
            .iter()
            .find(|(n, _)| *n == wanted)
            .map(|(n, c)| Country {
                name: n.to_string(),
                code: c.to_string(),
            })
            .ok_or_else(|| EngineError::UnknownCountry(name.to_string()))
    }

    pub fn all() -> Vec<Self> {
        COUNTRIES
            .iter()
            .map(|(n, c)| Country {
                name: n.to_string(),
                code: c.to_string(),
            })
            .collect()
    }
}

/// How the streak policy picks the first stake of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryIndexRule {
    /// Bet number follows the streak: slot `streak - threshold`
    #[default]
    FromStreak,
    /// Every session starts at the first slot
    First,
}

/// Trigger policy parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerConfig {
    /// Start betting after a run of non-draws
    Streak {
        threshold: u32,
        #[serde(default)]
        restart_after_exhaustion: bool,
        #[serde(default)]
        entry_index: EntryIndexRule,
    },
    /// Start betting when P(at least one draw in the next `horizon`
    /// matches) under the rolling draw rate reaches `threshold`
    RollingRate {
        threshold: f64,
        /// Binomial horizon; defaults to the staking window
        #[serde(default)]
        horizon: Option<u32>,
        #[serde(default)]
        scope: DrawRateScope,
        #[serde(default = "default_min_sample")]
        min_sample: usize,
    },
}

fn default_min_sample() -> usize {
    DEFAULT_MIN_SAMPLE
}

/// Progressive staking parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakingConfig {
    /// Bets per session before giving up
    pub window: u32,
    /// Stake for each bet of a session, in order
    pub progression: Vec<Decimal>,
    /// Draw quote used when a match has none
    pub fallback_odds: Decimal,
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            window: 5,
            progression: vec![dec!(2), dec!(4), dec!(6), dec!(9), dec!(13)],
            fallback_odds: dec!(3.5),
        }
    }
}

impl StakingConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.window == 0 {
            return Err(EngineError::InvalidConfiguration(
                "betting window must be at least 1".to_string(),
            ));
        }
        if self.progression.len() < self.window as usize {
            return Err(EngineError::InvalidConfiguration(format!(
                "stake progression has {} entries but the window is {}",
                self.progression.len(),
                self.window
            )));
        }
        if let Some(bad) = self.progression.iter().find(|s| **s <= Decimal::ZERO) {
            return Err(EngineError::InvalidConfiguration(format!(
                "stakes must be positive, found {bad}"
            )));
        }
        if self.fallback_odds <= Decimal::ZERO {
            return Err(EngineError::InvalidConfiguration(format!(
                "fallback odds must be positive, got {}",
                self.fallback_odds
            )));
        }
        Ok(())
    }

    /// Stake for slot `index`, clamped to the last entry
    pub fn stake_at(&self, index: usize) -> Decimal {
        let last = self.progression.len().saturating_sub(1);
        self.progression
            .get(index.min(last))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn last_slot(&self) -> usize {
        self.progression.len().saturating_sub(1)
    }

    /// Amount lost when a full session busts
    pub fn max_session_loss(&self) -> Decimal {
        (0..self.window as usize).map(|i| self.stake_at(i)).sum()
    }
}

/// A named strategy: trigger policy plus staking plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub name: String,
    pub trigger: TriggerConfig,
    #[serde(default)]
    pub staking: StakingConfig,
}

impl StrategyConfig {
    pub fn streak(name: &str, threshold: u32) -> Self {
        Self {
            name: name.to_string(),
            trigger: TriggerConfig::Streak {
                threshold,
                restart_after_exhaustion: false,
                entry_index: EntryIndexRule::FromStreak,
            },
            staking: StakingConfig::default(),
        }
    }

    pub fn rolling_rate(name: &str, threshold: f64) -> Self {
        Self {
            name: name.to_string(),
            trigger: TriggerConfig::RollingRate {
                threshold,
                horizon: None,
                scope: DrawRateScope::CurrentPeriod,
                min_sample: DEFAULT_MIN_SAMPLE,
            },
            staking: StakingConfig::default(),
        }
    }

    /// The four standard strategies compared by the simulator
    pub fn standard_set() -> Vec<Self> {
        vec![
            Self::streak("Streak >= 4", 4),
            Self::streak("Streak >= 6", 6),
            Self::rolling_rate("Rolling rate 0.80", 0.80),
            Self::rolling_rate("Rolling rate 0.90", 0.90),
        ]
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.name.trim().is_empty() {
            return Err(EngineError::InvalidConfiguration(
                "strategy name must not be empty".to_string(),
            ));
        }
        self.staking.validate().map_err(|e| match e {
            EngineError::InvalidConfiguration(msg) => {
                EngineError::InvalidConfiguration(format!("{}: {msg}", self.name))
            }
            other => other,
        })?;

        match &self.trigger {
            TriggerConfig::Streak { threshold, .. } => {
                if *threshold == 0 {
                    return Err(EngineError::InvalidConfiguration(format!(
                        "{}: streak threshold must be at least 1",
                        self.name
                    )));
                }
            }
            TriggerConfig::RollingRate {
                threshold,
                horizon,
                min_sample,
                ..
            } => {
                if !(0.0..=1.0).contains(threshold) {
                    return Err(EngineError::InvalidConfiguration(format!(
                        "{}: probability threshold must lie in [0, 1], got {threshold}",
                        self.name
                    )));
                }
                if *horizon == Some(0) {
                    return Err(EngineError::InvalidConfiguration(format!(
                        "{}: binomial horizon must be at least 1",
                        self.name
                    )));
                }
                if *min_sample == 0 {
                    return Err(EngineError::InvalidConfiguration(format!(
                        "{}: minimum sample must be at least 1",
                        self.name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Stable hash of a strategy set, used to tag stored runs
pub fn strategies_hash(strategies: &[StrategyConfig]) -> String {
    let json = serde_json::to_string(strategies).unwrap_or_default();
    format!("{:x}", Sha256::digest(json.as_bytes()))
}

/// A multi-country simulation request; missing JSON fields take the defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationRequest {
    pub countries: Vec<String>,
    pub periods: Vec<String>,
    /// Period treated as "current" for team statistics
    pub current_period: String,
    pub strategies: Vec<StrategyConfig>,
    /// Wall-clock budget for the whole run, checked between countries
    pub time_budget_secs: Option<u64>,
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self {
            countries: COUNTRIES.iter().map(|(n, _)| n.to_string()).collect(),
            periods: ["1920", "2021", "2122", "2223", "2324"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            current_period: "2324".to_string(),
            strategies: StrategyConfig::standard_set(),
            time_budget_secs: None,
        }
    }
}

impl SimulationRequest {
    /// Validate every strategy and resolve the requested countries
    pub fn validate(&self) -> EngineResult<Vec<Country>> {
        self.validate_strategies()?;
        self.countries.iter().map(|c| Country::from_name(c)).collect()
    }

    /// Period that decides which teams are currently active: the requested
    /// current period when it is loaded, otherwise the last requested one
    pub fn active_period(&self) -> &str {
        if self.periods.iter().any(|p| *p == self.current_period) {
            &self.current_period
        } else {
            self.periods
                .last()
                .map(String::as_str)
                .unwrap_or(&self.current_period)
        }
    }

    /// Validate periods and strategies without resolving countries
    pub fn validate_strategies(&self) -> EngineResult<()> {
        if self.periods.is_empty() {
            return Err(EngineError::InvalidConfiguration(
                "at least one period is required".to_string(),
            ));
        }
        if self.strategies.is_empty() {
            return Err(EngineError::InvalidConfiguration(
                "at least one strategy is required".to_string(),
            ));
        }
        for strategy in &self.strategies {
            strategy.validate()?;
        }
        let mut names: Vec<&str> = self.strategies.iter().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        if names.windows(2).any(|w| w[0] == w[1]) {
            return Err(EngineError::InvalidConfiguration(
                "strategy names must be unique".to_string(),
            ));
        }
        Ok(())
    }
}
