//! Types shared by the simulation engine

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Full-time result code as published in the match feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FullTimeResult {
    #[serde(rename = "H")]
    HomeWin,
    #[serde(rename = "A")]
    AwayWin,
    #[serde(rename = "D")]
    Draw,
}

impl FullTimeResult {
    /// Parse the single-letter `FTR` code (`H`, `A`, `D`)
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "H" => Some(Self::HomeWin),
            "A" => Some(Self::AwayWin),
            "D" => Some(Self::Draw),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::HomeWin => "H",
            Self::AwayWin => "A",
            Self::Draw => "D",
        }
    }

    pub fn is_draw(&self) -> bool {
        matches!(self, Self::Draw)
    }
}

/// A single played fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub result: FullTimeResult,
    pub home_goals: u32,
    pub away_goals: u32,
    /// Decimal draw quote (B365D); `None` when the feed has no usable value
    pub draw_odds: Option<Decimal>,
    /// Scoring period label, e.g. "2324"
    pub period: String,
}

impl Match {
    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }
}

/// Result of a match from one team's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "D")]
    Draw,
    #[serde(rename = "L")]
    Loss,
}

impl Outcome {
    /// Derive the outcome for `team` from a match result
    pub fn for_team(m: &Match, team: &str) -> Self {
        let is_home = m.home_team == team;
        match m.result {
            FullTimeResult::HomeWin if is_home => Outcome::Win,
            FullTimeResult::HomeWin => Outcome::Loss,
            FullTimeResult::AwayWin if is_home => Outcome::Loss,
            FullTimeResult::AwayWin => Outcome::Win,
            FullTimeResult::Draw => Outcome::Draw,
        }
    }

    pub fn is_draw(&self) -> bool {
        matches!(self, Outcome::Draw)
    }
}

/// A match seen from one team, with the streak counters ending at it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMatch {
    #[serde(flatten)]
    pub fixture: Match,
    pub outcome: Outcome,
    pub draw_streak: u32,
    pub no_draw_streak: u32,
}

impl TeamMatch {
    pub fn period(&self) -> &str {
        &self.fixture.period
    }

    pub fn is_draw(&self) -> bool {
        self.outcome.is_draw()
    }

    /// Goals scored and conceded by the team this entry belongs to
    pub fn goals_for_against(&self, team: &str) -> (u32, u32) {
        if self.fixture.home_team == team {
            (self.fixture.home_goals, self.fixture.away_goals)
        } else {
            (self.fixture.away_goals, self.fixture.home_goals)
        }
    }
}

/// Outcome of one (team, period, strategy) run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub strategy: String,
    pub country: String,
    pub team: String,
    pub period: String,
    pub total_staked: Decimal,
    pub total_returned: Decimal,
    pub profit: Decimal,
    /// Return on investment in percent
    pub roi: Decimal,
    pub bet_count: u32,
    pub win_count: u32,
    pub triggers: u32,
    /// Sessions that ran out of window without a draw
    pub busts: u32,
    /// The period ended while a session was still running
    pub open_session: bool,
    pub max_drawdown: Decimal,
    /// Signed ledger: negative entries are stakes, positive are payouts
    pub cash_flow: Vec<Decimal>,
}

/// Aggregated totals over a group of simulation results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub key: String,
    pub runs: u32,
    pub total_staked: Decimal,
    pub total_returned: Decimal,
    pub profit: Decimal,
    pub roi: Decimal,
    pub bet_count: u32,
    pub win_count: u32,
    pub triggers: u32,
    pub busts: u32,
    pub win_rate: Decimal,
    pub max_drawdown: Decimal,
}
