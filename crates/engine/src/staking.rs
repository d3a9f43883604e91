//! Match-by-match progressive staking engine

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::StakingConfig;
use crate::metrics::{max_drawdown, roi};
use crate::policy::TriggerPolicy;
use crate::series::TeamSeries;
use crate::types::{SimulationResult, TeamMatch};

/// Betting state of one team within one period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BettingState {
    #[default]
    Idle,
    Active {
        progression_index: usize,
        bets_remaining: u32,
    },
}

/// How a single placed bet settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Draw: stake paid out at the quote, session over
    Won { stake: Decimal, payout: Decimal },
    /// Non-draw with bets left in the window
    Lost { stake: Decimal },
    /// Non-draw on the last bet of the window
    Bust { stake: Decimal },
}

impl BettingState {
    pub fn is_active(&self) -> bool {
        matches!(self, BettingState::Active { .. })
    }

    /// Arm a session starting at `progression_index`
    pub fn arm(progression_index: usize, staking: &StakingConfig) -> Self {
        BettingState::Active {
            progression_index: progression_index.min(staking.last_slot()),
            bets_remaining: staking.window,
        }
    }

    /// Place and settle the bet for one match. Idle states place nothing.
    pub fn settle(&mut self, m: &TeamMatch, staking: &StakingConfig) -> Option<Settlement> {
        let BettingState::Active {
            progression_index,
            bets_remaining,
        } = *self
        else {
            return None;
        };
        if bets_remaining == 0 {
            *self = BettingState::Idle;
            return None;
        }

        let stake = staking.stake_at(progression_index);

        if m.is_draw() {
            let odds = draw_quote(m, staking);
            *self = BettingState::Idle;
            return Some(Settlement::Won {
                stake,
                payout: stake * odds,
            });
        }

        let bets_remaining = bets_remaining - 1;
        if bets_remaining == 0 {
            *self = BettingState::Idle;
            Some(Settlement::Bust { stake })
        } else {
            *self = BettingState::Active {
                progression_index: (progression_index + 1).min(staking.last_slot()),
                bets_remaining,
            };
            Some(Settlement::Lost { stake })
        }
    }
}

/// The match's draw quote, or the configured fallback when it has none
pub fn draw_quote(m: &TeamMatch, staking: &StakingConfig) -> Decimal {
    match m.fixture.draw_odds {
        Some(odds) if odds > Decimal::ZERO => odds,
        _ => staking.fallback_odds,
    }
}

/// Labels attached to a run's result
#[derive(Debug, Clone)]
pub struct RunLabel<'a> {
    pub strategy: &'a str,
    pub country: &'a str,
}

/// Staking engine that replays one team's period match by match
pub struct StakingEngine;

impl StakingEngine {
    /// Simulate `policy` + `staking` over the matches of `period`.
    ///
    /// A team without matches in the period yields an empty result.
    pub fn run(
        series: &TeamSeries,
        period: &str,
        policy: &dyn TriggerPolicy,
        staking: &StakingConfig,
        label: &RunLabel<'_>,
    ) -> SimulationResult {
        let mut state = BettingState::Idle;
        let mut cash_flow: Vec<Decimal> = Vec::new();
        let mut total_staked = Decimal::ZERO;
        let mut total_returned = Decimal::ZERO;
        let mut bet_count = 0u32;
        let mut win_count = 0u32;
        let mut triggers = 0u32;
        let mut busts = 0u32;

        let positions = series.period_positions(period);
        let matches = positions.len();

        for pos in positions {
            let m = &series.matches[pos];

            if !state.is_active() {
                if let Some(start) = policy.evaluate(series, pos) {
                    state = BettingState::arm(start.progression_index, staking);
                    triggers += 1;
                    debug!(
                        team = %series.team,
                        date = %m.fixture.date,
                        policy = policy.name(),
                        slot = start.progression_index,
                        "Session triggered"
                    );
                }
            }

            let Some(settlement) = state.settle(m, staking) else {
                continue;
            };

            match settlement {
                Settlement::Won { stake, payout } => {
                    total_staked += stake;
                    total_returned += payout;
                    bet_count += 1;
                    win_count += 1;
                    cash_flow.push(-stake);
                    cash_flow.push(payout);
                    debug!(team = %series.team, stake = %stake, payout = %payout, "Draw, session won");
                }
                Settlement::Lost { stake } => {
                    total_staked += stake;
                    bet_count += 1;
                    cash_flow.push(-stake);
                }
                Settlement::Bust { stake } => {
                    total_staked += stake;
                    bet_count += 1;
                    busts += 1;
                    cash_flow.push(-stake);
                    debug!(team = %series.team, "Window exhausted without a draw");
                }
            }
        }

        let profit = total_returned - total_staked;
        let result = SimulationResult {
            strategy: label.strategy.to_string(),
            country: label.country.to_string(),
            team: series.team.clone(),
            period: period.to_string(),
            total_staked,
            total_returned,
            profit,
            roi: roi(profit, total_staked),
            bet_count,
            win_count,
            triggers,
            busts,
            open_session: state.is_active(),
            max_drawdown: max_drawdown(&cash_flow),
            cash_flow,
        };

        if result.bet_count > 0 {
            info!(
                strategy = label.strategy,
                team = %result.team,
                period,
                matches,
                bets = result.bet_count,
                wins = result.win_count,
                profit = %result.profit,
                "Team period simulated"
            );
        }

        result
    }
}
