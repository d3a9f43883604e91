//! Trigger policies
//!
//! A policy looks at a team's series at one position and decides whether a
//! betting session should start there. Policies only read matches strictly
//! before the position, so the outcome being bet on is never visible to
//! the decision.

use crate::config::{EntryIndexRule, TriggerConfig};
use crate::probability::cumulative_binomial;
use crate::series::{DrawRateScope, TeamSeries};

/// Parameters handed to the staking engine when a policy fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStart {
    pub progression_index: usize,
}

/// Decides whether a betting session starts at a series position
pub trait TriggerPolicy: Send + Sync {
    fn name(&self) -> &str;
    fn evaluate(&self, series: &TeamSeries, position: usize) -> Option<SessionStart>;
}

// ============================================================================
// Streak policy
// ============================================================================

/// Fires once the no-draw streak reaches a threshold
pub struct StreakPolicy {
    threshold: u32,
    window: u32,
    restart_after_exhaustion: bool,
    entry_index: EntryIndexRule,
}

impl StreakPolicy {
    pub fn new(
        threshold: u32,
        window: u32,
        restart_after_exhaustion: bool,
        entry_index: EntryIndexRule,
    ) -> Self {
        Self {
            threshold,
            window,
            restart_after_exhaustion,
            entry_index,
        }
    }

    /// Whether a streak of `streak` non-draws opens (or re-opens) a session
    pub fn fires_at(&self, streak: u32) -> bool {
        if streak < self.threshold {
            return false;
        }
        self.restart_after_exhaustion || streak < self.threshold + self.window
    }
}

impl TriggerPolicy for StreakPolicy {
    fn name(&self) -> &str {
        "Streak"
    }

    fn evaluate(&self, series: &TeamSeries, position: usize) -> Option<SessionStart> {
        let streak = series.prior_no_draw_streak(position);
        if !self.fires_at(streak) {
            return None;
        }
        let progression_index = match self.entry_index {
            EntryIndexRule::FromStreak => (streak - self.threshold) as usize,
            EntryIndexRule::First => 0,
        };
        Some(SessionStart { progression_index })
    }
}

// ============================================================================
// Rolling-rate policy
// ============================================================================

/// Fires when P(at least one draw in the next `horizon` matches), under the
/// team's rolling draw rate, reaches a threshold.
///
/// The rate is treated as memoryless: the probability does not build up
/// over a streak, it only reflects how often the team has drawn so far.
pub struct RollingRatePolicy {
    threshold: f64,
    horizon: u32,
    scope: DrawRateScope,
    min_sample: usize,
}

impl RollingRatePolicy {
    pub fn new(threshold: f64, horizon: u32, scope: DrawRateScope, min_sample: usize) -> Self {
        Self {
            threshold,
            horizon,
            scope,
            min_sample,
        }
    }

    /// P(X >= 1) for X ~ Binomial(horizon, p_draw) at `position`, if defined
    pub fn at_least_one_draw(&self, series: &TeamSeries, position: usize) -> Option<f64> {
        let p_draw = series.rolling_draw_rate(position, self.scope, self.min_sample)?;
        cumulative_binomial(self.horizon, 1.min(self.horizon), p_draw)
            .ok()
            .map(|tails| tails.ge)
    }
}

impl TriggerPolicy for RollingRatePolicy {
    fn name(&self) -> &str {
        "RollingRate"
    }

    fn evaluate(&self, series: &TeamSeries, position: usize) -> Option<SessionStart> {
        let probability = self.at_least_one_draw(series, position)?;
        (probability >= self.threshold).then_some(SessionStart {
            progression_index: 0,
        })
    }
}

/// Build the policy described by a trigger configuration
pub fn build_policy(trigger: &TriggerConfig, window: u32) -> Box<dyn TriggerPolicy> {
    match trigger {
        TriggerConfig::Streak {
            threshold,
            restart_after_exhaustion,
            entry_index,
        } => Box::new(StreakPolicy::new(
            *threshold,
            window,
            *restart_after_exhaustion,
            *entry_index,
        )),

        TriggerConfig::RollingRate {
            threshold,
            horizon,
            scope,
            min_sample,
        } => Box::new(RollingRatePolicy::new(
            *threshold,
            horizon.unwrap_or(window),
            *scope,
            *min_sample,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::build_team_series;
    use crate::series::tests::fixtures_for;

    fn series(results: &str) -> TeamSeries {
        build_team_series(&fixtures_for(results, "1920", 0), "A")
    }

    #[test]
    fn test_streak_policy_fires_inside_main_span() {
        let policy = StreakPolicy::new(4, 5, false, EntryIndexRule::FromStreak);
        assert!(!policy.fires_at(3));
        assert!(policy.fires_at(4));
        assert!(policy.fires_at(8));
        assert!(!policy.fires_at(9));

        let restart = StreakPolicy::new(4, 5, true, EntryIndexRule::FromStreak);
        assert!(restart.fires_at(9));
        assert!(restart.fires_at(40));
    }

    #[test]
    fn test_streak_policy_reads_prior_streak_only() {
        let s = series("WWWWL");
        let policy = StreakPolicy::new(4, 5, false, EntryIndexRule::FromStreak);
        // position 3 is the 4th non-draw, but only 3 precede it
        assert_eq!(policy.evaluate(&s, 3), None);
        assert_eq!(
            policy.evaluate(&s, 4),
            Some(SessionStart {
                progression_index: 0
            })
        );
    }

    #[test]
    fn test_streak_entry_index_rules() {
        let s = series("WWWWWWW");
        let from_streak = StreakPolicy::new(4, 5, false, EntryIndexRule::FromStreak);
        let first = StreakPolicy::new(4, 5, false, EntryIndexRule::First);
        assert_eq!(from_streak.evaluate(&s, 6).unwrap().progression_index, 2);
        assert_eq!(first.evaluate(&s, 6).unwrap().progression_index, 0);
    }

    #[test]
    fn test_rolling_rate_undefined_before_min_sample() {
        let s = series("DDDW");
        let policy = RollingRatePolicy::new(0.5, 5, DrawRateScope::CurrentPeriod, 3);
        assert_eq!(policy.evaluate(&s, 0), None);
        assert_eq!(policy.evaluate(&s, 2), None);
        // three draws out of three: certain to fire
        assert!(policy.evaluate(&s, 3).is_some());
    }

    #[test]
    fn test_rolling_rate_threshold() {
        // p = 0.25 after four matches: 1 - 0.75^5 ≈ 0.763
        let s = series("DWWWL");
        let low = RollingRatePolicy::new(0.75, 5, DrawRateScope::CurrentPeriod, 3);
        let high = RollingRatePolicy::new(0.80, 5, DrawRateScope::CurrentPeriod, 3);
        let p = low.at_least_one_draw(&s, 4).unwrap();
        assert!((p - (1.0 - 0.75f64.powi(5))).abs() < 1e-12);
        assert!(low.evaluate(&s, 4).is_some());
        assert!(high.evaluate(&s, 4).is_none());
    }

    #[test]
    fn test_rolling_rate_zero_draws_never_fires() {
        let s = series("WWWWWW");
        let policy = RollingRatePolicy::new(0.0001, 5, DrawRateScope::CurrentPeriod, 3);
        assert!(policy.evaluate(&s, 5).is_none());
    }

    #[test]
    fn test_build_policy_uses_window_as_default_horizon() {
        let trigger = TriggerConfig::RollingRate {
            threshold: 0.0,
            horizon: None,
            scope: DrawRateScope::CurrentPeriod,
            min_sample: 3,
        };
        let policy = build_policy(&trigger, 5);
        assert_eq!(policy.name(), "RollingRate");
        assert!(policy.evaluate(&series("WWWW"), 3).is_some());
    }
}
