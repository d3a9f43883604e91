//! Per-team match series with draw / no-draw streak counters
//!
//! Streaks are computed in a single forward fold carrying the last draw
//! class and the last scoring period. Both counters restart when the period
//! changes, so a streak never carries across seasons.

use std::collections::BTreeSet;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::types::{Match, Outcome, TeamMatch};

/// Which prior matches the rolling draw rate is computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawRateScope {
    /// Only earlier matches of the same scoring period
    #[default]
    CurrentPeriod,
    /// Every earlier match of the team, across periods
    AllHistory,
}

/// Wins, draws, losses and goals for one team in one period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub points: u32,
    pub goals_for: u32,
    pub goals_against: u32,
}

/// Date-ordered matches of one team across all periods
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSeries {
    pub team: String,
    pub matches: Vec<TeamMatch>,
}

/// Running state of the streak fold
struct StreakFold<'a> {
    last_period: Option<&'a str>,
    last_was_draw: bool,
    draw_streak: u32,
    no_draw_streak: u32,
}

impl<'a> StreakFold<'a> {
    fn new() -> Self {
        Self {
            last_period: None,
            last_was_draw: false,
            draw_streak: 0,
            no_draw_streak: 0,
        }
    }

    /// Advance over one match and return (draw_streak, no_draw_streak) ending at it
    fn step(&mut self, period: &'a str, is_draw: bool) -> (u32, u32) {
        let new_period = self.last_period != Some(period);

        if new_period || is_draw != self.last_was_draw {
            self.draw_streak = 0;
            self.no_draw_streak = 0;
        }
        if is_draw {
            self.draw_streak += 1;
        } else {
            self.no_draw_streak += 1;
        }

        self.last_period = Some(period);
        self.last_was_draw = is_draw;
        (self.draw_streak, self.no_draw_streak)
    }
}

/// Build the ordered series of `team` from a flat dataset
pub fn build_team_series(dataset: &[Match], team: &str) -> TeamSeries {
    let mut fixtures: Vec<&Match> = dataset.iter().filter(|m| m.involves(team)).collect();
    // Stable sort keeps feed order for fixtures on the same date
    fixtures.sort_by_key(|m| m.date);

    let mut fold = StreakFold::new();
    let matches = fixtures
        .into_iter()
        .map(|m| {
            let outcome = Outcome::for_team(m, team);
            let (draw_streak, no_draw_streak) = fold.step(&m.period, outcome.is_draw());
            TeamMatch {
                fixture: m.clone(),
                outcome,
                draw_streak,
                no_draw_streak,
            }
        })
        .collect();

    TeamSeries {
        team: team.to_string(),
        matches,
    }
}

/// Teams that played in `period`
pub fn team_universe(dataset: &[Match], period: &str) -> BTreeSet<String> {
    dataset
        .iter()
        .filter(|m| m.period == period)
        .flat_map(|m| [m.home_team.clone(), m.away_team.clone()])
        .collect()
}

/// Every team appearing anywhere in the dataset
pub fn championship_teams(dataset: &[Match]) -> BTreeSet<String> {
    dataset
        .iter()
        .flat_map(|m| [m.home_team.clone(), m.away_team.clone()])
        .collect()
}

impl TeamSeries {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Distinct periods in chronological order of first appearance
    pub fn periods(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for m in &self.matches {
            if out.last().map(String::as_str) != Some(m.period()) {
                out.push(m.period().to_string());
            }
        }
        out.dedup();
        out
    }

    /// Positions of the matches played in `period`.
    ///
    /// A period occupies one contiguous block of the date-ordered series; an
    /// empty range means the team did not play in it.
    pub fn period_positions(&self, period: &str) -> Range<usize> {
        let start = self.matches.iter().position(|m| m.period() == period);
        match start {
            Some(start) => {
                let len = self.matches[start..]
                    .iter()
                    .take_while(|m| m.period() == period)
                    .count();
                start..start + len
            }
            None => 0..0,
        }
    }

    /// No-draw streak ending at the match before `pos`, 0 at a period's first match
    pub fn prior_no_draw_streak(&self, pos: usize) -> u32 {
        if pos == 0 || pos > self.matches.len() {
            return 0;
        }
        let prev = &self.matches[pos - 1];
        match self.matches.get(pos) {
            Some(current) if current.period() != prev.period() => 0,
            _ => prev.no_draw_streak,
        }
    }

    /// Share of draws among the matches before `pos`.
    ///
    /// `None` while fewer than `min_sample` earlier matches are in scope.
    pub fn rolling_draw_rate(
        &self,
        pos: usize,
        scope: DrawRateScope,
        min_sample: usize,
    ) -> Option<f64> {
        let current = self.matches.get(pos)?;
        let prior = &self.matches[..pos];

        let (total, draws) = prior
            .iter()
            .filter(|m| match scope {
                DrawRateScope::CurrentPeriod => m.period() == current.period(),
                DrawRateScope::AllHistory => true,
            })
            .fold((0usize, 0usize), |(total, draws), m| {
                (total + 1, draws + usize::from(m.is_draw()))
            });

        if total < min_sample.max(1) {
            return None;
        }
        Some(draws as f64 / total as f64)
    }

    /// Season record of the team in `period`
    pub fn period_record(&self, period: &str) -> PeriodRecord {
        let mut record = PeriodRecord::default();
        for m in &self.matches[self.period_positions(period)] {
            let (gf, ga) = m.goals_for_against(&self.team);
            record.played += 1;
            record.goals_for += gf;
            record.goals_against += ga;
            match m.outcome {
                Outcome::Win => record.wins += 1,
                Outcome::Draw => record.draws += 1,
                Outcome::Loss => record.losses += 1,
            }
        }
        record.points = record.wins * 3 + record.draws;
        record
    }

    /// Draw rate over every match of `period`
    pub fn period_draw_rate(&self, period: &str) -> Option<f64> {
        let record = self.period_record(period);
        if record.played == 0 {
            return None;
        }
        Some(record.draws as f64 / record.played as f64)
    }

    pub fn max_no_draw_streak(&self) -> u32 {
        self.matches.iter().map(|m| m.no_draw_streak).max().unwrap_or(0)
    }

    /// No-draw streak at the latest match
    pub fn current_no_draw_streak(&self) -> u32 {
        self.matches.last().map(|m| m.no_draw_streak).unwrap_or(0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::synthetic::{generate_league, LeagueSpec};
    use crate::types::FullTimeResult;
    use chrono::NaiveDate;

    /// Build a dataset for team "A" from a result string, one char per match
    /// ('W', 'D', 'L'), all in `period`, starting at `day_offset`.
    pub(crate) fn fixtures_for(results: &str, period: &str, day_offset: i64) -> Vec<Match> {
        let base = NaiveDate::from_ymd_opt(2019, 8, 1).unwrap();
        results
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let (result, hg, ag) = match c {
                    'W' => (FullTimeResult::HomeWin, 2, 0),
                    'L' => (FullTimeResult::AwayWin, 0, 1),
                    _ => (FullTimeResult::Draw, 1, 1),
                };
                Match {
                    date: base + chrono::Duration::days(day_offset + i as i64 * 7),
                    home_team: "A".to_string(),
                    away_team: format!("Opp{i}"),
                    result,
                    home_goals: hg,
                    away_goals: ag,
                    draw_odds: None,
                    period: period.to_string(),
                }
            })
            .collect()
    }

    fn streaks(series: &TeamSeries) -> Vec<(u32, u32)> {
        series
            .matches
            .iter()
            .map(|m| (m.draw_streak, m.no_draw_streak))
            .collect()
    }

    #[test]
    fn test_outcome_from_team_perspective() {
        let mut data = fixtures_for("WL", "1920", 0);
        data[1].home_team = "B".to_string();
        data[1].away_team = "A".to_string();
        // away win with A away is a win for A
        let series = build_team_series(&data, "A");
        assert_eq!(series.matches[0].outcome, Outcome::Win);
        assert_eq!(series.matches[1].outcome, Outcome::Win);

        let b = build_team_series(&data, "B");
        assert_eq!(b.matches[0].outcome, Outcome::Loss);
    }

    #[test]
    fn test_streak_counters_within_period() {
        let data = fixtures_for("WLDDWWL", "1920", 0);
        let series = build_team_series(&data, "A");
        assert_eq!(
            streaks(&series),
            vec![(0, 1), (0, 2), (1, 0), (2, 0), (0, 1), (0, 2), (0, 3)]
        );
    }

    #[test]
    fn test_streaks_reset_at_period_boundary() {
        let mut data = fixtures_for("WWW", "1920", 0);
        data.extend(fixtures_for("LD", "2021", 400));
        data.extend(fixtures_for("D", "2122", 800));
        let series = build_team_series(&data, "A");
        assert_eq!(
            streaks(&series),
            vec![(0, 1), (0, 2), (0, 3), (0, 1), (1, 0), (1, 0)]
        );
    }

    #[test]
    fn test_series_is_date_sorted() {
        let mut data = fixtures_for("WDL", "1920", 0);
        data.reverse();
        let series = build_team_series(&data, "A");
        let dates: Vec<_> = series.matches.iter().map(|m| m.fixture.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
        assert_eq!(series.matches[0].outcome, Outcome::Win);
    }

    #[test]
    fn test_streak_invariants_on_synthetic_league() {
        let spec = LeagueSpec {
            teams: 10,
            periods: vec!["1920".into(), "2021".into(), "2122".into()],
            draw_rate: 0.28,
            seed: 7,
        };
        let data = generate_league(&spec);
        for team in championship_teams(&data) {
            let series = build_team_series(&data, &team);
            for (i, m) in series.matches.iter().enumerate() {
                assert!(
                    (m.draw_streak == 0) != (m.no_draw_streak == 0),
                    "exactly one counter must be set at {team}[{i}]"
                );
                let first_of_period = i == 0 || series.matches[i - 1].period() != m.period();
                if first_of_period {
                    assert_eq!(m.draw_streak + m.no_draw_streak, 1);
                } else {
                    let prev = &series.matches[i - 1];
                    if m.is_draw() {
                        assert_eq!(m.draw_streak, prev.draw_streak + 1);
                    } else {
                        assert_eq!(m.no_draw_streak, prev.no_draw_streak + 1);
                    }
                }
            }
        }
    }

    #[test]
    fn test_team_universe_is_period_scoped() {
        let mut data = fixtures_for("WW", "1920", 0);
        let mut current = fixtures_for("D", "2021", 400);
        current[0].away_team = "New".to_string();
        data.extend(current);

        let universe = team_universe(&data, "2021");
        assert_eq!(
            universe.into_iter().collect::<Vec<_>>(),
            vec!["A".to_string(), "New".to_string()]
        );
        assert_eq!(championship_teams(&data).len(), 4);
    }

    #[test]
    fn test_period_positions_and_prior_streak() {
        let mut data = fixtures_for("WWL", "1920", 0);
        data.extend(fixtures_for("WD", "2021", 400));
        let series = build_team_series(&data, "A");

        assert_eq!(series.period_positions("1920"), 0..3);
        assert_eq!(series.period_positions("2021"), 3..5);
        assert_eq!(series.period_positions("2324"), 0..0);
        assert_eq!(series.periods(), vec!["1920".to_string(), "2021".to_string()]);

        assert_eq!(series.prior_no_draw_streak(0), 0);
        assert_eq!(series.prior_no_draw_streak(2), 2);
        // first match of a new period does not inherit the old streak
        assert_eq!(series.prior_no_draw_streak(3), 0);
        assert_eq!(series.prior_no_draw_streak(4), 1);
    }

    #[test]
    fn test_rolling_draw_rate_needs_minimum_sample() {
        let mut data = fixtures_for("DWDW", "1920", 0);
        data.extend(fixtures_for("DDWLW", "2021", 400));
        let series = build_team_series(&data, "A");

        // 2021 starts at position 4
        assert_eq!(series.rolling_draw_rate(4, DrawRateScope::CurrentPeriod, 3), None);
        assert_eq!(series.rolling_draw_rate(6, DrawRateScope::CurrentPeriod, 3), None);
        let rate = series
            .rolling_draw_rate(7, DrawRateScope::CurrentPeriod, 3)
            .unwrap();
        assert!((rate - 2.0 / 3.0).abs() < 1e-12);

        let all = series.rolling_draw_rate(4, DrawRateScope::AllHistory, 3).unwrap();
        assert!((all - 0.5).abs() < 1e-12);
        assert_eq!(series.rolling_draw_rate(99, DrawRateScope::AllHistory, 3), None);
    }

    #[test]
    fn test_period_record() {
        let data = fixtures_for("WWDL", "1920", 0);
        let series = build_team_series(&data, "A");
        let rec = series.period_record("1920");
        assert_eq!(rec.wins, 2);
        assert_eq!(rec.draws, 1);
        assert_eq!(rec.losses, 1);
        assert_eq!(rec.points, 7);
        assert_eq!(rec.goals_for, 5);
        assert_eq!(rec.goals_against, 2);
        assert_eq!(series.period_draw_rate("1920"), Some(0.25));
        assert_eq!(series.period_draw_rate("2021"), None);
        assert_eq!(series.max_no_draw_streak(), 2);
        assert_eq!(series.current_no_draw_streak(), 1);
    }
}
