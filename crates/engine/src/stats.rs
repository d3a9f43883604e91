//! League table and draw-probability statistics per team
//!
//! c_prob     = P(X >= 1), X ~ Binomial(horizon + current_no_draw, 1 / mean_draw_odds)
//! c_prob_adj = P(X >= 1), X ~ Binomial(horizon, current-period draw rate), 4 dp
//!
//! `c_prob` lengthens the horizon by the running streak and so rises as a
//! streak grows; `c_prob_adj` does not, and is the figure the rolling-rate
//! strategies trade on.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::probability::{cumulative_binomial, decimal_odds_to_probability, round4};
use crate::series::{build_team_series, championship_teams, PeriodRecord, TeamSeries};
use crate::types::Match;

/// Summary of one team over the loaded periods
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamStats {
    pub team: String,
    pub max_no_draw: u32,
    pub current_no_draw: u32,
    /// Mean of the available draw quotes
    pub mean_draw_odds: Option<Decimal>,
    /// Draw rate in the current period, 4 dp
    pub p_draw: Option<f64>,
    pub periods: BTreeMap<String, PeriodRecord>,
    pub c_prob: Option<f64>,
    pub c_prob_adj: Option<f64>,
}

impl TeamStats {
    fn current(&self, period: &str) -> PeriodRecord {
        self.periods.get(period).copied().unwrap_or_default()
    }
}

fn mean_draw_odds(series: &TeamSeries) -> Option<Decimal> {
    let quotes: Vec<Decimal> = series
        .matches
        .iter()
        .filter_map(|m| m.fixture.draw_odds)
        .filter(|q| *q > Decimal::ZERO)
        .collect();
    if quotes.is_empty() {
        return None;
    }
    let total: Decimal = quotes.iter().sum();
    Some(total / Decimal::from(quotes.len()))
}

fn at_least_one(trials: u32, p: f64) -> Option<f64> {
    cumulative_binomial(trials, 1.min(trials), p)
        .ok()
        .map(|tails| tails.ge)
}

/// Statistics for one team's series
pub fn series_stats(
    series: &TeamSeries,
    periods: &[String],
    current_period: &str,
    horizon: u32,
) -> TeamStats {
    let current_no_draw = series.current_no_draw_streak();
    let mean_odds = mean_draw_odds(series);
    let p_draw = series.period_draw_rate(current_period).map(round4);

    let c_prob = mean_odds
        .and_then(|odds| decimal_odds_to_probability(odds.to_f64()?).ok())
        .and_then(|p| at_least_one(horizon + current_no_draw, p));
    let c_prob_adj = p_draw.and_then(|p| at_least_one(horizon, p)).map(round4);

    let periods = periods
        .iter()
        .map(|p| (p.clone(), series.period_record(p)))
        .collect();

    TeamStats {
        team: series.team.clone(),
        max_no_draw: series.max_no_draw_streak(),
        current_no_draw,
        mean_draw_odds: mean_odds.map(|d| d.round_dp(4)),
        p_draw,
        periods,
        c_prob,
        c_prob_adj,
    }
}

/// Statistics for every team in the dataset, ordered like a league table:
/// current-period points desc, goals for desc, goals against asc.
pub fn team_stats(
    dataset: &[Match],
    periods: &[String],
    current_period: &str,
    horizon: u32,
) -> Vec<TeamStats> {
    let mut stats: Vec<TeamStats> = championship_teams(dataset)
        .iter()
        .map(|team| {
            let series = build_team_series(dataset, team);
            series_stats(&series, periods, current_period, horizon)
        })
        .collect();

    stats.sort_by(|a, b| {
        let (ra, rb) = (a.current(current_period), b.current(current_period));
        rb.points
            .cmp(&ra.points)
            .then(rb.goals_for.cmp(&ra.goals_for))
            .then(ra.goals_against.cmp(&rb.goals_against))
            .then_with(|| a.team.cmp(&b.team))
    });
    stats
}

/// Histogram of the no-draw streak lengths that ended in a draw.
///
/// For every draw after a team's first match, the streak that preceded it
/// is counted (0 when the previous match was also a draw). `teams` narrows
/// the count to the named teams.
pub fn no_draw_frequencies(dataset: &[Match], teams: Option<&[String]>) -> BTreeMap<u32, u32> {
    let names: Vec<String> = match teams {
        Some(t) => t.to_vec(),
        None => championship_teams(dataset).into_iter().collect(),
    };

    let mut histogram = BTreeMap::new();
    for team in &names {
        let series = build_team_series(dataset, team);
        for (pos, m) in series.matches.iter().enumerate().skip(1) {
            if m.is_draw() {
                *histogram.entry(series.prior_no_draw_streak(pos)).or_insert(0) += 1;
            }
        }
    }
    histogram
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::tests::fixtures_for;
    use rust_decimal_macros::dec;

    fn periods() -> Vec<String> {
        vec!["1920".to_string(), "2021".to_string()]
    }

    #[test]
    fn test_series_stats_probabilities() {
        let mut data = fixtures_for("WDWW", "1920", 0);
        data.extend(fixtures_for("DWWL", "2021", 400));
        for m in data.iter_mut() {
            m.draw_odds = Some(dec!(4));
        }
        let series = build_team_series(&data, "A");
        let s = series_stats(&series, &periods(), "2021", 5);

        assert_eq!(s.max_no_draw, 3);
        assert_eq!(s.current_no_draw, 3);
        assert_eq!(s.mean_draw_odds, Some(dec!(4)));
        assert_eq!(s.p_draw, Some(0.25));

        // streak-lengthened horizon: 5 + 3 trials at p = 0.25
        let c = s.c_prob.unwrap();
        assert!((c - (1.0 - 0.75f64.powi(8))).abs() < 1e-12);
        assert_eq!(s.c_prob_adj, Some(round4(1.0 - 0.75f64.powi(5))));
        assert_eq!(s.periods["2021"].points, 7);
    }

    #[test]
    fn test_missing_quotes_leave_c_prob_undefined() {
        let series = build_team_series(&fixtures_for("WWD", "2021", 0), "A");
        let s = series_stats(&series, &periods(), "2021", 5);
        assert_eq!(s.mean_draw_odds, None);
        assert_eq!(s.c_prob, None);
        assert!(s.c_prob_adj.is_some());

        let none = series_stats(&series, &periods(), "2324", 5);
        assert_eq!(none.p_draw, None);
        assert_eq!(none.c_prob_adj, None);
    }

    #[test]
    fn test_team_stats_table_order() {
        // A wins twice at home and loses to Opp2; opponents play once each
        let data = fixtures_for("WWL", "2021", 0);
        let table = team_stats(&data, &periods(), "2021", 5);
        assert_eq!(table.len(), 4);
        assert_eq!(table[0].team, "A");
        // Opp2 won 1-0 away, Opp0 and Opp1 lost 0-2
        assert_eq!(table[1].team, "Opp2");
        assert_eq!(table[2].team, "Opp0");
        assert_eq!(table[3].team, "Opp1");
    }

    #[test]
    fn test_no_draw_frequencies() {
        let data = fixtures_for("DWWDDWD", "1920", 0);
        let only_a = vec!["A".to_string()];
        let hist = no_draw_frequencies(&data, Some(only_a.as_slice()));
        // draws at 3 (after 2), 4 (after 0) and 6 (after 1); the first match is skipped
        assert_eq!(hist.get(&2), Some(&1));
        assert_eq!(hist.get(&0), Some(&1));
        assert_eq!(hist.get(&1), Some(&1));
        assert_eq!(hist.values().sum::<u32>(), 3);
    }
}
