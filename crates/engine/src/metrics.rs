//! Outcome aggregation
//!
//! profit = returned - staked
//! roi    = profit / staked × 100   (0 when nothing was staked)
//! max_drawdown = max over t of (running_max(cum[..=t]) - cum[t]),
//! where the running max is taken over the cumulative values themselves,
//! so it starts at cum[0].
//!
//! ROI is kept at full precision; renderers round it for display.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{SimulationResult, SummaryRow};

/// Return on investment in percent
pub fn roi(profit: Decimal, staked: Decimal) -> Decimal {
    if staked <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    profit / staked * dec!(100)
}

/// Wins per bet in percent, rounded to 2 dp
pub fn win_rate(wins: u32, bets: u32) -> Decimal {
    if bets == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(wins) / Decimal::from(bets) * dec!(100)).round_dp(2)
}

/// Largest peak-to-trough fall of the cumulative ledger
pub fn max_drawdown(cash_flow: &[Decimal]) -> Decimal {
    let mut cumulative = Decimal::ZERO;
    let mut peak: Option<Decimal> = None;
    let mut worst = Decimal::ZERO;

    for entry in cash_flow {
        cumulative += *entry;
        let peak = peak.get_or_insert(cumulative);
        if cumulative > *peak {
            *peak = cumulative;
        }
        let drawdown = *peak - cumulative;
        if drawdown > worst {
            worst = drawdown;
        }
    }
    worst
}

/// Lowest and highest cumulative balance reached over the ledger
pub fn cash_flow_extremes(cash_flow: &[Decimal]) -> (Decimal, Decimal) {
    let mut cumulative = Decimal::ZERO;
    let mut low = Decimal::ZERO;
    let mut high = Decimal::ZERO;
    for entry in cash_flow {
        cumulative += *entry;
        low = low.min(cumulative);
        high = high.max(cumulative);
    }
    (low, high)
}

// ============================================================================
// Grouping
// ============================================================================

/// Dimension a result table is grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Country,
    Period,
    Strategy,
}

impl GroupKey {
    fn of<'a>(&self, r: &'a SimulationResult) -> &'a str {
        match self {
            GroupKey::Country => &r.country,
            GroupKey::Period => &r.period,
            GroupKey::Strategy => &r.strategy,
        }
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupKey::Country => write!(f, "country"),
            GroupKey::Period => write!(f, "period"),
            GroupKey::Strategy => write!(f, "strategy"),
        }
    }
}

/// Totals over a set of results. ROI and win rate come from the sums; the
/// drawdown is the worst drawdown of any member.
pub fn summarize<'a, I>(key: &str, results: I) -> SummaryRow
where
    I: IntoIterator<Item = &'a SimulationResult>,
{
    let mut row = SummaryRow {
        key: key.to_string(),
        runs: 0,
        total_staked: Decimal::ZERO,
        total_returned: Decimal::ZERO,
        profit: Decimal::ZERO,
        roi: Decimal::ZERO,
        bet_count: 0,
        win_count: 0,
        triggers: 0,
        busts: 0,
        win_rate: Decimal::ZERO,
        max_drawdown: Decimal::ZERO,
    };

    for r in results {
        row.runs += 1;
        row.total_staked += r.total_staked;
        row.total_returned += r.total_returned;
        row.bet_count += r.bet_count;
        row.win_count += r.win_count;
        row.triggers += r.triggers;
        row.busts += r.busts;
        row.max_drawdown = row.max_drawdown.max(r.max_drawdown);
    }

    row.profit = row.total_returned - row.total_staked;
    row.roi = roi(row.profit, row.total_staked);
    row.win_rate = win_rate(row.win_count, row.bet_count);
    row
}

/// One summary row per distinct key value, ordered by key
pub fn group_by(results: &[SimulationResult], key: GroupKey) -> Vec<SummaryRow> {
    let mut groups: BTreeMap<&str, Vec<&SimulationResult>> = BTreeMap::new();
    for r in results {
        groups.entry(key.of(r)).or_default().push(r);
    }
    groups
        .into_iter()
        .map(|(k, members)| summarize(k, members))
        .collect()
}

/// The `n` most profitable runs, best first
pub fn top_performers(results: &[SimulationResult], n: usize) -> Vec<SimulationResult> {
    let mut sorted = results.to_vec();
    sorted.sort_by(|a, b| b.profit.cmp(&a.profit).then_with(|| a.team.cmp(&b.team)));
    sorted.truncate(n);
    sorted
}

/// The `n` least profitable runs, worst first
pub fn bottom_performers(results: &[SimulationResult], n: usize) -> Vec<SimulationResult> {
    let mut sorted = results.to_vec();
    sorted.sort_by(|a, b| a.profit.cmp(&b.profit).then_with(|| a.team.cmp(&b.team)));
    sorted.truncate(n);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(strategy: &str, country: &str, team: &str, cash_flow: Vec<Decimal>) -> SimulationResult {
        let staked: Decimal = cash_flow.iter().filter(|c| **c < Decimal::ZERO).map(|c| -*c).sum();
        let returned: Decimal = cash_flow.iter().filter(|c| **c > Decimal::ZERO).sum();
        let bets = cash_flow.iter().filter(|c| **c < Decimal::ZERO).count() as u32;
        let wins = cash_flow.iter().filter(|c| **c > Decimal::ZERO).count() as u32;
        let profit = returned - staked;
        SimulationResult {
            strategy: strategy.to_string(),
            country: country.to_string(),
            team: team.to_string(),
            period: "2324".to_string(),
            total_staked: staked,
            total_returned: returned,
            profit,
            roi: roi(profit, staked),
            bet_count: bets,
            win_count: wins,
            triggers: 1,
            busts: 0,
            open_session: false,
            max_drawdown: max_drawdown(&cash_flow),
            cash_flow,
        }
    }

    #[test]
    fn test_roi_zero_when_nothing_staked() {
        assert_eq!(roi(dec!(5), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(roi(dec!(6.8), dec!(6)).round_dp(2), dec!(113.33));
        // stored unrounded
        assert!(roi(dec!(6.8), dec!(6)) > dec!(113.333));
        assert_eq!(roi(dec!(-34), dec!(34)), dec!(-100));
    }

    #[test]
    fn test_drawdown_properties() {
        assert_eq!(max_drawdown(&[]), Decimal::ZERO);
        // the first stake sets the peak; only the fall after it counts
        assert_eq!(max_drawdown(&[dec!(-2), dec!(-4)]), dec!(4));
        assert_eq!(max_drawdown(&[dec!(-2), dec!(-4), dec!(14)]), dec!(4));
        // a full bust from the first stake: peak -2, trough -34
        let bust = [dec!(-2), dec!(-4), dec!(-6), dec!(-9), dec!(-13)];
        assert_eq!(max_drawdown(&bust), dec!(32));
        // a single entry has nothing to fall from
        assert_eq!(max_drawdown(&[dec!(-2)]), Decimal::ZERO);
        // recovers above the old peak, then falls again
        let ledger = [dec!(-2), dec!(10), dec!(-4), dec!(-6), dec!(3)];
        assert_eq!(max_drawdown(&ledger), dec!(10));
        // only gains: no drawdown
        assert_eq!(max_drawdown(&[dec!(3), dec!(4)]), Decimal::ZERO);
    }

    #[test]
    fn test_cash_flow_extremes() {
        let ledger = [dec!(-2), dec!(-4), dec!(14), dec!(-9)];
        assert_eq!(cash_flow_extremes(&ledger), (dec!(-6), dec!(8)));
        assert_eq!(cash_flow_extremes(&[]), (Decimal::ZERO, Decimal::ZERO));
    }

    #[test]
    fn test_win_rate() {
        assert_eq!(win_rate(0, 0), Decimal::ZERO);
        assert_eq!(win_rate(1, 4), dec!(25));
    }

    #[test]
    fn test_group_by_strategy_sums_members() {
        let results = vec![
            result("s4", "greece", "A", vec![dec!(-2), dec!(-4), dec!(14)]),
            result("s4", "england", "B", vec![dec!(-2), dec!(-4), dec!(-6), dec!(-9), dec!(-13)]),
            result("r80", "greece", "A", vec![dec!(-2), dec!(7)]),
        ];

        let rows = group_by(&results, GroupKey::Strategy);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, "r80");
        let s4 = &rows[1];
        assert_eq!(s4.runs, 2);
        assert_eq!(s4.total_staked, dec!(40));
        assert_eq!(s4.total_returned, dec!(14));
        assert_eq!(s4.profit, dec!(-26));
        assert_eq!(s4.roi, dec!(-65));
        assert_eq!(s4.bet_count, 7);
        assert_eq!(s4.win_count, 1);
        assert_eq!(s4.max_drawdown, dec!(32));

        let by_country = group_by(&results, GroupKey::Country);
        assert_eq!(
            by_country.iter().map(|r| r.key.as_str()).collect::<Vec<_>>(),
            vec!["england", "greece"]
        );
    }

    #[test]
    fn test_summarize_empty() {
        let row = summarize("all", Vec::<SimulationResult>::new().iter());
        assert_eq!(row.runs, 0);
        assert_eq!(row.roi, Decimal::ZERO);
        assert_eq!(row.win_rate, Decimal::ZERO);
    }

    #[test]
    fn test_top_and_bottom_performers() {
        let results = vec![
            result("s4", "greece", "A", vec![dec!(-2), dec!(7)]),
            result("s4", "greece", "B", vec![dec!(-2), dec!(-4)]),
            result("s4", "greece", "C", vec![dec!(-2), dec!(-4), dec!(20)]),
        ];
        let top = top_performers(&results, 2);
        assert_eq!(top.iter().map(|r| r.team.as_str()).collect::<Vec<_>>(), vec!["C", "A"]);
        let bottom = bottom_performers(&results, 1);
        assert_eq!(bottom[0].team, "B");
    }
}
