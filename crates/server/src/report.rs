//! Markdown and JSON renderings of a simulation report

use chrono::Utc;
use engine::{
    bottom_performers, cash_flow_extremes, top_performers, SimulationReport, SimulationResult,
    SummaryRow,
};
use std::fmt::Write;

fn summary_table(out: &mut String, title: &str, key_label: &str, rows: &[SummaryRow]) {
    let _ = writeln!(out, "## {title}\n");
    if rows.is_empty() {
        let _ = writeln!(out, "_No betting runs._\n");
        return;
    }
    let _ = writeln!(
        out,
        "| {key_label} | Runs | Bets | Wins | Win % | Staked | Returned | Profit | ROI % | Max DD |"
    );
    let _ = writeln!(out, "|---|---:|---:|---:|---:|---:|---:|---:|---:|---:|");
    for r in rows {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |",
            r.key,
            r.runs,
            r.bet_count,
            r.win_count,
            r.win_rate,
            r.total_staked,
            r.total_returned,
            r.profit,
            r.roi.round_dp(2),
            r.max_drawdown
        );
    }
    out.push('\n');
}

fn performer_table(
    out: &mut String,
    title: &str,
    report: &SimulationReport,
    results: &[SimulationResult],
) {
    let _ = writeln!(out, "## {title}\n");
    if results.is_empty() {
        let _ = writeln!(out, "_No betting runs._\n");
        return;
    }
    let _ = writeln!(
        out,
        "| Team | Active | Country | Period | Strategy | Bets | Wins | Profit | ROI % | Low | High |"
    );
    let _ = writeln!(out, "|---|:---:|---|---|---|---:|---:|---:|---:|---:|---:|");
    for r in results {
        let (low, high) = cash_flow_extremes(&r.cash_flow);
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |",
            r.team,
            if report.is_active(r) { "yes" } else { "no" },
            r.country,
            r.period,
            r.strategy,
            r.bet_count,
            r.win_count,
            r.profit,
            r.roi.round_dp(2),
            low,
            high
        );
    }
    out.push('\n');
}

/// Render a report as a Markdown document
pub fn render_markdown(report: &SimulationReport, top_n: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Draw strategy simulation\n");
    let _ = writeln!(out, "- Run: `{}`", report.run_id);
    let _ = writeln!(out, "- Source: {}", report.source);
    let _ = writeln!(out, "- Countries: {}", report.countries.join(", "));
    let _ = writeln!(out, "- Periods: {} (current {})", report.periods.join(", "), report.current_period);
    let _ = writeln!(
        out,
        "- Overall: {} runs, staked {}, returned {}, profit {}, ROI {}%",
        report.overall.runs,
        report.overall.total_staked,
        report.overall.total_returned,
        report.overall.profit,
        report.overall.roi.round_dp(2)
    );
    if report.timed_out {
        let _ = writeln!(out, "- **Time budget exhausted before every country ran**");
    }
    out.push('\n');

    summary_table(&mut out, "By strategy", "Strategy", &report.by_strategy);
    summary_table(&mut out, "By country", "Country", &report.by_country);
    summary_table(&mut out, "By period", "Period", &report.by_period);

    performer_table(
        &mut out,
        "Top performers",
        report,
        &top_performers(&report.results, top_n),
    );
    performer_table(
        &mut out,
        "Bottom performers",
        report,
        &bottom_performers(&report.results, top_n),
    );

    if !report.failed_countries.is_empty() {
        let _ = writeln!(out, "## Skipped countries\n");
        for f in &report.failed_countries {
            let _ = writeln!(out, "- {}: {}", f.country, f.reason);
        }
        out.push('\n');
    }

    out
}

/// Build export JSON from an in-memory report (used by the simulate command)
pub fn build_export_json(report: &SimulationReport, top_n: usize) -> serde_json::Value {
    serde_json::json!({
        "generated_at": Utc::now().to_rfc3339(),
        "run_id": report.run_id,
        "source": report.source,
        "params_hash": report.params_hash,
        "countries": report.countries,
        "periods": report.periods,
        "current_period": report.current_period,
        "active_teams": report.active_teams,
        "overall": report.overall,
        "by_strategy": report.by_strategy,
        "by_country": report.by_country,
        "by_period": report.by_period,
        "top_performers": top_performers(&report.results, top_n),
        "bottom_performers": bottom_performers(&report.results, top_n),
        "failed_countries": report.failed_countries,
        "timed_out": report.timed_out,
        "results": report.results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{group_by, summarize, FailedCountry, GroupKey};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn result(team: &str, strategy: &str, cash_flow: Vec<Decimal>) -> SimulationResult {
        let staked: Decimal = cash_flow.iter().filter(|c| **c < Decimal::ZERO).map(|c| -*c).sum();
        let returned: Decimal = cash_flow.iter().filter(|c| **c > Decimal::ZERO).sum();
        SimulationResult {
            strategy: strategy.to_string(),
            country: "greece".to_string(),
            team: team.to_string(),
            period: "2324".to_string(),
            total_staked: staked,
            total_returned: returned,
            profit: returned - staked,
            roi: engine::roi(returned - staked, staked),
            bet_count: cash_flow.iter().filter(|c| **c < Decimal::ZERO).count() as u32,
            win_count: cash_flow.iter().filter(|c| **c > Decimal::ZERO).count() as u32,
            triggers: 1,
            busts: 0,
            open_session: false,
            max_drawdown: engine::max_drawdown(&cash_flow),
            cash_flow,
        }
    }

    fn report(results: Vec<SimulationResult>) -> SimulationReport {
        SimulationReport {
            run_id: "1700000000000".to_string(),
            source: "synthetic".to_string(),
            params_hash: "abc".to_string(),
            countries: vec!["greece".to_string()],
            periods: vec!["2324".to_string()],
            overall: summarize("all", &results),
            by_strategy: group_by(&results, GroupKey::Strategy),
            by_country: group_by(&results, GroupKey::Country),
            by_period: group_by(&results, GroupKey::Period),
            results,
            failed_countries: vec![FailedCountry {
                country: "italy".to_string(),
                reason: "Data error: no matches loaded".to_string(),
            }],
            timed_out: false,
            current_period: "2324".to_string(),
            active_teams: [("greece".to_string(), vec!["Aris".to_string()])]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn test_markdown_sections() {
        let r = report(vec![
            result("Aris", "Streak >= 4", vec![dec!(-2), dec!(-4), dec!(14)]),
            result("PAOK", "Streak >= 4", vec![dec!(-2), dec!(-4), dec!(-6), dec!(-9), dec!(-13)]),
        ]);
        let md = render_markdown(&r, 5);
        assert!(md.starts_with("# Draw strategy simulation"));
        assert!(md.contains("## By strategy"));
        assert!(md.contains("| Streak >= 4 | 2 | 7 | 1 |"));
        assert!(md.contains("## Top performers"));
        assert!(md.contains("- italy: Data error: no matches loaded"));
        assert!(md.contains("(current 2324)"));
        // Aris still plays in the current period, PAOK does not
        assert!(md.contains("| Aris | yes | greece |"));
        assert!(md.contains("| PAOK | no | greece |"));
        // top performer listed before the bust
        let top = md.find("## Top performers").unwrap();
        assert!(md[top..].find("Aris").unwrap() < md[top..].find("PAOK").unwrap());
    }

    #[test]
    fn test_roi_rounded_only_in_markdown() {
        // staked 6, profit 8: ROI 133.333...
        let r = report(vec![result("Aris", "Streak >= 4", vec![dec!(-2), dec!(-4), dec!(14)])]);
        assert!(r.results[0].roi > dec!(133.333));
        let md = render_markdown(&r, 5);
        assert!(md.contains("| 8 | 133.33 |"));
        assert!(!md.contains("133.333"));
    }

    #[test]
    fn test_empty_report_renders() {
        let md = render_markdown(&report(Vec::new()), 5);
        assert!(md.contains("_No betting runs._"));
    }

    #[test]
    fn test_export_json_shape() {
        let r = report(vec![result("Aris", "Streak >= 4", vec![dec!(-2), dec!(7)])]);
        let json = build_export_json(&r, 3);
        assert_eq!(json["run_id"], "1700000000000");
        assert_eq!(json["results"].as_array().unwrap().len(), 1);
        assert_eq!(json["by_strategy"][0]["key"], "Streak >= 4");
        assert_eq!(json["failed_countries"][0]["country"], "italy");
        assert_eq!(json["active_teams"]["greece"][0], "Aris");
    }
}
