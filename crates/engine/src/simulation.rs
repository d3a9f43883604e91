//! Multi-country simulation runner
//!
//! Loads each country through a `MatchSource`, replays every
//! (team, period, strategy) combination on the staking engine and keeps
//! the runs that placed at least one bet. Progress is shared with the HTTP
//! layer through `SimulationProgress`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{
    atomic::{AtomicBool, AtomicU32, Ordering},
    Arc, RwLock,
};
use std::time::{Duration, Instant};

use chrono::Utc;
use persistence::repository::{SimulationRepository, SimulationResultRecord, SimulationRunRecord};
use persistence::SqlitePool;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{strategies_hash, Country, SimulationRequest};
use crate::error::EngineResult;
use crate::metrics::{group_by, summarize, GroupKey};
use crate::policy::{build_policy, TriggerPolicy};
use crate::series::{build_team_series, championship_teams, team_universe, TeamSeries};
use crate::source::MatchSource;
use crate::staking::{RunLabel, StakingEngine};
use crate::types::{Match, SimulationResult, SummaryRow};

// ============================================================================
// Types
// ============================================================================

/// Simulation run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStatus {
    Idle,
    Running,
    Complete,
    Cancelled,
    Error,
}

/// A requested country that produced no results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedCountry {
    pub country: String,
    pub reason: String,
}

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub run_id: String,
    pub source: String,
    pub params_hash: String,
    pub countries: Vec<String>,
    pub periods: Vec<String>,
    pub results: Vec<SimulationResult>,
    pub overall: SummaryRow,
    pub by_strategy: Vec<SummaryRow>,
    pub by_country: Vec<SummaryRow>,
    pub by_period: Vec<SummaryRow>,
    pub failed_countries: Vec<FailedCountry>,
    /// The wall-clock budget ran out before every country was simulated
    pub timed_out: bool,
    /// Period whose team list marks a team as currently active
    pub current_period: String,
    /// Per country, the teams that play in `current_period`
    pub active_teams: BTreeMap<String, Vec<String>>,
}

impl SimulationReport {
    /// Whether a result's team still plays in the current period
    pub fn is_active(&self, result: &SimulationResult) -> bool {
        self.active_teams
            .get(&result.country)
            .is_some_and(|teams| teams.iter().any(|t| *t == result.team))
    }
}

/// Shared progress tracker between API handler and background task
pub struct SimulationProgress {
    pub status: RwLock<SimulationStatus>,
    pub total_countries: AtomicU32,
    pub completed_countries: AtomicU32,
    pub cancelled: AtomicBool,
    pub current_country: RwLock<Option<String>>,
    pub report: RwLock<Option<SimulationReport>>,
    pub error_message: RwLock<Option<String>>,
}

impl SimulationProgress {
    pub fn new() -> Self {
        Self {
            status: RwLock::new(SimulationStatus::Idle),
            total_countries: AtomicU32::new(0),
            completed_countries: AtomicU32::new(0),
            cancelled: AtomicBool::new(false),
            current_country: RwLock::new(None),
            report: RwLock::new(None),
            error_message: RwLock::new(None),
        }
    }

    /// Reset for a new run
    pub fn reset(&self) {
        *self.status.write().unwrap() = SimulationStatus::Running;
        self.total_countries.store(0, Ordering::Relaxed);
        self.completed_countries.store(0, Ordering::Relaxed);
        self.cancelled.store(false, Ordering::Relaxed);
        *self.current_country.write().unwrap() = None;
        *self.report.write().unwrap() = None;
        *self.error_message.write().unwrap() = None;
    }

    /// Get progress as percentage
    pub fn progress_pct(&self) -> f32 {
        let total = self.total_countries.load(Ordering::Relaxed);
        let done = self.completed_countries.load(Ordering::Relaxed);
        if total == 0 {
            0.0
        } else {
            (done as f32 / total as f32) * 100.0
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.status.read().unwrap(), SimulationStatus::Running)
    }

    pub fn status(&self) -> SimulationStatus {
        *self.status.read().unwrap()
    }

    fn fail(&self, message: String) {
        *self.error_message.write().unwrap() = Some(message);
        *self.status.write().unwrap() = SimulationStatus::Error;
    }
}

impl Default for SimulationProgress {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Per-country simulation
// ============================================================================

/// Run every strategy over every team and requested period of one country.
///
/// Runs that never placed a bet are dropped.
pub fn simulate_country(
    country: &Country,
    dataset: &[Match],
    request: &SimulationRequest,
) -> Vec<SimulationResult> {
    let policies: Vec<Box<dyn TriggerPolicy>> = request
        .strategies
        .iter()
        .map(|s| build_policy(&s.trigger, s.staking.window))
        .collect();

    let series: HashMap<String, TeamSeries> = championship_teams(dataset)
        .into_iter()
        .map(|team| {
            let s = build_team_series(dataset, &team);
            (team, s)
        })
        .collect();

    let mut results = Vec::new();
    let mut dropped = 0usize;

    for period in &request.periods {
        for team in team_universe(dataset, period) {
            let Some(team_series) = series.get(&team) else {
                continue;
            };
            for (strategy, policy) in request.strategies.iter().zip(&policies) {
                let label = RunLabel {
                    strategy: &strategy.name,
                    country: &country.name,
                };
                let result = StakingEngine::run(
                    team_series,
                    period,
                    policy.as_ref(),
                    &strategy.staking,
                    &label,
                );
                if result.bet_count > 0 {
                    results.push(result);
                } else {
                    dropped += 1;
                }
            }
        }
    }

    info!(
        country = %country.name,
        teams = series.len(),
        results = results.len(),
        dropped,
        "Country simulated"
    );
    results
}

// ============================================================================
// Persistence mapping
// ============================================================================

/// Convert a SimulationResult to a SimulationResultRecord for DB storage
pub fn result_to_record(result: &SimulationResult, run_id: &str) -> SimulationResultRecord {
    SimulationResultRecord {
        id: None,
        run_id: run_id.to_string(),
        strategy: result.strategy.clone(),
        country: result.country.clone(),
        team: result.team.clone(),
        period: result.period.clone(),
        total_staked: result.total_staked.to_string(),
        total_returned: result.total_returned.to_string(),
        profit: result.profit.to_string(),
        roi: result.roi.to_string(),
        bet_count: result.bet_count as i64,
        win_count: result.win_count as i64,
        triggers: result.triggers as i64,
        busts: result.busts as i64,
        open_session: result.open_session,
        max_drawdown: result.max_drawdown.to_string(),
        cash_flow: serde_json::to_string(&result.cash_flow).unwrap_or_default(),
    }
}

/// Convert a report header to a SimulationRunRecord for DB storage
pub fn report_to_record(report: &SimulationReport, request: &SimulationRequest) -> SimulationRunRecord {
    SimulationRunRecord {
        id: None,
        run_id: report.run_id.clone(),
        params_hash: report.params_hash.clone(),
        source: report.source.clone(),
        countries: serde_json::to_string(&report.countries).unwrap_or_default(),
        periods: serde_json::to_string(&report.periods).unwrap_or_default(),
        strategies: serde_json::to_string(&request.strategies).unwrap_or_default(),
        failed_countries: serde_json::to_string(&report.failed_countries).unwrap_or_default(),
        result_count: report.results.len() as i64,
        total_staked: report.overall.total_staked.to_string(),
        total_returned: report.overall.total_returned.to_string(),
        profit: report.overall.profit.to_string(),
        roi: report.overall.roi.to_string(),
        created_at: None,
    }
}

async fn persist_report(pool: &SqlitePool, report: &SimulationReport, request: &SimulationRequest) {
    let records: Vec<SimulationResultRecord> = report
        .results
        .iter()
        .map(|r| result_to_record(r, &report.run_id))
        .collect();
    let repo = SimulationRepository::new(pool);
    match repo
        .save_report(&report_to_record(report, request), &records)
        .await
    {
        Ok(rows) => info!(run_id = %report.run_id, rows, "Simulation stored"),
        Err(e) => warn!(run_id = %report.run_id, error = %e, "Failed to store simulation run"),
    }
}

/// Millisecond timestamp plus a random suffix, so runs started in the same
/// millisecond (API and CLI sharing one store) still get distinct ids
pub fn new_run_id() -> String {
    format!(
        "{}-{:08x}",
        Utc::now().timestamp_millis(),
        rand::random::<u32>()
    )
}

// ============================================================================
// Main Simulation Runner
// ============================================================================

/// Run a full multi-country simulation.
///
/// An invalid strategy set or an unknown country aborts the run before
/// anything is loaded. A country whose data cannot be loaded is logged,
/// listed in `failed_countries` and skipped.
pub async fn run_simulation(
    request: SimulationRequest,
    source: Arc<dyn MatchSource>,
    progress: Arc<SimulationProgress>,
    db_pool: Option<SqlitePool>,
) -> EngineResult<SimulationReport> {
    let countries = match request.validate() {
        Ok(countries) => countries,
        Err(e) => {
            progress.fail(e.to_string());
            return Err(e);
        }
    };

    let run_id = new_run_id();
    let started = Instant::now();
    let budget = request.time_budget_secs.map(Duration::from_secs);
    let request = Arc::new(request);

    progress
        .total_countries
        .store(countries.len() as u32, Ordering::Relaxed);

    info!(
        run_id = %run_id,
        source = source.name(),
        countries = ?request.countries,
        periods = ?request.periods,
        strategies = request.strategies.len(),
        "Starting simulation"
    );

    let mut results: Vec<SimulationResult> = Vec::new();
    let mut failed_countries: Vec<FailedCountry> = Vec::new();
    let mut simulated: Vec<String> = Vec::new();
    let mut active_teams: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut timed_out = false;

    for country in &countries {
        let name = &country.name;
        if progress.cancelled.load(Ordering::Relaxed) {
            warn!("Simulation cancelled");
            break;
        }
        if budget.is_some_and(|b| started.elapsed() >= b) {
            warn!(elapsed_secs = started.elapsed().as_secs(), "Time budget exhausted");
            timed_out = true;
            break;
        }

        *progress.current_country.write().unwrap() = Some(name.clone());

        let outcome = match source.load(country, &request.periods).await {
            Ok(dataset) => {
                let req = Arc::clone(&request);
                let c = country.clone();
                tokio::task::spawn_blocking(move || {
                    let active: Vec<String> = team_universe(&dataset, req.active_period())
                        .into_iter()
                        .collect();
                    (simulate_country(&c, &dataset, &req), active)
                })
                .await
                .map_err(|e| format!("simulation task failed: {e}"))
            }
            Err(e) => Err(e.to_string()),
        };

        match outcome {
            Ok((country_results, active)) => {
                simulated.push(name.clone());
                results.extend(country_results);
                active_teams.insert(name.clone(), active);
            }
            Err(reason) => {
                warn!(country = %name, reason = %reason, "Country skipped");
                failed_countries.push(FailedCountry {
                    country: name.clone(),
                    reason,
                });
            }
        }

        progress.completed_countries.fetch_add(1, Ordering::Relaxed);
    }

    let report = SimulationReport {
        run_id,
        source: source.name().to_string(),
        params_hash: strategies_hash(&request.strategies),
        countries: simulated,
        periods: request.periods.clone(),
        overall: summarize("all", &results),
        by_strategy: group_by(&results, GroupKey::Strategy),
        by_country: group_by(&results, GroupKey::Country),
        by_period: group_by(&results, GroupKey::Period),
        results,
        failed_countries,
        timed_out,
        current_period: request.active_period().to_string(),
        active_teams,
    };

    info!(
        run_id = %report.run_id,
        results = report.results.len(),
        failed = report.failed_countries.len(),
        profit = %report.overall.profit,
        roi = %report.overall.roi,
        "Simulation complete"
    );

    if let Some(pool) = &db_pool {
        persist_report(pool, &report, &request).await;
    }

    *progress.current_country.write().unwrap() = None;
    *progress.report.write().unwrap() = Some(report.clone());
    *progress.status.write().unwrap() = if progress.cancelled.load(Ordering::Relaxed) {
        SimulationStatus::Cancelled
    } else {
        SimulationStatus::Complete
    };

    Ok(report)
}
