//! Draw-Sim: draw-betting strategy simulator over football results
//!
//! Usage:
//!   draw-sim simulate --countries greece,italy    Run a simulation from CLI
//!   draw-sim stats --country greece               League table with draw statistics
//!   draw-sim prob --trials 5 --successes 1 --p 0.3
//!   draw-sim serve --port 3001                    Launch the JSON API

mod report;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use clap::{Parser, Subcommand};
use engine::stats::series_stats;
use engine::{
    build_team_series, championship_teams, cumulative_binomial, exact_binomial,
    no_draw_frequencies, probability_to_decimal_odds, run_simulation, team_stats, Country,
    CsvDirectorySource, FootballDataClient, LeagueSpec, MatchSource, SimulationProgress,
    SimulationReport, SimulationRequest, SimulationStatus, StrategyConfig, SyntheticSource,
    TeamStats,
};
use persistence::repository::SimulationRepository;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

const APP_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH"));

#[derive(Parser)]
#[command(name = "draw-sim")]
#[command(about = "Progressive draw-betting simulator over football league results", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where match data comes from
#[derive(clap::Args, Clone)]
struct SourceArgs {
    /// Read `{dir}/{period}/{code}.csv` files instead of downloading
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Use a seeded synthetic league (offline)
    #[arg(long, conflicts_with = "data_dir")]
    synthetic: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a multi-country simulation from CLI (no web server)
    Simulate {
        /// Countries to simulate (comma-separated, default: all six leagues)
        #[arg(long, value_delimiter = ',')]
        countries: Vec<String>,
        /// Periods to load, e.g. 2122,2223 (default: 1920..2324)
        #[arg(long, value_delimiter = ',')]
        periods: Vec<String>,
        /// JSON file holding an array of strategy configurations
        #[arg(long)]
        strategies: Option<PathBuf>,
        #[command(flatten)]
        source: SourceArgs,
        /// Optional JSON export path
        #[arg(long)]
        export: Option<PathBuf>,
        /// Optional Markdown report path
        #[arg(long)]
        report: Option<PathBuf>,
        /// Store the run in the database
        #[arg(long)]
        persist: bool,
        /// Wall-clock budget in seconds, checked between countries
        #[arg(long)]
        time_budget: Option<u64>,
        /// Number of best and worst runs to list
        #[arg(long, default_value_t = 10)]
        top_n: usize,
    },
    /// League table with streaks and draw probabilities for one country
    Stats {
        #[arg(long)]
        country: String,
        /// Periods to load (default: 1920..2324)
        #[arg(long, value_delimiter = ',')]
        periods: Vec<String>,
        /// Binomial horizon for the draw probabilities
        #[arg(long, default_value_t = 5)]
        horizon: u32,
        /// Also print the histogram of no-draw streaks ended by a draw
        #[arg(long)]
        frequencies: bool,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Binomial probabilities for k successes in n trials
    Prob {
        #[arg(long)]
        trials: u32,
        #[arg(long)]
        successes: u32,
        #[arg(long)]
        p: f64,
    },
    /// Launch the JSON API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value_t = 3001)]
        port: u16,
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Clone)]
struct AppState {
    source: Arc<dyn MatchSource>,
    db: Arc<persistence::Database>,
    progress: Arc<SimulationProgress>,
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug,engine=debug,draw_sim=debug")
    } else {
        EnvFilter::new("info,engine=info,draw_sim=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(filter)
        .init();
}

fn db_path() -> String {
    std::env::var("DRAW_SIM_DB_PATH").unwrap_or_else(|_| "data/draw_sim.db".to_string())
}

async fn open_database() -> anyhow::Result<persistence::Database> {
    let path = db_path();
    persistence::Database::new(&path).await.map_err(|e| {
        error!("Failed to initialize database: {}", e);
        anyhow::anyhow!("Database initialization failed: {}", e)
    })
}

fn build_source(args: &SourceArgs) -> Arc<dyn MatchSource> {
    if args.synthetic {
        Arc::new(SyntheticSource::new(LeagueSpec::default()))
    } else if let Some(dir) = &args.data_dir {
        Arc::new(CsvDirectorySource::new(dir.clone()))
    } else {
        let base = std::env::var("DRAW_SIM_DATA_URL")
            .unwrap_or_else(|_| engine::api::football_data::DEFAULT_BASE_URL.to_string());
        Arc::new(FootballDataClient::with_base_url(&base))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Simulate {
            countries,
            periods,
            strategies,
            source,
            export,
            report,
            persist,
            time_budget,
            top_n,
        } => {
            let mut request = SimulationRequest::default();
            if !countries.is_empty() {
                request.countries = countries;
            }
            if !periods.is_empty() {
                request.current_period = periods.last().cloned().unwrap_or_default();
                request.periods = periods;
            }
            if let Some(path) = strategies {
                request.strategies = load_strategies(&path)?;
            }
            request.time_budget_secs = time_budget;
            cmd_simulate(request, &source, export, report, persist, top_n).await?;
        }
        Commands::Stats {
            country,
            periods,
            horizon,
            frequencies,
            source,
        } => {
            cmd_stats(&country, periods, horizon, frequencies, &source).await?;
        }
        Commands::Prob {
            trials,
            successes,
            p,
        } => {
            cmd_prob(trials, successes, p)?;
        }
        Commands::Serve { host, port, source } => {
            cmd_serve(&host, port, &source).await?;
        }
    }

    Ok(())
}

fn load_strategies(path: &std::path::Path) -> anyhow::Result<Vec<StrategyConfig>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", path.display(), e))?;
    let strategies: Vec<StrategyConfig> = serde_json::from_str(&text)?;
    Ok(strategies)
}

// ============================================================================
// Serve command: Axum web server
// ============================================================================

async fn cmd_serve(host: &str, port: u16, source_args: &SourceArgs) -> anyhow::Result<()> {
    info!("Draw-Sim v{} starting...", APP_VERSION);

    let db = open_database().await?;
    info!("Database initialized: {}", db_path());

    let source = build_source(source_args);
    let state = AppState {
        source: source.clone(),
        db: Arc::new(db),
        progress: Arc::new(SimulationProgress::new()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(api_health))
        .route("/probability", get(api_probability))
        .route("/team_stats/:country", get(api_team_stats))
        .route("/team/:country/:team", get(api_team))
        .route("/simulate", post(api_start_simulation))
        .route("/simulate/status", get(api_simulation_status))
        .route("/simulate/cancel", post(api_cancel_simulation))
        .route("/runs", get(api_runs))
        .route("/runs/:run_id", get(api_run_detail).delete(api_delete_run))
        .with_state(state);

    let app = Router::new().nest("/api", api_routes).layer(cors);

    let addr: std::net::SocketAddr = format!("{}:{}", host, port).parse()?;
    println!("\n=== Draw-Sim v{} ===", APP_VERSION);
    println!("Listening on http://{}", addr);
    println!("Match source: {}", source.name());
    println!("\nEndpoints:");
    println!("  GET  /api/health                 - Health check");
    println!("  GET  /api/probability            - Binomial probabilities (trials, successes, p)");
    println!("  GET  /api/team_stats/:country    - League table with draw statistics");
    println!("  GET  /api/team/:country/:team    - One team's series and statistics");
    println!("  POST /api/simulate               - Start a simulation");
    println!("  GET  /api/simulate/status        - Poll simulation progress");
    println!("  POST /api/simulate/cancel        - Cancel the running simulation");
    println!("  GET  /api/runs                   - Stored runs");
    println!("  GET  /api/runs/:run_id           - Stored run with its results");
    println!("  DELETE /api/runs/:run_id         - Delete a stored run");
    println!("\n  Database: {}", db_path());
    println!("\nPress Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Simulate command: CLI mode (no web server)
// ============================================================================

async fn cmd_simulate(
    request: SimulationRequest,
    source_args: &SourceArgs,
    export: Option<PathBuf>,
    report_path: Option<PathBuf>,
    persist: bool,
    top_n: usize,
) -> anyhow::Result<()> {
    println!("\n=== Draw-Sim v{} ===", APP_VERSION);

    let source = build_source(source_args);
    let db_pool = if persist {
        let db = open_database().await?;
        println!("Database: {}", db_path());
        Some(db.pool_clone())
    } else {
        None
    };

    println!("Source: {}", source.name());
    println!("Countries: {}", request.countries.join(", "));
    println!(
        "Periods: {} | Strategies: {}",
        request.periods.join(", "),
        request.strategies.len()
    );
    println!("Press Ctrl+C to stop after the current country\n");

    let progress = Arc::new(SimulationProgress::new());
    progress.reset();

    let progress_for_ctrlc = progress.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl+C received, requesting cancel...");
        progress_for_ctrlc.cancelled.store(true, Ordering::Relaxed);
    });

    let progress_clone = progress.clone();
    let handle = tokio::spawn(async move {
        run_simulation(request, source, progress_clone, db_pool).await
    });

    // Progress display loop
    loop {
        tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
        let pct = progress.progress_pct();
        let completed = progress.completed_countries.load(Ordering::Relaxed);
        let total = progress.total_countries.load(Ordering::Relaxed);
        let current = progress.current_country.read().unwrap().clone();

        match progress.status() {
            SimulationStatus::Running | SimulationStatus::Idle => {
                let bar_len = 30;
                let filled = (pct as usize * bar_len) / 100;
                let bar: String = "=".repeat(filled) + &" ".repeat(bar_len - filled);
                print!(
                    "\r  [{}] {:.0}% ({}/{}) {}          ",
                    bar,
                    pct,
                    completed,
                    total,
                    current.unwrap_or_default()
                );
            }
            SimulationStatus::Complete | SimulationStatus::Cancelled => {
                println!("\r  Done ({}/{} countries)                              ", completed, total);
                break;
            }
            SimulationStatus::Error => {
                let err = progress.error_message.read().unwrap().clone();
                println!("\r  Error: {}                              ", err.unwrap_or_default());
                break;
            }
        }
    }

    let report = handle.await??;
    print_report(&report, top_n);

    if let Some(path) = export {
        let json = serde_json::to_string_pretty(&report::build_export_json(&report, top_n))?;
        std::fs::write(&path, &json)?;
        println!("\nResults exported to {}", path.display());
    }

    if let Some(path) = report_path {
        std::fs::write(&path, report::render_markdown(&report, top_n))?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

fn print_report(report: &SimulationReport, top_n: usize) {
    if report.timed_out {
        println!("\nTime budget exhausted, report covers the completed countries only.");
    }
    for failed in &report.failed_countries {
        println!("  Skipped {}: {}", failed.country, failed.reason);
    }
    if report.results.is_empty() {
        println!("\nNo betting runs.");
        return;
    }

    println!("\nBy strategy:");
    println!(
        "  {:<24} {:>6} {:>6} {:>10} {:>10} {:>10} {:>8} {:>8}",
        "Strategy", "Runs", "Bets", "Staked", "Returned", "Profit", "ROI%", "MaxDD"
    );
    println!("  {}", "-".repeat(90));
    for row in report.by_strategy.iter().chain(std::iter::once(&report.overall)) {
        println!(
            "  {:<24} {:>6} {:>6} {:>10} {:>10} {:>10} {:>8} {:>8}",
            row.key,
            row.runs,
            row.bet_count,
            row.total_staked,
            row.total_returned,
            row.profit,
            row.roi.round_dp(2),
            row.max_drawdown,
        );
    }

    let top = engine::top_performers(&report.results, top_n);
    println!("\nTop {} runs:", top.len());
    println!(
        "  {:>3}  {:<22} {:<10} {:<6} {:<24} {:>5} {:>10}",
        "#", "Team", "Country", "Period", "Strategy", "Bets", "Profit"
    );
    println!("  {}", "-".repeat(90));
    for (i, r) in top.iter().enumerate() {
        println!(
            "  {:>3}  {:<22} {:<10} {:<6} {:<24} {:>5} {:>10}",
            i + 1,
            r.team,
            r.country,
            r.period,
            r.strategy,
            r.bet_count,
            r.profit,
        );
    }
}

// ============================================================================
// Stats and probability commands
// ============================================================================

async fn load_country(
    source: &dyn MatchSource,
    country: &str,
    periods: &[String],
) -> anyhow::Result<Vec<engine::Match>> {
    let country = Country::from_name(country)?;
    Ok(source.load(&country, periods).await?)
}

async fn cmd_stats(
    country: &str,
    periods: Vec<String>,
    horizon: u32,
    frequencies: bool,
    source_args: &SourceArgs,
) -> anyhow::Result<()> {
    let periods = if periods.is_empty() {
        SimulationRequest::default().periods
    } else {
        periods
    };
    let current = periods.last().cloned().unwrap_or_default();
    let source = build_source(source_args);
    let dataset = load_country(source.as_ref(), country, &periods).await?;

    let stats = team_stats(&dataset, &periods, &current, horizon);
    print_stats(&stats, &current);

    if frequencies {
        println!("\nNo-draw streak before each draw:");
        for (length, count) in no_draw_frequencies(&dataset, None) {
            println!("  {:>3}  {}", length, count);
        }
    }
    Ok(())
}

fn fmt_prob(p: Option<f64>) -> String {
    p.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "-".to_string())
}

fn print_stats(stats: &[TeamStats], current: &str) {
    println!("\nPeriod {}:", current);
    println!(
        "  {:>3}  {:<24} {:>4} {:>3} {:>3} {:>3} {:>4} {:>7} {:>6} {:>6} {:>7} {:>8} {:>10}",
        "#", "Team", "P", "W", "D", "L", "Pts", "Goals", "MaxND", "CurND", "Odds", "C.Prob", "C.ProbAdj"
    );
    println!("  {}", "-".repeat(104));
    for (i, s) in stats.iter().enumerate() {
        let rec = s.periods.get(current).copied().unwrap_or_default();
        println!(
            "  {:>3}  {:<24} {:>4} {:>3} {:>3} {:>3} {:>4} {:>7} {:>6} {:>6} {:>7} {:>8} {:>10}",
            i + 1,
            s.team,
            rec.played,
            rec.wins,
            rec.draws,
            rec.losses,
            rec.points,
            format!("{}:{}", rec.goals_for, rec.goals_against),
            s.max_no_draw,
            s.current_no_draw,
            s.mean_draw_odds
                .map(|d| d.round_dp(2).to_string())
                .unwrap_or_else(|| "-".to_string()),
            fmt_prob(s.c_prob),
            fmt_prob(s.c_prob_adj),
        );
    }
}

fn cmd_prob(trials: u32, successes: u32, p: f64) -> anyhow::Result<()> {
    let exact = exact_binomial(trials, successes, p)?;
    let tails = cumulative_binomial(trials, successes, p)?;
    println!("\nBinomial(n = {}, p = {}), k = {}", trials, p, successes);
    println!("  P(X = k)  = {:.6}", exact);
    println!("  P(X < k)  = {:.6}", tails.lt);
    println!("  P(X <= k) = {:.6}", tails.le);
    println!("  P(X > k)  = {:.6}", tails.gt);
    println!("  P(X >= k) = {:.6}", tails.ge);
    if let Ok(odds) = probability_to_decimal_odds(tails.ge) {
        println!("  Fair decimal odds for P(X >= k): {}", odds);
    }
    Ok(())
}

// ============================================================================
// API Handlers: Statistics
// ============================================================================

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, message: impl std::fmt::Display) -> ApiError {
    (
        status,
        Json(serde_json::json!({
            "success": false,
            "error": message.to_string(),
        })),
    )
}

/// GET /api/health
async fn api_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "draw-sim",
        "version": APP_VERSION,
    }))
}

#[derive(Debug, Deserialize)]
struct ProbabilityQuery {
    trials: u32,
    successes: u32,
    p: f64,
}

/// GET /api/probability?trials=&successes=&p=
async fn api_probability(
    Query(q): Query<ProbabilityQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let exact = exact_binomial(q.trials, q.successes, q.p)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    let tails = cumulative_binomial(q.trials, q.successes, q.p)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    Ok(Json(serde_json::json!({
        "success": true,
        "trials": q.trials,
        "successes": q.successes,
        "p": q.p,
        "exact": exact,
        "tails": tails,
    })))
}

fn stats_params(params: &HashMap<String, String>) -> (Vec<String>, String, u32) {
    let periods: Vec<String> = params
        .get("periods")
        .map(|s| {
            s.split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        })
        .filter(|p: &Vec<String>| !p.is_empty())
        .unwrap_or_else(|| SimulationRequest::default().periods);
    let current = params
        .get("current_period")
        .cloned()
        .or_else(|| periods.last().cloned())
        .unwrap_or_default();
    let horizon = params
        .get("horizon")
        .and_then(|s| s.parse().ok())
        .filter(|h| *h > 0)
        .unwrap_or(5);
    (periods, current, horizon)
}

async fn load_for_api(
    state: &AppState,
    country: &str,
    periods: &[String],
) -> Result<(Country, Vec<engine::Match>), ApiError> {
    let country =
        Country::from_name(country).map_err(|e| api_error(StatusCode::NOT_FOUND, e))?;
    let dataset = state
        .source
        .load(&country, periods)
        .await
        .map_err(|e| api_error(StatusCode::BAD_GATEWAY, e))?;
    Ok((country, dataset))
}

/// GET /api/team_stats/:country: league table with streaks and draw probabilities
async fn api_team_stats(
    State(state): State<AppState>,
    Path(country): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (periods, current, horizon) = stats_params(&params);
    let (country, dataset) = load_for_api(&state, &country, &periods).await?;
    let stats = team_stats(&dataset, &periods, &current, horizon);
    Ok(Json(serde_json::json!({
        "success": true,
        "country": country.name,
        "current_period": current,
        "horizon": horizon,
        "data": stats,
        "no_draw_frequencies": no_draw_frequencies(&dataset, None),
    })))
}

/// GET /api/team/:country/:team: one team's match series and statistics
async fn api_team(
    State(state): State<AppState>,
    Path((country, team)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (periods, current, horizon) = stats_params(&params);
    let (country, dataset) = load_for_api(&state, &country, &periods).await?;
    if !championship_teams(&dataset).contains(&team) {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Unknown team for {}: {}", country.name, team),
        ));
    }
    let series = build_team_series(&dataset, &team);
    let stats = series_stats(&series, &periods, &current, horizon);
    let names = [team.clone()];
    Ok(Json(serde_json::json!({
        "success": true,
        "country": country.name,
        "stats": stats,
        "no_draw_frequencies": no_draw_frequencies(&dataset, Some(names.as_slice())),
        "matches": series.matches,
    })))
}

// ============================================================================
// API Handlers: Simulation
// ============================================================================

/// POST /api/simulate: start a simulation in the background
async fn api_start_simulation(
    State(state): State<AppState>,
    Json(request): Json<SimulationRequest>,
) -> Json<serde_json::Value> {
    if state.progress.is_running() {
        let pct = state.progress.progress_pct();
        return Json(serde_json::json!({
            "success": false,
            "message": format!("Simulation already running ({:.0}% complete)", pct),
        }));
    }
    if let Err(e) = request.validate() {
        return Json(serde_json::json!({
            "success": false,
            "message": e.to_string(),
        }));
    }

    info!(
        countries = ?request.countries,
        periods = ?request.periods,
        strategies = request.strategies.len(),
        "Starting simulation"
    );

    state.progress.reset();

    let source = state.source.clone();
    let progress = state.progress.clone();
    let db_pool = Some(state.db.pool_clone());
    tokio::spawn(async move {
        if let Err(e) = run_simulation(request, source, progress, db_pool).await {
            error!(error = %e, "Simulation failed");
        }
    });

    Json(serde_json::json!({
        "success": true,
        "message": "Simulation started",
    }))
}

/// POST /api/simulate/cancel: stop after the current country
async fn api_cancel_simulation(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.progress.cancelled.store(true, Ordering::Relaxed);
    info!("Simulation cancel requested via API");
    Json(serde_json::json!({
        "success": true,
        "message": "Cancel requested"
    }))
}

/// GET /api/simulate/status: poll simulation progress
async fn api_simulation_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let progress = &state.progress;
    let status = progress.status();
    let current_country = progress.current_country.read().unwrap().clone();
    let report = progress.report.read().unwrap().clone();
    let error = progress.error_message.read().unwrap().clone();

    Json(serde_json::json!({
        "status": status,
        "current_country": current_country,
        "progress_pct": progress.progress_pct(),
        "completed": progress.completed_countries.load(Ordering::Relaxed),
        "total": progress.total_countries.load(Ordering::Relaxed),
        "report": report,
        "error": error,
    }))
}

// ============================================================================
// API Handlers: Stored runs
// ============================================================================

/// GET /api/runs: most recent stored runs
async fn api_runs(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let limit: i64 = params
        .get("limit")
        .and_then(|s| s.parse().ok())
        .unwrap_or(20);

    let repo = SimulationRepository::new(state.db.pool());
    match repo.list_runs(limit).await {
        Ok(records) => Json(serde_json::json!({
            "success": true,
            "data": records,
            "total": records.len(),
        })),
        Err(e) => Json(serde_json::json!({
            "success": false,
            "error": format!("Failed to list runs: {}", e),
            "data": [],
            "total": 0,
        })),
    }
}

/// GET /api/runs/:run_id: a stored run with its results, optionally one strategy
async fn api_run_detail(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let repo = SimulationRepository::new(state.db.pool());
    let run = repo
        .get_run(&run_id)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Unknown run: {}", run_id)))?;
    let strategy = params.get("strategy").map(|s| s.as_str());
    let results = repo
        .get_results(&run_id, strategy)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?;

    Ok(Json(serde_json::json!({
        "success": true,
        "run": run,
        "results": results,
        "total": results.len(),
    })))
}

/// DELETE /api/runs/:run_id: remove a stored run and its results
async fn api_delete_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let repo = SimulationRepository::new(state.db.pool());
    let deleted = repo
        .delete_run(&run_id)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?;
    if !deleted {
        return Err(api_error(StatusCode::NOT_FOUND, format!("Unknown run: {}", run_id)));
    }
    info!(run_id = %run_id, "Stored run deleted");
    Ok(Json(serde_json::json!({
        "success": true,
        "run_id": run_id,
    })))
}
