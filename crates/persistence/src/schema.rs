//! Database schema definitions

/// SQL to create all tables
/// NOTE: money columns are TEXT to preserve rust_decimal::Decimal precision
pub const CREATE_TABLES: &str = r#"
-- One row per simulation run
CREATE TABLE IF NOT EXISTS simulation_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id TEXT NOT NULL UNIQUE,
    params_hash TEXT NOT NULL,
    source TEXT NOT NULL,
    countries TEXT NOT NULL,
    periods TEXT NOT NULL,
    strategies TEXT NOT NULL,
    failed_countries TEXT NOT NULL DEFAULT '[]',
    result_count INTEGER NOT NULL DEFAULT 0,
    total_staked TEXT NOT NULL DEFAULT '0',
    total_returned TEXT NOT NULL DEFAULT '0',
    profit TEXT NOT NULL DEFAULT '0',
    roi TEXT NOT NULL DEFAULT '0',
    created_at INTEGER DEFAULT (strftime('%s', 'now'))
);

-- One row per (team, period, strategy) result of a run
CREATE TABLE IF NOT EXISTS simulation_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id TEXT NOT NULL REFERENCES simulation_runs(run_id) ON DELETE CASCADE,
    strategy TEXT NOT NULL,
    country TEXT NOT NULL,
    team TEXT NOT NULL,
    period TEXT NOT NULL,
    total_staked TEXT NOT NULL,
    total_returned TEXT NOT NULL,
    profit TEXT NOT NULL,
    roi TEXT NOT NULL,
    bet_count INTEGER NOT NULL,
    win_count INTEGER NOT NULL,
    triggers INTEGER NOT NULL,
    busts INTEGER NOT NULL DEFAULT 0,
    open_session INTEGER NOT NULL DEFAULT 0,
    max_drawdown TEXT NOT NULL,
    cash_flow TEXT NOT NULL DEFAULT '[]'
);

-- ========== INDEXES ==========

CREATE INDEX IF NOT EXISTS idx_runs_hash ON simulation_runs(params_hash);
CREATE INDEX IF NOT EXISTS idx_runs_created ON simulation_runs(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_results_run ON simulation_results(run_id, strategy);
CREATE INDEX IF NOT EXISTS idx_results_team ON simulation_results(country, team)
"#;

/// The individual statements of `CREATE_TABLES`, comment lines removed
pub fn statements() -> impl Iterator<Item = String> {
    CREATE_TABLES.split(';').filter_map(|chunk| {
        let sql = chunk
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let sql = sql.trim();
        (!sql.is_empty()).then(|| sql.to_string())
    })
}
