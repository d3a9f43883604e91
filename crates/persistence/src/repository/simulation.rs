//! Simulation runs repository

use crate::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{FromRow, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

/// A stored simulation run (one request, many results)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SimulationRunRecord {
    pub id: Option<i64>,
    pub run_id: String,
    pub params_hash: String,
    pub source: String,
    /// JSON array of country names
    pub countries: String,
    /// JSON array of period labels
    pub periods: String,
    /// JSON array of strategy configurations
    pub strategies: String,
    pub failed_countries: String,
    pub result_count: i64,
    pub total_staked: String,
    pub total_returned: String,
    pub profit: String,
    pub roi: String,
    pub created_at: Option<i64>,
}

impl SimulationRunRecord {
    pub fn country_list(&self) -> DbResult<Vec<String>> {
        Ok(serde_json::from_str(&self.countries)?)
    }

    pub fn period_list(&self) -> DbResult<Vec<String>> {
        Ok(serde_json::from_str(&self.periods)?)
    }
}

/// One (team, period, strategy) result of a run
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SimulationResultRecord {
    pub id: Option<i64>,
    pub run_id: String,
    pub strategy: String,
    pub country: String,
    pub team: String,
    pub period: String,
    pub total_staked: String,
    pub total_returned: String,
    pub profit: String,
    pub roi: String,
    pub bet_count: i64,
    pub win_count: i64,
    pub triggers: i64,
    pub busts: i64,
    pub open_session: bool,
    pub max_drawdown: String,
    /// JSON array of signed ledger entries
    pub cash_flow: String,
}

const RUN_COLUMNS: &str = r#"
    id, run_id, params_hash, source, countries, periods, strategies,
    failed_countries, result_count, total_staked, total_returned, profit, roi,
    created_at
"#;

const RESULT_COLUMNS: &str = r#"
    id, run_id, strategy, country, team, period,
    total_staked, total_returned, profit, roi,
    bet_count, win_count, triggers, busts, open_session,
    max_drawdown, cash_flow
"#;

const INSERT_RUN: &str = r#"
    INSERT INTO simulation_runs (
        run_id, params_hash, source, countries, periods, strategies,
        failed_countries, result_count, total_staked, total_returned, profit, roi
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const INSERT_RESULT: &str = r#"
    INSERT INTO simulation_results (
        run_id, strategy, country, team, period,
        total_staked, total_returned, profit, roi,
        bet_count, win_count, triggers, busts, open_session,
        max_drawdown, cash_flow
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

fn insert_run(record: &SimulationRunRecord) -> SqliteQuery<'_> {
    sqlx::query(INSERT_RUN)
        .bind(&record.run_id)
        .bind(&record.params_hash)
        .bind(&record.source)
        .bind(&record.countries)
        .bind(&record.periods)
        .bind(&record.strategies)
        .bind(&record.failed_countries)
        .bind(record.result_count)
        .bind(&record.total_staked)
        .bind(&record.total_returned)
        .bind(&record.profit)
        .bind(&record.roi)
}

fn insert_result(record: &SimulationResultRecord) -> SqliteQuery<'_> {
    sqlx::query(INSERT_RESULT)
        .bind(&record.run_id)
        .bind(&record.strategy)
        .bind(&record.country)
        .bind(&record.team)
        .bind(&record.period)
        .bind(&record.total_staked)
        .bind(&record.total_returned)
        .bind(&record.profit)
        .bind(&record.roi)
        .bind(record.bet_count)
        .bind(record.win_count)
        .bind(record.triggers)
        .bind(record.busts)
        .bind(record.open_session)
        .bind(&record.max_drawdown)
        .bind(&record.cash_flow)
}

async fn insert_results(
    conn: &mut SqliteConnection,
    records: &[SimulationResultRecord],
) -> DbResult<u64> {
    let mut inserted = 0u64;
    for record in records {
        let result = insert_result(record)
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::Query(format!("result for {}: {e}", record.team)))?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

/// Repository for simulation runs and results
pub struct SimulationRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SimulationRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a run header. Fails if the run id already exists.
    pub async fn save_run(&self, record: &SimulationRunRecord) -> DbResult<i64> {
        let result = insert_run(record).execute(self.pool).await?;
        Ok(result.last_insert_rowid())
    }

    /// Store the results of a run in one transaction
    pub async fn save_results(&self, records: &[SimulationResultRecord]) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;
        let inserted = insert_results(&mut *tx, records).await?;
        tx.commit().await?;
        debug!(rows = inserted, "Simulation results stored");
        Ok(inserted)
    }

    /// Store a run header and all of its results atomically: either both
    /// land or neither does. Returns the number of result rows written.
    pub async fn save_report(
        &self,
        run: &SimulationRunRecord,
        results: &[SimulationResultRecord],
    ) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;
        insert_run(run).execute(&mut *tx).await?;
        let inserted = insert_results(&mut *tx, results).await?;
        tx.commit().await?;
        debug!(run_id = %run.run_id, rows = inserted, "Simulation run stored");
        Ok(inserted)
    }

    /// Most recent runs first
    pub async fn list_runs(&self, limit: i64) -> DbResult<Vec<SimulationRunRecord>> {
        let sql = format!(
            "SELECT {RUN_COLUMNS} FROM simulation_runs ORDER BY created_at DESC, id DESC LIMIT ?"
        );
        let records = sqlx::query_as::<_, SimulationRunRecord>(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        Ok(records)
    }

    pub async fn get_run(&self, run_id: &str) -> DbResult<Option<SimulationRunRecord>> {
        let sql = format!("SELECT {RUN_COLUMNS} FROM simulation_runs WHERE run_id = ?");
        let record = sqlx::query_as::<_, SimulationRunRecord>(&sql)
            .bind(run_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(record)
    }

    /// Results of a run, optionally for one strategy, best profit first
    pub async fn get_results(
        &self,
        run_id: &str,
        strategy: Option<&str>,
    ) -> DbResult<Vec<SimulationResultRecord>> {
        let mut sql = format!("SELECT {RESULT_COLUMNS} FROM simulation_results WHERE run_id = ?");
        if strategy.is_some() {
            sql.push_str(" AND strategy = ?");
        }
        sql.push_str(" ORDER BY CAST(profit AS REAL) DESC, team ASC");

        let mut query = sqlx::query_as::<_, SimulationResultRecord>(&sql).bind(run_id);
        if let Some(s) = strategy {
            query = query.bind(s);
        }

        let records = query.fetch_all(self.pool).await?;
        Ok(records)
    }

    /// Delete a run together with its results
    pub async fn delete_run(&self, run_id: &str) -> DbResult<bool> {
        sqlx::query("DELETE FROM simulation_results WHERE run_id = ?")
            .bind(run_id)
            .execute(self.pool)
            .await?;
        let result = sqlx::query("DELETE FROM simulation_runs WHERE run_id = ?")
            .bind(run_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
