//! Repository for the usage log behind the rate limiter
//!
//! One row is appended per review run, after every gate has passed. The
//! limiter evaluates its gates over a snapshot of this log, keyed by the same
//! installation/repository/PR identifiers the row is written with.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::Result;

/// A single recorded review run
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UsageRecord {
    pub id: i64,
    pub installation_id: i64,
    pub repository_id: i64,
    pub pr_number: i64,
    pub delivery_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Everything the rate-limit gates need, fetched in one pass
#[derive(Debug, Clone, Default)]
pub struct UsageSnapshot {
    /// Most recent run for this exact (repository, PR), any age
    pub last_run_for_pr: Option<DateTime<Utc>>,
    /// Total prior runs for this PR
    pub runs_for_pr: i64,
    /// Run timestamps for this installation in the trailing window, newest first
    pub window_runs: Vec<DateTime<Utc>>,
}

/// Repository for usage-log rows
pub struct UsageRepo {
    pool: SqlitePool,
}

impl UsageRepo {
    /// Create a new repository instance
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append a usage row for a run whose gates have all passed
    pub async fn record(
        &self,
        installation_id: i64,
        repository_id: i64,
        pr_number: i64,
        delivery_id: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO usage_log (installation_id, repository_id, pr_number, delivery_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(installation_id)
        .bind(repository_id)
        .bind(pr_number)
        .bind(delivery_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch the snapshot the gates evaluate against
    ///
    /// The trailing window is 24 hours ending at `now`; timestamps come back
    /// newest first so the daily gate can index the Nth-newest run directly.
    pub async fn snapshot(
        &self,
        installation_id: i64,
        repository_id: i64,
        pr_number: i64,
        now: DateTime<Utc>,
    ) -> Result<UsageSnapshot> {
        let last_run_for_pr: Option<(DateTime<Utc>,)> = sqlx::query_as(
            r#"
            SELECT created_at FROM usage_log
            WHERE repository_id = ? AND pr_number = ?
            ORDER BY created_at DESC LIMIT 1
            "#,
        )
        .bind(repository_id)
        .bind(pr_number)
        .fetch_optional(&self.pool)
        .await?;

        let (runs_for_pr,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM usage_log WHERE repository_id = ? AND pr_number = ?",
        )
        .bind(repository_id)
        .bind(pr_number)
        .fetch_one(&self.pool)
        .await?;

        let cutoff = now - Duration::hours(24);
        let window_rows: Vec<(DateTime<Utc>,)> = sqlx::query_as(
            r#"
            SELECT created_at FROM usage_log
            WHERE installation_id = ? AND created_at > ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(installation_id)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(UsageSnapshot {
            last_run_for_pr: last_run_for_pr.map(|(t,)| t),
            runs_for_pr,
            window_runs: window_rows.into_iter().map(|(t,)| t).collect(),
        })
    }

    /// List all usage rows for an installation, newest first
    pub async fn list_for_installation(&self, installation_id: i64) -> Result<Vec<UsageRecord>> {
        sqlx::query_as::<_, UsageRecord>(
            "SELECT * FROM usage_log WHERE installation_id = ? ORDER BY created_at DESC",
        )
        .bind(installation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }
}
