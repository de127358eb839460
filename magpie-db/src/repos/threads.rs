//! Repository for finding comment threads
//!
//! A thread is the persisted lifecycle of one finding across review re-runs.
//! Rows are never deleted: resolution is a status flip, and a re-detected
//! issue key opens a fresh row so the audit trail stays intact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use crate::{Error, Result};

/// Thread lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadStatus {
    Open,
    Resolved,
    Ignored,
}

impl ThreadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreadStatus::Open => "open",
            ThreadStatus::Resolved => "resolved",
            ThreadStatus::Ignored => "ignored",
        }
    }
}

/// A persisted comment thread
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ThreadRecord {
    pub id: i64,
    pub review_id: i64,
    pub issue_key: String,
    pub file_path: String,
    pub line: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ThreadRecord {
    /// Check whether the thread is still open
    pub fn is_open(&self) -> bool {
        self.status == "open"
    }
}

/// Repository for managing comment threads
pub struct ThreadsRepo {
    pool: SqlitePool,
}

impl ThreadsRepo {
    /// Create a new repository instance
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert an open thread for a newly posted finding
    pub async fn open(
        &self,
        review_id: i64,
        issue_key: &str,
        file_path: &str,
        line: i64,
    ) -> Result<ThreadRecord> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO comment_threads (review_id, issue_key, file_path, line, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, 'open', ?, ?)
            "#,
        )
        .bind(review_id)
        .bind(issue_key)
        .bind(file_path)
        .bind(line)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid()).await
    }

    /// Get a thread by its internal ID
    pub async fn get_by_id(&self, id: i64) -> Result<ThreadRecord> {
        sqlx::query_as::<_, ThreadRecord>("SELECT * FROM comment_threads WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => Error::NotFound(format!("thread with id {}", id)),
                e => e.into(),
            })
    }

    /// List all open threads for a review
    pub async fn list_open(&self, review_id: i64) -> Result<Vec<ThreadRecord>> {
        sqlx::query_as::<_, ThreadRecord>(
            "SELECT * FROM comment_threads WHERE review_id = ? AND status = 'open' ORDER BY id ASC",
        )
        .bind(review_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// List every thread ever recorded for a review (audit trail)
    pub async fn list_all(&self, review_id: i64) -> Result<Vec<ThreadRecord>> {
        sqlx::query_as::<_, ThreadRecord>(
            "SELECT * FROM comment_threads WHERE review_id = ? ORDER BY id ASC",
        )
        .bind(review_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// Transition an open thread to resolved
    ///
    /// Resolved threads stay resolved; a later re-detection of the same issue
    /// key opens a new row instead of reviving this one.
    pub async fn resolve(&self, review_id: i64, issue_key: &str) -> Result<bool> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE comment_threads
            SET status = 'resolved', updated_at = ?
            WHERE review_id = ? AND issue_key = ? AND status = 'open'
            "#,
        )
        .bind(now)
        .bind(review_id)
        .bind(issue_key)
        .execute(&self.pool)
        .await?;

        let resolved = result.rows_affected() > 0;
        if resolved {
            debug!(review_id, issue_key, "resolved comment thread");
        }
        Ok(resolved)
    }

    /// Mark an open thread as ignored (tenant opted out of this finding)
    pub async fn ignore(&self, review_id: i64, issue_key: &str) -> Result<bool> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE comment_threads
            SET status = 'ignored', updated_at = ?
            WHERE review_id = ? AND issue_key = ? AND status = 'open'
            "#,
        )
        .bind(now)
        .bind(review_id)
        .bind(issue_key)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
