//! Repository for review run records
//!
//! One logical row exists per `(repository_id, pr_number)`. Every re-trigger
//! of the same PR upserts that row back into `processing` and clears the
//! previous error and timestamp, so the table never accumulates duplicates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{Error, Result};

/// Review lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Processing => "processing",
            ReviewStatus::Completed => "completed",
            ReviewStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(ReviewStatus::Pending),
            "processing" => Ok(ReviewStatus::Processing),
            "completed" => Ok(ReviewStatus::Completed),
            "failed" => Ok(ReviewStatus::Failed),
            other => Err(Error::NotFound(format!("unknown review status: {}", other))),
        }
    }
}

/// A persisted review run
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewRecord {
    pub id: i64,
    pub repository_id: i64,
    pub pr_number: i64,
    pub status: String,
    pub context_hash: Option<String>,
    pub result: Option<String>,
    pub error: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReviewRecord {
    /// Parse the stored status string
    pub fn status(&self) -> Result<ReviewStatus> {
        self.status.parse()
    }
}

/// Repository for managing review run state
pub struct ReviewsRepo {
    pool: SqlitePool,
}

impl ReviewsRepo {
    /// Create a new repository instance
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert the review row for a PR into `processing`
    ///
    /// A fresh trigger on an already-reviewed PR re-enters `processing` and
    /// clears the prior error and processed timestamp.
    pub async fn begin_processing(
        &self,
        repository_id: i64,
        pr_number: i64,
    ) -> Result<ReviewRecord> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO reviews (repository_id, pr_number, status, created_at, updated_at)
            VALUES (?, ?, 'processing', ?, ?)
            ON CONFLICT (repository_id, pr_number) DO UPDATE SET
                status = 'processing',
                error = NULL,
                processed_at = NULL,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(repository_id)
        .bind(pr_number)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(repository_id, pr_number).await
    }

    /// Mark a review as completed with its result payload
    pub async fn complete(
        &self,
        id: i64,
        result_json: &str,
        context_hash: Option<&str>,
    ) -> Result<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE reviews
            SET status = 'completed', result = ?, context_hash = ?,
                error = NULL, processed_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(result_json)
        .bind(context_hash)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Mark a review as failed with an error message
    pub async fn fail(&self, id: i64, error: &str) -> Result<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE reviews
            SET status = 'failed', error = ?, processed_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(error)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get the review row for a PR
    pub async fn get(&self, repository_id: i64, pr_number: i64) -> Result<ReviewRecord> {
        sqlx::query_as::<_, ReviewRecord>(
            "SELECT * FROM reviews WHERE repository_id = ? AND pr_number = ?",
        )
        .bind(repository_id)
        .bind(pr_number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => Error::NotFound(format!(
                "review for repository {} PR #{}",
                repository_id, pr_number
            )),
            e => e.into(),
        })
    }

    /// Get the review row for a PR if it exists
    pub async fn find(&self, repository_id: i64, pr_number: i64) -> Result<Option<ReviewRecord>> {
        sqlx::query_as::<_, ReviewRecord>(
            "SELECT * FROM reviews WHERE repository_id = ? AND pr_number = ?",
        )
        .bind(repository_id)
        .bind(pr_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// List all reviews for a repository, newest first
    pub async fn list_by_repository(&self, repository_id: i64) -> Result<Vec<ReviewRecord>> {
        sqlx::query_as::<_, ReviewRecord>(
            "SELECT * FROM reviews WHERE repository_id = ? ORDER BY updated_at DESC",
        )
        .bind(repository_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }
}
