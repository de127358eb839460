//! Pull request review submission and comment listing

use crate::{Error, GitHubClient, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

/// A review comment on a pull request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewComment {
    /// Comment ID
    pub id: u64,
    /// Comment body/text
    pub body: String,
    /// Author username
    pub author: String,
    /// File path (if this is a code review comment)
    pub path: Option<String>,
    /// Line number (if this is a code review comment)
    pub line: Option<u64>,
    /// When the comment was created
    pub created_at: DateTime<Utc>,
}

/// An inline comment to submit with a review
#[derive(Debug, Clone, Serialize)]
pub struct InlineComment {
    pub path: String,
    pub line: u64,
    /// "LEFT" or "RIGHT"
    pub side: String,
    pub body: String,
}

impl GitHubClient {
    /// Submit one review with a summary body and inline comments
    ///
    /// Uses the COMMENT event: Magpie reports, humans approve.
    pub async fn submit_review(
        &self,
        pr_number: u64,
        commit_sha: &str,
        summary: &str,
        comments: &[InlineComment],
    ) -> Result<()> {
        debug!(pr_number, comments = comments.len(), "Submitting review");

        let route = format!(
            "/repos/{}/{}/pulls/{}/reviews",
            self.owner(),
            self.repo(),
            pr_number
        );

        let body = json!({
            "commit_id": commit_sha,
            "body": summary,
            "event": "COMMENT",
            "comments": comments,
        });

        let _: serde_json::Value = self
            .client()
            .post(route, Some(&body))
            .await
            .map_err(Error::Api)?;

        info!(pr_number, comments = comments.len(), "Review submitted");
        Ok(())
    }

    /// Get all review comments for a pull request
    pub async fn get_pr_review_comments(&self, pr_number: u64) -> Result<Vec<ReviewComment>> {
        let comments = self
            .client()
            .pulls(self.owner(), self.repo())
            .list_comments(Some(pr_number))
            .send()
            .await
            .map_err(Error::Api)?;

        Ok(comments
            .items
            .into_iter()
            .map(|c| ReviewComment {
                id: c.id.0,
                body: c.body,
                author: c.user.map(|u| u.login).unwrap_or_default(),
                path: Some(c.path),
                line: c.line,
                created_at: c.created_at,
            })
            .collect())
    }
}
