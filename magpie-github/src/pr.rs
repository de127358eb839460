//! Pull request data access

use crate::{Error, GitHubClient, Result};
use chrono::{DateTime, Utc};
use octocrab::models::pulls::PullRequest as OctocrabPR;
use serde::{Deserialize, Serialize};
use tracing::debug;

const GITHUB_API_BASE: &str = "https://api.github.com";
const DIFF_MEDIA_TYPE: &str = "application/vnd.github.v3.diff";

/// Pull request representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// PR title
    pub title: String,
    /// PR body
    pub body: String,
    /// Current state (open, closed)
    pub state: PrState,
    /// Head commit SHA
    pub head_sha: String,
    /// Base commit SHA
    pub base_sha: String,
    /// Head branch name
    pub head_branch: String,
    /// Base branch name
    pub base_branch: String,
    /// When the PR was created
    pub created_at: DateTime<Utc>,
    /// When the PR was last updated
    pub updated_at: DateTime<Utc>,
}

/// PR state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    Open,
    Closed,
}

impl From<octocrab::models::IssueState> for PrState {
    fn from(state: octocrab::models::IssueState) -> Self {
        match state {
            octocrab::models::IssueState::Closed => PrState::Closed,
            _ => PrState::Open,
        }
    }
}

impl From<OctocrabPR> for PullRequest {
    fn from(pr: OctocrabPR) -> Self {
        PullRequest {
            number: pr.number,
            title: pr.title.unwrap_or_default(),
            body: pr.body.unwrap_or_default(),
            state: pr.state.map(|s| s.into()).unwrap_or(PrState::Open),
            head_sha: pr.head.sha,
            base_sha: pr.base.sha,
            head_branch: pr.head.ref_field,
            base_branch: pr.base.ref_field,
            created_at: pr.created_at.unwrap_or_else(Utc::now),
            updated_at: pr.updated_at.unwrap_or_else(Utc::now),
        }
    }
}

impl GitHubClient {
    /// Get a pull request by number
    pub async fn get_pr(&self, number: u64) -> Result<PullRequest> {
        debug!(number, "Fetching pull request");

        let pr = self
            .client()
            .pulls(self.owner(), self.repo())
            .get(number)
            .await
            .map_err(|e| match &e {
                octocrab::Error::GitHub { source, .. }
                    if source.message.contains("Not Found") =>
                {
                    Error::PrNotFound(number)
                }
                _ => Error::Api(e),
            })?;

        Ok(pr.into())
    }

    /// Fetch the raw unified diff for a pull request
    ///
    /// Octocrab has no diff media-type support, so this goes through reqwest
    /// with the Accept header GitHub requires.
    pub async fn get_pr_diff(&self, number: u64) -> Result<String> {
        debug!(number, "Fetching pull request diff");

        let url = format!(
            "{}/repos/{}/{}/pulls/{}",
            GITHUB_API_BASE,
            self.owner(),
            self.repo(),
            number
        );

        let response = reqwest::Client::new()
            .get(&url)
            .header("Accept", DIFF_MEDIA_TYPE)
            .header("Authorization", format!("Bearer {}", self.token()))
            .header("User-Agent", "magpie-review")
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::PrNotFound(number));
        }
        if !response.status().is_success() {
            return Err(Error::Other(format!(
                "diff fetch for PR #{} failed with status {}",
                number,
                response.status()
            )));
        }

        Ok(response.text().await?)
    }

    /// Fetch file content at a ref; `None` when the file does not exist there
    pub async fn get_file_content(&self, path: &str, git_ref: &str) -> Result<Option<String>> {
        debug!(path, git_ref, "Fetching file content");

        let result = self
            .client()
            .repos(self.owner(), self.repo())
            .get_content()
            .path(path)
            .r#ref(git_ref)
            .send()
            .await;

        match result {
            Ok(mut content) => Ok(content
                .items
                .pop()
                .and_then(|item| item.decoded_content())),
            Err(octocrab::Error::GitHub { source, .. })
                if source.message.contains("Not Found") =>
            {
                Ok(None)
            }
            Err(e) => Err(Error::Api(e)),
        }
    }
}
