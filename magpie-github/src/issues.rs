//! Issue fetching for linked-issue context

use crate::{Error, GitHubClient, Result};
use octocrab::models::issues::Issue as OctocrabIssue;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// GitHub issue representation, trimmed to what the review prompt needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Issue number
    pub number: u64,
    /// Issue title
    pub title: String,
    /// Issue body/description
    pub body: Option<String>,
}

impl From<OctocrabIssue> for Issue {
    fn from(issue: OctocrabIssue) -> Self {
        Issue {
            number: issue.number,
            title: issue.title,
            body: issue.body,
        }
    }
}

impl GitHubClient {
    /// Get an issue by number; `None` when it does not exist
    pub async fn get_issue(&self, number: u64) -> Result<Option<Issue>> {
        debug!(number, "Fetching issue");

        match self
            .client()
            .issues(self.owner(), self.repo())
            .get(number)
            .await
        {
            Ok(issue) => Ok(Some(issue.into())),
            Err(octocrab::Error::GitHub { source, .. })
                if source.message.contains("Not Found") =>
            {
                Ok(None)
            }
            Err(e) => Err(Error::Api(e)),
        }
    }
}
