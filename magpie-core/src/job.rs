//! Review job input type

use serde::{Deserialize, Serialize};

/// A code-change event that triggers one review run
///
/// Immutable once enqueued; never persisted beyond the Review row it produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewJob {
    /// App installation (tenant) the event belongs to
    pub installation_id: i64,
    /// Numeric repository identifier
    pub repository_id: i64,
    /// Repository in `owner/name` form
    pub repository: String,
    /// Pull request number
    pub pr_number: i64,
    /// PR title
    pub pr_title: String,
    /// PR body, if any
    pub pr_body: Option<String>,
    /// Head commit SHA of the PR at delivery time
    pub head_sha: String,
    /// Base commit SHA
    pub base_sha: String,
    /// Delivery identifier from the event source
    pub delivery_id: String,
}

impl ReviewJob {
    /// Create a new review job
    pub fn new(
        installation_id: i64,
        repository_id: i64,
        repository: impl Into<String>,
        pr_number: i64,
    ) -> Self {
        Self {
            installation_id,
            repository_id,
            repository: repository.into(),
            pr_number,
            pr_title: String::new(),
            pr_body: None,
            head_sha: String::new(),
            base_sha: String::new(),
            delivery_id: String::new(),
        }
    }

    /// Set the PR title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.pr_title = title.into();
        self
    }

    /// Set the PR body
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.pr_body = Some(body.into());
        self
    }

    /// Set head and base commit SHAs
    pub fn with_shas(mut self, head: impl Into<String>, base: impl Into<String>) -> Self {
        self.head_sha = head.into();
        self.base_sha = base.into();
        self
    }

    /// Set the delivery identifier
    pub fn with_delivery_id(mut self, delivery_id: impl Into<String>) -> Self {
        self.delivery_id = delivery_id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_builder() {
        let job = ReviewJob::new(1, 42, "acme/widgets", 7)
            .with_title("Add login")
            .with_body("Fixes #12")
            .with_shas("abc", "def")
            .with_delivery_id("deliv-1");

        assert_eq!(job.repository, "acme/widgets");
        assert_eq!(job.pr_number, 7);
        assert_eq!(job.pr_body.as_deref(), Some("Fixes #12"));
        assert_eq!(job.head_sha, "abc");
    }
}
