//! Version-control client seam
//!
//! The pipeline only sees this trait; the octocrab implementation lives in
//! `magpie-github`. Posting is additive on the provider side, so keeping
//! duplicate comments out is the pipeline's job, not the client's.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::diff::DiffSide;
use crate::Result;

/// A review comment to be posted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftComment {
    pub path: String,
    pub line: usize,
    pub side: DiffSide,
    pub body: String,
}

/// An existing review comment on the PR
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostedComment {
    pub id: u64,
    pub path: Option<String>,
    pub line: Option<usize>,
    pub body: String,
    pub author: String,
}

/// A linked issue referenced from the PR body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueContext {
    pub number: i64,
    pub title: String,
    pub body: Option<String>,
}

/// Operations the review pipeline needs from the code host
#[async_trait]
pub trait VcsClient: Send + Sync {
    /// Fetch the unified diff for a PR
    async fn get_diff(&self, pr_number: i64) -> Result<String>;

    /// Fetch file content at a ref; `None` if the file does not exist there
    async fn get_file_content(&self, path: &str, git_ref: &str) -> Result<Option<String>>;

    /// Submit one review with a summary and inline comments
    async fn post_review(
        &self,
        pr_number: i64,
        commit_sha: &str,
        summary: &str,
        comments: &[DraftComment],
    ) -> Result<()>;

    /// List all existing review comments on a PR
    async fn list_review_comments(&self, pr_number: i64) -> Result<Vec<PostedComment>>;

    /// Fetch a linked issue for prompt context; `None` if missing
    async fn get_issue(&self, issue_number: i64) -> Result<Option<IssueContext>>;
}

/// Extract `Fixes #N` / `Closes #N` / `Resolves #N` references from a PR body
pub fn linked_issue_numbers(body: &str) -> Vec<i64> {
    let mut numbers = Vec::new();
    for window in body.split_whitespace().collect::<Vec<_>>().windows(2) {
        let keyword = window[0].trim_end_matches(':').to_ascii_lowercase();
        if !matches!(keyword.as_str(), "fixes" | "closes" | "resolves" | "fix" | "close") {
            continue;
        }
        if let Some(num) = window[1].strip_prefix('#') {
            let num = num.trim_end_matches(|c: char| !c.is_ascii_digit());
            if let Ok(n) = num.parse::<i64>() {
                if !numbers.contains(&n) {
                    numbers.push(n);
                }
            }
        }
    }
    numbers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linked_issue_numbers() {
        let body = "This PR fixes #12 and closes #34.\nAlso mentions #99 without a keyword.";
        assert_eq!(linked_issue_numbers(body), vec![12, 34]);
    }

    #[test]
    fn test_linked_issue_numbers_dedupes() {
        let body = "Fixes #5, fixes #5";
        assert_eq!(linked_issue_numbers(body), vec![5]);
    }

    #[test]
    fn test_no_links() {
        assert!(linked_issue_numbers("Just a refactor").is_empty());
    }
}
