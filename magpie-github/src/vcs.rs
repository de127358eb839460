//! `VcsClient` implementation backed by the GitHub API

use async_trait::async_trait;

use magpie_core::diff::DiffSide;
use magpie_core::vcs::{DraftComment, IssueContext, PostedComment, VcsClient};

use crate::review::InlineComment;
use crate::GitHubClient;

fn pr_id(pr_number: i64) -> magpie_core::Result<u64> {
    u64::try_from(pr_number)
        .map_err(|_| magpie_core::Error::Vcs(format!("invalid PR number: {}", pr_number)))
}

fn side_label(side: DiffSide) -> &'static str {
    match side {
        DiffSide::Old => "LEFT",
        DiffSide::New => "RIGHT",
    }
}

#[async_trait]
impl VcsClient for GitHubClient {
    async fn get_diff(&self, pr_number: i64) -> magpie_core::Result<String> {
        Ok(self.get_pr_diff(pr_id(pr_number)?).await?)
    }

    async fn get_file_content(
        &self,
        path: &str,
        git_ref: &str,
    ) -> magpie_core::Result<Option<String>> {
        Ok(GitHubClient::get_file_content(self, path, git_ref).await?)
    }

    async fn post_review(
        &self,
        pr_number: i64,
        commit_sha: &str,
        summary: &str,
        comments: &[DraftComment],
    ) -> magpie_core::Result<()> {
        let inline: Vec<InlineComment> = comments
            .iter()
            .map(|c| InlineComment {
                path: c.path.clone(),
                line: c.line as u64,
                side: side_label(c.side).to_string(),
                body: c.body.clone(),
            })
            .collect();

        self.submit_review(pr_id(pr_number)?, commit_sha, summary, &inline)
            .await?;
        Ok(())
    }

    async fn list_review_comments(
        &self,
        pr_number: i64,
    ) -> magpie_core::Result<Vec<PostedComment>> {
        let comments = self.get_pr_review_comments(pr_id(pr_number)?).await?;
        Ok(comments
            .into_iter()
            .map(|c| PostedComment {
                id: c.id,
                path: c.path,
                line: c.line.map(|l| l as usize),
                body: c.body,
                author: c.author,
            })
            .collect())
    }

    async fn get_issue(&self, issue_number: i64) -> magpie_core::Result<Option<IssueContext>> {
        let number = u64::try_from(issue_number)
            .map_err(|_| magpie_core::Error::Vcs(format!("invalid issue number: {}", issue_number)))?;

        let issue = GitHubClient::get_issue(self, number).await?;
        Ok(issue.map(|i| IssueContext {
            number: i.number as i64,
            title: i.title,
            body: i.body,
        }))
    }
}
