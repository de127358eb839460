//! Finding reconciliation and posting
//!
//! Merges static and AI findings against the thread ledger so repeated runs
//! of the same PR never double-post: findings whose key already has an open
//! thread are suppressed, open threads whose key is no longer detected are
//! resolved, and only genuinely new findings become comments. Every
//! candidate comment is validated against the diff's hunks before posting
//! because the code host rejects comments outside the diff context.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use magpie_db::repos::threads::{ThreadRecord, ThreadsRepo};

use crate::diff::{DiffSide, ParsedFile};
use crate::error::Result;
use crate::findings::Finding;
use crate::vcs::{DraftComment, VcsClient};

/// What one reconciliation run decided
#[derive(Debug, Clone)]
pub struct ReconcilePlan {
    /// New findings to post as inline comments
    pub to_post: Vec<Finding>,
    /// Issue keys of open threads no longer detected, to be resolved
    pub to_resolve: Vec<String>,
    /// Findings skipped because an open thread already covers their key
    pub suppressed: usize,
    /// Candidate comments dropped for landing outside any hunk
    pub invalid_dropped: usize,
}

/// Counters reported back into the review result
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct ReconcileOutcome {
    pub posted: usize,
    pub resolved: usize,
    pub suppressed: usize,
    pub invalid_dropped: usize,
}

/// Decide what to post, suppress, and resolve
///
/// `findings` is the merged static + AI set, already keyed. Deduplicates by
/// issue key within the run (first occurrence wins, static rules run first
/// so they take precedence over AI restatements).
pub fn plan_reconciliation(
    findings: Vec<Finding>,
    open_threads: &[ThreadRecord],
    files: &[ParsedFile],
) -> ReconcilePlan {
    let mut seen = HashSet::new();
    let mut deduped = Vec::with_capacity(findings.len());
    for finding in findings {
        if seen.insert(finding.issue_key.clone()) {
            deduped.push(finding);
        }
    }

    let detected: HashSet<&str> = deduped.iter().map(|f| f.issue_key.as_str()).collect();

    let open_keys: HashSet<&str> = open_threads
        .iter()
        .filter(|t| t.is_open())
        .map(|t| t.issue_key.as_str())
        .collect();

    // Open threads whose problem vanished from this run's detection
    let to_resolve: Vec<String> = open_threads
        .iter()
        .filter(|t| t.is_open() && !detected.contains(t.issue_key.as_str()))
        .map(|t| t.issue_key.clone())
        .collect();

    let by_path: HashMap<&str, &ParsedFile> =
        files.iter().map(|f| (f.path.as_str(), f)).collect();

    let mut to_post = Vec::new();
    let mut suppressed = 0usize;
    let mut invalid_dropped = 0usize;

    for finding in deduped {
        if open_keys.contains(finding.issue_key.as_str()) {
            suppressed += 1;
            continue;
        }

        let valid = by_path
            .get(finding.file.as_str())
            .map(|f| f.line_in_hunks(finding.line, DiffSide::New))
            .unwrap_or(false);

        if valid {
            to_post.push(finding);
        } else {
            debug!(
                file = %finding.file,
                line = finding.line,
                rule = %finding.rule_id,
                "Dropping comment outside diff context"
            );
            invalid_dropped += 1;
        }
    }

    if invalid_dropped > 0 {
        warn!(count = invalid_dropped, "Dropped comments that fell outside any hunk");
    }

    ReconcilePlan {
        to_post,
        to_resolve,
        suppressed,
        invalid_dropped,
    }
}

/// Render the comment body for one finding
pub fn render_comment_body(finding: &Finding) -> String {
    let mut body = format!("**[{}]** {}", finding.severity, finding.message);

    if let Some(why) = &finding.why {
        body.push_str(&format!("\n\n{}", why));
    }
    if let Some(fix) = &finding.fix {
        body.push_str(&format!("\n\n**Suggested fix:** {}", fix));
    }
    if let Some(suggestion) = &finding.suggestion {
        body.push_str(&format!("\n\n```suggestion\n{}\n```", suggestion));
    }
    body.push_str(&format!("\n\n<sub>{}</sub>", finding.rule_id));
    body
}

/// Turn the planned findings into draft comments for the code host
pub fn build_draft_comments(to_post: &[Finding]) -> Vec<DraftComment> {
    to_post
        .iter()
        .map(|f| DraftComment {
            path: f.file.clone(),
            line: f.line,
            side: DiffSide::New,
            body: render_comment_body(f),
        })
        .collect()
}

/// Execute a plan: post the review, resolve stale threads, insert new ones
///
/// Posting happens before thread bookkeeping so a posting failure leaves the
/// ledger untouched and the next run retries cleanly.
pub async fn apply_plan(
    vcs: &dyn VcsClient,
    threads: &ThreadsRepo,
    review_id: i64,
    pr_number: i64,
    commit_sha: &str,
    summary: &str,
    plan: &ReconcilePlan,
) -> Result<ReconcileOutcome> {
    let comments = build_draft_comments(&plan.to_post);

    if !comments.is_empty() || !summary.trim().is_empty() {
        vcs.post_review(pr_number, commit_sha, summary, &comments).await?;
    }

    let mut resolved = 0usize;
    for key in &plan.to_resolve {
        if threads.resolve(review_id, key).await? {
            resolved += 1;
        }
    }

    for finding in &plan.to_post {
        threads
            .open(review_id, &finding.issue_key, &finding.file, finding.line as i64)
            .await?;
    }

    info!(
        posted = plan.to_post.len(),
        resolved,
        suppressed = plan.suppressed,
        dropped = plan.invalid_dropped,
        "Reconciliation applied"
    );

    Ok(ReconcileOutcome {
        posted: plan.to_post.len(),
        resolved,
        suppressed: plan.suppressed,
        invalid_dropped: plan.invalid_dropped,
    })
}
