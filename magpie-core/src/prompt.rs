//! Review prompt generation
//!
//! Builds the provider-agnostic prompt for one AI review call: PR metadata,
//! the line-numbered diff for the batch, linked-issue context, retrieved
//! snippets, and prior static findings the model may validate or override.

use crate::context::Snippet;
use crate::findings::Finding;
use crate::llm::ChatMessage;
use crate::score::ScoredFile;
use crate::vcs::IssueContext;

/// System prompt shared by every review call
pub const SYSTEM_PROMPT: &str = "You are a senior code reviewer. You review pull request diffs \
and respond ONLY with a single JSON object, no prose, matching this shape:\n\
{\n\
  \"summary\": string,\n\
  \"risk\": \"low\" | \"medium\" | \"high\",\n\
  \"merge_readiness\": \"approve\" | \"needs_work\" | \"blocked\",\n\
  \"comments\": [{\"file\": string, \"line\": number, \"end_line\": number?, \
\"severity\": \"BLOCKER\"|\"CRITICAL\"|\"MAJOR\"|\"MINOR\"|\"INFO\", \
\"category\": string?, \"message\": string, \"why\": string?, \"fix\": string?, \
\"suggestion\": string?}]\n\
}\n\
Severity taxonomy: BLOCKER = must not merge; CRITICAL = crash, security, or \
data-loss risk; MAJOR = correctness or design problem; MINOR = worthwhile \
cleanup; INFO = observation. Only raise CRITICAL for crash, security, or \
data-loss issues. Comment only on lines present in the diff.";

/// Context for one review prompt
#[derive(Debug, Clone, Default)]
pub struct ReviewPrompt {
    pub pr_title: String,
    pub pr_body: Option<String>,
    pub linked_issues: Vec<IssueContext>,
    pub snippets: Vec<Snippet>,
    pub static_findings: Vec<Finding>,
    pub custom_instructions: Option<String>,
    /// Batch position as (index, total) when the PR is reviewed in batches
    pub batch: Option<(usize, usize)>,
}

impl ReviewPrompt {
    pub fn new(pr_title: impl Into<String>) -> Self {
        Self {
            pr_title: pr_title.into(),
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: Option<String>) -> Self {
        self.pr_body = body;
        self
    }

    pub fn with_linked_issues(mut self, issues: Vec<IssueContext>) -> Self {
        self.linked_issues = issues;
        self
    }

    pub fn with_snippets(mut self, snippets: Vec<Snippet>) -> Self {
        self.snippets = snippets;
        self
    }

    pub fn with_static_findings(mut self, findings: Vec<Finding>) -> Self {
        self.static_findings = findings;
        self
    }

    pub fn with_custom_instructions(mut self, instructions: Option<String>) -> Self {
        self.custom_instructions = instructions;
        self
    }

    pub fn with_batch(mut self, index: usize, total: usize) -> Self {
        self.batch = Some((index, total));
        self
    }

    /// Render the user prompt for a batch of files
    pub fn to_prompt(&self, files: &[ScoredFile]) -> String {
        let mut prompt = String::new();

        prompt.push_str(&format!("# Pull Request: {}\n\n", self.pr_title));

        if let Some((index, total)) = self.batch {
            prompt.push_str(&format!(
                "Reviewing batch {} of {}. Judge only the files below.\n\n",
                index + 1,
                total
            ));
        }

        if let Some(body) = &self.pr_body {
            if !body.trim().is_empty() {
                prompt.push_str("## Description\n\n");
                prompt.push_str(body.trim());
                prompt.push_str("\n\n");
            }
        }

        if !self.linked_issues.is_empty() {
            prompt.push_str("## Linked Issues\n\n");
            for issue in &self.linked_issues {
                prompt.push_str(&format!("### #{}: {}\n", issue.number, issue.title));
                if let Some(body) = &issue.body {
                    prompt.push_str(&truncate(body.trim(), 1500));
                    prompt.push('\n');
                }
                prompt.push('\n');
            }
        }

        if !self.snippets.is_empty() {
            prompt.push_str("## Related Code From This Repository\n\n");
            for snippet in &self.snippets {
                prompt.push_str(&format!("### {}\n```\n", snippet.path));
                prompt.push_str(&truncate(&snippet.content, 2000));
                prompt.push_str("\n```\n\n");
            }
        }

        if !self.static_findings.is_empty() {
            prompt.push_str("## Static Analysis Findings\n\n");
            prompt.push_str(
                "Deterministic rules flagged the issues below. Validate each one: repeat it \
                 in your comments if real, or omit it if a false positive.\n\n",
            );
            for finding in &self.static_findings {
                prompt.push_str(&format!(
                    "- [{}] {}:{} ({}): {}\n",
                    finding.rule_id, finding.file, finding.line, finding.severity, finding.message
                ));
            }
            prompt.push('\n');
        }

        if let Some(instructions) = &self.custom_instructions {
            prompt.push_str("## Reviewer Instructions\n\n");
            prompt.push_str(instructions.trim());
            prompt.push_str("\n\n");
        }

        prompt.push_str("## Changes Under Review\n\n");
        for scored in files {
            prompt.push_str(&render_file_diff(scored));
        }

        prompt
    }

    /// Full message list for one chat call
    pub fn to_messages(&self, files: &[ScoredFile]) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(self.to_prompt(files)),
        ]
    }
}

/// Render one file's hunk-scoped, line-numbered changes
fn render_file_diff(scored: &ScoredFile) -> String {
    let file = &scored.file;
    let mut out = String::new();

    out.push_str(&format!("### {}", file.path));
    if let Some(old) = &file.old_path {
        out.push_str(&format!(" (renamed from {})", old));
    }
    out.push('\n');

    if file.hunks.is_empty() {
        out.push_str("(rename only, no content changes)\n\n");
        return out;
    }

    out.push_str("```\n");
    for line in &file.deletions {
        out.push_str(&format!("-{:>5} | {}\n", line.line_number, line.content));
    }
    for line in &file.additions {
        out.push_str(&format!("+{:>5} | {}\n", line.line_number, line.content));
    }
    out.push_str("```\n\n");
    out
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}\n[truncated]", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::{Finding, Severity};

    fn scored(path: &str, added: &[(usize, &str)]) -> ScoredFile {
        use crate::diff::{DiffLine, Hunk, ParsedFile};
        ScoredFile::new(ParsedFile {
            path: path.to_string(),
            old_path: None,
            hunks: vec![Hunk {
                old_start: 1,
                old_lines: 0,
                new_start: 1,
                new_lines: 50,
            }],
            additions: added
                .iter()
                .map(|(n, c)| DiffLine {
                    line_number: *n,
                    content: c.to_string(),
                })
                .collect(),
            deletions: Vec::new(),
            is_new: false,
            is_deleted: false,
        })
    }

    #[test]
    fn test_prompt_contains_title_and_diff() {
        let prompt = ReviewPrompt::new("Add retry logic")
            .to_prompt(&[scored("src/retry.rs", &[(3, "let attempts = 3;")])]);

        assert!(prompt.contains("# Pull Request: Add retry logic"));
        assert!(prompt.contains("### src/retry.rs"));
        assert!(prompt.contains("+    3 | let attempts = 3;"));
    }

    #[test]
    fn test_prompt_includes_static_findings() {
        let finding = Finding::from_rule("sql-injection", "src/db.rs", 9, Severity::Critical, "raw SQL");
        let prompt = ReviewPrompt::new("t")
            .with_static_findings(vec![finding])
            .to_prompt(&[]);

        assert!(prompt.contains("Static Analysis Findings"));
        assert!(prompt.contains("[sql-injection] src/db.rs:9"));
    }

    #[test]
    fn test_prompt_includes_batch_header() {
        let prompt = ReviewPrompt::new("t").with_batch(1, 3).to_prompt(&[]);
        assert!(prompt.contains("batch 2 of 3"));
    }

    #[test]
    fn test_prompt_includes_linked_issue_and_snippets() {
        let prompt = ReviewPrompt::new("t")
            .with_linked_issues(vec![IssueContext {
                number: 12,
                title: "Login broken".to_string(),
                body: Some("Steps to reproduce".to_string()),
            }])
            .with_snippets(vec![Snippet {
                path: "src/auth.rs".to_string(),
                content: "fn login() {}".to_string(),
                score: 0.9,
            }])
            .to_prompt(&[]);

        assert!(prompt.contains("#12: Login broken"));
        assert!(prompt.contains("Related Code"));
        assert!(prompt.contains("fn login() {}"));
    }

    #[test]
    fn test_messages_start_with_system() {
        let messages = ReviewPrompt::new("t").to_messages(&[]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("Severity taxonomy"));
    }

    #[test]
    fn test_rename_only_file_rendered_without_fence() {
        use crate::diff::ParsedFile;
        let file = ScoredFile::new(ParsedFile {
            path: "src/new.rs".to_string(),
            old_path: Some("src/old.rs".to_string()),
            hunks: Vec::new(),
            additions: Vec::new(),
            deletions: Vec::new(),
            is_new: false,
            is_deleted: false,
        });
        let prompt = ReviewPrompt::new("t").to_prompt(&[file]);
        assert!(prompt.contains("renamed from src/old.rs"));
        assert!(prompt.contains("rename only"));
    }
}
