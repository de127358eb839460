//! Finding types and deterministic issue keys
//!
//! A finding is one reportable issue, static or AI-sourced. Its issue key is
//! a hash of the identifying fields, stable across runs, so repeated detection
//! of the same problem maps onto the same comment thread.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Severity taxonomy shared by static rules and AI review output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Blocker,
    Critical,
    Major,
    Minor,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Blocker => "BLOCKER",
            Severity::Critical => "CRITICAL",
            Severity::Major => "MAJOR",
            Severity::Minor => "MINOR",
            Severity::Info => "INFO",
        }
    }

    /// Parse a severity label, tolerating whatever casing the model emits
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BLOCKER" => Some(Severity::Blocker),
            "CRITICAL" => Some(Severity::Critical),
            "MAJOR" => Some(Severity::Major),
            "MINOR" => Some(Severity::Minor),
            "INFO" => Some(Severity::Info),
            _ => None,
        }
    }

    /// Severities that must never be dropped by truncation
    pub fn is_mandatory(&self) -> bool {
        matches!(self, Severity::Blocker | Severity::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a finding came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingSource {
    Static,
    Ai,
}

/// Rule ID used for all AI-sourced findings
pub const AI_RULE_ID: &str = "ai-review";

/// A single reportable issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub source: FindingSource,
    /// Stable rule identifier; `ai-review` for model output
    pub rule_id: String,
    pub file: String,
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    pub severity: Severity,
    pub message: String,
    /// Explanation of why this matters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub why: Option<String>,
    /// Suggested fix description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
    /// Replacement snippet suitable for a suggestion block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Deterministic identity key, filled in by [`Finding::keyed`]
    pub issue_key: String,
}

impl Finding {
    /// Create a static-rule finding
    pub fn from_rule(
        rule_id: impl Into<String>,
        file: impl Into<String>,
        line: usize,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: FindingSource::Static,
            rule_id: rule_id.into(),
            file: file.into(),
            line,
            end_line: None,
            severity,
            message: message.into(),
            why: None,
            fix: None,
            suggestion: None,
            issue_key: String::new(),
        }
    }

    /// Create an AI-sourced finding
    pub fn from_ai(
        file: impl Into<String>,
        line: usize,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: FindingSource::Ai,
            rule_id: AI_RULE_ID.to_string(),
            file: file.into(),
            line,
            end_line: None,
            severity,
            message: message.into(),
            why: None,
            fix: None,
            suggestion: None,
            issue_key: String::new(),
        }
    }

    /// Set the end of a multi-line span
    pub fn with_end_line(mut self, end_line: usize) -> Self {
        self.end_line = Some(end_line);
        self
    }

    /// Set the rationale
    pub fn with_why(mut self, why: impl Into<String>) -> Self {
        self.why = Some(why.into());
        self
    }

    /// Set the suggested fix
    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix = Some(fix.into());
        self
    }

    /// Fill in the issue key for this finding's PR context
    pub fn keyed(mut self, repository_id: i64, pr_number: i64) -> Self {
        self.issue_key = issue_key(repository_id, pr_number, &self.file, &self.rule_id, &self.message);
        self
    }
}

/// Compute the deterministic identity key for a finding
///
/// The key deliberately excludes the line number: a finding that merely moves
/// within a file between runs keeps its thread instead of double-posting.
pub fn issue_key(
    repository_id: i64,
    pr_number: i64,
    file: &str,
    rule_id: &str,
    message: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(repository_id.to_le_bytes());
    hasher.update(b"|");
    hasher.update(pr_number.to_le_bytes());
    hasher.update(b"|");
    hasher.update(file.as_bytes());
    hasher.update(b"|");
    hasher.update(rule_id.as_bytes());
    hasher.update(b"|");
    hasher.update(message.as_bytes());

    let digest = hasher.finalize();
    let mut key = String::with_capacity(32);
    for byte in &digest[..16] {
        key.push_str(&format!("{:02x}", byte));
    }
    key
}
