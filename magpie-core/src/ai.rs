//! AI review orchestration
//!
//! Drives the model calls for a PR: splits large file sets into batches,
//! parses the untrusted response defensively, and normalizes severities
//! before the findings reach reconciliation. Model output is never trusted
//! to be well-formed; every parse failure degrades to a safe fallback
//! instead of failing the job.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::findings::{Finding, Severity};
use crate::llm::{ChatOptions, LlmClient};
use crate::prompt::ReviewPrompt;
use crate::score::ScoredFile;

/// Files per model call when batching is in effect
pub const BATCH_SIZE: usize = 12;

/// Cap on non-mandatory comments surviving truncation
pub const MAX_SOFT_COMMENTS: usize = 25;

/// Language that justifies keeping a CRITICAL severity
const CRITICAL_KEYWORDS: &[&str] = &[
    "crash",
    "panic",
    "security",
    "vulnerab",
    "inject",
    "leak",
    "data loss",
    "data-loss",
    "corrupt",
    "overflow",
    "exploit",
    "unauthenticated",
];

/// Categories whose remarks are informational no matter what the model says
const INFO_CATEGORIES: &[&str] = &["logging", "naming", "test-coverage", "test coverage"];

/// Overall risk as assessed by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// Merge-readiness verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeReadiness {
    Approve,
    NeedsWork,
    Blocked,
}

impl MergeReadiness {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeReadiness::Approve => "approve",
            MergeReadiness::NeedsWork => "needs_work",
            MergeReadiness::Blocked => "blocked",
        }
    }
}

/// Final output of the AI stage, normalized and keyed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiAssessment {
    pub summary: String,
    pub risk: RiskLevel,
    pub merge_readiness: MergeReadiness,
    pub findings: Vec<Finding>,
    /// Set when any batch came back unparseable and a fallback was used
    pub fallback_used: bool,
    /// Lower-severity comments dropped by truncation
    pub omitted: usize,
}

/// One comment as the model emits it, before normalization
#[derive(Debug, Clone, Deserialize)]
struct RawComment {
    #[serde(default)]
    file: String,
    #[serde(default)]
    line: usize,
    #[serde(default)]
    end_line: Option<usize>,
    #[serde(default)]
    severity: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    why: Option<String>,
    #[serde(default)]
    fix: Option<String>,
    #[serde(default)]
    suggestion: Option<String>,
}

/// One batch's response shape
#[derive(Debug, Clone, Deserialize)]
struct RawReview {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    risk: Option<RiskLevel>,
    #[serde(default)]
    merge_readiness: Option<MergeReadiness>,
    #[serde(default)]
    comments: Vec<RawComment>,
}

impl RawReview {
    /// Safe result for unparseable model output
    fn fallback() -> Self {
        Self {
            summary: "Automated review could not parse the model response; treating this \
                      change as blocked pending a manual look."
                .to_string(),
            risk: Some(RiskLevel::High),
            merge_readiness: Some(MergeReadiness::Blocked),
            comments: Vec::new(),
        }
    }
}

/// Run the AI review over the selected files
///
/// Batch calls are sequential. Per-batch summaries are concatenated, but only
/// the final batch's risk and merge-readiness stand as the overall verdict.
pub async fn run_review(
    llm: &dyn LlmClient,
    model: &str,
    prompt: &ReviewPrompt,
    files: &[ScoredFile],
    allow_batching: bool,
    repository_id: i64,
    pr_number: i64,
) -> Result<AiAssessment> {
    let batches: Vec<&[ScoredFile]> = if allow_batching && files.len() > BATCH_SIZE {
        files.chunks(BATCH_SIZE).collect()
    } else {
        vec![files]
    };
    let total = batches.len();

    let options = ChatOptions::for_model(model);
    let mut summaries = Vec::with_capacity(total);
    let mut raw_comments = Vec::new();
    let mut risk = RiskLevel::Medium;
    let mut readiness = MergeReadiness::NeedsWork;
    let mut fallback_used = false;

    for (index, batch) in batches.iter().enumerate() {
        let batch_prompt = if total > 1 {
            prompt.clone().with_batch(index, total)
        } else {
            prompt.clone()
        };

        debug!(batch = index + 1, total, files = batch.len(), "Requesting AI review batch");
        let response = llm.chat(&batch_prompt.to_messages(batch), &options).await?;

        let (review, was_fallback) = parse_review(&response.content);
        fallback_used |= was_fallback;

        if !review.summary.trim().is_empty() {
            summaries.push(review.summary);
        }
        raw_comments.extend(review.comments);

        // Last batch wins; intermediate assessments are partial views
        if let Some(r) = review.risk {
            risk = r;
        }
        if let Some(m) = review.merge_readiness {
            readiness = m;
        }
    }

    let findings: Vec<Finding> = raw_comments
        .into_iter()
        .filter_map(normalize_comment)
        .map(|f| f.keyed(repository_id, pr_number))
        .collect();

    let (findings, omitted) = truncate_findings(findings);

    let mut summary = summaries.join("\n\n");
    if omitted > 0 {
        summary.push_str(&format!("\n\n_{} lower-severity comments omitted._", omitted));
    }

    Ok(AiAssessment {
        summary,
        risk,
        merge_readiness: readiness,
        findings,
        fallback_used,
        omitted,
    })
}

/// Parse one batch response, falling back to a blocked verdict on failure
///
/// Returns (review, fallback_used).
fn parse_review(content: &str) -> (RawReview, bool) {
    match extract_json(content) {
        Some(value) => match serde_json::from_value::<RawReview>(value) {
            Ok(review) => (review, false),
            Err(e) => {
                warn!("AI response JSON had unexpected shape: {}", e);
                (RawReview::fallback(), true)
            }
        },
        None => {
            warn!(
                "AI response contained no parseable JSON; preview: {}",
                content.chars().take(120).collect::<String>()
            );
            (RawReview::fallback(), true)
        }
    }
}

/// Pull a JSON object out of raw model text
///
/// Tries a direct parse, then stripped code fences, then brace-matched
/// extraction from surrounding prose.
pub fn extract_json(content: &str) -> Option<serde_json::Value> {
    let trimmed = content.trim();

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    let unfenced = strip_code_fences(trimmed);
    if let Ok(value) = serde_json::from_str(unfenced.trim()) {
        return Some(value);
    }

    let extracted = brace_matched(&unfenced)?;
    serde_json::from_str(&extracted).ok()
}

fn strip_code_fences(s: &str) -> String {
    let mut result = s.to_string();

    if result.starts_with("```") {
        if let Some(first_newline) = result.find('\n') {
            result = result[first_newline + 1..].to_string();
        }
    }
    if result.trim_end().ends_with("```") {
        let trimmed = result.trim_end();
        result = trimmed[..trimmed.len() - 3].trim_end().to_string();
    }

    result
}

/// Find the first balanced `{...}` span, string-aware
fn brace_matched(s: &str) -> Option<String> {
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (i, ch) in s[start..].char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(s[start..start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

/// Apply severity policy to one raw comment
///
/// CRITICAL stands only when the text talks about crash, security, or data
/// loss; otherwise it is a MAJOR. Logging, naming, and test-coverage remarks
/// are informational regardless of the model's label. Comments without a
/// usable file or line are dropped.
fn normalize_comment(raw: RawComment) -> Option<Finding> {
    if raw.file.trim().is_empty() || raw.line == 0 {
        return None;
    }
    if raw.message.trim().is_empty() {
        return None;
    }

    let mut severity = Severity::parse(&raw.severity).unwrap_or(Severity::Major);

    if severity == Severity::Critical && !has_critical_language(&raw) {
        severity = Severity::Major;
    }

    if let Some(category) = &raw.category {
        let category = category.to_ascii_lowercase();
        if INFO_CATEGORIES.iter().any(|c| category.contains(c)) {
            severity = Severity::Info;
        }
    }

    let mut finding = Finding::from_ai(raw.file, raw.line, severity, raw.message);
    if let Some(end_line) = raw.end_line {
        if end_line > finding.line {
            finding = finding.with_end_line(end_line);
        }
    }
    if let Some(why) = raw.why {
        finding = finding.with_why(why);
    }
    if let Some(fix) = raw.fix {
        finding = finding.with_fix(fix);
    }
    finding.suggestion = raw.suggestion;

    Some(finding)
}

fn has_critical_language(raw: &RawComment) -> bool {
    let mut text = raw.message.to_ascii_lowercase();
    if let Some(why) = &raw.why {
        text.push(' ');
        text.push_str(&why.to_ascii_lowercase());
    }
    if let Some(category) = &raw.category {
        text.push(' ');
        text.push_str(&category.to_ascii_lowercase());
    }
    CRITICAL_KEYWORDS.iter().any(|k| text.contains(k))
}

/// Keep every BLOCKER/CRITICAL finding; cap the rest
///
/// Returns the surviving findings (severity order preserved within each
/// class) and the number dropped.
fn truncate_findings(findings: Vec<Finding>) -> (Vec<Finding>, usize) {
    let (mandatory, soft): (Vec<_>, Vec<_>) =
        findings.into_iter().partition(|f| f.severity.is_mandatory());

    let mut soft = soft;
    soft.sort_by_key(|f| f.severity);

    let omitted = soft.len().saturating_sub(MAX_SOFT_COMMENTS);
    soft.truncate(MAX_SOFT_COMMENTS);

    let mut kept = mandatory;
    kept.extend(soft);
    (kept, omitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatMessage, ChatResponse};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedLlm {
        responses: Mutex<Vec<String>>,
        calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedLlm {
        fn new(responses: Vec<&str>) -> Self {
            let mut responses: Vec<String> = responses.into_iter().map(String::from).collect();
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn chat(
            &self,
            messages: &[ChatMessage],
            _options: &ChatOptions,
        ) -> Result<ChatResponse> {
            self.calls.lock().unwrap().push(messages.to_vec());
            let content = self.responses.lock().unwrap().pop().unwrap_or_default();
            Ok(ChatResponse { content })
        }
    }

    fn scored(path: &str) -> ScoredFile {
        use crate::diff::{DiffLine, Hunk, ParsedFile};
        ScoredFile::new(ParsedFile {
            path: path.to_string(),
            old_path: None,
            hunks: vec![Hunk {
                old_start: 1,
                old_lines: 0,
                new_start: 1,
                new_lines: 2,
            }],
            additions: vec![DiffLine {
                line_number: 1,
                content: "let x = 1;".to_string(),
            }],
            deletions: Vec::new(),
            is_new: false,
            is_deleted: false,
        })
    }

    fn raw(severity: &str, message: &str, category: Option<&str>) -> RawComment {
        RawComment {
            file: "src/a.rs".to_string(),
            line: 5,
            end_line: None,
            severity: severity.to_string(),
            category: category.map(String::from),
            message: message.to_string(),
            why: None,
            fix: None,
            suggestion: None,
        }
    }

    #[test]
    fn test_extract_json_direct() {
        let value = extract_json(r#"{"summary": "ok"}"#).unwrap();
        assert_eq!(value["summary"], "ok");
    }

    #[test]
    fn test_extract_json_fenced() {
        let value = extract_json("```json\n{\"summary\": \"ok\"}\n```").unwrap();
        assert_eq!(value["summary"], "ok");
    }

    #[test]
    fn test_extract_json_from_prose() {
        let content = r#"Here is my review:
{"summary": "looks fine", "comments": []}
Let me know if you need more."#;
        let value = extract_json(content).unwrap();
        assert_eq!(value["summary"], "looks fine");
    }

    #[test]
    fn test_extract_json_respects_braces_in_strings() {
        let content = r#"note {"summary": "uses {braces} inside", "comments": []} end"#;
        let value = extract_json(content).unwrap();
        assert_eq!(value["summary"], "uses {braces} inside");
    }

    #[test]
    fn test_extract_json_none_for_garbage() {
        assert!(extract_json("no json here at all").is_none());
    }

    #[test]
    fn test_parse_review_fallback_is_blocked() {
        let (review, fallback) = parse_review("the model rambled with no json");
        assert!(fallback);
        assert_eq!(review.merge_readiness, Some(MergeReadiness::Blocked));
        assert_eq!(review.risk, Some(RiskLevel::High));
        assert!(review.comments.is_empty());
    }

    #[test]
    fn test_critical_without_keywords_downgraded() {
        let finding = normalize_comment(raw("CRITICAL", "rename this variable", None)).unwrap();
        assert_eq!(finding.severity, Severity::Major);
    }

    #[test]
    fn test_critical_with_security_language_kept() {
        let finding =
            normalize_comment(raw("CRITICAL", "SQL injection via user input", None)).unwrap();
        assert_eq!(finding.severity, Severity::Critical);
    }

    #[test]
    fn test_info_categories_forced_down() {
        let finding =
            normalize_comment(raw("MAJOR", "println left in", Some("logging"))).unwrap();
        assert_eq!(finding.severity, Severity::Info);
    }

    #[test]
    fn test_unknown_severity_defaults_to_major() {
        let finding = normalize_comment(raw("URGENT", "something odd", None)).unwrap();
        assert_eq!(finding.severity, Severity::Major);
    }

    #[test]
    fn test_comment_without_location_dropped() {
        let mut comment = raw("MAJOR", "msg", None);
        comment.line = 0;
        assert!(normalize_comment(comment).is_none());
    }

    #[test]
    fn test_truncation_never_drops_mandatory() {
        let mut findings = Vec::new();
        for i in 0..5 {
            findings.push(
                Finding::from_ai("src/a.rs", i + 1, Severity::Blocker, format!("blocker {}", i)),
            );
        }
        for i in 0..40 {
            findings.push(
                Finding::from_ai("src/a.rs", i + 100, Severity::Minor, format!("minor {}", i)),
            );
        }

        let (kept, omitted) = truncate_findings(findings);
        assert_eq!(omitted, 40 - MAX_SOFT_COMMENTS);
        assert_eq!(kept.len(), 5 + MAX_SOFT_COMMENTS);
        assert_eq!(
            kept.iter().filter(|f| f.severity == Severity::Blocker).count(),
            5
        );
    }

    #[test]
    fn test_truncation_prefers_higher_severity_soft_findings() {
        let mut findings = Vec::new();
        for i in 0..MAX_SOFT_COMMENTS {
            findings.push(Finding::from_ai("a.rs", i + 1, Severity::Info, format!("info {}", i)));
        }
        findings.push(Finding::from_ai("a.rs", 999, Severity::Major, "the real issue"));

        let (kept, omitted) = truncate_findings(findings);
        assert_eq!(omitted, 1);
        assert!(kept.iter().any(|f| f.severity == Severity::Major));
    }

    #[tokio::test]
    async fn test_single_call_when_under_batch_size() {
        let llm = ScriptedLlm::new(vec![
            r#"{"summary": "fine", "risk": "low", "merge_readiness": "approve", "comments": []}"#,
        ]);
        let files: Vec<ScoredFile> = (0..3).map(|i| scored(&format!("src/f{}.rs", i))).collect();
        let prompt = ReviewPrompt::new("t");

        let assessment = run_review(&llm, "gpt-4o-mini", &prompt, &files, true, 1, 7)
            .await
            .unwrap();

        assert_eq!(llm.calls.lock().unwrap().len(), 1);
        assert_eq!(assessment.risk, RiskLevel::Low);
        assert_eq!(assessment.merge_readiness, MergeReadiness::Approve);
        assert!(!assessment.fallback_used);
    }

    #[tokio::test]
    async fn test_batching_splits_and_final_batch_is_authoritative() {
        let llm = ScriptedLlm::new(vec![
            r#"{"summary": "batch one", "risk": "low", "merge_readiness": "approve", "comments": []}"#,
            r#"{"summary": "batch two", "risk": "high", "merge_readiness": "needs_work", "comments": []}"#,
        ]);
        let files: Vec<ScoredFile> = (0..BATCH_SIZE + 3)
            .map(|i| scored(&format!("src/f{}.rs", i)))
            .collect();
        let prompt = ReviewPrompt::new("t");

        let assessment = run_review(&llm, "gpt-4o", &prompt, &files, true, 1, 7)
            .await
            .unwrap();

        assert_eq!(llm.calls.lock().unwrap().len(), 2);
        assert_eq!(assessment.risk, RiskLevel::High);
        assert_eq!(assessment.merge_readiness, MergeReadiness::NeedsWork);
        assert!(assessment.summary.contains("batch one"));
        assert!(assessment.summary.contains("batch two"));
    }

    #[tokio::test]
    async fn test_no_batching_without_plan_permission() {
        let llm = ScriptedLlm::new(vec![
            r#"{"summary": "one shot", "risk": "medium", "merge_readiness": "needs_work", "comments": []}"#,
        ]);
        let files: Vec<ScoredFile> = (0..BATCH_SIZE + 5)
            .map(|i| scored(&format!("src/f{}.rs", i)))
            .collect();
        let prompt = ReviewPrompt::new("t");

        let assessment = run_review(&llm, "gpt-4o", &prompt, &files, false, 1, 7)
            .await
            .unwrap();

        assert_eq!(llm.calls.lock().unwrap().len(), 1);
        assert!(!assessment.fallback_used);
    }

    #[tokio::test]
    async fn test_unparseable_batch_yields_fallback() {
        let llm = ScriptedLlm::new(vec!["total nonsense, no json"]);
        let files = vec![scored("src/a.rs")];
        let prompt = ReviewPrompt::new("t");

        let assessment = run_review(&llm, "gpt-4o", &prompt, &files, true, 1, 7)
            .await
            .unwrap();

        assert!(assessment.fallback_used);
        assert_eq!(assessment.merge_readiness, MergeReadiness::Blocked);
        assert_eq!(assessment.risk, RiskLevel::High);
        assert!(assessment.findings.is_empty());
    }

    #[tokio::test]
    async fn test_findings_are_keyed_and_normalized() {
        let llm = ScriptedLlm::new(vec![
            r#"{"summary": "s", "risk": "medium", "merge_readiness": "needs_work",
                "comments": [{"file": "src/a.rs", "line": 4, "severity": "CRITICAL",
                              "message": "please rename this function"}]}"#,
        ]);
        let files = vec![scored("src/a.rs")];
        let prompt = ReviewPrompt::new("t");

        let assessment = run_review(&llm, "gpt-4o", &prompt, &files, true, 3, 9)
            .await
            .unwrap();

        assert_eq!(assessment.findings.len(), 1);
        let finding = &assessment.findings[0];
        assert_eq!(finding.severity, Severity::Major);
        assert_eq!(finding.issue_key.len(), 32);
    }
}
