//! Deterministic static rule engine
//!
//! A fixed registry of independent detectors runs over the full static file
//! set. Detectors are cheap relative to model calls, so they see every file
//! the ignore globs let through, including docs and tests. A failing detector
//! is logged and skipped; it never aborts the run.

mod debug_stmt;
mod duplicate;
mod injection;
mod oversized;
mod secrets;

use glob::Pattern;
use tracing::{debug, warn};

use crate::findings::{Finding, Severity};
use crate::score::ScoredFile;
use crate::Result;

pub use debug_stmt::DebugStatementRule;
pub use duplicate::DuplicateLogicRule;
pub use injection::SqlInjectionRule;
pub use oversized::OversizedChangeRule;
pub use secrets::HardcodedSecretRule;

/// Everything a detector may inspect for one run
pub struct RuleContext<'a> {
    pub repository_id: i64,
    pub pr_number: i64,
    /// The filtered static file set, in diff order
    pub files: &'a [ScoredFile],
}

impl<'a> RuleContext<'a> {
    /// Files matching the detector's `applies_to` globs
    pub fn applicable_files(&self, globs: &[&str]) -> Vec<&'a ScoredFile> {
        let patterns: Vec<Pattern> = globs.iter().filter_map(|g| Pattern::new(g).ok()).collect();
        self.files
            .iter()
            .filter(|f| patterns.iter().any(|p| p.matches(&f.file.path)))
            .collect()
    }
}

/// A deterministic detector with a stable rule ID
pub trait Detector: Send + Sync {
    /// Stable rule identifier, carried verbatim on every finding
    fn id(&self) -> &'static str;

    /// Default severity for this rule's findings
    fn severity(&self) -> Severity;

    /// Path globs this detector applies to
    fn applies_to(&self) -> &'static [&'static str];

    /// Run the detector; an error means "skip this rule", never "abort"
    fn detect(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>>;
}

/// Build the static detector registry
///
/// The list is fixed at startup; detectors are not discovered at runtime.
pub fn registry() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(HardcodedSecretRule),
        Box::new(SqlInjectionRule),
        Box::new(DebugStatementRule),
        Box::new(OversizedChangeRule),
        Box::new(DuplicateLogicRule),
    ]
}

/// Run all applicable detectors and concatenate their findings
///
/// Every finding comes back with its issue key already computed for the
/// context's PR.
pub fn run_rules(ctx: &RuleContext<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();

    for detector in registry() {
        match detector.detect(ctx) {
            Ok(mut batch) => {
                debug!(rule = detector.id(), count = batch.len(), "detector finished");
                findings.append(&mut batch);
            }
            Err(e) => {
                warn!(rule = detector.id(), error = %e, "detector failed, skipping");
            }
        }
    }

    findings
        .into_iter()
        .map(|f| f.keyed(ctx.repository_id, ctx.pr_number))
        .collect()
}
