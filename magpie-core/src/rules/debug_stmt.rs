//! Leftover debug statement detection

use super::{Detector, RuleContext};
use crate::findings::{Finding, Severity};
use crate::Result;

/// Flags debug printing left in added code
pub struct DebugStatementRule;

const RULE_ID: &str = "no-debug-statements";

const MARKERS: &[&str] = &[
    "console.log(",
    "console.debug(",
    "dbg!(",
    "println!(\"DEBUG",
    "print(\"DEBUG",
    "fmt.Println(",
    "binding.pry",
    "debugger;",
    "pdb.set_trace()",
];

impl Detector for DebugStatementRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn severity(&self) -> Severity {
        Severity::Minor
    }

    fn applies_to(&self) -> &'static [&'static str] {
        &[
            "**/*.rs", "**/*.ts", "**/*.tsx", "**/*.js", "**/*.jsx", "**/*.py", "**/*.go",
            "**/*.rb",
        ]
    }

    fn detect(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for scored in ctx.applicable_files(self.applies_to()) {
            // Test files legitimately print; skip them.
            if crate::score::is_test(&scored.file.path.to_ascii_lowercase()) {
                continue;
            }
            for added in &scored.file.additions {
                let trimmed = added.content.trim_start();
                if trimmed.starts_with("//") || trimmed.starts_with('#') {
                    continue;
                }
                if MARKERS.iter().any(|m| trimmed.contains(m)) {
                    findings.push(
                        Finding::from_rule(
                            RULE_ID,
                            &scored.file.path,
                            added.line_number,
                            self.severity(),
                            "Debug statement left in production code",
                        )
                        .with_fix("Remove the statement or replace it with structured logging."),
                    );
                }
            }
        }
        Ok(findings)
    }
}
