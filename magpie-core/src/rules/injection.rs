//! SQL injection heuristics

use regex::Regex;

use super::{Detector, RuleContext};
use crate::findings::{Finding, Severity};
use crate::Result;

/// Flags raw SQL assembled with string interpolation or concatenation
pub struct SqlInjectionRule;

const RULE_ID: &str = "sql-injection";

fn has_sql_keyword(line: &str) -> bool {
    let upper = line.to_ascii_uppercase();
    ["SELECT ", "INSERT ", "UPDATE ", "DELETE ", "WHERE "]
        .iter()
        .any(|kw| upper.contains(kw))
}

impl Detector for SqlInjectionRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn applies_to(&self) -> &'static [&'static str] {
        &[
            "**/*.rs", "**/*.ts", "**/*.tsx", "**/*.js", "**/*.jsx", "**/*.py", "**/*.go",
            "**/*.java", "**/*.rb", "**/*.php", "**/*.sql",
        ]
    }

    fn detect(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>> {
        // Interpolation markers across the supported languages.
        let interpolation = Regex::new(r#"(format!\s*\(|\$\{|%s|\{\}.*\.format\(|f["'])"#)
            .map_err(|e| crate::Error::Other(e.to_string()))?;
        let concat = Regex::new(r#"["']\s*\+|\+\s*["']"#)
            .map_err(|e| crate::Error::Other(e.to_string()))?;

        let mut findings = Vec::new();
        for scored in ctx.applicable_files(self.applies_to()) {
            for added in &scored.file.additions {
                let line = &added.content;
                if !has_sql_keyword(line) {
                    continue;
                }
                if interpolation.is_match(line) || concat.is_match(line) {
                    findings.push(
                        Finding::from_rule(
                            RULE_ID,
                            &scored.file.path,
                            added.line_number,
                            self.severity(),
                            "Raw SQL built with string interpolation or concatenation",
                        )
                        .with_why(
                            "Untrusted input spliced into a query string allows SQL injection."
                                .to_string(),
                        )
                        .with_fix("Use parameterized queries with bound arguments."),
                    );
                }
            }
        }
        Ok(findings)
    }
}
