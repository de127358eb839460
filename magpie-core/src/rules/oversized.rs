//! Oversized contiguous addition detection

use super::{Detector, RuleContext};
use crate::findings::{Finding, Severity};
use crate::Result;

/// Flags single contiguous blocks of added code large enough to suggest an
/// unextracted function or pasted-in module
pub struct OversizedChangeRule;

const RULE_ID: &str = "oversized-addition";

/// Contiguous added lines above this count get flagged
const BLOCK_THRESHOLD: usize = 80;

impl Detector for OversizedChangeRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn severity(&self) -> Severity {
        Severity::Minor
    }

    fn applies_to(&self) -> &'static [&'static str] {
        &[
            "**/*.rs", "**/*.ts", "**/*.tsx", "**/*.js", "**/*.jsx", "**/*.py", "**/*.go",
            "**/*.java", "**/*.kt", "**/*.rb", "**/*.c", "**/*.cpp", "**/*.cs",
        ]
    }

    fn detect(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for scored in ctx.applicable_files(self.applies_to()) {
            // Whole-file additions are expected for new files.
            if scored.file.is_new {
                continue;
            }
            for (start, end) in contiguous_spans(&scored.file.additions) {
                let len = end - start + 1;
                if len > BLOCK_THRESHOLD {
                    findings.push(
                        Finding::from_rule(
                            RULE_ID,
                            &scored.file.path,
                            start,
                            self.severity(),
                            format!("{} consecutive added lines in one block", len),
                        )
                        .with_end_line(end)
                        .with_why(
                            "Large single blocks are hard to review and often hide \
                             extractable units."
                                .to_string(),
                        ),
                    );
                }
            }
        }
        Ok(findings)
    }
}

/// Collapse added lines into (start, end) runs of consecutive line numbers
fn contiguous_spans(additions: &[crate::diff::DiffLine]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut iter = additions.iter();
    let Some(first) = iter.next() else {
        return spans;
    };

    let mut start = first.line_number;
    let mut end = first.line_number;
    for line in iter {
        if line.line_number == end + 1 {
            end = line.line_number;
        } else {
            spans.push((start, end));
            start = line.line_number;
            end = line.line_number;
        }
    }
    spans.push((start, end));
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffLine;
    use crate::rules::tests::file_with_additions;

    #[test]
    fn test_contiguous_spans() {
        let additions: Vec<DiffLine> = [1, 2, 3, 7, 8, 20]
            .iter()
            .map(|n| DiffLine {
                line_number: *n,
                content: String::new(),
            })
            .collect();
        assert_eq!(contiguous_spans(&additions), vec![(1, 3), (7, 8), (20, 20)]);
    }

    #[test]
    fn test_flags_block_above_threshold() {
        let lines: Vec<(usize, String)> = (10..10 + BLOCK_THRESHOLD + 5)
            .map(|n| (n, format!("let x{} = {};", n, n)))
            .collect();
        let refs: Vec<(usize, &str)> = lines.iter().map(|(n, s)| (*n, s.as_str())).collect();
        let files = vec![file_with_additions("src/big.rs", &refs)];

        let ctx = RuleContext {
            repository_id: 1,
            pr_number: 1,
            files: &files,
        };
        let findings = OversizedChangeRule.detect(&ctx).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 10);
        assert!(findings[0].end_line.unwrap() > 10 + BLOCK_THRESHOLD);
    }

    #[test]
    fn test_small_blocks_pass() {
        let files = vec![file_with_additions(
            "src/small.rs",
            &[(1, "a"), (2, "b"), (3, "c")],
        )];
        let ctx = RuleContext {
            repository_id: 1,
            pr_number: 1,
            files: &files,
        };
        assert!(OversizedChangeRule.detect(&ctx).unwrap().is_empty());
    }
}
