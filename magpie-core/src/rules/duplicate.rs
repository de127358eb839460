//! Cross-file duplicate logic detection
//!
//! Matching windows of added lines appearing in two or more files are
//! reported once, from a single canonical "leader" file: the
//! lexicographically first path in the duplicate group. Overlapping matched
//! ranges inside the leader are merged into one span before reporting, so a
//! contiguous duplicated block never produces fragmented findings.

use std::collections::BTreeSet;
use std::collections::HashMap;

use super::{Detector, RuleContext};
use crate::findings::{Finding, Severity};
use crate::Result;

/// Flags logic added verbatim in more than one file
pub struct DuplicateLogicRule;

const RULE_ID: &str = "duplicate-logic";

/// Number of consecutive meaningful lines that must match
const WINDOW: usize = 5;

/// A normalized added line that still carries its diff position
#[derive(Debug, Clone)]
struct CodeLine {
    line_number: usize,
    normalized: String,
}

/// Strip noise that should not defeat or fake a match
fn normalize(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.len() < 4 {
        return None;
    }
    if trimmed.starts_with("//")
        || trimmed.starts_with('#')
        || trimmed.starts_with("/*")
        || trimmed.starts_with('*')
    {
        return None;
    }
    // Brace/bracket-only lines match everywhere.
    if trimmed.chars().all(|c| "{}()[];,".contains(c)) {
        return None;
    }
    Some(trimmed.to_string())
}

impl Detector for DuplicateLogicRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn severity(&self) -> Severity {
        Severity::Major
    }

    fn applies_to(&self) -> &'static [&'static str] {
        &[
            "**/*.rs", "**/*.ts", "**/*.tsx", "**/*.js", "**/*.jsx", "**/*.py", "**/*.go",
            "**/*.java", "**/*.kt", "**/*.rb",
        ]
    }

    fn detect(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>> {
        let files = ctx.applicable_files(self.applies_to());

        // window content -> occurrences of (path, start_line, end_line)
        let mut windows: HashMap<String, Vec<(String, usize, usize)>> = HashMap::new();

        for scored in &files {
            let code: Vec<CodeLine> = scored
                .file
                .additions
                .iter()
                .filter_map(|l| {
                    normalize(&l.content).map(|normalized| CodeLine {
                        line_number: l.line_number,
                        normalized,
                    })
                })
                .collect();

            for chunk in code.windows(WINDOW) {
                let key = chunk
                    .iter()
                    .map(|l| l.normalized.as_str())
                    .collect::<Vec<_>>()
                    .join("\n");
                windows.entry(key).or_default().push((
                    scored.file.path.clone(),
                    chunk[0].line_number,
                    chunk[WINDOW - 1].line_number,
                ));
            }
        }

        // Leader file -> matched spans and the partner files involved.
        let mut leader_spans: HashMap<String, Vec<(usize, usize)>> = HashMap::new();
        let mut leader_partners: HashMap<String, BTreeSet<String>> = HashMap::new();

        for occurrences in windows.values() {
            let distinct: BTreeSet<&str> =
                occurrences.iter().map(|(path, _, _)| path.as_str()).collect();
            if distinct.len() < 2 {
                continue;
            }
            // Lexicographically first path reports for the whole group.
            let leader = distinct.iter().next().copied().unwrap_or_default().to_string();

            for (path, start, end) in occurrences {
                if *path == leader {
                    leader_spans
                        .entry(leader.clone())
                        .or_default()
                        .push((*start, *end));
                }
            }
            leader_partners
                .entry(leader.clone())
                .or_default()
                .extend(distinct.iter().filter(|p| **p != leader).map(|p| p.to_string()));
        }

        let mut findings = Vec::new();
        let mut leaders: Vec<&String> = leader_spans.keys().collect();
        leaders.sort();

        for leader in leaders {
            let partners = leader_partners
                .get(leader)
                .map(|set| set.iter().cloned().collect::<Vec<_>>().join(", "))
                .unwrap_or_default();

            for (start, end) in merge_spans(leader_spans[leader].clone()) {
                findings.push(
                    Finding::from_rule(
                        RULE_ID,
                        leader,
                        start,
                        self.severity(),
                        format!("Added code duplicates logic also added in: {}", partners),
                    )
                    .with_end_line(end)
                    .with_fix("Extract the shared logic into one helper both call sites use."),
                );
            }
        }

        Ok(findings)
    }
}

/// Merge overlapping or adjacent (start, end) spans into maximal ranges
fn merge_spans(mut spans: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    if spans.is_empty() {
        return spans;
    }
    spans.sort_unstable();

    let mut merged: Vec<(usize, usize)> = vec![spans[0]];
    for (start, end) in spans.into_iter().skip(1) {
        match merged.last_mut() {
            Some(last) if start <= last.1 + 1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}
