//! PR complexity scoring
//!
//! A pure function of the filtered file set. The score is computed fresh on
//! every run, echoed into the result payload, and never persisted as
//! authoritative state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::score::ScoredFile;

/// Complexity classification used to pick model cost vs. depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    Trivial,
    Simple,
    Complex,
}

impl ComplexityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityTier::Trivial => "trivial",
            ComplexityTier::Simple => "simple",
            ComplexityTier::Complex => "complex",
        }
    }
}

impl std::fmt::Display for ComplexityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The individual inputs that produced a score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityFactors {
    pub file_count: usize,
    pub lines_changed: usize,
    /// Highest file risk score in the set
    pub file_risk: u8,
    /// Number of distinct file extensions touched
    pub language_diversity: usize,
    /// Files in high-risk categories (score >= 4)
    pub risk_patterns: usize,
}

/// A scored complexity assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityScore {
    /// 0..=10
    pub score: u8,
    pub tier: ComplexityTier,
    pub reason: String,
    pub factors: ComplexityFactors,
}

/// Score the complexity of a filtered file set
pub fn score_complexity(files: &[ScoredFile]) -> ComplexityScore {
    let file_count = files.len();
    let lines_changed: usize = files.iter().map(|f| f.file.lines_changed()).sum();
    let file_risk = files.iter().map(|f| f.score).max().unwrap_or(0);
    let language_diversity = files
        .iter()
        .filter_map(|f| f.file.extension())
        .collect::<BTreeSet<_>>()
        .len();
    let risk_patterns = files.iter().filter(|f| f.score >= 4).count();

    let mut score = 0u8;
    let mut reasons: Vec<String> = Vec::new();

    score += match file_count {
        0..=2 => 0,
        3..=8 => 1,
        9..=20 => 2,
        _ => 3,
    };
    if file_count > 8 {
        reasons.push(format!("{} files changed", file_count));
    }

    score += match lines_changed {
        0..=50 => 0,
        51..=250 => 1,
        251..=800 => 2,
        _ => 3,
    };
    if lines_changed > 250 {
        reasons.push(format!("{} lines changed", lines_changed));
    }

    score += match file_risk {
        5 => 2,
        4 => 1,
        _ => 0,
    };
    if file_risk >= 4 {
        reasons.push("high-risk paths touched".to_string());
    }

    if language_diversity > 2 {
        score += 1;
        reasons.push(format!("{} languages involved", language_diversity));
    }

    if risk_patterns > 1 {
        score += 1;
        reasons.push(format!("{} infra or security files", risk_patterns));
    }

    let score = score.min(10);
    let tier = match score {
        0..=2 => ComplexityTier::Trivial,
        3..=5 => ComplexityTier::Simple,
        _ => ComplexityTier::Complex,
    };

    let reason = if reasons.is_empty() {
        format!("small change ({} files, {} lines)", file_count, lines_changed)
    } else {
        reasons.join(", ")
    };

    ComplexityScore {
        score,
        tier,
        reason,
        factors: ComplexityFactors {
            file_count,
            lines_changed,
            file_risk,
            language_diversity,
            risk_patterns,
        },
    }
}
