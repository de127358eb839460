//! Plan tiers and the limits they derive
//!
//! `PlanLimits` is a pure function of `(tier, expires_at)`. An expired plan
//! collapses to the Free tier; nothing else about expiry is handled here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tenant's subscription level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Pro => "pro",
            PlanTier::Enterprise => "enterprise",
        }
    }

    /// Parse a plan identifier; unknown values fall back to Free
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "pro" => PlanTier::Pro,
            "enterprise" => PlanTier::Enterprise,
            _ => PlanTier::Free,
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Limits derived from a plan tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub tier: PlanTier,
    pub allow_ai: bool,
    pub allow_rag: bool,
    pub rag_k: usize,
    pub max_files: usize,
    pub max_repos: usize,
    pub chat_per_pr_limit: u32,
    pub daily_reviews_limit: u32,
    pub reviews_per_pr: u32,
    pub cooldown_minutes: i64,
    pub allow_custom_prompts: bool,
    /// Whether large PRs may be split into multiple AI batches
    pub allow_batching: bool,
}

impl PlanLimits {
    /// Derive limits for a plan, collapsing expired plans to Free
    pub fn for_plan(tier: PlanTier, expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let effective = match expires_at {
            Some(expiry) if expiry <= now => PlanTier::Free,
            _ => tier,
        };
        Self::for_tier(effective)
    }

    /// Limits for an unexpired tier
    pub fn for_tier(tier: PlanTier) -> Self {
        match tier {
            PlanTier::Free => Self {
                tier,
                allow_ai: false,
                allow_rag: false,
                rag_k: 0,
                max_files: 30,
                max_repos: 1,
                chat_per_pr_limit: 0,
                daily_reviews_limit: 10,
                reviews_per_pr: 3,
                cooldown_minutes: 15,
                allow_custom_prompts: false,
                allow_batching: false,
            },
            PlanTier::Pro => Self {
                tier,
                allow_ai: true,
                allow_rag: true,
                rag_k: 5,
                max_files: 75,
                max_repos: 10,
                chat_per_pr_limit: 25,
                daily_reviews_limit: 100,
                reviews_per_pr: 10,
                cooldown_minutes: 3,
                allow_custom_prompts: true,
                allow_batching: false,
            },
            PlanTier::Enterprise => Self {
                tier,
                allow_ai: true,
                allow_rag: true,
                rag_k: 10,
                max_files: 200,
                max_repos: 100,
                chat_per_pr_limit: 100,
                daily_reviews_limit: 1000,
                reviews_per_pr: 25,
                cooldown_minutes: 1,
                allow_custom_prompts: true,
                allow_batching: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_free_tier_has_no_ai() {
        let limits = PlanLimits::for_tier(PlanTier::Free);
        assert!(!limits.allow_ai);
        assert!(!limits.allow_rag);
        assert_eq!(limits.max_files, 30);
    }

    #[test]
    fn test_expired_plan_collapses_to_free() {
        let now = Utc::now();
        let limits = PlanLimits::for_plan(PlanTier::Enterprise, Some(now - Duration::days(1)), now);
        assert_eq!(limits.tier, PlanTier::Free);
        assert!(!limits.allow_ai);
    }

    #[test]
    fn test_unexpired_plan_keeps_tier() {
        let now = Utc::now();
        let limits = PlanLimits::for_plan(PlanTier::Pro, Some(now + Duration::days(30)), now);
        assert_eq!(limits.tier, PlanTier::Pro);
        assert!(limits.allow_ai);
    }

    #[test]
    fn test_no_expiry_keeps_tier() {
        let limits = PlanLimits::for_plan(PlanTier::Enterprise, None, Utc::now());
        assert_eq!(limits.tier, PlanTier::Enterprise);
        assert!(limits.allow_batching);
    }

    #[test]
    fn test_tier_parse_defaults_to_free() {
        assert_eq!(PlanTier::parse("Pro"), PlanTier::Pro);
        assert_eq!(PlanTier::parse("enterprise"), PlanTier::Enterprise);
        assert_eq!(PlanTier::parse("trial-2019"), PlanTier::Free);
    }

    #[test]
    fn test_batching_is_top_tier_only() {
        assert!(!PlanLimits::for_tier(PlanTier::Free).allow_batching);
        assert!(!PlanLimits::for_tier(PlanTier::Pro).allow_batching);
        assert!(PlanLimits::for_tier(PlanTier::Enterprise).allow_batching);
    }
}
