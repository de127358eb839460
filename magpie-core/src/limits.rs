//! Rate-limit and plan-cap gates
//!
//! Three independent gates run before any model call: cooldown, per-PR cap,
//! and the trailing-24h daily cap. Each denial carries a computed reset
//! timestamp. Denials are not failures; the pipeline turns them into a
//! completed review with an explanatory result.

use chrono::{DateTime, Duration, Utc};
use magpie_db::UsageSnapshot;
use serde::{Deserialize, Serialize};

use crate::plan::PlanLimits;

/// Safety margin added to reset timestamps so clients retrying exactly at
/// `reset_at` do not race the window edge.
pub const RESET_BUFFER_SECS: i64 = 60;

/// A typed gate denial with the moment capacity frees up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "gate", rename_all = "snake_case")]
pub enum LimitDenial {
    /// The PR was reviewed too recently
    Cooldown { reset_at: DateTime<Utc> },
    /// This PR has used up its review allowance
    PerPrCap { used: u32, limit: u32 },
    /// The installation hit its daily review cap
    DailyCap {
        reset_at: DateTime<Utc>,
        used: u32,
        limit: u32,
    },
}

impl LimitDenial {
    /// Human-readable explanation for the review result payload
    pub fn message(&self) -> String {
        match self {
            LimitDenial::Cooldown { reset_at } => format!(
                "Review skipped: cooldown active for this PR. Next review available at {}.",
                reset_at.to_rfc3339()
            ),
            LimitDenial::PerPrCap { used, limit } => format!(
                "Review skipped: this PR has used {} of {} allowed reviews.",
                used, limit
            ),
            LimitDenial::DailyCap {
                reset_at,
                used,
                limit,
            } => format!(
                "Review skipped: daily limit reached ({} of {}). Capacity frees up at {}.",
                used,
                limit,
                reset_at.to_rfc3339()
            ),
        }
    }
}

/// Evaluate every gate against a usage snapshot
///
/// The first failing gate is returned; the caller records a usage row only
/// after all gates pass.
pub fn evaluate_gates(
    limits: &PlanLimits,
    snapshot: &UsageSnapshot,
    now: DateTime<Utc>,
) -> Result<(), LimitDenial> {
    // Gate 1: cooldown for this exact (repository, PR).
    if let Some(last_run) = snapshot.last_run_for_pr {
        let reset_at = last_run + Duration::minutes(limits.cooldown_minutes);
        if now < reset_at {
            return Err(LimitDenial::Cooldown { reset_at });
        }
    }

    // Gate 2: lifetime per-PR cap.
    let used_for_pr = snapshot.runs_for_pr.max(0) as u32;
    if used_for_pr >= limits.reviews_per_pr {
        return Err(LimitDenial::PerPrCap {
            used: used_for_pr,
            limit: limits.reviews_per_pr,
        });
    }

    // Gate 3: trailing-24h installation cap. The reset is when the Nth-newest
    // run ages out of the window, so capacity frees up incrementally instead
    // of in a single daily cliff.
    let window_used = snapshot.window_runs.len() as u32;
    if window_used >= limits.daily_reviews_limit {
        // A zero limit has no run to age out; capacity never frees within
        // the window, so the reset anchors to now instead.
        let reset_at = (limits.daily_reviews_limit as usize)
            .checked_sub(1)
            .and_then(|i| snapshot.window_runs.get(i).copied())
            .unwrap_or(now)
            + Duration::hours(24)
            + Duration::seconds(RESET_BUFFER_SECS);
        return Err(LimitDenial::DailyCap {
            reset_at,
            used: window_used,
            limit: limits.daily_reviews_limit,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{PlanLimits, PlanTier};

    fn limits() -> PlanLimits {
        PlanLimits {
            cooldown_minutes: 15,
            reviews_per_pr: 5,
            daily_reviews_limit: 3,
            ..PlanLimits::for_tier(PlanTier::Pro)
        }
    }

    #[test]
    fn test_empty_snapshot_passes() {
        let now = Utc::now();
        assert!(evaluate_gates(&limits(), &UsageSnapshot::default(), now).is_ok());
    }

    #[test]
    fn test_cooldown_denies_with_reset() {
        let now = Utc::now();
        let snapshot = UsageSnapshot {
            last_run_for_pr: Some(now - Duration::minutes(5)),
            runs_for_pr: 1,
            window_runs: vec![now - Duration::minutes(5)],
        };

        match evaluate_gates(&limits(), &snapshot, now) {
            Err(LimitDenial::Cooldown { reset_at }) => {
                assert_eq!(reset_at, now - Duration::minutes(5) + Duration::minutes(15));
            }
            other => panic!("expected cooldown denial, got {:?}", other),
        }
    }

    #[test]
    fn test_cooldown_expired_passes() {
        let now = Utc::now();
        let snapshot = UsageSnapshot {
            last_run_for_pr: Some(now - Duration::minutes(16)),
            runs_for_pr: 1,
            window_runs: vec![now - Duration::minutes(16)],
        };
        assert!(evaluate_gates(&limits(), &snapshot, now).is_ok());
    }

    #[test]
    fn test_per_pr_cap() {
        let now = Utc::now();
        let snapshot = UsageSnapshot {
            last_run_for_pr: Some(now - Duration::hours(2)),
            runs_for_pr: 5,
            window_runs: vec![now - Duration::hours(2)],
        };

        match evaluate_gates(&limits(), &snapshot, now) {
            Err(LimitDenial::PerPrCap { used, limit }) => {
                assert_eq!(used, 5);
                assert_eq!(limit, 5);
            }
            other => panic!("expected per-PR denial, got {:?}", other),
        }
    }

    #[test]
    fn test_daily_cap_reset_is_oldest_plus_window() {
        // dailyReviewsLimit = 3 with runs at t0 < t1 < t2, all within 24h:
        // a request at t2 + 1s is denied with reset_at = t0 + 24h + buffer.
        let t0 = Utc::now() - Duration::hours(10);
        let t1 = t0 + Duration::hours(1);
        let t2 = t0 + Duration::hours(2);
        let now = t2 + Duration::seconds(1);

        let snapshot = UsageSnapshot {
            last_run_for_pr: None,
            runs_for_pr: 0,
            window_runs: vec![t2, t1, t0],
        };

        match evaluate_gates(&limits(), &snapshot, now) {
            Err(LimitDenial::DailyCap { reset_at, used, limit }) => {
                assert_eq!(used, 3);
                assert_eq!(limit, 3);
                assert_eq!(
                    reset_at,
                    t0 + Duration::hours(24) + Duration::seconds(RESET_BUFFER_SECS)
                );
            }
            other => panic!("expected daily denial, got {:?}", other),
        }
    }

    #[test]
    fn test_daily_cap_frees_incrementally() {
        // With 4 runs in the window and a limit of 3, capacity frees when the
        // 3rd-newest run ages out, not when the very oldest does.
        let t0 = Utc::now() - Duration::hours(20);
        let t1 = t0 + Duration::hours(1);
        let t2 = t0 + Duration::hours(2);
        let t3 = t0 + Duration::hours(3);

        let snapshot = UsageSnapshot {
            last_run_for_pr: None,
            runs_for_pr: 0,
            window_runs: vec![t3, t2, t1, t0],
        };

        match evaluate_gates(&limits(), &snapshot, t3 + Duration::seconds(1)) {
            Err(LimitDenial::DailyCap { reset_at, .. }) => {
                assert_eq!(
                    reset_at,
                    t1 + Duration::hours(24) + Duration::seconds(RESET_BUFFER_SECS)
                );
            }
            other => panic!("expected daily denial, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_daily_limit_denies_without_panicking() {
        let now = Utc::now();
        let limits = PlanLimits {
            daily_reviews_limit: 0,
            ..limits()
        };

        match evaluate_gates(&limits, &UsageSnapshot::default(), now) {
            Err(LimitDenial::DailyCap { reset_at, used, limit }) => {
                assert_eq!(used, 0);
                assert_eq!(limit, 0);
                assert!(reset_at > now);
            }
            other => panic!("expected daily denial, got {:?}", other),
        }
    }

    #[test]
    fn test_request_after_reset_is_accepted() {
        // Mirror of the denial case: once t0 has aged out of the window the
        // snapshot no longer contains it and the gate passes.
        let now = Utc::now();
        let t1 = now - Duration::hours(23);
        let t2 = now - Duration::hours(22);

        let snapshot = UsageSnapshot {
            last_run_for_pr: None,
            runs_for_pr: 0,
            window_runs: vec![t2, t1],
        };
        assert!(evaluate_gates(&limits(), &snapshot, now).is_ok());
    }

    #[test]
    fn test_denial_messages_are_explanatory() {
        let denial = LimitDenial::PerPrCap { used: 5, limit: 5 };
        assert!(denial.message().contains("5 of 5"));

        let denial = LimitDenial::Cooldown { reset_at: Utc::now() };
        assert!(denial.message().contains("cooldown"));
    }
}
