//! Magpie Core - automated pull-request review
//!
//! This crate implements the review orchestration pipeline: diff parsing and
//! classification, static analysis rules, complexity-based model routing,
//! plan and rate-limit enforcement, batched AI review with defensive output
//! handling, and idempotent reconciliation of findings into review comments.

pub mod ai;
pub mod complexity;
pub mod config;
pub mod context;
pub mod diff;
pub mod error;
pub mod filter;
pub mod findings;
pub mod job;
pub mod limits;
pub mod llm;
pub mod pipeline;
pub mod plan;
pub mod prompt;
pub mod queue;
pub mod reconcile;
pub mod router;
pub mod rules;
pub mod score;
pub mod vcs;

pub use config::Config;
pub use error::{Error, Result};
pub use findings::{Finding, Severity};
pub use job::ReviewJob;
pub use pipeline::{ReviewPipeline, ReviewResult, RunOutcome};
pub use plan::{PlanLimits, PlanTier};
