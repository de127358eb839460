//! Magpie GitHub - GitHub integration for Magpie
//!
//! This crate provides GitHub API access for fetching PR diffs and linked
//! issues, and for submitting review comments. `GitHubClient` implements the
//! core crate's `VcsClient` seam.

mod client;
mod error;
mod issues;
mod pr;
mod review;
mod vcs;

pub use client::{parse_github_url, GitHubClient};
pub use error::{Error, Result};
pub use issues::Issue;
pub use pr::{PrState, PullRequest};
pub use review::{InlineComment, ReviewComment};
