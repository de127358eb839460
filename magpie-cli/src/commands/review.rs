//! Review command - run one review against a pull request

use clap::Args;
use magpie_core::config::Config;
use magpie_core::job::ReviewJob;
use magpie_core::pipeline::RunOutcome;

use super::{build_pipeline, github_client};

/// Arguments for the review command
#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// Pull request number to review
    #[arg(short, long)]
    pub pr: u64,

    /// Installation (tenant) identifier for usage accounting
    #[arg(long, default_value = "1")]
    pub installation_id: i64,

    /// Print the result payload as JSON
    #[arg(long)]
    pub json: bool,
}

impl ReviewArgs {
    /// Execute the review command
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let github = github_client(config)?;

        // The numeric repository id anchors review rows and finding keys.
        let repo_info = github
            .client()
            .repos(github.owner(), github.repo())
            .get()
            .await?;
        let repository_id = repo_info.id.0 as i64;

        let pr = github.get_pr(self.pr).await?;
        if verbose {
            tracing::info!(
                pr = self.pr,
                title = %pr.title,
                head = %pr.head_sha,
                "Fetched pull request"
            );
        }

        let job = ReviewJob::new(
            self.installation_id,
            repository_id,
            format!("{}/{}", github.owner(), github.repo()),
            self.pr as i64,
        )
        .with_title(&pr.title)
        .with_body(&pr.body)
        .with_shas(&pr.head_sha, &pr.base_sha)
        .with_delivery_id(format!("cli-{}", chrono::Utc::now().timestamp()));

        let pipeline = build_pipeline(config).await?;
        let result = pipeline.run(&job).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        match result.outcome {
            RunOutcome::Reviewed => {
                println!("Review posted for PR #{}", self.pr);
                if let Some(complexity) = &result.complexity {
                    println!("  complexity: {} ({}/10)", complexity.tier.as_str(), complexity.score);
                }
                if let Some(model) = &result.model {
                    println!("  model: {}", model);
                } else {
                    println!("  model: (static analysis only)");
                }
                println!("  static findings: {}", result.static_findings);
                println!("  ai findings: {}", result.ai_findings);
                if let Some(outcome) = &result.reconcile {
                    println!(
                        "  posted: {}, suppressed: {}, resolved: {}, dropped: {}",
                        outcome.posted, outcome.suppressed, outcome.resolved, outcome.invalid_dropped
                    );
                }
                if result.reduced_confidence {
                    println!("  note: reduced confidence (partial context or fallback output)");
                }
            }
            RunOutcome::Skipped | RunOutcome::Limited => {
                println!(
                    "{}",
                    result
                        .message
                        .unwrap_or_else(|| "Review did not run.".to_string())
                );
            }
        }

        Ok(())
    }
}
