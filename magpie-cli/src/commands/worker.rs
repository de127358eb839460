//! Worker command - process queued review jobs
//!
//! Reads line-delimited JSON jobs from stdin and feeds them through the
//! worker pool. Webhook ingestion lives outside this binary; anything that
//! can write a job line can drive the pool.

use std::sync::Arc;

use async_trait::async_trait;
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};

use magpie_core::config::Config;
use magpie_core::pipeline::ReviewPipeline;
use magpie_core::queue::{Job, JobHandler, JobQueue};
use magpie_core::Result;

use super::build_pipeline;

/// Arguments for the worker command
#[derive(Args, Debug)]
pub struct WorkerArgs {
    /// Number of concurrent workers
    #[arg(short, long, default_value = "2")]
    pub workers: usize,

    /// Queue capacity before submission blocks
    #[arg(long, default_value = "64")]
    pub capacity: usize,
}

struct PipelineHandler {
    pipeline: ReviewPipeline,
}

#[async_trait]
impl JobHandler for PipelineHandler {
    async fn handle(&self, job: Job) -> Result<()> {
        match job {
            Job::Review(review) => {
                self.pipeline.run(&review).await?;
                Ok(())
            }
            Job::Indexing { repository } => {
                tracing::info!(repository = %repository, "indexing requested; no retriever configured");
                Ok(())
            }
            Job::Chat { repository, pr_number, .. } => {
                tracing::info!(
                    repository = %repository,
                    pr = pr_number,
                    "chat requested; not supported by this worker"
                );
                Ok(())
            }
        }
    }
}

impl WorkerArgs {
    /// Execute the worker command
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let pipeline = build_pipeline(config).await?;
        let handler = Arc::new(PipelineHandler { pipeline });
        let queue = JobQueue::start(handler, self.workers, self.capacity);

        if verbose {
            tracing::info!(workers = self.workers, "Worker pool started, reading jobs from stdin");
        }
        println!("Reading jobs from stdin, one JSON object per line. Ctrl-D to stop.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut submitted = 0usize;

        while let Some(line) = lines.next_line().await? {
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Job>(&line) {
                Ok(job) => {
                    queue.submit(job).await?;
                    submitted += 1;
                }
                Err(e) => {
                    eprintln!("skipping malformed job line: {}", e);
                }
            }
        }

        queue.shutdown().await;
        println!("Processed {} job(s).", submitted);
        Ok(())
    }
}
