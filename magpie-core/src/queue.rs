//! Job queue and worker pool
//!
//! Jobs are pulled from one channel by a small pool of tokio tasks. A job
//! occupies its worker for the whole run; there is no mid-job cancellation.
//! Handler errors are logged and absorbed so one bad job never takes a
//! worker down.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::job::ReviewJob;

/// The kinds of work the pool processes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Review,
    Indexing,
    Chat,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Review => "review",
            JobKind::Indexing => "indexing",
            JobKind::Chat => "chat",
        }
    }
}

/// One unit of queued work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Job {
    Review(ReviewJob),
    /// Re-index a repository for context retrieval
    Indexing { repository: String },
    /// Answer a question about a PR
    Chat {
        repository: String,
        pr_number: i64,
        question: String,
    },
}

impl Job {
    pub fn kind(&self) -> JobKind {
        match self {
            Job::Review(_) => JobKind::Review,
            Job::Indexing { .. } => JobKind::Indexing,
            Job::Chat { .. } => JobKind::Chat,
        }
    }
}

/// Handles one job at a time on behalf of a worker
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: Job) -> Result<()>;
}

/// A bounded queue feeding a fixed pool of workers
pub struct JobQueue {
    tx: mpsc::Sender<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl JobQueue {
    /// Start `workers` tasks pulling from a queue with the given capacity
    pub fn start(handler: Arc<dyn JobHandler>, workers: usize, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel::<Job>(capacity);
        let rx = Arc::new(Mutex::new(rx));

        let handles = (0..workers.max(1))
            .map(|worker_id| {
                let rx = Arc::clone(&rx);
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    loop {
                        // Hold the lock only long enough to take one job.
                        let job = {
                            let mut rx = rx.lock().await;
                            rx.recv().await
                        };
                        let Some(job) = job else {
                            break;
                        };

                        let kind = job.kind();
                        if let Err(e) = handler.handle(job).await {
                            error!(worker = worker_id, kind = kind.as_str(), error = %e, "job failed");
                        }
                    }
                    info!(worker = worker_id, "worker stopped");
                })
            })
            .collect();

        Self {
            tx,
            workers: handles,
        }
    }

    /// Enqueue a job, waiting if the queue is full
    pub async fn submit(&self, job: Job) -> Result<()> {
        self.tx
            .send(job)
            .await
            .map_err(|_| Error::Other("job queue is shut down".to_string()))
    }

    /// Stop accepting jobs and wait for in-flight work to finish
    pub async fn shutdown(self) {
        drop(self.tx);
        for handle in self.workers {
            if let Err(e) = handle.await {
                error!(error = %e, "worker task panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        handled: AtomicUsize,
        fail_indexing: bool,
    }

    #[async_trait]
    impl JobHandler for CountingHandler {
        async fn handle(&self, job: Job) -> Result<()> {
            if self.fail_indexing && job.kind() == JobKind::Indexing {
                return Err(Error::Other("boom".to_string()));
            }
            self.handled.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn review_job() -> Job {
        Job::Review(ReviewJob::new(1, 2, "acme/widgets", 3))
    }

    #[tokio::test]
    async fn test_jobs_are_processed() {
        let handler = Arc::new(CountingHandler {
            handled: AtomicUsize::new(0),
            fail_indexing: false,
        });
        let queue = JobQueue::start(handler.clone(), 2, 8);

        for _ in 0..5 {
            queue.submit(review_job()).await.unwrap();
        }
        queue.shutdown().await;

        assert_eq!(handler.handled.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_handler_error_does_not_stop_workers() {
        let handler = Arc::new(CountingHandler {
            handled: AtomicUsize::new(0),
            fail_indexing: true,
        });
        let queue = JobQueue::start(handler.clone(), 1, 8);

        queue
            .submit(Job::Indexing {
                repository: "acme/widgets".to_string(),
            })
            .await
            .unwrap();
        queue.submit(review_job()).await.unwrap();
        queue.shutdown().await;

        // The failing indexing job was absorbed; the review job still ran.
        assert_eq!(handler.handled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_fails() {
        let handler = Arc::new(CountingHandler {
            handled: AtomicUsize::new(0),
            fail_indexing: false,
        });
        let queue = JobQueue::start(handler, 1, 2);
        let tx = queue.tx.clone();
        queue.shutdown().await;

        assert!(tx.send(review_job()).await.is_err());
    }

    #[test]
    fn test_job_kinds() {
        assert_eq!(review_job().kind(), JobKind::Review);
        assert_eq!(
            Job::Chat {
                repository: "a/b".to_string(),
                pr_number: 1,
                question: "why".to_string(),
            }
            .kind(),
            JobKind::Chat
        );
    }
}
