//! Bounded worker pool
//!
//! A fixed number of worker tasks pull jobs from one bounded channel and push
//! their outcomes into another. The pool itself knows nothing about crawling;
//! the coordinator decides what to submit and when.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

pub struct WorkerPool<J, O> {
    jobs: mpsc::Sender<J>,
    outcomes: mpsc::UnboundedReceiver<O>,
    workers: JoinSet<()>,
    size: usize,
}

impl<J, O> WorkerPool<J, O>
where
    J: Send + 'static,
    O: Send + 'static,
{
    /// Spawns `size` workers, each running `handler` on one job at a time
    ///
    /// # Arguments
    ///
    /// * `size` - Number of workers (clamped to at least 1)
    /// * `handler` - Async function turning a job into an outcome
    pub fn spawn<F, Fut>(size: usize, handler: F) -> Self
    where
        F: Fn(J) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
    {
        let size = size.max(1);
        let (job_tx, job_rx) = mpsc::channel::<J>(size);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let handler = Arc::new(handler);

        let mut workers = JoinSet::new();
        for worker_id in 0..size {
            let job_rx = Arc::clone(&job_rx);
            let outcome_tx = outcome_tx.clone();
            let handler = Arc::clone(&handler);

            workers.spawn(async move {
                loop {
                    let job = job_rx.lock().await.recv().await;
                    let Some(job) = job else { break };

                    if outcome_tx.send((*handler)(job).await).is_err() {
                        break;
                    }
                }
                tracing::trace!("Worker {} stopped", worker_id);
            });
        }

        Self {
            jobs: job_tx,
            outcomes: outcome_rx,
            workers,
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Hands a job to the next free worker
    ///
    /// Returns the job back if every worker has stopped.
    pub async fn submit(&self, job: J) -> Result<(), J> {
        self.jobs.send(job).await.map_err(|e| e.0)
    }

    /// Waits for the next finished job
    ///
    /// Returns `None` once every worker has stopped.
    pub async fn next_outcome(&mut self) -> Option<O> {
        self.outcomes.recv().await
    }

    /// Closes the job channel and waits for all workers to exit
    pub async fn shutdown(self) {
        let Self {
            jobs, mut workers, ..
        } = self;
        drop(jobs);

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("Worker task ended abnormally: {}", e);
            }
        }
    }
}
