//! Worker pool - fixed set of tasks running trials through the oracle

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use lockpick_common::{Candidate, LockpickError, LockpickResult, Oracle, Trial, TrialOutcome};

use crate::run_state::RunState;

struct Job {
    trial: Trial,
    reply: oneshot::Sender<TrialOutcome>,
}

/// Result of one bounded wait on a [`TrialHandle`].
#[derive(Debug, PartialEq, Eq)]
pub enum HandlePoll {
    Ready(TrialOutcome),
    Pending,
    /// The trial was dropped without running because the run had stopped.
    Abandoned,
}

/// Pending result of one submitted trial.
pub struct TrialHandle {
    candidate: Candidate,
    rx: oneshot::Receiver<TrialOutcome>,
}

impl TrialHandle {
    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    /// Wait at most `wait` for the outcome.
    pub async fn wait_for(&mut self, wait: Duration) -> HandlePoll {
        match timeout(wait, &mut self.rx).await {
            Ok(Ok(outcome)) => HandlePoll::Ready(outcome),
            Ok(Err(_)) => HandlePoll::Abandoned,
            Err(_) => HandlePoll::Pending,
        }
    }
}

pub struct WorkerPool {
    sender: Option<mpsc::UnboundedSender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers sharing one job queue.
    ///
    /// Workers skip queued jobs once `state` stops running; a trial that
    /// has already started runs to completion (bounded by the oracle's
    /// own timeout).
    pub fn spawn(size: usize, oracle: Arc<dyn Oracle>, state: Arc<RunState>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel::<Job>();
        let queue = Arc::new(Mutex::new(receiver));

        let workers = (0..size.max(1))
            .map(|id| {
                let queue = queue.clone();
                let oracle = oracle.clone();
                let state = state.clone();

                tokio::spawn(async move {
                    loop {
                        let job = {
                            let mut q = queue.lock().await;
                            q.recv().await
                        };
                        let Some(job) = job else { break };

                        if !state.is_running() || job.reply.is_closed() {
                            trace!(worker = id, "Skipping queued trial, run stopped");
                            continue;
                        }

                        let outcome = oracle
                            .try_candidate(job.trial.archive(), job.trial.password())
                            .await;
                        // scheduler may have moved on; nobody to tell
                        let _ = job.reply.send(outcome);
                    }
                    debug!(worker = id, "Worker exiting");
                })
            })
            .collect();

        Self {
            sender: Some(sender),
            workers,
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queue a trial. Each submitted trial runs at most once.
    pub fn submit(&self, trial: Trial) -> LockpickResult<TrialHandle> {
        let sender = self.sender.as_ref().ok_or(LockpickError::Cancelled)?;
        let (reply, rx) = oneshot::channel();
        let candidate = trial.candidate.clone();
        sender
            .send(Job { trial, reply })
            .map_err(|_| LockpickError::Cancelled)?;
        Ok(TrialHandle { candidate, rx })
    }

    /// Close the queue and wait for in-flight trials to finish naturally.
    pub async fn shutdown(mut self) {
        drop(self.sender.take());
        for worker in self.workers.drain(..) {
            if let Err(e) = worker.await {
                warn!("Worker task failed: {}", e);
            }
        }
    }
}
