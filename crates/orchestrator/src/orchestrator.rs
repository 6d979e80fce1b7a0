// crates/orchestrator/src/orchestrator.rs
//! Orchestrator - batch scheduling and winner detection

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use lockpick_common::{
    EngineSettings, LockpickError, LockpickResult, MemoryProbe, Oracle, RunOutcome, RunReport,
    Trial, TrialOutcome, StopReason,
};

use crate::candidates::{count_candidates, CandidateReader};
use crate::governor::{DeadlineTimer, MemoryGovernor, SysinfoProbe};
use crate::pool::{HandlePoll, TrialHandle, WorkerPool};
use crate::run_state::RunState;

/// How the scheduling loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopExit {
    Exhausted,
    Halted,
}

/// Orchestrator streams the candidate list through the worker pool in
/// batches and stops at the first successful trial.
///
/// One orchestrator drives exactly one run: [`Orchestrator::run`] consumes it.
pub struct Orchestrator {
    id: Uuid,
    settings: EngineSettings,
    oracle: Arc<dyn Oracle>,
    memory_probe: Arc<dyn MemoryProbe>,
    state: Arc<RunState>,
}

impl Orchestrator {
    pub fn new(settings: EngineSettings, oracle: Arc<dyn Oracle>) -> Self {
        Self {
            id: Uuid::new_v4(),
            settings,
            oracle,
            memory_probe: Arc::new(SysinfoProbe::new()),
            state: Arc::new(RunState::new()),
        }
    }

    /// Replace the process memory probe (tests use a fixed value).
    pub fn with_memory_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.memory_probe = probe;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Shared state of the upcoming run: progress snapshots and stop requests.
    pub fn state(&self) -> Arc<RunState> {
        self.state.clone()
    }

    /// Try every candidate in `passwords` against `archive`.
    ///
    /// Missing inputs fail before any worker starts. Everything that goes
    /// wrong inside a single trial is absorbed and counted.
    #[instrument(skip_all, fields(run = %self.id))]
    pub async fn run(self, archive: &Path, passwords: &Path) -> LockpickResult<RunReport> {
        if !archive.exists() {
            return Err(LockpickError::archive_not_found(archive));
        }
        if !passwords.exists() {
            return Err(LockpickError::password_file_not_found(passwords));
        }

        let started = Instant::now();
        let total = count_candidates(passwords).await?;
        self.state.progress().set_total(total);

        info!("Starting password cracking with {} passwords", total);
        info!(
            "Using {} workers with batch size {} ({})",
            self.settings.workers,
            self.settings.batch_size,
            self.oracle.name()
        );

        let mut deadline = DeadlineTimer::arm(self.settings.deadline, self.state.clone());
        let governor = MemoryGovernor::new(
            self.memory_probe.clone(),
            self.settings.memory_limit,
            self.settings.memory_backoff,
        );
        let pool = WorkerPool::spawn(
            self.settings.workers,
            self.oracle.clone(),
            self.state.clone(),
        );

        let archive = Arc::new(archive.to_path_buf());
        let exit = self.schedule(&pool, &governor, archive, passwords).await;

        deadline.cancel();
        self.state.halt();
        pool.shutdown().await;

        let outcome = self.finalize(exit?);
        self.state.progress().print_summary(&outcome);

        Ok(RunReport {
            run_id: self.id,
            outcome,
            progress: self.state.progress().snapshot(),
            elapsed: started.elapsed(),
        })
    }

    async fn schedule(
        &self,
        pool: &WorkerPool,
        governor: &MemoryGovernor,
        archive: Arc<PathBuf>,
        passwords: &Path,
    ) -> LockpickResult<LoopExit> {
        let mut reader = CandidateReader::open(passwords).await?;
        let mut error_streak = 0usize;
        let mut batch_no = 0usize;

        loop {
            if !self.state.is_running() {
                return Ok(LoopExit::Halted);
            }
            governor.wait_for_headroom(&self.state).await;
            if !self.state.is_running() {
                return Ok(LoopExit::Halted);
            }

            let batch = reader.next_batch(self.settings.batch_size).await?;
            if batch.is_empty() {
                return Ok(LoopExit::Exhausted);
            }
            batch_no += 1;
            debug!(batch = batch_no, size = batch.len(), "Submitting batch");

            let handles = batch
                .into_iter()
                .map(|candidate| pool.submit(Trial::new(archive.clone(), candidate)))
                .collect::<LockpickResult<Vec<_>>>()?;

            if self.drain(handles, &mut error_streak).await == LoopExit::Halted {
                return Ok(LoopExit::Halted);
            }

            let snap = self.state.progress().snapshot();
            debug!(processed = snap.processed, total = snap.total, "Batch drained");
        }
    }

    /// Collect a batch's outcomes in submission order. Returns `Halted` as
    /// soon as a winner is found or the run is stopped; remaining handles
    /// are abandoned.
    async fn drain(&self, handles: Vec<TrialHandle>, error_streak: &mut usize) -> LoopExit {
        let poll = self.settings.poll_interval;

        for mut handle in handles {
            loop {
                match handle.wait_for(poll).await {
                    HandlePoll::Ready(outcome) => {
                        self.state.progress().record(&outcome);
                        match outcome {
                            TrialOutcome::Success(password) => {
                                if self.state.declare_winner(password) {
                                    info!("Password accepted: {}", handle.candidate());
                                } else {
                                    debug!("Duplicate success for {} discarded", handle.candidate());
                                }
                                return LoopExit::Halted;
                            }
                            TrialOutcome::Failure => *error_streak = 0,
                            TrialOutcome::TransientError(reason) => {
                                *error_streak += 1;
                                debug!("Trial for {} failed: {}", handle.candidate(), reason);
                                self.check_error_streak(*error_streak);
                            }
                        }
                        break;
                    }
                    HandlePoll::Pending => {
                        if !self.state.is_running() {
                            return LoopExit::Halted;
                        }
                    }
                    HandlePoll::Abandoned => break,
                }
            }

            if !self.state.is_running() {
                return LoopExit::Halted;
            }
        }

        LoopExit::Exhausted
    }

    fn check_error_streak(&self, streak: usize) {
        let limit = self.settings.max_consecutive_errors;
        if limit > 0 && streak >= limit {
            warn!("{} consecutive trial errors, giving up", streak);
            self.state.stop(StopReason::ErrorLimit);
        }
    }

    fn finalize(&self, exit: LoopExit) -> RunOutcome {
        if let Some(password) = self.state.winner() {
            return RunOutcome::Found(password.to_string());
        }
        match exit {
            LoopExit::Exhausted => RunOutcome::NotFound,
            LoopExit::Halted => {
                let reason = self.state.stop_reason().unwrap_or(StopReason::ExternalRequest);
                info!("Stopping password cracking process ({})", reason);
                RunOutcome::Stopped(reason)
            }
        }
    }
}
