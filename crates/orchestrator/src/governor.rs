//! Resource governor - run deadline and memory backpressure

use std::sync::{Arc, Mutex};
use std::time::Duration;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use lockpick_common::MemoryProbe;

use crate::run_state::RunState;

/// Memory re-checks before admitting the next batch anyway.
pub const MAX_BACKOFF_ROUNDS: usize = 10;

/// One-shot wall-clock timer that stops the run when it fires.
///
/// Dropping or cancelling the timer before it fires is a no-op for the run.
pub struct DeadlineTimer {
    handle: Option<JoinHandle<()>>,
}

impl DeadlineTimer {
    /// Arm the timer; `None` means the run is unbounded and nothing is spawned.
    pub fn arm(deadline: Option<Duration>, state: Arc<RunState>) -> Self {
        let handle = deadline.map(|after| {
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                if state.is_running() {
                    info!("Deadline of {:?} reached, stopping password cracking...", after);
                }
                state.expire_deadline();
            })
        });
        Self { handle }
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for DeadlineTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Advisory backpressure: delays new batches while RSS is over the ceiling.
pub struct MemoryGovernor {
    probe: Arc<dyn MemoryProbe>,
    limit: u64,
    backoff: Duration,
}

impl MemoryGovernor {
    pub fn new(probe: Arc<dyn MemoryProbe>, limit: u64, backoff: Duration) -> Self {
        Self { probe, limit, backoff }
    }

    pub fn under_pressure(&self) -> bool {
        self.limit > 0 && self.probe.current_usage() > self.limit
    }

    /// Wait until usage drops below the ceiling, the run stops, or
    /// [`MAX_BACKOFF_ROUNDS`] pauses have passed. Returns the pauses taken.
    pub async fn wait_for_headroom(&self, state: &RunState) -> usize {
        let mut rounds = 0;
        while rounds < MAX_BACKOFF_ROUNDS && state.is_running() && self.under_pressure() {
            warn!("Memory limit reached, waiting for cleanup...");
            tokio::time::sleep(self.backoff).await;
            rounds += 1;
        }
        if rounds == MAX_BACKOFF_ROUNDS && self.under_pressure() {
            warn!(
                "Memory still above {} bytes after {} pauses, continuing",
                self.limit, rounds
            );
        }
        rounds
    }
}

/// Resident set size of this process, via `sysinfo`.
pub struct SysinfoProbe {
    system: Mutex<System>,
    pid: Option<Pid>,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            pid: sysinfo::get_current_pid().ok(),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SysinfoProbe {
    fn current_usage(&self) -> u64 {
        let Some(pid) = self.pid else { return 0 };
        let Ok(mut system) = self.system.lock() else { return 0 };
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        system.process(pid).map(|p| p.memory()).unwrap_or(0)
    }
}
