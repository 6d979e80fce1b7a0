//! Progress tracking

use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

use lockpick_common::{ProgressSnapshot, RunOutcome, TrialOutcome};

pub struct ProgressTracker {
    total: AtomicUsize,
    processed: AtomicUsize,
    errors: AtomicUsize,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            total: AtomicUsize::new(0),
            processed: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        }
    }

    pub fn set_total(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
    }

    /// Count one drained trial.
    pub fn record(&self, outcome: &TrialOutcome) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        if outcome.is_transient() {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    pub fn print_summary(&self, outcome: &RunOutcome) {
        let snap = self.snapshot();

        info!("Run Summary:");
        info!("  Candidates: {}", snap.total);
        info!("  Tried: {}", snap.processed);
        info!("  Transient errors: {}", snap.errors);
        if snap.total > 0 {
            info!("  Coverage: {:.1}%", snap.percent());
        }
        match outcome {
            RunOutcome::Found(password) => info!("Success! Password found: {}", password),
            RunOutcome::NotFound => info!("No valid password found."),
            RunOutcome::Stopped(reason) => info!("Stopped early: {}", reason),
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
