//! Shared run state
//!
//! The only mutable structure shared between the scheduler and the
//! workers. `running` goes from true to false exactly once per run and
//! `winner` is a single-assignment cell, so the first successful trial
//! to reach it is the only one ever recorded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use lockpick_common::StopReason;

use crate::progress::ProgressTracker;

pub struct RunState {
    running: AtomicBool,
    deadline_exceeded: AtomicBool,
    winner: OnceLock<String>,
    stop_reason: OnceLock<StopReason>,
    progress: ProgressTracker,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            deadline_exceeded: AtomicBool::new(false),
            winner: OnceLock::new(),
            stop_reason: OnceLock::new(),
            progress: ProgressTracker::new(),
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    #[inline]
    pub fn deadline_exceeded(&self) -> bool {
        self.deadline_exceeded.load(Ordering::Acquire)
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.get().map(String::as_str)
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason.get().copied()
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Record a successful password and stop the run.
    ///
    /// Returns `false` when another trial already won; the caller's
    /// password is discarded.
    pub fn declare_winner(&self, password: String) -> bool {
        // running flips first so nobody observes a winner while still running
        self.running.store(false, Ordering::Release);
        self.winner.set(password).is_ok()
    }

    /// Stop the run early. The first reason recorded sticks.
    pub fn stop(&self, reason: StopReason) {
        self.running.store(false, Ordering::Release);
        let _ = self.stop_reason.set(reason);
    }

    /// Ask a running engine to wind down (Ctrl-C and friends).
    pub fn request_stop(&self) {
        self.stop(StopReason::ExternalRequest);
    }

    /// Deadline timer callback. Safe to call more than once.
    pub fn expire_deadline(&self) {
        self.deadline_exceeded.store(true, Ordering::Release);
        self.stop(StopReason::Deadline);
    }

    /// End of run: clear `running` without recording a reason.
    pub(crate) fn halt(&self) {
        self.running.store(false, Ordering::Release);
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
