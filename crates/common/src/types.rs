//! Core data types for the password-trial engine
//!
//! Small value types passed between the scheduler, the worker pool and
//! whoever observes a run (CLI, logs). Trials are cheap to clone: the
//! archive identity is shared behind an `Arc`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// One password read from the candidate source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate(String);

impl Candidate {
    /// Build a candidate from a raw line, stripping the line terminator.
    ///
    /// Returns `None` for empty lines. Only `\n` and `\r` are removed;
    /// other whitespace is part of the password.
    #[must_use]
    pub fn from_line(line: &str) -> Option<Self> {
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A candidate paired with the archive it is tried against.
///
/// Produced by the scheduler, consumed once by one worker.
#[derive(Debug, Clone)]
pub struct Trial {
    pub archive: Arc<PathBuf>,
    pub candidate: Candidate,
}

impl Trial {
    #[inline]
    #[must_use]
    pub fn new(archive: Arc<PathBuf>, candidate: Candidate) -> Self {
        Self { archive, candidate }
    }

    #[inline]
    #[must_use]
    pub fn archive(&self) -> &Path {
        self.archive.as_path()
    }

    #[inline]
    #[must_use]
    pub fn password(&self) -> &str {
        self.candidate.as_str()
    }
}

/// Result of a single trial.
///
/// `Failure` and `TransientError` both mean "not this password"; only
/// `Success` ends the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialOutcome {
    Success(String),
    Failure,
    TransientError(String),
}

impl TrialOutcome {
    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, TrialOutcome::Success(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, TrialOutcome::TransientError(_))
    }
}

/// Why a run ended before the candidate stream was exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    Deadline,
    ExternalRequest,
    ErrorLimit,
}

impl StopReason {
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            StopReason::Deadline => "deadline",
            StopReason::ExternalRequest => "external-request",
            StopReason::ErrorLimit => "error-limit",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum RunOutcome {
    Found(String),
    NotFound,
    Stopped(StopReason),
}

impl RunOutcome {
    #[inline]
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        match self {
            RunOutcome::Found(p) => Some(p),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, RunOutcome::Found(_))
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Found(p) => write!(f, "password found: {}", p),
            RunOutcome::NotFound => f.write_str("no valid password found"),
            RunOutcome::Stopped(reason) => write!(f, "stopped early ({})", reason),
        }
    }
}

/// Point-in-time view of a run's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub processed: usize,
    pub total: usize,
    /// Trials that ended in a transient error (subset of `processed`).
    pub errors: usize,
}

impl ProgressSnapshot {
    /// Progress percentage in [0.0, 100.0].
    #[inline]
    #[must_use]
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            (self.processed as f32 / self.total as f32) * 100.0
        }
    }
}

/// Final record of a run, handed to the output layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub outcome: RunOutcome,
    pub progress: ProgressSnapshot,
    pub elapsed: Duration,
}

/// Immutable knobs the orchestrator runs with.
///
/// Built once from the configuration before a run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub workers: usize,
    pub batch_size: usize,
    /// Overall wall-clock budget; `None` means unbounded.
    pub deadline: Option<Duration>,
    /// Process RSS ceiling in bytes; 0 disables the check.
    pub memory_limit: u64,
    /// Pause between memory re-checks while over the ceiling.
    pub memory_backoff: Duration,
    /// Bounded wait used while draining a pending result.
    pub poll_interval: Duration,
    /// Stop after this many transient errors in a row; 0 never stops.
    pub max_consecutive_errors: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            workers: 1,
            batch_size: 1000,
            deadline: None,
            memory_limit: 0,
            memory_backoff: Duration::from_secs(1),
            poll_interval: Duration::from_millis(100),
            max_consecutive_errors: 0,
        }
    }
}

impl EngineSettings {
    #[inline]
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline.filter(|d| !d.is_zero());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_memory_limit(mut self, bytes: u64) -> Self {
        self.memory_limit = bytes;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_memory_backoff(mut self, backoff: Duration) -> Self {
        self.memory_backoff = backoff;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_max_consecutive_errors(mut self, limit: usize) -> Self {
        self.max_consecutive_errors = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_strips_only_line_terminators() {
        assert_eq!(Candidate::from_line("hunter2\r\n").unwrap().as_str(), "hunter2");
        assert_eq!(Candidate::from_line(" pass word \n").unwrap().as_str(), " pass word ");
        assert!(Candidate::from_line("\r\n").is_none());
        assert!(Candidate::from_line("").is_none());
    }

    #[test]
    fn outcome_display() {
        assert_eq!(RunOutcome::Found("x".into()).to_string(), "password found: x");
        assert_eq!(
            RunOutcome::Stopped(StopReason::Deadline).to_string(),
            "stopped early (deadline)"
        );
        assert_eq!(RunOutcome::Found("x".into()).password(), Some("x"));
        assert_eq!(RunOutcome::NotFound.password(), None);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(RunOutcome::Stopped(StopReason::ExternalRequest)).unwrap();
        assert_eq!(json["status"], "stopped");
        assert_eq!(json["detail"], "external-request");
    }

    #[test]
    fn progress_percent() {
        let empty = ProgressSnapshot::default();
        assert_eq!(empty.percent(), 0.0);

        let half = ProgressSnapshot { processed: 5, total: 10, errors: 0 };
        assert_eq!(half.percent(), 50.0);
    }

    #[test]
    fn settings_builders_clamp() {
        let s = EngineSettings::default()
            .with_workers(0)
            .with_batch_size(0)
            .with_deadline(Some(Duration::ZERO));
        assert_eq!(s.workers, 1);
        assert_eq!(s.batch_size, 1);
        assert_eq!(s.deadline, None);
    }
}
