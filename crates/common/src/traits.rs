//! Core traits for lockpick components
//!
//! The engine only talks to the outside world through these two seams,
//! so tests can swap in deterministic doubles.

use crate::types::TrialOutcome;
use async_trait::async_trait;
use std::path::Path;

/// Pass/fail decryption oracle - tries one password against an archive.
///
/// Implementations must never fail past this boundary: every invocation
/// problem is reported as [`TrialOutcome::TransientError`].
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Try a single candidate password.
    async fn try_candidate(&self, archive: &Path, password: &str) -> TrialOutcome;

    /// Oracle name/identifier
    fn name(&self) -> &str;
}

/// Source of the current process memory usage, in bytes.
pub trait MemoryProbe: Send + Sync {
    fn current_usage(&self) -> u64;
}
