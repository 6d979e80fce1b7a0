//! Lockpick Common - Shared types and traits
//!
//! This crate provides the value types, configuration, error type and
//! the oracle/memory-probe seams used across the lockpick workspace.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{CpuPriority, CrackerConfig};
pub use error::{LockpickError, LockpickResult};
pub use traits::{MemoryProbe, Oracle};
pub use types::{
    Candidate, EngineSettings, ProgressSnapshot, RunOutcome, RunReport, StopReason, Trial,
    TrialOutcome,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
