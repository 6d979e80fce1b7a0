//! Orchestrator - the concurrent password-trial engine
//!
//! Streams a candidate list through a bounded worker pool in batches,
//! stops at the first accepted password, and enforces the run deadline
//! and memory ceiling along the way.

mod candidates;
mod governor;
mod orchestrator;
mod pool;
mod progress;
mod run_state;
pub mod sizing;

pub use candidates::{count_candidates, CandidateReader};
pub use governor::{DeadlineTimer, MemoryGovernor, SysinfoProbe, MAX_BACKOFF_ROUNDS};
pub use orchestrator::Orchestrator;
pub use pool::{HandlePoll, TrialHandle, WorkerPool};
pub use progress::ProgressTracker;
pub use run_state::RunState;
pub use sizing::{plan_workers, SystemResources};
