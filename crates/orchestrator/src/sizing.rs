//! Worker pool sizing
//!
//! Computed once at startup from a snapshot of the machine; the pool is
//! never resized during a run.

use sysinfo::System;

/// Hard cap on the default worker count.
pub const MAX_WORKERS: usize = 16;
/// Memory budget assumed for one in-flight trial.
pub const MEMORY_PER_TRIAL: u64 = 512 * 1024 * 1024;
/// Share of available memory the pool may plan for.
pub const MEMORY_FRACTION: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemResources {
    pub cpus: usize,
    /// Available memory in bytes; 0 when unknown.
    pub available_memory: u64,
}

impl SystemResources {
    pub fn detect() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let mut system = System::new();
        system.refresh_memory();
        Self {
            cpus,
            available_memory: system.available_memory(),
        }
    }
}

/// min(2 x cores, 16), further capped by how many trials fit in 80% of
/// available memory. Never below one.
pub fn default_workers(resources: SystemResources) -> usize {
    let cpu_based = resources.cpus.saturating_mul(2).min(MAX_WORKERS);
    if resources.available_memory == 0 {
        return cpu_based.max(1);
    }
    let budget = (resources.available_memory as f64 * MEMORY_FRACTION) as u64;
    let memory_based = usize::try_from(budget / MEMORY_PER_TRIAL).unwrap_or(usize::MAX);
    cpu_based.min(memory_based).max(1)
}

/// An explicit request wins; 0 means "decide for me".
pub fn plan_workers(requested: usize, resources: SystemResources) -> usize {
    if requested > 0 {
        requested
    } else {
        default_workers(resources)
    }
}
