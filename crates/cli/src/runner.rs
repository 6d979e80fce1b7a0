// runner.rs
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::args::Cli;
use crate::output::print_results;
use lockpick_common::{CpuPriority, CrackerConfig, RunOutcome, StopReason};
use lockpick_oracle::{SevenZipOracle, ToolLocator};
use lockpick_orchestrator::{plan_workers, Orchestrator, RunState, SystemResources};
use lockpick_storage::SuccessLog;

pub async fn run_crack(cli: Cli, config: CrackerConfig) -> Result<ExitCode> {
    let config = apply_overrides(config, &cli);

    let configured_tool = Path::new(&config.sevenzip_path);
    let tool = ToolLocator::from_env(Some(configured_tool))
        .locate()
        .context("Cannot run without an extraction tool")?;
    info!("Using 7-Zip at {}", tool.display());

    if !config.is_supported_format(&cli.archive) {
        warn!(
            "{} does not have a supported extension ({}); trying anyway",
            cli.archive.display(),
            config.supported_formats.join(", ")
        );
    }
    apply_cpu_priority(config.cpu_priority);

    let resources = SystemResources::detect();
    let workers = plan_workers(config.max_workers, resources);
    let settings = config.engine_settings(workers, resources.available_memory);
    info!(
        "Detected {} CPUs, {} MiB available; memory ceiling {} MiB",
        resources.cpus,
        resources.available_memory / (1024 * 1024),
        settings.memory_limit / (1024 * 1024)
    );

    let oracle = SevenZipOracle::new(tool)
        .with_timeout(config.trial_timeout())
        .with_output_dir(config.output_dir.clone());
    let orchestrator = Orchestrator::new(settings, Arc::new(oracle));
    let state = orchestrator.state();

    let interrupt = spawn_interrupt_handler(state.clone());
    let progress = (!cli.no_progress).then(|| ProgressDisplay::start(state.clone()));

    let result = orchestrator.run(&cli.archive, &cli.passwords).await;

    interrupt.abort();
    if let Some(progress) = progress {
        progress.finish();
    }
    let report = result?;

    if let RunOutcome::Found(password) = &report.outcome {
        if config.save_successful {
            let log = SuccessLog::new(config.sink_path(&cli.config));
            match log.append(password).await {
                Ok(()) => info!("Saved password to {}", log.path().display()),
                Err(e) => error!("Error saving successful password: {}", e),
            }
        }
    }

    print_results(&report, &cli.output)?;

    Ok(match report.outcome {
        RunOutcome::Stopped(StopReason::ExternalRequest) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

/// Command-line flags win over the config file.
fn apply_overrides(mut config: CrackerConfig, cli: &Cli) -> CrackerConfig {
    if let Some(workers) = cli.workers {
        config.max_workers = workers;
    }
    if let Some(batch_size) = cli.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(deadline) = cli.deadline {
        config.timeout = deadline.max(0.0);
    }
    config
}

fn spawn_interrupt_handler(state: Arc<RunState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Process interrupted by user, stopping...");
            state.request_stop();
        }
    })
}

struct ProgressDisplay {
    bar: ProgressBar,
    ticker: JoinHandle<()>,
}

impl ProgressDisplay {
    fn start(state: Arc<RunState>) -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} Trying passwords [{wide_bar:.cyan/blue}] {pos}/{len} ({per_sec}, {eta} remaining)",
        ) {
            bar.set_style(style.progress_chars("=>-"));
        }

        let ticker = tokio::spawn({
            let bar = bar.clone();
            async move {
                let mut interval = tokio::time::interval(Duration::from_millis(200));
                loop {
                    interval.tick().await;
                    let snap = state.progress().snapshot();
                    bar.set_length(snap.total as u64);
                    bar.set_position(snap.processed as u64);
                }
            }
        });

        Self { bar, ticker }
    }

    fn finish(self) {
        self.ticker.abort();
        self.bar.finish_and_clear();
    }
}

#[cfg(unix)]
fn apply_cpu_priority(priority: CpuPriority) {
    if priority != CpuPriority::High {
        return;
    }
    // SAFETY: setpriority only changes the scheduling priority of this process.
    let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS, 0, -10) };
    if rc != 0 {
        warn!(
            "Could not set process priority: {}",
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn apply_cpu_priority(priority: CpuPriority) {
    if priority == CpuPriority::High {
        warn!("Could not set process priority: not supported on this platform");
    }
}
