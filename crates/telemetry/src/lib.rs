//! Telemetry - tracing subscriber setup
//!
//! Logs go to stderr in compact form and, optionally, to a plain-text
//! log file. The filter comes from, in order of precedence:
//! - `RUST_LOG`
//! - the `-v` count on the command line
//! - `log_level` from the config file

use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: Level,
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            file: None,
        }
    }
}

impl LogSettings {
    /// Start from a config-file level name; unknown names fall back to INFO.
    pub fn from_level_name(name: &str) -> Self {
        Self {
            level: parse_level(name).unwrap_or(Level::INFO),
            file: None,
        }
    }

    /// `-v` raises the level to DEBUG, `-vv` and beyond to TRACE.
    pub fn with_verbosity(mut self, verbose: u8) -> Self {
        self.level = match verbose {
            0 => self.level,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        self
    }

    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }

    fn build_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.to_string().to_lowercase()))
    }
}

/// Parse a level name; accepts the usual aliases (`WARNING`, `CRITICAL`).
pub fn parse_level(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" | "critical" | "fatal" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

fn file_appender(path: &Path) -> Option<RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path.file_name()?.to_str()?;

    match RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
    {
        Ok(appender) => Some(appender),
        Err(e) => {
            eprintln!("Warning: cannot open log file {}: {}", path.display(), e);
            None
        }
    }
}

/// Install the global subscriber.
///
/// Keep the returned guard alive for the life of the program; dropping it
/// flushes the log file. Calling this twice is silently ignored.
pub fn init(settings: &LogSettings) -> Option<WorkerGuard> {
    let filter = settings.build_filter();

    let stderr_layer = fmt::layer().compact().with_writer(std::io::stderr);

    let (file_layer, guard) = match settings.file.as_deref().and_then(file_appender) {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_config_level_names() {
        assert_eq!(parse_level("INFO"), Some(Level::INFO));
        assert_eq!(parse_level("WARNING"), Some(Level::WARN));
        assert_eq!(parse_level("critical"), Some(Level::ERROR));
        assert_eq!(parse_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn verbosity_overrides_config_level() {
        let base = LogSettings::from_level_name("WARNING");
        assert_eq!(base.level, Level::WARN);
        assert_eq!(base.clone().with_verbosity(0).level, Level::WARN);
        assert_eq!(base.clone().with_verbosity(1).level, Level::DEBUG);
        assert_eq!(base.with_verbosity(3).level, Level::TRACE);
    }

    #[test]
    fn unknown_level_defaults_to_info() {
        assert_eq!(LogSettings::from_level_name("???").level, Level::INFO);
    }

    #[test]
    fn init_writes_to_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lockpick.log");
        let settings = LogSettings::default().with_file(Some(path.clone()));

        let guard = init(&settings);
        assert!(guard.is_some());
        drop(guard);
        assert!(path.exists());
    }
}
