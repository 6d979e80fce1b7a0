//! JSON configuration file
//!
//! Every field has a default, so a partial file is merged onto the
//! defaults. A missing file is not an error; a broken one falls back to
//! the defaults and hands the parse error back to the caller to report.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{LockpickError, LockpickResult};
use crate::types::EngineSettings;

/// Fraction of available memory used as the default RSS ceiling.
pub const DEFAULT_MEMORY_FRACTION: f64 = 0.8;

/// Process scheduling priority requested at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CpuPriority {
    #[default]
    Normal,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrackerConfig {
    /// Worker count; 0 lets the sizing heuristic decide.
    pub max_workers: usize,
    /// Overall deadline in seconds; 0 means unbounded.
    pub timeout: f64,
    /// Per-trial timeout in seconds.
    pub trial_timeout: f64,
    /// Extraction directory, relative to the archive's directory.
    pub output_dir: String,
    pub save_successful: bool,
    /// Sink file name, relative to the config file's directory.
    pub successful_passwords_file: String,
    pub supported_formats: Vec<String>,
    pub log_level: String,
    /// Log file path; empty disables file logging.
    pub log_file: String,
    pub sevenzip_path: String,
    pub batch_size: usize,
    /// RSS ceiling in bytes; 0 means 80% of available memory.
    pub memory_limit: u64,
    pub memory_backoff_ms: u64,
    pub cpu_priority: CpuPriority,
    /// Consecutive transient errors that stop the run; 0 never stops.
    pub max_consecutive_errors: usize,
}

impl Default for CrackerConfig {
    fn default() -> Self {
        Self {
            max_workers: 0,
            timeout: 0.0,
            trial_timeout: 30.0,
            output_dir: "extracted".to_string(),
            save_successful: true,
            successful_passwords_file: "successful_passwords.txt".to_string(),
            supported_formats: [".rar", ".zip", ".7z", ".tar", ".gz"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            log_level: "INFO".to_string(),
            log_file: "lockpick.log".to_string(),
            sevenzip_path: String::new(),
            batch_size: 1000,
            memory_limit: 0,
            memory_backoff_ms: 1000,
            cpu_priority: CpuPriority::Normal,
            max_consecutive_errors: 0,
        }
    }
}

impl CrackerConfig {
    /// Parse a config file strictly. A missing file yields the defaults.
    pub fn load(path: &Path) -> LockpickResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`CrackerConfig::load`], but never fails: a broken file yields
    /// the defaults together with the error that caused the fallback.
    pub fn load_or_default(path: &Path) -> (Self, Option<LockpickError>) {
        match Self::load(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    fn validate(&self) -> LockpickResult<()> {
        if !self.timeout.is_finite() || self.timeout < 0.0 {
            return Err(LockpickError::Config(format!(
                "timeout must be a non-negative number of seconds, got {}",
                self.timeout
            )));
        }
        if !self.trial_timeout.is_finite() || self.trial_timeout <= 0.0 {
            return Err(LockpickError::Config(format!(
                "trial_timeout must be positive, got {}",
                self.trial_timeout
            )));
        }
        if self.output_dir.trim().is_empty() {
            return Err(LockpickError::Config("output_dir must not be empty".into()));
        }
        Ok(())
    }

    /// Overall run deadline, `None` when unbounded.
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        if self.timeout > 0.0 {
            Duration::try_from_secs_f64(self.timeout).ok()
        } else {
            None
        }
    }

    #[must_use]
    pub fn trial_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.trial_timeout).unwrap_or(Duration::from_secs(30))
    }

    /// Sink file for successful passwords, next to the config file.
    #[must_use]
    pub fn sink_path(&self, config_path: &Path) -> PathBuf {
        let dir = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        dir.join(&self.successful_passwords_file)
    }

    /// Log file path, `None` when file logging is disabled.
    #[must_use]
    pub fn log_file(&self) -> Option<PathBuf> {
        let trimmed = self.log_file.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }

    /// Whether the archive's extension is in `supported_formats`.
    #[must_use]
    pub fn is_supported_format(&self, archive: &Path) -> bool {
        let name = archive
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        self.supported_formats
            .iter()
            .any(|ext| name.ends_with(&ext.to_lowercase()))
    }

    /// Effective RSS ceiling given the memory currently available.
    #[must_use]
    pub fn memory_ceiling(&self, available_memory: u64) -> u64 {
        if self.memory_limit > 0 {
            self.memory_limit
        } else {
            (available_memory as f64 * DEFAULT_MEMORY_FRACTION) as u64
        }
    }

    /// Freeze the run-relevant fields into engine settings.
    #[must_use]
    pub fn engine_settings(&self, workers: usize, available_memory: u64) -> EngineSettings {
        EngineSettings::default()
            .with_workers(workers)
            .with_batch_size(self.batch_size)
            .with_deadline(self.deadline())
            .with_memory_limit(self.memory_ceiling(available_memory))
            .with_memory_backoff(Duration::from_millis(self.memory_backoff_ms))
            .with_max_consecutive_errors(self.max_consecutive_errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = CrackerConfig::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, CrackerConfig::default());
    }

    #[test]
    fn partial_file_is_merged_onto_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"max_workers": 2, "output_dir": "test_extracted", "retry_limit": 100}"#,
        )
        .unwrap();

        let config = CrackerConfig::load(&path).unwrap();
        assert_eq!(config.max_workers, 2);
        assert_eq!(config.output_dir, "test_extracted");
        assert_eq!(config.batch_size, 1000);
        assert!(config.save_successful);
    }

    #[test]
    fn invalid_json_falls_back_with_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "invalid json content").unwrap();

        let (config, err) = CrackerConfig::load_or_default(&path);
        assert_eq!(config, CrackerConfig::default());
        assert!(matches!(err, Some(LockpickError::Json(_))));
    }

    #[test]
    fn negative_timeout_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"timeout": -1}"#).unwrap();
        assert!(matches!(CrackerConfig::load(&path), Err(LockpickError::Config(_))));
    }

    #[test]
    fn deadline_zero_is_unbounded() {
        let mut config = CrackerConfig::default();
        assert_eq!(config.deadline(), None);
        config.timeout = 0.5;
        assert_eq!(config.deadline(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn sink_lives_next_to_config() {
        let config = CrackerConfig::default();
        assert_eq!(
            config.sink_path(Path::new("/etc/lockpick/config.json")),
            PathBuf::from("/etc/lockpick/successful_passwords.txt")
        );
        assert_eq!(
            config.sink_path(Path::new("config.json")),
            PathBuf::from("./successful_passwords.txt")
        );
    }

    #[test]
    fn supported_format_matching_is_case_insensitive() {
        let config = CrackerConfig::default();
        assert!(config.is_supported_format(Path::new("/data/Backup.7Z")));
        assert!(config.is_supported_format(Path::new("logs.tar.gz")));
        assert!(!config.is_supported_format(Path::new("test.xyz")));
    }

    #[test]
    fn engine_settings_default_memory_ceiling() {
        let config = CrackerConfig::default();
        let settings = config.engine_settings(4, 10_000);
        assert_eq!(settings.workers, 4);
        assert_eq!(settings.memory_limit, 8_000);
        assert_eq!(settings.batch_size, 1000);
        assert_eq!(settings.memory_backoff, Duration::from_secs(1));

        let explicit = CrackerConfig { memory_limit: 123, ..CrackerConfig::default() };
        assert_eq!(explicit.engine_settings(1, 10_000).memory_limit, 123);
    }
}
