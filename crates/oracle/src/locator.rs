//! Locating the 7-Zip executable
//!
//! Search order:
//! 1. explicit path from the config file
//! 2. `SEVENZIP_PATH` environment variable
//! 3. well-known install locations
//! 4. `7z` / `7zz` / `7za` on `PATH`

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

use lockpick_common::{LockpickError, LockpickResult};

#[cfg(windows)]
const TOOL_NAMES: &[&str] = &["7z.exe", "7zz.exe", "7za.exe"];
#[cfg(not(windows))]
const TOOL_NAMES: &[&str] = &["7z", "7zz", "7za"];

#[cfg(windows)]
const WELL_KNOWN: &[&str] = &[
    r"C:\Program Files\7-Zip\7z.exe",
    r"C:\Program Files (x86)\7-Zip\7z.exe",
];
#[cfg(not(windows))]
const WELL_KNOWN: &[&str] = &[
    "/usr/bin/7z",
    "/usr/local/bin/7z",
    "/opt/homebrew/bin/7z",
    "/usr/bin/7zz",
    "/usr/local/bin/7zz",
];

#[derive(Debug, Clone, Default)]
pub struct ToolLocator {
    configured: Option<PathBuf>,
    env_override: Option<PathBuf>,
    well_known: Vec<PathBuf>,
    search_path: Option<OsString>,
}

impl ToolLocator {
    /// Locator seeded from the process environment.
    pub fn from_env(configured: Option<&Path>) -> Self {
        Self {
            configured: configured
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf),
            env_override: std::env::var_os("SEVENZIP_PATH")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            well_known: WELL_KNOWN.iter().map(PathBuf::from).collect(),
            search_path: std::env::var_os("PATH"),
        }
    }

    /// Locator with no environment at all; tests fill in what they need.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_configured(mut self, path: impl Into<PathBuf>) -> Self {
        self.configured = Some(path.into());
        self
    }

    pub fn with_env_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_override = Some(path.into());
        self
    }

    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    /// Resolve the tool path, or [`LockpickError::ToolNotFound`].
    pub fn locate(&self) -> LockpickResult<PathBuf> {
        let explicit = self
            .configured
            .iter()
            .chain(self.env_override.iter())
            .chain(self.well_known.iter());
        for candidate in explicit {
            if candidate.is_file() {
                debug!("Using 7-Zip at {}", candidate.display());
                return Ok(candidate.clone());
            }
        }

        if let Some(search_path) = &self.search_path {
            for dir in std::env::split_paths(search_path) {
                for name in TOOL_NAMES {
                    let candidate = dir.join(name);
                    if candidate.is_file() {
                        debug!("Found 7-Zip on PATH at {}", candidate.display());
                        return Ok(candidate);
                    }
                }
            }
        }

        Err(LockpickError::ToolNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn configured_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let configured = dir.path().join("my7z");
        let env = dir.path().join("env7z");
        fs::write(&configured, "").unwrap();
        fs::write(&env, "").unwrap();

        let found = ToolLocator::empty()
            .with_configured(&configured)
            .with_env_override(&env)
            .locate()
            .unwrap();
        assert_eq!(found, configured);
    }

    #[test]
    fn missing_configured_path_falls_through_to_env() {
        let dir = tempfile::tempdir().unwrap();
        let env = dir.path().join("env7z");
        fs::write(&env, "").unwrap();

        let found = ToolLocator::empty()
            .with_configured(dir.path().join("missing"))
            .with_env_override(&env)
            .locate()
            .unwrap();
        assert_eq!(found, env);
    }

    #[test]
    fn searches_path_directories() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let tool = second.path().join(TOOL_NAMES[0]);
        fs::write(&tool, "").unwrap();

        let search = std::env::join_paths([first.path(), second.path()]).unwrap();
        let found = ToolLocator::empty().with_search_path(search).locate().unwrap();
        assert_eq!(found, tool);
    }

    #[test]
    fn nothing_found() {
        let empty = tempfile::tempdir().unwrap();
        let err = ToolLocator::empty()
            .with_search_path(empty.path().as_os_str())
            .locate()
            .unwrap_err();
        assert!(matches!(err, LockpickError::ToolNotFound));
    }
}
