//! Error types for lockpick
//!
//! Only pre-run validation and source I/O failures surface as errors.
//! Per-trial problems are folded into [`crate::TrialOutcome`] instead.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LockpickError {
    #[error("{what} not found: {}", path.display())]
    NotFound { what: &'static str, path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("7-Zip not found. Install it from https://www.7-zip.org/, add it to PATH, or set \"sevenzip_path\" in the config file")]
    ToolNotFound,

    #[error("Operation cancelled")]
    Cancelled,
}

impl LockpickError {
    /// Missing archive.
    pub fn archive_not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            what: "Archive",
            path: path.into(),
        }
    }

    /// Missing candidate list.
    pub fn password_file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            what: "Password file",
            path: path.into(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias for lockpick operations
pub type LockpickResult<T> = Result<T, LockpickError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_path() {
        let err = LockpickError::archive_not_found("/tmp/missing.7z");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Archive not found: /tmp/missing.7z");

        let err = LockpickError::password_file_not_found("words.txt");
        assert!(err.to_string().starts_with("Password file not found"));
    }

    #[test]
    fn io_errors_are_not_not_found() {
        let err = LockpickError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(!err.is_not_found());
    }
}
