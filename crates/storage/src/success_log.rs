//! Append-only record of passwords that opened an archive
//!
//! One password per line. The file is only ever appended to: never
//! truncated, rewritten or deduplicated.

use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use lockpick_common::LockpickResult;

#[derive(Debug, Clone)]
pub struct SuccessLog {
    path: PathBuf,
}

impl SuccessLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one password as its own line.
    pub async fn append(&self, password: &str) -> LockpickResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format!("{}\n", password).as_bytes()).await?;
        file.flush().await?;
        debug!("Recorded successful password in {}", self.path.display());
        Ok(())
    }
}
