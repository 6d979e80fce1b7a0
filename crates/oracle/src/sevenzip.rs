// crates/oracle/src/sevenzip.rs
//! 7-Zip oracle implementation

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, instrument, trace, warn};

use lockpick_common::{Oracle, TrialOutcome};

/// Runs `<tool> x <archive> -p<password> -o<dir> -y` once per candidate.
///
/// Exit status zero means the password opened the archive; nothing else
/// about the tool's output is interpreted.
pub struct SevenZipOracle {
    program: PathBuf,
    leading_args: Vec<OsString>,
    output_dir: String,
    timeout: Duration,
}

impl SevenZipOracle {
    /// Create an oracle for the given 7-Zip executable with default settings.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            output_dir: "extracted".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the per-trial timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the extraction directory name (relative to the archive's directory).
    pub fn with_output_dir(mut self, dir: impl Into<String>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Arguments placed before the `x` subcommand, for tools run through a launcher.
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Where a successful trial extracts to: `<archive dir>/<output_dir>`.
    pub async fn output_dir_for(&self, archive: &Path) -> PathBuf {
        let archive = tokio::fs::canonicalize(archive)
            .await
            .unwrap_or_else(|_| archive.to_path_buf());
        archive
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&self.output_dir)
    }

    fn command(&self, archive: &Path, password: &str, output_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .arg("x")
            .arg(archive)
            .arg(format!("-p{}", password))
            .arg(concat_os("-o", output_dir))
            .arg("-y")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

fn concat_os(prefix: &str, path: &Path) -> OsString {
    let mut s = OsString::from(prefix);
    s.push(path.as_os_str());
    s
}

#[async_trait]
impl Oracle for SevenZipOracle {
    #[instrument(skip(self, archive, password), fields(archive = %archive.display()))]
    async fn try_candidate(&self, archive: &Path, password: &str) -> TrialOutcome {
        let output_dir = self.output_dir_for(archive).await;
        if let Err(e) = tokio::fs::create_dir_all(&output_dir).await {
            warn!("Cannot create output directory {}: {}", output_dir.display(), e);
            return TrialOutcome::TransientError(format!("output directory: {}", e));
        }

        let mut child = match self.command(archive, password, &output_dir).spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Error trying password {}: {}", password, e);
                return TrialOutcome::TransientError(format!("spawn failed: {}", e));
            }
        };

        match timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) if status.success() => {
                debug!("Tool accepted password");
                TrialOutcome::Success(password.to_string())
            }
            Ok(Ok(status)) => {
                trace!("Tool rejected password ({})", status);
                TrialOutcome::Failure
            }
            Ok(Err(e)) => {
                warn!("Error trying password {}: {}", password, e);
                TrialOutcome::TransientError(format!("wait failed: {}", e))
            }
            Err(_) => {
                warn!("Timeout while trying password: {}", password);
                // kill_on_drop reaps it as well; start_kill just makes it prompt
                let _ = child.start_kill();
                TrialOutcome::TransientError(format!("timed out after {:?}", self.timeout))
            }
        }
    }

    fn name(&self) -> &str {
        "7-Zip"
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Fake 7-Zip: accepts `secret`, writes a file into the `-o` directory.
    const FAKE_TOOL: &str = r#"
if [ "$3" = "-psecret" ]; then
    out="${4#-o}"
    echo "decrypted" > "$out/contents.txt"
    exit 0
fi
if [ "$3" = "-pslow" ]; then
    sleep 5
fi
exit 2
"#;

    fn fixture() -> (TempDir, PathBuf, SevenZipOracle) {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake7z.sh");
        fs::write(&script, FAKE_TOOL).unwrap();
        let archive = dir.path().join("secret.7z");
        fs::write(&archive, b"not really an archive").unwrap();

        let oracle = SevenZipOracle::new("/bin/sh")
            .with_leading_args([script.into_os_string()])
            .with_output_dir("test_extracted")
            .with_timeout(Duration::from_millis(500));
        (dir, archive, oracle)
    }

    #[tokio::test]
    async fn correct_password_extracts() {
        let (dir, archive, oracle) = fixture();

        let outcome = oracle.try_candidate(&archive, "secret").await;
        assert_eq!(outcome, TrialOutcome::Success("secret".to_string()));

        let extracted = dir.path().join("test_extracted").join("contents.txt");
        assert_eq!(fs::read_to_string(extracted).unwrap().trim(), "decrypted");
    }

    #[tokio::test]
    async fn wrong_password_is_failure_and_creates_output_dir() {
        let (dir, archive, oracle) = fixture();

        assert_eq!(oracle.try_candidate(&archive, "guess").await, TrialOutcome::Failure);
        assert!(dir.path().join("test_extracted").is_dir());

        // second call with the directory already present
        assert_eq!(oracle.try_candidate(&archive, "guess2").await, TrialOutcome::Failure);
    }

    #[tokio::test]
    async fn slow_tool_times_out_as_transient() {
        let (_dir, archive, oracle) = fixture();
        let oracle = oracle.with_timeout(Duration::from_millis(100));

        let outcome = oracle.try_candidate(&archive, "slow").await;
        assert!(outcome.is_transient(), "got {:?}", outcome);
    }

    #[tokio::test]
    async fn missing_tool_is_transient() {
        let (_dir, archive, _) = fixture();
        let oracle = SevenZipOracle::new("/nonexistent/7z");

        let outcome = oracle.try_candidate(&archive, "secret").await;
        assert!(outcome.is_transient(), "got {:?}", outcome);
    }

    #[tokio::test]
    async fn output_dir_is_next_to_archive() {
        let (dir, archive, oracle) = fixture();
        let expected = fs::canonicalize(dir.path()).unwrap().join("test_extracted");
        assert_eq!(oracle.output_dir_for(&archive).await, expected);
    }
}
