use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lockpick")]
#[command(version)]
#[command(about = "Recover the password of an encrypted archive from a word list", long_about = None)]
pub struct Cli {
    /// Path to the archive file
    pub archive: PathBuf,

    /// Path to the password file (one candidate per line)
    #[arg(short, long, default_value = "PWD.txt")]
    pub passwords: PathBuf,

    /// Path to the JSON config file
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Worker count, overrides the config file (0 = size from CPUs and memory)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Candidates per batch, overrides the config file
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Overall deadline in seconds, overrides the config file (0 = none)
    #[arg(long)]
    pub deadline: Option<f64>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Output format: text, json
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    pub output: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["lockpick", "secret.7z"]);
        assert_eq!(cli.archive, PathBuf::from("secret.7z"));
        assert_eq!(cli.passwords, PathBuf::from("PWD.txt"));
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.workers, None);
        assert_eq!(cli.output, "text");
    }

    #[test]
    fn overrides() {
        let cli = Cli::parse_from([
            "lockpick", "a.zip", "-p", "words.txt", "-w", "4", "-b", "50", "--deadline", "1.5",
            "-vv", "-o", "json",
        ]);
        assert_eq!(cli.passwords, PathBuf::from("words.txt"));
        assert_eq!(cli.workers, Some(4));
        assert_eq!(cli.batch_size, Some(50));
        assert_eq!(cli.deadline, Some(1.5));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.output, "json");
    }

    #[test]
    fn rejects_unknown_output_format() {
        assert!(Cli::try_parse_from(["lockpick", "a.zip", "-o", "csv"]).is_err());
    }
}
