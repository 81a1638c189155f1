//! CLI interface for git-summary.

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser};

use crate::config::{load_languages, OutputTarget, SummaryConfig, DEFAULT_BRANCH, DEFAULT_OUTPUT};
use crate::git::{HistoryOrder, FULL_HASH_LEN, SHORT_HASH_LEN};
use crate::pipeline;

/// git-summary: per-file git history and directory structure as JSON.
#[derive(Parser, Debug)]
#[command(name = "git-summary")]
#[command(about = "Generate a JSON summary of a repository's files and their git history", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the root directory of the git repository.
    #[arg(value_name = "REPO_PATH")]
    pub repo_path: PathBuf,

    /// Branch whose history is collected.
    #[arg(long, default_value = DEFAULT_BRANCH)]
    pub branch: String,

    /// Output JSON file.
    #[arg(long, default_value = DEFAULT_OUTPUT, conflicts_with = "stdout")]
    pub output: PathBuf,

    /// Print the JSON document to stdout instead of writing a file.
    #[arg(long)]
    pub stdout: bool,

    /// Record full 40-character commit hashes instead of abbreviated ones.
    #[arg(long)]
    pub full_hash: bool,

    /// Order of commits within each file's history.
    #[arg(long, value_enum, default_value_t = HistoryOrder::OldestFirst)]
    pub history_order: HistoryOrder,

    /// YAML file mapping extensions to language labels.
    #[arg(long, value_name = "FILE")]
    pub languages: Option<PathBuf>,

    /// Suppress progress messages.
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Default tracing directive for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    /// Builds the run configuration from the parsed arguments.
    pub fn to_config(&self) -> Result<SummaryConfig> {
        let mut config = SummaryConfig::new(&self.repo_path);
        config.branch.clone_from(&self.branch);
        config.output = if self.stdout {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(self.output.clone())
        };
        config.hash_length = if self.full_hash {
            FULL_HASH_LEN
        } else {
            SHORT_HASH_LEN
        };
        config.history_order = self.history_order;
        config.languages = load_languages(self.languages.as_deref())?;
        Ok(config)
    }

    /// Executes the CLI command.
    pub fn execute(self) -> Result<()> {
        let config = self.to_config()?;
        let announce = !self.quiet && !self.stdout;

        if announce {
            let root_name = fs::canonicalize(&self.repo_path)
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .unwrap_or_else(|| self.repo_path.display().to_string());
            println!("Analyzing repository: {root_name} (branch: {})", config.branch);
        }

        pipeline::generate(&config)?;

        if announce {
            if let OutputTarget::File(path) = &config.output {
                println!("JSON summary created: {}", path.display());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_interface() {
        let cli = Cli::try_parse_from(["git-summary", "/tmp/repo"]).unwrap();
        assert_eq!(cli.branch, "main");
        assert_eq!(cli.output, PathBuf::from("git_summary.json"));
        assert!(!cli.full_hash);
        assert_eq!(cli.history_order, HistoryOrder::OldestFirst);
        assert_eq!(cli.log_level(), "warn");
    }

    #[test]
    fn options_map_onto_config() {
        let cli = Cli::try_parse_from([
            "git-summary",
            "repo",
            "--branch",
            "develop",
            "--output",
            "out/summary.json",
            "--full-hash",
            "--history-order",
            "newest-first",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.log_level(), "debug");

        let config = cli.to_config().unwrap();
        assert_eq!(config.branch, "develop");
        assert_eq!(
            config.output,
            OutputTarget::File(PathBuf::from("out/summary.json"))
        );
        assert_eq!(config.hash_length, 40);
        assert_eq!(config.history_order, HistoryOrder::NewestFirst);
    }

    #[test]
    fn repo_path_is_required() {
        assert!(Cli::try_parse_from(["git-summary"]).is_err());
    }

    #[test]
    fn stdout_conflicts_with_output() {
        assert!(Cli::try_parse_from(["git-summary", "r", "--stdout", "--output", "x.json"]).is_err());
        let cli = Cli::try_parse_from(["git-summary", "r", "--stdout"]).unwrap();
        assert_eq!(cli.to_config().unwrap().output, OutputTarget::Stdout);
    }
}
