//! Command-line argument parsing

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::commands::Command;

/// HistPurge - keep unwanted sites out of your browsing history
///
/// Manages the blacklist/whitelist of URL patterns and decides which visited
/// addresses are purged from history.
#[derive(Parser, Debug)]
#[command(name = "histpurge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", global = true, env = "HISTPURGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// State file path (overrides storage.path)
    #[arg(short = 's', long, value_name = "FILE", global = true, env = "HISTPURGE_STATE")]
    pub state: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format for logs
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormat>,

    /// Log file path
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<String>,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// Compact format
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::patterns::PatternCommands;

    #[test]
    fn test_verbose() {
        let args = Args::parse_from(["histpurge", "-v", "patterns", "list"]);
        assert_eq!(args.verbose, 1);

        let args = Args::parse_from(["histpurge", "patterns", "list", "-vvv"]);
        assert_eq!(args.verbose, 3);
    }

    #[test]
    fn test_pattern_subcommand() {
        let args = Args::parse_from(["histpurge", "--state", "s.json", "patterns", "add", "^https://a\\.com"]);
        assert_eq!(args.state, Some(PathBuf::from("s.json")));
        match args.command {
            Command::Patterns(p) => match p.command {
                PatternCommands::Add { pattern } => assert_eq!(pattern, "^https://a\\.com"),
                other => panic!("unexpected subcommand {other:?}"),
            },
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_log_format() {
        let args = Args::parse_from(["histpurge", "--log-format", "json", "serve"]);
        assert_eq!(args.log_format, Some(LogFormat::Json));
    }
}
