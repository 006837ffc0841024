//! CLI commands

pub mod config;
pub mod patterns;
pub mod serve;

use clap::Subcommand;

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pattern list management (blacklist/whitelist)
    Patterns(patterns::PatternArgs),

    /// Serve the message protocol over stdin/stdout
    Serve(serve::ServeArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}
