//! HistPurge CLI
//!
//! Command-line interface and stdio message host for the history purger.

mod args;
mod commands;
mod logging;

use anyhow::Result;
use clap::Parser;
use histpurge_core::Config;
use tracing::error;

use args::Args;

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Logging settings may come from the config file, so load it first.
    // Config maintenance commands must work even when that file is broken.
    let config = match &args.command {
        commands::Command::Config(config_args) if !config_args.action.uses_effective_config() => {
            Config::default()
        }
        _ => commands::config::resolve(&args)?,
    };
    logging::init(&args, &config.logging)?;

    let result = run(args, &config);

    if let Err(ref e) = result {
        error!("Fatal error: {:#}", e);
    }

    result
}

fn run(args: Args, config: &Config) -> Result<()> {
    match args.command {
        commands::Command::Patterns(pattern_args) => commands::patterns::execute(pattern_args, config),
        commands::Command::Serve(serve_args) => commands::serve::execute(serve_args, config),
        commands::Command::Config(config_args) => commands::config::execute(config_args, config),
    }
}
