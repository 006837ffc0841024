//! Pattern list management commands
//!
//! Thin wrappers over the pattern store; every mutation goes through the
//! same operations the message protocol uses.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use histpurge_core::{Config, ListMode, PatternStore};
use std::path::PathBuf;

/// Pattern management arguments
#[derive(Args, Debug)]
pub struct PatternArgs {
    #[command(subcommand)]
    pub command: PatternCommands,
}

/// Pattern subcommands
#[derive(Subcommand, Debug)]
pub enum PatternCommands {
    /// List stored patterns and the list mode
    List,

    /// Add a pattern (a regular expression searched in visited URLs)
    Add {
        /// Pattern to add
        pattern: String,
    },

    /// Remove a pattern (exact text)
    Remove {
        /// Pattern to remove
        pattern: String,
    },

    /// Import comma-separated patterns
    Import {
        /// Comma-separated list, e.g. "facebook,^https://news\.example"
        list: Option<String>,

        /// Read the list from a file instead
        #[arg(short, long, conflicts_with = "list")]
        file: Option<PathBuf>,
    },

    /// Print patterns as one comma-separated line
    Export,

    /// Remove all patterns (the list mode is kept)
    Clear,

    /// Set list mode
    Mode {
        /// Mode: blacklist or whitelist
        mode: String,
    },

    /// Show whether a URL would be purged
    Check {
        /// Visited address to test
        url: String,
    },
}

/// Execute pattern command
pub fn execute(args: PatternArgs, config: &Config) -> Result<()> {
    let store = config.build_store();

    match args.command {
        PatternCommands::List => list_patterns(&store, config),
        PatternCommands::Add { pattern } => add_pattern(&store, &pattern),
        PatternCommands::Remove { pattern } => remove_pattern(&store, &pattern),
        PatternCommands::Import { list, file } => import_patterns(&store, list, file),
        PatternCommands::Export => export_patterns(&store),
        PatternCommands::Clear => clear_patterns(&store),
        PatternCommands::Mode { mode } => set_mode(&store, &mode),
        PatternCommands::Check { url } => check_url(&store, config, &url),
    }
}

fn mode_label(mode: ListMode) -> colored::ColoredString {
    match mode {
        ListMode::Blacklist => "blacklist".red(),
        ListMode::Whitelist => "whitelist".green(),
    }
}

fn list_patterns(store: &PatternStore, config: &Config) -> Result<()> {
    let state = store.load().context("Failed to load patterns")?;
    let invalid = config.build_filter().invalid_patterns(&state);

    println!("{}", "═".repeat(50).bright_blue());
    println!("{}", " History Purge Patterns".bright_white().bold());
    println!("{}", "═".repeat(50).bright_blue());
    println!("State: {}", config.storage.path.cyan());
    println!("Mode: {}", mode_label(state.mode));
    println!("Total patterns: {}", state.len().to_string().green());
    println!("{}", "─".repeat(50).bright_black());

    if state.is_empty() {
        println!("{}", "  (empty)".dimmed());
    } else {
        for pattern in &state.patterns {
            if invalid.contains(pattern) {
                println!("  {} {} {}", "✗".red(), pattern, "(never matches)".dimmed());
            } else {
                println!("  {} {}", "●".green(), pattern);
            }
        }
    }

    println!("{}", "═".repeat(50).bright_blue());

    Ok(())
}

fn add_pattern(store: &PatternStore, pattern: &str) -> Result<()> {
    if store.add(pattern).context("Failed to add pattern")? {
        println!("{} Added {}", "✓".green(), pattern.trim().cyan());
    } else {
        println!("{} Not added: {} is blank or already listed", "!".yellow(), pattern.cyan());
    }
    Ok(())
}

fn remove_pattern(store: &PatternStore, pattern: &str) -> Result<()> {
    if store.remove(pattern).context("Failed to remove pattern")? {
        println!("{} Removed {}", "✓".green(), pattern.cyan());
    } else {
        println!("{} Pattern not found: {}", "✗".red(), pattern);
    }
    Ok(())
}

fn import_patterns(store: &PatternStore, list: Option<String>, file: Option<PathBuf>) -> Result<()> {
    let raw = match (list, file) {
        (Some(list), _) => list,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?
            .replace(['\r', '\n'], ","),
        (None, None) => anyhow::bail!("Nothing to import: pass a list or --file"),
    };

    let count = store.import_many(&raw).context("Failed to import patterns")?;
    println!("{} Imported {} new pattern(s)", "✓".green(), count.to_string().cyan());
    Ok(())
}

fn export_patterns(store: &PatternStore) -> Result<()> {
    println!("{}", store.export().context("Failed to export patterns")?);
    Ok(())
}

fn clear_patterns(store: &PatternStore) -> Result<()> {
    store.clear().context("Failed to clear patterns")?;
    println!("{} Cleared all patterns", "✓".green());
    Ok(())
}

fn set_mode(store: &PatternStore, mode: &str) -> Result<()> {
    match mode.parse::<ListMode>() {
        Ok(mode) => {
            store.set_list_mode(mode).context("Failed to set list mode")?;
            println!("{} List mode set to {}", "✓".green(), mode_label(mode));
        }
        Err(e) => println!("{} Invalid mode: {}", "✗".red(), e),
    }
    Ok(())
}

fn check_url(store: &PatternStore, config: &Config, url: &str) -> Result<()> {
    let state = store.load().context("Failed to load patterns")?;
    let decision = config.build_filter().decide(url, &state);

    println!("{}", "─".repeat(50).bright_black());
    println!("URL: {}", url.cyan());
    println!("Mode: {}", mode_label(state.mode));
    match decision.matched {
        Some(index) => println!("Matched: {}", state.patterns[index].green()),
        None => println!("Matched: {}", "nothing".yellow()),
    }
    println!(
        "Result: {}",
        if decision.purge {
            "purge from history".red()
        } else {
            "keep in history".green()
        }
    );
    println!("{}", "─".repeat(50).bright_black());

    Ok(())
}
