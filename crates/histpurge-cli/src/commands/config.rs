//! Config command - configuration management

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use histpurge_core::config::{Config, StorageBackend};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::args::Args as CliArgs;

/// Config command arguments
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Generate a configuration file with default values
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "histpurge.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Config file to validate
        file: PathBuf,
    },

    /// Show config file locations
    Paths,
}

impl ConfigAction {
    /// Whether the action reads the resolved configuration
    pub fn uses_effective_config(&self) -> bool {
        matches!(self, Self::Show)
    }
}

/// Execute config command
pub fn execute(args: ConfigArgs, config: &Config) -> Result<()> {
    match args.action {
        ConfigAction::Show => show_config(config),
        ConfigAction::Generate { output, force } => generate_config(&output, force),
        ConfigAction::Validate { file } => validate_config(&file),
        ConfigAction::Paths => show_paths(),
    }
}

/// Build the effective configuration for a CLI invocation
///
/// Uses `--config` if given, otherwise the first discovered file, otherwise
/// defaults. `--state` then overrides the storage path.
pub fn resolve(args: &CliArgs) -> Result<Config> {
    let mut config = match args.config.clone().or_else(find_config_file) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => Config::default(),
    };

    if let Some(ref state) = args.state {
        config.storage.backend = StorageBackend::File;
        config.storage.path = state.display().to_string();
    }

    config
        .validate()
        .context("Configuration validation failed")?;
    Ok(config)
}

fn show_config(config: &Config) -> Result<()> {
    let toml_str = config.to_toml().context("Failed to serialize config")?;
    println!("{}", toml_str);
    Ok(())
}

fn generate_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", output.display());
    }

    let toml_str = Config::default()
        .to_toml()
        .context("Failed to serialize config")?;

    let content = format!(
        "# HistPurge Configuration\n\
         # storage.backend: \"file\" or \"memory\"\n\
         # logging.level: error, warn, info, debug or trace\n\n\
         {}",
        toml_str
    );

    std::fs::write(output, content)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    info!("Generated config file: {:?}", output);
    println!("Configuration file generated: {}", output.display());

    Ok(())
}

fn validate_config(file: &Path) -> Result<()> {
    let config = Config::load(file)
        .with_context(|| format!("Failed to load config from {:?}", file))?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("✓ Configuration is valid");
    println!("  Storage: {:?} ({})", config.storage.backend, config.storage.path);
    println!("  Pattern cache: {}", config.filter.cache_patterns);
    println!("  Log level: {}", config.logging.level);

    Ok(())
}

fn show_paths() -> Result<()> {
    println!("Configuration file search paths:");
    println!();
    println!("  1. ./histpurge.toml");

    if let Some(dirs) = project_dirs() {
        println!("  2. {}", dirs.config_dir().join("histpurge.toml").display());
    }

    println!();
    println!("Default state file: ./{}", Config::default().storage.path);

    Ok(())
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "histpurge")
}

fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("histpurge.toml");
    if local.exists() {
        return Some(local);
    }

    let path = project_dirs()?.config_dir().join("histpurge.toml");
    if path.exists() {
        debug!("Using user config {:?}", path);
        return Some(path);
    }

    None
}
