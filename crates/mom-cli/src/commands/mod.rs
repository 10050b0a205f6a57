//! CLI command definitions and handlers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mom_core::config::MomConfig;
use std::path::PathBuf;

pub mod config;
pub mod providers;
pub mod scan;
pub mod serve;

/// MOM - Skin scan and healthcare provider locator
#[derive(Parser)]
#[command(name = "mom")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to use instead of mom.toml / the global config
    #[arg(short, long, global = true, env = "MOM_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture a skin photo and analyze it
    Scan(scan::ScanArgs),

    /// Find dermatologists, doctors or pharmacies nearby
    Providers(providers::ProvidersArgs),

    /// Start the web server
    Serve(serve::ServeArgs),

    /// Show the effective configuration
    Config,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;

        match self.command {
            Commands::Scan(args) => scan::execute(args, &config).await,
            Commands::Providers(args) => providers::execute(args, &config).await,
            Commands::Serve(args) => serve::execute(args, config).await,
            Commands::Config => config::execute(&config, self.config.as_deref()),
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<MomConfig> {
    match path {
        Some(path) => {
            let mut config = MomConfig::from_file(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            config.apply_env(|key| std::env::var(key).ok())?;
            Ok(config)
        }
        None => MomConfig::load().context("Failed to load configuration"),
    }
}
