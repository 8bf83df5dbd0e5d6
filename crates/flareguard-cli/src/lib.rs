//! FlareGuard command-line interface.
//!
//! The dispatch engine is blocking, so commands run on the main thread
//! without an async runtime.

pub mod commands;

use clap::{Parser, Subcommand};
use flareguard_core::AlertConfig;

/// FlareGuard - fire detection alert dispatch
#[derive(Parser)]
#[command(name = "flareguard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = "FLAREGUARD_CONFIG")]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Send an alert for an image file
    Send(commands::send::SendArgs),

    /// Show which alert channels are enabled
    Channels,

    /// Configuration management
    Config(commands::config::ConfigArgs),

    /// Show version information
    Version,
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "flareguard=info",
        1 => "flareguard=debug",
        _ => "flareguard=trace",
    }
}

/// Run the CLI with the given arguments.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Version = cli.command {
        println!("flareguard {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = AlertConfig::load_with_env(cli.config.as_deref())?;
    match cli.command {
        Commands::Send(args) => commands::send::run(args, &config),
        Commands::Channels => commands::channels::run(&config),
        Commands::Config(args) => commands::config::run(args, &config),
        Commands::Version => Ok(()),
    }
}
