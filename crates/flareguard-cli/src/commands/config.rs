//! Configuration management commands.

use super::{CHECK, CROSS};
use clap::Args;
use console::style;
use flareguard_core::AlertConfig;

/// Config command arguments.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(clap::Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (secrets redacted)
    Show,

    /// Validate configuration
    Validate,
}

/// Run the config command.
pub fn run(args: ConfigArgs, config: &AlertConfig) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            println!("{}", config.to_json()?);
        }

        ConfigCommand::Validate => match config.validate() {
            Ok(()) => println!("  {} Configuration valid", style(CHECK).green()),
            Err(e) => {
                println!("  {} Configuration invalid: {}", style(CROSS).red(), e);
                anyhow::bail!("Invalid configuration");
            }
        },
    }

    Ok(())
}
