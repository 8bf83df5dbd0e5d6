//! FlareGuard CLI entry point.

use clap::Parser;
use flareguard_cli::{default_log_filter, run, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Values already in the environment win over .env
    flareguard_core::env::load_dotenv()?;

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_log_filter(cli.verbose).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    run(cli)
}
