//! Channel enablement report.

use super::{CHECK, WARN};
use console::style;
use flareguard_core::config::ChannelStatus;
use flareguard_core::AlertConfig;

/// Status line for one channel.
fn status_line(status: &ChannelStatus) -> String {
    if status.enabled {
        format!("{} {:<10} enabled", style(CHECK).green(), status.name)
    } else {
        format!(
            "{} {:<10} disabled (missing {})",
            style(WARN).yellow(),
            status.name,
            status.missing.join(", ")
        )
    }
}

/// Run the channels command.
pub fn run(config: &AlertConfig) -> anyhow::Result<()> {
    println!("{}\n", style("Alert channels").bold());
    for status in config.channel_statuses() {
        println!("  {}", status_line(&status));
        for warning in &status.warnings {
            println!("      {} {}", style(WARN).yellow(), warning);
        }
    }
    println!("\n  Events directory: {}", config.events_dir.display());
    if config.cooldown_secs == 0 {
        println!("  Cooldown: disabled");
    } else {
        println!("  Cooldown: {}s per label", config.cooldown_secs);
    }
    Ok(())
}
