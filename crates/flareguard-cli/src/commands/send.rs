//! One-shot alert dispatch from an image file.

use super::{CHECK, CROSS, WARN};
use anyhow::Context;
use clap::Args;
use console::style;
use crossbeam_channel::Sender;
use flareguard_channels::{DispatchEngineBuilder, DispatchObserver};
use flareguard_core::types::{DispatchOutcome, PersistedFrame, DEFAULT_LABEL};
use flareguard_core::AlertConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Send command arguments.
#[derive(Args, Debug)]
pub struct SendArgs {
    /// Encoded image (JPEG) of the detection frame
    pub image: PathBuf,

    /// Detection label
    #[arg(short, long, default_value = DEFAULT_LABEL)]
    pub label: String,

    /// Seconds to wait for delivery before giving up
    #[arg(short, long, default_value_t = 60)]
    pub wait: u64,

    /// Additional Telegram chat to alert (repeatable)
    #[arg(long = "chat")]
    pub chats: Vec<String>,
}

/// Forwards the outcomes of the single dispatched job to the main thread.
struct Forward(Sender<(PersistedFrame, Vec<DispatchOutcome>)>);

impl DispatchObserver for Forward {
    fn on_dispatch(&self, _label: &str, frame: &PersistedFrame, outcomes: &[DispatchOutcome]) {
        let _ = self.0.send((frame.clone(), outcomes.to_vec()));
    }
}

/// Run the send command.
pub fn run(args: SendArgs, config: &AlertConfig) -> anyhow::Result<()> {
    config.validate()?;

    let frame = std::fs::read(&args.image)
        .with_context(|| format!("Failed to read image {}", args.image.display()))?;
    debug!(path = %args.image.display(), bytes = frame.len(), "Loaded detection frame");

    let (tx, rx) = crossbeam_channel::bounded(1);
    let engine = DispatchEngineBuilder::from_config(config)?
        .observer(Arc::new(Forward(tx)))
        .build()?;

    for chat in &args.chats {
        engine.register_recipient(chat);
    }

    if !engine.send_alert(frame, &args.label) {
        anyhow::bail!("Alert was not accepted; see the log for the reason");
    }
    println!("Alert queued: {}", style(&args.label).bold());

    let received = rx.recv_timeout(Duration::from_secs(args.wait));
    engine.shutdown();

    let (frame, outcomes) = match received {
        Ok(job) => job,
        Err(_) => {
            println!(
                "  {} Timed out after {}s waiting for delivery",
                style(WARN).yellow(),
                args.wait
            );
            return Ok(());
        }
    };

    println!("  Frame saved to {}", frame.path.display());
    if outcomes.is_empty() {
        println!(
            "  {} No channels enabled; run 'flareguard channels' for details",
            style(WARN).yellow()
        );
    }
    for outcome in &outcomes {
        println!("  {}", outcome_line(outcome));
        for recipient in outcome.recipients.iter().filter(|r| !r.delivered) {
            println!(
                "      {} {}: {}",
                style(WARN).yellow(),
                recipient.recipient,
                recipient.error.as_deref().unwrap_or("not delivered")
            );
        }
    }

    let failed = outcomes.iter().filter(|o| !o.delivered).count();
    if failed > 0 {
        anyhow::bail!("{} of {} channel(s) failed", failed, outcomes.len());
    }
    Ok(())
}

/// Summary line for one channel outcome.
fn outcome_line(outcome: &DispatchOutcome) -> String {
    if outcome.delivered {
        format!(
            "{} {:<10} delivered to {}/{} recipient(s)",
            style(CHECK).green(),
            outcome.channel,
            outcome.recipients.len() - outcome.failed_recipients(),
            outcome.recipients.len()
        )
    } else {
        format!(
            "{} {:<10} {}",
            style(CROSS).red(),
            outcome.channel,
            outcome.error.as_deref().unwrap_or("failed")
        )
    }
}
