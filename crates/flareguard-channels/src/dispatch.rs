//! Fire-and-forget alert dispatch.
//!
//! [`DispatchEngine::send_alert`] persists the frame on the calling thread,
//! queues a job on the worker pool, and returns. The job fans the frame out
//! to every enabled channel in registration order, containing each channel's
//! errors and panics so the others still run.

use crate::cooldown::Cooldown;
use crate::error::{panic_message, ChannelError};
use crate::pool::WorkerPool;
use crate::storage::{FrameEncoder, FrameStore, JpegPassthrough};
use crate::traits::AlertChannel;
use crate::Result;
use bytes::Bytes;
use flareguard_core::config::AlertConfig;
use flareguard_core::types::{DetectionEvent, DispatchOutcome, PersistedFrame, DEFAULT_LABEL};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn};

#[cfg(feature = "telegram")]
use crate::bridge::Bridged;
#[cfg(feature = "telegram")]
use crate::telegram::TelegramChannel;

/// Name prefix of the dispatch worker threads.
const POOL_NAME: &str = "flareguard-dispatch";

/// Receives the outcomes of every finished dispatch job.
///
/// Called on the worker thread that ran the job.
pub trait DispatchObserver: Send + Sync {
    /// One outcome per enabled channel, in dispatch order.
    fn on_dispatch(&self, label: &str, frame: &PersistedFrame, outcomes: &[DispatchOutcome]);
}

/// State shared by every dispatch job. Read-only once built.
struct Fanout {
    channels: Vec<Box<dyn AlertChannel>>,
    observer: Option<Arc<dyn DispatchObserver>>,
}

impl Fanout {
    fn run(&self, label: &str, frame: &PersistedFrame) {
        let span = info_span!("dispatch", label, frame = frame.file_name());
        let _guard = span.enter();

        if self.channels.is_empty() {
            debug!("No channels enabled; frame kept on disk only");
        }

        let outcomes: Vec<DispatchOutcome> = self
            .channels
            .iter()
            .map(|channel| deliver_isolated(channel.as_ref(), label, frame))
            .collect();

        let delivered = outcomes.iter().filter(|o| o.delivered).count();
        info!(
            delivered,
            failed = outcomes.len() - delivered,
            "Dispatch finished"
        );

        if let Some(observer) = &self.observer {
            let notified = panic::catch_unwind(AssertUnwindSafe(|| {
                observer.on_dispatch(label, frame, &outcomes)
            }));
            if let Err(payload) = notified {
                error!(panic = %panic_message(payload.as_ref()), "Dispatch observer panicked");
            }
        }
    }
}

/// Run one channel, turning errors and panics into a failed outcome.
fn deliver_isolated(
    channel: &dyn AlertChannel,
    label: &str,
    frame: &PersistedFrame,
) -> DispatchOutcome {
    let name = channel.name().to_string();
    match panic::catch_unwind(AssertUnwindSafe(|| channel.deliver(label, frame))) {
        Ok(Ok(report)) => {
            info!(
                channel = %name,
                delivered = report.delivered_count(),
                failed = report.failed_count(),
                "Channel completed delivery"
            );
            DispatchOutcome::delivered(name, report.recipients)
        }
        Ok(Err(e)) => {
            error!(channel = %name, error = %e, "Channel delivery failed");
            DispatchOutcome::failed(name, e.to_string())
        }
        Err(payload) => {
            let e = ChannelError::Panicked(panic_message(payload.as_ref()));
            error!(channel = %name, error = %e, "Channel panicked");
            DispatchOutcome::failed(name, e.to_string())
        }
    }
}

/// The alert dispatch engine.
pub struct DispatchEngine {
    store: FrameStore,
    cooldown: Cooldown,
    fanout: Arc<Fanout>,
    pool: WorkerPool,
    #[cfg(feature = "telegram")]
    telegram: Option<Arc<TelegramChannel>>,
}

impl std::fmt::Debug for DispatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchEngine")
            .field("events_dir", &self.store.dir())
            .field("channels", &self.enabled_channels())
            .field("cooldown", &self.cooldown.interval())
            .field("pool", &self.pool)
            .finish()
    }
}

impl DispatchEngine {
    /// Start building an engine with no channels.
    pub fn builder() -> DispatchEngineBuilder {
        DispatchEngineBuilder::new()
    }

    /// Build an engine with every channel whose credentials are configured.
    ///
    /// Channels with missing credentials are skipped with a warning.
    pub fn from_config(config: &AlertConfig) -> Result<Self> {
        DispatchEngineBuilder::from_config(config)?.build()
    }

    /// Accept a detection for background delivery.
    ///
    /// Blocks only while the frame is written to the events directory.
    /// Returns `false` when the label is cooling down, the frame could not be
    /// persisted, or the engine is shut down. Delivery results are never
    /// reported here; see [`DispatchObserver`].
    pub fn send_alert(&self, frame: impl Into<Bytes>, label: &str) -> bool {
        if self.pool.is_shut_down() {
            warn!(label, "Alert rejected: dispatch engine is shut down");
            return false;
        }

        if let Err(remaining) = self.cooldown.try_acquire(label) {
            debug!(
                label,
                remaining_ms = remaining.as_millis() as u64,
                "Alert suppressed by cooldown"
            );
            return false;
        }

        let event = DetectionEvent::new(frame, label);
        let persisted = match self.store.persist(&event) {
            Ok(persisted) => persisted,
            Err(e) => {
                error!(label, error = %e, "Failed to persist alert frame");
                self.cooldown.reset(label);
                return false;
            }
        };

        let fanout = Arc::clone(&self.fanout);
        let file = persisted.file_name().to_string();
        let job_label = event.label;
        match self.pool.submit(move || fanout.run(&job_label, &persisted)) {
            Ok(()) => {
                debug!(label, %file, "Alert queued");
                true
            }
            Err(e) => {
                error!(label, %file, error = %e, "Failed to queue alert");
                false
            }
        }
    }

    /// [`DispatchEngine::send_alert`] with the default "Fire" label.
    pub fn send_default_alert(&self, frame: impl Into<Bytes>) -> bool {
        self.send_alert(frame, DEFAULT_LABEL)
    }

    /// Names of the enabled channels, in dispatch order.
    pub fn enabled_channels(&self) -> Vec<String> {
        self.fanout
            .channels
            .iter()
            .map(|channel| channel.name().to_string())
            .collect()
    }

    /// The events directory.
    pub fn events_dir(&self) -> &std::path::Path {
        self.store.dir()
    }

    /// Add a Telegram chat to the recipient list.
    ///
    /// Returns `false` if Telegram is disabled or the chat is already known.
    #[cfg(feature = "telegram")]
    pub fn register_recipient(&self, chat_id: &str) -> bool {
        match &self.telegram {
            Some(telegram) => telegram.register_recipient(chat_id),
            None => {
                warn!(chat_id, "Cannot register recipient: Telegram is disabled");
                false
            }
        }
    }

    /// Block until all accepted alerts have been dispatched, or `timeout`
    /// elapses. Returns `true` when nothing is left in flight.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.pool.wait_idle(timeout)
    }

    /// Stop accepting alerts and release the worker pool without waiting.
    ///
    /// Safe to call more than once; dropping the engine does the same.
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}

/// Builder for [`DispatchEngine`].
pub struct DispatchEngineBuilder {
    events_dir: PathBuf,
    workers: usize,
    cooldown: Duration,
    encoder: Box<dyn FrameEncoder>,
    channels: Vec<Box<dyn AlertChannel>>,
    observer: Option<Arc<dyn DispatchObserver>>,
    #[cfg(feature = "telegram")]
    telegram: Option<Arc<TelegramChannel>>,
}

impl DispatchEngineBuilder {
    /// Create a builder with the default configuration values and no
    /// channels.
    pub fn new() -> Self {
        let defaults = AlertConfig::default();
        let cooldown = defaults.cooldown();
        Self {
            events_dir: defaults.events_dir,
            workers: defaults.workers,
            cooldown,
            encoder: Box::new(JpegPassthrough),
            channels: Vec::new(),
            observer: None,
            #[cfg(feature = "telegram")]
            telegram: None,
        }
    }

    /// Create a builder from configuration, with every channel whose
    /// credentials are present already added.
    pub fn from_config(config: &AlertConfig) -> Result<Self> {
        let mut builder = Self::new()
            .events_dir(config.events_dir.clone())
            .workers(config.workers)
            .cooldown(config.cooldown());

        for status in config.channel_statuses() {
            for warning in &status.warnings {
                warn!(channel = status.name, "{}", warning);
            }
            if !status.enabled {
                warn!(
                    channel = status.name,
                    missing = ?status.missing,
                    "Channel disabled: missing credentials"
                );
                continue;
            }
            builder = builder.configured_channel(status.name, config)?;
        }

        Ok(builder)
    }

    /// Set the events directory.
    pub fn events_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.events_dir = dir.into();
        self
    }

    /// Set the number of worker threads.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the per-label cooldown. Zero disables it.
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Set the frame encoder.
    pub fn encoder(mut self, encoder: Box<dyn FrameEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Append a channel. Channels run in the order they were added.
    pub fn channel(mut self, channel: Box<dyn AlertChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    /// Append the Telegram channel and keep a handle for recipient
    /// registration.
    #[cfg(feature = "telegram")]
    pub fn telegram(mut self, telegram: Arc<TelegramChannel>) -> Self {
        self.channels.push(Box::new(Bridged::new(Arc::clone(&telegram))));
        self.telegram = Some(telegram);
        self
    }

    /// Set the outcome observer.
    pub fn observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    #[allow(unused_variables)]
    fn configured_channel(self, name: &str, config: &AlertConfig) -> Result<Self> {
        match name {
            #[cfg(feature = "whatsapp")]
            "whatsapp" => {
                let host = Arc::new(crate::imgur::ImgurUploader::from_config(&config.imgur));
                let channel =
                    crate::whatsapp::WhatsAppChannel::from_config(&config.whatsapp, host)?;
                info!(channel = name, phone = %channel.phone(), "Channel enabled");
                Ok(self.channel(Box::new(channel)))
            }
            #[cfg(feature = "telegram")]
            "telegram" => {
                let channel = TelegramChannel::from_config(&config.telegram)?;
                info!(
                    channel = name,
                    recipients = channel.recipients().len(),
                    "Channel enabled"
                );
                Ok(self.telegram(Arc::new(channel)))
            }
            _ => {
                warn!(channel = name, "Channel is configured but support is not compiled in");
                Ok(self)
            }
        }
    }

    /// Start the worker pool and build the engine.
    pub fn build(self) -> Result<DispatchEngine> {
        let pool = WorkerPool::new(POOL_NAME, self.workers)?;
        let fanout = Arc::new(Fanout {
            channels: self.channels,
            observer: self.observer,
        });

        let engine = DispatchEngine {
            store: FrameStore::with_encoder(self.events_dir, self.encoder),
            cooldown: Cooldown::new(self.cooldown),
            fanout,
            pool,
            #[cfg(feature = "telegram")]
            telegram: self.telegram,
        };

        info!(
            events_dir = %engine.store.dir().display(),
            channels = ?engine.enabled_channels(),
            workers = engine.pool.capacity(),
            cooldown_secs = engine.cooldown.interval().as_secs(),
            "Dispatch engine ready"
        );
        Ok(engine)
    }
}

impl Default for DispatchEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
