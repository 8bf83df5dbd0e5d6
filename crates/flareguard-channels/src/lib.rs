//! Alert channels and the dispatch engine for FlareGuard.
//!
//! A [`DispatchEngine`] accepts detections, persists their frames through a
//! [`FrameStore`], and fans each one out to every enabled [`AlertChannel`] on
//! a bounded [`WorkerPool`]. Channels built on async APIs run through the
//! [`AsyncBridge`], which gives each call its own single-use runtime.

pub mod bridge;
pub mod cooldown;
pub mod dispatch;
pub mod error;
pub mod pool;
pub mod storage;
pub mod traits;

#[cfg(feature = "whatsapp")]
pub mod imgur;

#[cfg(feature = "whatsapp")]
pub mod whatsapp;

#[cfg(feature = "telegram")]
pub mod telegram;

#[cfg(test)]
mod testing;

pub use bridge::{AsyncBridge, Bridged};
pub use cooldown::Cooldown;
pub use dispatch::{DispatchEngine, DispatchEngineBuilder, DispatchObserver};
pub use error::ChannelError;
pub use pool::WorkerPool;
pub use storage::{FrameEncoder, FrameStore, JpegPassthrough};
pub use traits::{AlertChannel, AsyncAlertChannel, DeliveryReport};

#[cfg(feature = "whatsapp")]
pub use imgur::{ImageHost, ImgurUploader};

#[cfg(feature = "whatsapp")]
pub use whatsapp::WhatsAppChannel;

#[cfg(feature = "telegram")]
pub use telegram::{PhotoSender, TelegramChannel, TeloxideSender};

/// Result type for channel operations.
pub type Result<T> = std::result::Result<T, ChannelError>;

/// Human-readable alert headline shared by every channel.
pub fn alert_headline(label: &str) -> String {
    format!("🚨 {} Detected!", label)
}
