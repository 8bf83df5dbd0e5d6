//! Channel and dispatch error types.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting or delivering an alert.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Image hosting failed; dependent channels skip their own request.
    #[error("image upload failed: {0}")]
    Upload(String),

    /// The alert request reached the remote API but was not accepted.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// The persisted frame is gone.
    #[error("missing image: {}", .0.display())]
    MissingImage(PathBuf),

    /// Writing a frame to the events directory failed.
    #[error("failed to persist frame to {}: {source}", path.display())]
    Storage {
        /// Target file or directory.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Channel configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Channel-specific error.
    #[error("{channel} error: {message}")]
    Channel {
        /// Channel name.
        channel: String,
        /// Error message.
        message: String,
    },

    /// The async bridge could not drive the call.
    #[error("async bridge error: {0}")]
    Bridge(String),

    /// A channel panicked; the panic was contained.
    #[error("panicked: {0}")]
    Panicked(String),

    /// The worker pool no longer accepts jobs.
    #[error("worker pool is shut down")]
    PoolClosed,
}

impl ChannelError {
    /// Create a channel-specific error.
    pub fn channel(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Channel {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Create a storage error for the given path.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from the image upload step.
    pub fn is_upload(&self) -> bool {
        matches!(self, Self::Upload(_))
    }
}

/// Render a panic payload caught by `catch_unwind`.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
