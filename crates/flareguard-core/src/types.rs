//! Shared data types for alert dispatch.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default label used when a caller does not classify the detection.
pub const DEFAULT_LABEL: &str = "Fire";

/// A detection handed to the dispatch engine.
///
/// Immutable once created; adapters only ever see the label and the
/// [`PersistedFrame`] derived from it.
#[derive(Debug, Clone)]
pub struct DetectionEvent {
    /// Encoded image bytes for the frame that triggered the detection.
    pub frame: bytes::Bytes,

    /// Classification label, e.g. "Fire".
    pub label: String,

    /// When the detection was handed over. The persisted frame's timestamp
    /// starts from this value.
    pub timestamp: DateTime<Local>,
}

impl DetectionEvent {
    /// Create a new detection event stamped with the current local time.
    pub fn new(frame: impl Into<bytes::Bytes>, label: impl Into<String>) -> Self {
        Self {
            frame: frame.into(),
            label: label.into(),
            timestamp: Local::now(),
        }
    }
}

/// A detection frame written to the events directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedFrame {
    /// Location of the image file.
    pub path: PathBuf,

    /// The event's timestamp, bumped forward when needed so it is unique per
    /// store.
    pub timestamp: DateTime<Local>,
}

impl PersistedFrame {
    /// File name component of the path, for log fields.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// Result of one delivery attempt to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientOutcome {
    /// Recipient identifier (phone number, chat id).
    pub recipient: String,

    /// Whether the message reached the remote API successfully.
    pub delivered: bool,

    /// Failure detail, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecipientOutcome {
    /// A successful delivery.
    pub fn delivered(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            delivered: true,
            error: None,
        }
    }

    /// A failed delivery.
    pub fn failed(recipient: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            delivered: false,
            error: Some(error.into()),
        }
    }
}

/// Result of dispatching one event to one channel.
///
/// Only used for logging and observers; never returned to the caller of
/// `send_alert`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    /// Channel name ("whatsapp", "telegram", ...).
    pub channel: String,

    /// Whether the channel completed its delivery.
    pub delivered: bool,

    /// Failure detail, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Per-recipient results reported by the channel.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<RecipientOutcome>,
}

impl DispatchOutcome {
    /// Outcome for a channel that completed delivery.
    pub fn delivered(channel: impl Into<String>, recipients: Vec<RecipientOutcome>) -> Self {
        Self {
            channel: channel.into(),
            delivered: true,
            error: None,
            recipients,
        }
    }

    /// Outcome for a channel that failed.
    pub fn failed(channel: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            delivered: false,
            error: Some(error.into()),
            recipients: Vec::new(),
        }
    }

    /// Number of recipients that did not receive the alert.
    pub fn failed_recipients(&self) -> usize {
        self.recipients.iter().filter(|r| !r.delivered).count()
    }
}
