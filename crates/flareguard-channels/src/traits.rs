//! Core channel traits.
//!
//! The dispatch engine only ever talks to [`AlertChannel`], a blocking
//! interface run on worker threads. Channels whose client library is async
//! implement [`AsyncAlertChannel`] instead and are adapted with
//! [`crate::Bridged`].

use crate::Result;
use async_trait::async_trait;
use flareguard_core::types::{PersistedFrame, RecipientOutcome};
use std::fmt::Debug;
use std::sync::Arc;

/// A channel that delivers alerts with blocking calls.
pub trait AlertChannel: Send + Sync + Debug {
    /// Channel name used in logs and outcomes.
    fn name(&self) -> &str;

    /// Deliver one alert.
    ///
    /// An `Err` marks the whole channel as failed for this event. A channel
    /// that reaches several recipients reports individual failures inside
    /// the [`DeliveryReport`] instead.
    fn deliver(&self, label: &str, frame: &PersistedFrame) -> Result<DeliveryReport>;
}

/// A channel whose client API can only be driven from an async context.
#[async_trait]
pub trait AsyncAlertChannel: Send + Sync + Debug {
    /// Channel name used in logs and outcomes.
    fn name(&self) -> &str;

    /// Deliver one alert.
    async fn deliver(&self, label: &str, frame: &PersistedFrame) -> Result<DeliveryReport>;
}

#[async_trait]
impl<T: AsyncAlertChannel + ?Sized> AsyncAlertChannel for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn deliver(&self, label: &str, frame: &PersistedFrame) -> Result<DeliveryReport> {
        (**self).deliver(label, frame).await
    }
}

/// Per-recipient results of a completed delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// One entry per attempted recipient, in send order.
    pub recipients: Vec<RecipientOutcome>,
}

impl DeliveryReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report for a single recipient that received the alert.
    pub fn single(recipient: impl Into<String>) -> Self {
        Self {
            recipients: vec![RecipientOutcome::delivered(recipient)],
        }
    }

    /// Record an outcome.
    pub fn push(&mut self, outcome: RecipientOutcome) {
        self.recipients.push(outcome);
    }

    /// Number of recipients that received the alert.
    pub fn delivered_count(&self) -> usize {
        self.recipients.iter().filter(|r| r.delivered).count()
    }

    /// Number of recipients that did not.
    pub fn failed_count(&self) -> usize {
        self.recipients.len() - self.delivered_count()
    }
}
