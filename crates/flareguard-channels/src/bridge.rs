//! Driving async channel calls from blocking worker threads.
//!
//! Worker threads have no ambient runtime. Each bridged call builds a
//! private current-thread runtime, runs the future to completion on it, and
//! tears it down before returning, so concurrent jobs never share a runtime
//! and nothing spawned by the call outlives it.

use crate::error::{panic_message, ChannelError};
use crate::traits::{AlertChannel, AsyncAlertChannel, DeliveryReport};
use crate::Result;
use flareguard_core::types::PersistedFrame;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error};

/// Runs one future to completion on a single-use runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsyncBridge;

impl AsyncBridge {
    /// Create a new bridge.
    pub fn new() -> Self {
        Self
    }

    /// Drive `future` to completion and return its result.
    ///
    /// A panic inside the future is caught and returned as
    /// [`ChannelError::Panicked`]. Calling this from a thread that is already
    /// inside a tokio runtime is refused with [`ChannelError::Bridge`].
    pub fn run_to_completion<F, T>(&self, task: &str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ChannelError::Bridge(format!(
                "{} was called from inside an async runtime",
                task
            )));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ChannelError::Bridge(format!("failed to build runtime: {}", e)))?;

        debug!(task, "Running async task on private runtime");
        let result = panic::catch_unwind(AssertUnwindSafe(|| runtime.block_on(future)));

        // Spawned leftovers are dropped here rather than awaited.
        runtime.shutdown_background();

        match result {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(task, panic = %message, "Async task panicked");
                Err(ChannelError::Panicked(message))
            }
        }
    }
}

/// Adapts an [`AsyncAlertChannel`] into a blocking [`AlertChannel`].
#[derive(Debug)]
pub struct Bridged<C> {
    inner: C,
    bridge: AsyncBridge,
}

impl<C: AsyncAlertChannel> Bridged<C> {
    /// Wrap an async channel.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            bridge: AsyncBridge::new(),
        }
    }

    /// Access the wrapped channel.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: AsyncAlertChannel> AlertChannel for Bridged<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn deliver(&self, label: &str, frame: &PersistedFrame) -> Result<DeliveryReport> {
        self.bridge
            .run_to_completion(self.inner.name(), self.inner.deliver(label, frame))
    }
}
