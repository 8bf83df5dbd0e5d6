//! Bounded pool of blocking worker threads.
//!
//! Jobs go through an unbounded crossbeam queue drained by a fixed number of
//! named threads. Excess jobs wait in the queue; nothing is dropped.

use crate::error::{panic_message, ChannelError};
use crate::Result;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-capacity worker pool.
pub struct WorkerPool {
    name: String,
    capacity: usize,
    sender: Mutex<Option<Sender<Job>>>,
    tracker: Arc<JobTracker>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

/// Counts submitted jobs that have not finished yet.
#[derive(Default)]
struct JobTracker {
    outstanding: Mutex<usize>,
    idle: Condvar,
}

impl JobTracker {
    fn begin(&self) {
        *self.outstanding.lock() += 1;
    }

    fn finish(&self) {
        let mut outstanding = self.outstanding.lock();
        *outstanding = outstanding.saturating_sub(1);
        if *outstanding == 0 {
            self.idle.notify_all();
        }
    }
}

impl WorkerPool {
    /// Spawn `capacity` worker threads named `<name>-<index>`.
    pub fn new(name: impl Into<String>, capacity: usize) -> Result<Self> {
        let name = name.into();
        if capacity == 0 {
            return Err(ChannelError::Config(
                "worker pool capacity must be at least 1".to_string(),
            ));
        }

        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();
        let tracker = Arc::new(JobTracker::default());

        for index in 0..capacity {
            let receiver = receiver.clone();
            let tracker = Arc::clone(&tracker);
            thread::Builder::new()
                .name(format!("{}-{}", name, index))
                .spawn(move || worker_loop(receiver, tracker))?;
        }

        debug!(pool = %name, capacity, "Worker pool started");
        Ok(Self {
            name,
            capacity,
            sender: Mutex::new(Some(sender)),
            tracker,
        })
    }

    /// Queue a job. Returns immediately.
    pub fn submit<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.lock();
        let sender = sender.as_ref().ok_or(ChannelError::PoolClosed)?;

        self.tracker.begin();
        if sender.send(Box::new(job)).is_err() {
            self.tracker.finish();
            return Err(ChannelError::PoolClosed);
        }
        Ok(())
    }

    /// Number of worker threads.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Jobs submitted but not yet finished, queued or running.
    pub fn outstanding(&self) -> usize {
        *self.tracker.outstanding.lock()
    }

    /// Whether [`WorkerPool::shutdown`] has been called.
    pub fn is_shut_down(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Block until every submitted job has finished or `timeout` elapses.
    ///
    /// Returns `true` when the pool went idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut outstanding = self.tracker.outstanding.lock();
        while *outstanding > 0 {
            if self
                .tracker
                .idle
                .wait_until(&mut outstanding, deadline)
                .timed_out()
            {
                return *outstanding == 0;
            }
        }
        true
    }

    /// Stop accepting jobs and release the workers without joining them.
    ///
    /// Already queued jobs still run; workers exit once the queue is empty.
    /// Safe to call any number of times.
    pub fn shutdown(&self) {
        if let Some(sender) = self.sender.lock().take() {
            drop(sender);
            info!(
                pool = %self.name,
                outstanding = self.outstanding(),
                "Worker pool shut down"
            );
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(receiver: Receiver<Job>, tracker: Arc<JobTracker>) {
    for job in receiver.iter() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            error!(panic = %panic_message(payload.as_ref()), "Worker job panicked");
        }
        tracker.finish();
    }
    debug!("Worker exiting");
}
