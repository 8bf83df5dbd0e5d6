//! Persisting detection frames to the events directory.

use crate::error::ChannelError;
use crate::Result;
use chrono::{DateTime, Local, TimeZone};
use flareguard_core::types::{DetectionEvent, PersistedFrame};
use std::fmt::Debug;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::debug;

/// Upper bound on file-name claims before giving up on a directory.
const MAX_CLAIM_ATTEMPTS: usize = 1000;

/// Writes a frame as an image file.
pub trait FrameEncoder: Send + Sync + Debug {
    /// File extension, without the dot.
    fn extension(&self) -> &str;

    /// Write the encoded image.
    fn encode(&self, frame: &[u8], out: &mut dyn Write) -> io::Result<()>;
}

/// Encoder for frames that already hold JPEG bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegPassthrough;

impl FrameEncoder for JpegPassthrough {
    fn extension(&self) -> &str {
        "jpg"
    }

    fn encode(&self, frame: &[u8], out: &mut dyn Write) -> io::Result<()> {
        out.write_all(frame)
    }
}

/// Append-only store of detection frames.
///
/// File names are `alert_<YYYYMMDD-HHMMSS-ffffff>.<ext>`. Timestamps handed
/// out by one store are strictly increasing at microsecond resolution, and
/// files are claimed with `create_new`, so two events never share a file.
#[derive(Debug)]
pub struct FrameStore {
    dir: PathBuf,
    encoder: Box<dyn FrameEncoder>,
    last_micros: AtomicI64,
}

impl FrameStore {
    /// Create a store writing JPEG frames into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_encoder(dir, Box::new(JpegPassthrough))
    }

    /// Create a store with a custom encoder.
    pub fn with_encoder(dir: impl Into<PathBuf>, encoder: Box<dyn FrameEncoder>) -> Self {
        Self {
            dir: dir.into(),
            encoder,
            last_micros: AtomicI64::new(0),
        }
    }

    /// The events directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the event's frame to a fresh file.
    pub fn persist(&self, event: &DetectionEvent) -> Result<PersistedFrame> {
        fs::create_dir_all(&self.dir).map_err(|e| ChannelError::storage(&self.dir, e))?;

        for _ in 0..MAX_CLAIM_ATTEMPTS {
            let timestamp = self.next_timestamp(&event.timestamp);
            let path = self
                .dir
                .join(frame_file_name(&timestamp, self.encoder.extension()));

            let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(ChannelError::storage(path, e)),
            };

            let mut writer = BufWriter::new(file);
            let written = self
                .encoder
                .encode(&event.frame, &mut writer)
                .and_then(|_| writer.flush());
            if let Err(e) = written {
                drop(writer);
                let _ = fs::remove_file(&path);
                return Err(ChannelError::storage(path, e));
            }

            debug!(path = %path.display(), bytes = event.frame.len(), "Persisted frame");
            return Ok(PersistedFrame { path, timestamp });
        }

        Err(ChannelError::storage(
            &self.dir,
            io::Error::new(io::ErrorKind::AlreadyExists, "no free frame file name"),
        ))
    }

    /// `base`, bumped past the last stamp this store handed out.
    fn next_timestamp(&self, base: &DateTime<Local>) -> DateTime<Local> {
        let now = base.timestamp_micros();
        let previous = self
            .last_micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        let micros = now.max(previous + 1);

        let secs = micros.div_euclid(1_000_000);
        let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
        Local
            .timestamp_opt(secs, nanos)
            .single()
            .unwrap_or(*base)
    }
}

/// File name for a frame persisted at `timestamp`.
pub fn frame_file_name(timestamp: &DateTime<Local>, extension: &str) -> String {
    format!(
        "alert_{}.{}",
        timestamp.format("%Y%m%d-%H%M%S-%6f"),
        extension
    )
}
