//! Shared fixtures for the FlareGuard integration tests.

use async_trait::async_trait;
use bytes::Bytes;
use flareguard_channels::{ChannelError, DispatchObserver, PhotoSender};
use flareguard_core::config::{AlertConfig, AlertConfigBuilder};
use flareguard_core::types::{DispatchOutcome, PersistedFrame};
use parking_lot::{Condvar, Mutex};
use std::path::Path;
use std::time::{Duration, Instant};
use wiremock::{Mock, MockServer, Request};

/// A small but well-formed JPEG marker pair with some payload.
pub const JPEG: &[u8] = b"\xff\xd8\xff\xe0flareguard-test-frame\xff\xd9";

/// Telegram bot token used by every scenario.
pub const BOT_TOKEN: &str = "123456:TEST-TOKEN";

/// A mock HTTP API usable from plain `#[test]` functions.
///
/// Channels make blocking requests on their own worker threads, so the
/// server is driven by a runtime owned here rather than by the test.
pub struct MockApi {
    // Dropped first, so expectations are verified while the runtime is alive.
    server: MockServer,
    runtime: tokio::runtime::Runtime,
}

impl MockApi {
    pub fn start() -> Self {
        let runtime = tokio::runtime::Runtime::new().expect("test runtime");
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    pub fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }

    /// Requests whose path ends with `suffix`, case-insensitively.
    pub fn requests_to(&self, suffix: &str) -> usize {
        let suffix = suffix.to_ascii_lowercase();
        self.requests()
            .iter()
            .filter(|r| r.url.path().to_ascii_lowercase().ends_with(&suffix))
            .count()
    }

    /// Configuration with every endpoint pointed at this server and every
    /// credential present.
    pub fn full_config(&self, events_dir: &Path) -> AlertConfig {
        self.configured(events_dir)
            .imgur_client_id("imgur-client")
            .whatsapp("callmebot-key", "+15551234567")
            .telegram(BOT_TOKEN, Some("42"))
            .build()
    }

    /// Configuration with endpoints pointed at this server and no
    /// credentials.
    pub fn configured(&self, events_dir: &Path) -> AlertConfigBuilder {
        AlertConfigBuilder::new()
            .events_dir(events_dir)
            .cooldown_secs(0)
            .imgur_upload_url(format!("{}/3/upload", self.uri()))
            .whatsapp_endpoint(format!("{}/whatsapp.php", self.uri()))
            .telegram_api_url(self.uri())
    }
}

/// Body of a successful Imgur upload.
pub fn imgur_success() -> serde_json::Value {
    serde_json::json!({
        "data": { "id": "abc123", "link": "https://i.imgur.com/abc123.jpg" },
        "success": true,
        "status": 200
    })
}

/// Body of a successful Bot API `sendPhoto` call.
pub fn telegram_photo_sent() -> serde_json::Value {
    serde_json::json!({
        "ok": true,
        "result": {
            "message_id": 7,
            "from": { "id": 123456, "is_bot": true, "first_name": "FlareGuard", "username": "flareguard_bot" },
            "chat": { "id": 42, "first_name": "Ops", "type": "private" },
            "date": 1700000000,
            "photo": [
                { "file_id": "photo-1", "file_unique_id": "unique-1", "file_size": 1024, "width": 90, "height": 60 }
            ],
            "caption": "🚨 Fire Detected!"
        }
    })
}

/// One finished dispatch job as seen by an observer.
#[derive(Debug, Clone)]
pub struct ObservedJob {
    pub label: String,
    pub frame: PersistedFrame,
    pub outcomes: Vec<DispatchOutcome>,
}

impl ObservedJob {
    pub fn outcome(&self, channel: &str) -> &DispatchOutcome {
        self.outcomes
            .iter()
            .find(|o| o.channel == channel)
            .unwrap_or_else(|| panic!("no outcome for channel {}", channel))
    }
}

/// Observer that records every job and lets tests wait for a count.
#[derive(Default)]
pub struct RecordingObserver {
    jobs: Mutex<Vec<ObservedJob>>,
    changed: Condvar,
}

impl RecordingObserver {
    pub fn jobs(&self) -> Vec<ObservedJob> {
        self.jobs.lock().clone()
    }

    /// Wait until at least `count` jobs were observed.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> Vec<ObservedJob> {
        let deadline = Instant::now() + timeout;
        let mut jobs = self.jobs.lock();
        while jobs.len() < count {
            if self.changed.wait_until(&mut jobs, deadline).timed_out() {
                break;
            }
        }
        jobs.clone()
    }
}

impl DispatchObserver for RecordingObserver {
    fn on_dispatch(&self, label: &str, frame: &PersistedFrame, outcomes: &[DispatchOutcome]) {
        self.jobs.lock().push(ObservedJob {
            label: label.to_string(),
            frame: frame.clone(),
            outcomes: outcomes.to_vec(),
        });
        self.changed.notify_all();
    }
}

/// Photo sender that rejects some chats and records every attempt.
#[derive(Debug, Default)]
pub struct ScriptedSender {
    rejected: Vec<String>,
    attempts: Mutex<Vec<String>>,
}

impl ScriptedSender {
    pub fn rejecting(chats: &[&str]) -> Self {
        Self {
            rejected: chats.iter().map(|c| c.to_string()).collect(),
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().clone()
    }
}

#[async_trait]
impl PhotoSender for ScriptedSender {
    async fn send_photo(
        &self,
        recipient: &str,
        _photo: Bytes,
        _caption: &str,
    ) -> Result<(), ChannelError> {
        self.attempts.lock().push(recipient.to_string());
        if self.rejected.iter().any(|r| r == recipient) {
            return Err(ChannelError::channel(
                "telegram",
                "Forbidden: bot was blocked by the user",
            ));
        }
        Ok(())
    }
}

/// Sorted file names in `dir`; empty when it does not exist.
pub fn frame_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
