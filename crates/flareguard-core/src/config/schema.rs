//! Configuration schema definitions.

use crate::paths;
use crate::secret::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default Imgur upload endpoint.
pub const IMGUR_UPLOAD_URL: &str = "https://api.imgur.com/3/upload";

/// Default CallMeBot WhatsApp endpoint.
pub const CALLMEBOT_WHATSAPP_URL: &str = "https://api.callmebot.com/whatsapp.php";

/// Main FlareGuard alerting configuration.
///
/// Built once at startup and shared read-only with the dispatch engine and
/// every channel adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Directory receiving one image file per accepted alert.
    #[serde(default = "paths::default_events_dir")]
    pub events_dir: PathBuf,

    /// Minimum seconds between two accepted alerts with the same label.
    /// Zero, the default, disables the cooldown.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// Number of dispatch worker threads.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Image hosting settings.
    #[serde(default)]
    pub imgur: ImgurConfig,

    /// WhatsApp (CallMeBot) settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Telegram bot settings.
    #[serde(default)]
    pub telegram: TelegramConfig,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            events_dir: paths::default_events_dir(),
            cooldown_secs: default_cooldown_secs(),
            workers: default_workers(),
            imgur: ImgurConfig::default(),
            whatsapp: WhatsAppConfig::default(),
            telegram: TelegramConfig::default(),
        }
    }
}

fn default_cooldown_secs() -> u64 {
    0
}

fn default_workers() -> usize {
    2
}

/// Imgur image hosting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImgurConfig {
    /// Client identifier sent as `Authorization: Client-ID ...`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<SecretString>,

    /// Upload endpoint.
    #[serde(default = "default_imgur_url")]
    pub upload_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_upload_timeout")]
    pub timeout_secs: u64,
}

impl Default for ImgurConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            upload_url: default_imgur_url(),
            timeout_secs: default_upload_timeout(),
        }
    }
}

fn default_imgur_url() -> String {
    IMGUR_UPLOAD_URL.to_string()
}

fn default_upload_timeout() -> u64 {
    10
}

/// WhatsApp alerts through the CallMeBot click-to-message API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// CallMeBot API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,

    /// Receiving phone number, international format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Webhook endpoint.
    #[serde(default = "default_callmebot_url")]
    pub endpoint: String,

    /// Request timeout in seconds.
    #[serde(default = "default_message_timeout")]
    pub timeout_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            phone: None,
            endpoint: default_callmebot_url(),
            timeout_secs: default_message_timeout(),
        }
    }
}

fn default_callmebot_url() -> String {
    CALLMEBOT_WHATSAPP_URL.to_string()
}

fn default_message_timeout() -> u64 {
    15
}

/// Telegram bot photo alerts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<SecretString>,

    /// Default chat receiving alerts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,

    /// Bot API base URL override (self-hosted Bot API server, tests).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_message_timeout")]
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: None,
            chat_id: None,
            api_url: None,
            timeout_secs: default_message_timeout(),
        }
    }
}

/// Enablement of one channel, derived from credential presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelStatus {
    /// Channel name.
    pub name: &'static str,

    /// Whether every required credential is present.
    pub enabled: bool,

    /// Environment keys that are required but absent.
    pub missing: Vec<&'static str>,

    /// Optional keys that are absent; the channel runs in a degraded mode.
    pub warnings: Vec<String>,
}
