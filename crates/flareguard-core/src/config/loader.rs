//! Configuration loading, environment overlay, and validation.

use super::{AlertConfig, ChannelStatus};
use crate::env::{self, vars};
use crate::error::ConfigError;
use crate::paths;
use crate::secret::SecretString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

impl AlertConfig {
    /// Load configuration from a JSON5 file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        debug!(path = %path.display(), "Loading configuration");
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Serialize to a pretty JSON string. Secrets are redacted.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load the optional file, then overlay the environment.
    ///
    /// With no explicit path, `FLAREGUARD_CONFIG` is consulted; when neither
    /// names a file, defaults are used.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| env::get_var(vars::FLAREGUARD_CONFIG).map(|p| paths::expand_tilde(&p)));

        let mut config = match path {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Overlay values present in the environment onto this configuration.
    pub fn apply_env(&mut self) {
        if let Some(dir) = env::get_var(vars::FLAREGUARD_EVENTS_DIR) {
            self.events_dir = paths::expand_tilde(&dir);
        }
        if let Some(cooldown) = env::get_secs(vars::FLAREGUARD_ALERT_COOLDOWN) {
            self.cooldown_secs = cooldown.as_secs();
        }
        if let Some(workers) = env::get_usize(vars::FLAREGUARD_WORKERS) {
            self.workers = workers;
        }
        if let Some(id) = env::get_var(vars::IMGUR_CLIENT_ID) {
            self.imgur.client_id = Some(SecretString::new(id));
        }
        if let Some(key) = env::get_var(vars::CALLMEBOT_API_KEY) {
            self.whatsapp.api_key = Some(SecretString::new(key));
        }
        if let Some(phone) = env::get_var(vars::RECEIVER_WHATSAPP_NUMBER) {
            self.whatsapp.phone = Some(phone);
        }
        if let Some(token) = env::get_var(vars::TELEGRAM_TOKEN) {
            self.telegram.token = Some(SecretString::new(token));
        }
        if let Some(chat) = env::get_var(vars::TELEGRAM_CHAT_ID) {
            self.telegram.chat_id = Some(chat);
        }
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.events_dir.as_os_str().is_empty() {
            errors.push("events_dir must not be empty".to_string());
        }

        if self.workers == 0 {
            errors.push("workers must be at least 1".to_string());
        }

        let timeouts = [
            ("imgur.timeout_secs", self.imgur.timeout_secs),
            ("whatsapp.timeout_secs", self.whatsapp.timeout_secs),
            ("telegram.timeout_secs", self.telegram.timeout_secs),
        ];
        for (key, secs) in timeouts {
            if secs == 0 {
                errors.push(format!("{} must be greater than 0", key));
            }
        }

        let mut endpoints = vec![
            ("imgur.upload_url", self.imgur.upload_url.as_str()),
            ("whatsapp.endpoint", self.whatsapp.endpoint.as_str()),
        ];
        if let Some(api_url) = &self.telegram.api_url {
            endpoints.push(("telegram.api_url", api_url.as_str()));
        }
        for (key, value) in endpoints {
            if let Err(e) = url::Url::parse(value) {
                errors.push(format!("{} '{}' is not a valid URL: {}", key, value, e));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }

    /// Per-label alert cooldown.
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    /// WhatsApp enablement: needs an API key and a receiving number.
    pub fn whatsapp_status(&self) -> ChannelStatus {
        let mut missing = Vec::new();
        if !has_secret(&self.whatsapp.api_key) {
            missing.push(vars::CALLMEBOT_API_KEY);
        }
        if !has_value(&self.whatsapp.phone) {
            missing.push(vars::RECEIVER_WHATSAPP_NUMBER);
        }

        let mut warnings = Vec::new();
        if !has_secret(&self.imgur.client_id) {
            warnings.push(format!(
                "{} is not set; image uploads will fail",
                vars::IMGUR_CLIENT_ID
            ));
        }

        ChannelStatus {
            name: "whatsapp",
            enabled: missing.is_empty(),
            missing,
            warnings,
        }
    }

    /// Telegram enablement: needs a bot token.
    pub fn telegram_status(&self) -> ChannelStatus {
        let mut missing = Vec::new();
        if !has_secret(&self.telegram.token) {
            missing.push(vars::TELEGRAM_TOKEN);
        }

        let mut warnings = Vec::new();
        if !has_value(&self.telegram.chat_id) {
            warnings.push(format!(
                "{} is not set; no recipient is registered",
                vars::TELEGRAM_CHAT_ID
            ));
        }

        ChannelStatus {
            name: "telegram",
            enabled: missing.is_empty(),
            missing,
            warnings,
        }
    }

    /// Enablement of every known channel, in dispatch order.
    pub fn channel_statuses(&self) -> Vec<ChannelStatus> {
        vec![self.whatsapp_status(), self.telegram_status()]
    }
}

fn has_secret(value: &Option<SecretString>) -> bool {
    value.as_ref().is_some_and(|s| !s.is_blank())
}

fn has_value(value: &Option<String>) -> bool {
    value.as_ref().is_some_and(|s| !s.trim().is_empty())
}

/// Builder for constructing an [`AlertConfig`] programmatically.
#[derive(Debug, Clone, Default)]
pub struct AlertConfigBuilder {
    config: AlertConfig,
}

impl AlertConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the events directory.
    pub fn events_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.events_dir = dir.into();
        self
    }

    /// Set the per-label cooldown in seconds.
    pub fn cooldown_secs(mut self, secs: u64) -> Self {
        self.config.cooldown_secs = secs;
        self
    }

    /// Set the number of dispatch workers.
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Set the Imgur client id.
    pub fn imgur_client_id(mut self, id: impl Into<String>) -> Self {
        self.config.imgur.client_id = Some(SecretString::new(id));
        self
    }

    /// Override the Imgur upload endpoint.
    pub fn imgur_upload_url(mut self, url: impl Into<String>) -> Self {
        self.config.imgur.upload_url = url.into();
        self
    }

    /// Set WhatsApp credentials.
    pub fn whatsapp(mut self, api_key: impl Into<String>, phone: impl Into<String>) -> Self {
        self.config.whatsapp.api_key = Some(SecretString::new(api_key));
        self.config.whatsapp.phone = Some(phone.into());
        self
    }

    /// Override the CallMeBot endpoint.
    pub fn whatsapp_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.whatsapp.endpoint = url.into();
        self
    }

    /// Set the Telegram bot token and optional default chat.
    pub fn telegram(mut self, token: impl Into<String>, chat_id: Option<&str>) -> Self {
        self.config.telegram.token = Some(SecretString::new(token));
        self.config.telegram.chat_id = chat_id.map(str::to_string);
        self
    }

    /// Override the Telegram Bot API base URL.
    pub fn telegram_api_url(mut self, url: impl Into<String>) -> Self {
        self.config.telegram.api_url = Some(url.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> AlertConfig {
        self.config
    }

    /// Build and validate the configuration.
    pub fn build_validated(self) -> Result<AlertConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
