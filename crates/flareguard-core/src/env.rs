//! Environment variable handling.
//!
//! Only [`crate::AlertConfig::load_with_env`] and the binary's startup path
//! call into this module; channel adapters receive their credentials by value.

use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable as a usize.
pub fn get_usize(name: &str) -> Option<usize> {
    get_parsed(name)
}

/// Get an environment variable holding whole seconds as a duration.
pub fn get_secs(name: &str) -> Option<Duration> {
    get_parsed::<u64>(name).map(Duration::from_secs)
}

/// Parse a set variable; unparsable values are ignored with a warning.
fn get_parsed<T: FromStr>(name: &str) -> Option<T> {
    let value = get_var(name)?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(var = name, %value, "Ignoring unparsable environment value");
            None
        }
    }
}

/// Load environment variables from `.env` in the working directory.
pub fn load_dotenv() -> Result<(), std::io::Error> {
    load_dotenv_from(Path::new(".env"))
}

/// Load environment variables from a dotenv-style file.
///
/// Variables that are already set are left untouched. A missing file is not
/// an error.
pub fn load_dotenv_from(path: &Path) -> Result<(), std::io::Error> {
    if !path.exists() {
        return Ok(());
    }

    let content = std::fs::read_to_string(path)?;
    for (key, value) in parse_dotenv(&content) {
        if env::var(&key).is_err() {
            env::set_var(key, value);
        }
    }
    Ok(())
}

/// Parse `KEY=value` lines, skipping comments, blanks, and `export` prefixes.
fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line);
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim();

            // Remove quotes if present
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);

            if !key.is_empty() {
                pairs.push((key.to_string(), value.to_string()));
            }
        }
    }

    pairs
}

/// Environment variable names read at startup.
pub mod vars {
    /// Imgur client identifier used for image uploads.
    pub const IMGUR_CLIENT_ID: &str = "IMGUR_CLIENT_ID";

    /// CallMeBot API key for WhatsApp alerts.
    pub const CALLMEBOT_API_KEY: &str = "CALLMEBOT_API_KEY";

    /// Phone number receiving WhatsApp alerts.
    pub const RECEIVER_WHATSAPP_NUMBER: &str = "RECEIVER_WHATSAPP_NUMBER";

    /// Telegram bot token.
    pub const TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";

    /// Default Telegram chat receiving photo alerts.
    pub const TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

    /// Directory where detection frames are written.
    pub const FLAREGUARD_EVENTS_DIR: &str = "FLAREGUARD_EVENTS_DIR";

    /// Minimum seconds between two alerts with the same label.
    pub const FLAREGUARD_ALERT_COOLDOWN: &str = "FLAREGUARD_ALERT_COOLDOWN";

    /// Number of dispatch worker threads.
    pub const FLAREGUARD_WORKERS: &str = "FLAREGUARD_WORKERS";

    /// Config file override.
    pub const FLAREGUARD_CONFIG: &str = "FLAREGUARD_CONFIG";
}
