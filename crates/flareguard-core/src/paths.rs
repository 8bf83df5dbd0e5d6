//! Path resolution utilities.

use std::path::PathBuf;

/// Default directory name for persisted detection frames.
pub const DEFAULT_EVENTS_DIR: &str = "detected_events";

/// Default events directory, relative to the working directory.
pub fn default_events_dir() -> PathBuf {
    PathBuf::from(DEFAULT_EVENTS_DIR)
}

/// Expand tilde (~) in a path.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
