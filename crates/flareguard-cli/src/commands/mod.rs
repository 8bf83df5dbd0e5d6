//! CLI command implementations.

pub mod channels;
pub mod config;
pub mod send;

use console::Emoji;

pub(crate) static CHECK: Emoji = Emoji("✓", "+");
pub(crate) static CROSS: Emoji = Emoji("✗", "x");
pub(crate) static WARN: Emoji = Emoji("⚠", "!");
