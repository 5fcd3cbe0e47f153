use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration, stored as `config.toml`.
///
/// Every field has a default, so an empty or missing file is a valid config.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct InboxConfig {
    /// Subscribe to real-time delivery on startup.
    #[serde(default)]
    pub live_delivery: bool,
    /// Run a bulk refresh on startup.
    #[serde(default = "default_true")]
    pub refresh_on_start: bool,
    /// Ask the gateway which notification opened the app on startup.
    #[serde(default = "default_true")]
    pub fetch_opening_on_start: bool,
    /// JSON fixture backing the in-process gateway.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixture: Option<PathBuf>,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            live_delivery: false,
            refresh_on_start: true,
            fetch_opening_on_start: true,
            fixture: None,
        }
    }
}

fn default_true() -> bool {
    true
}
