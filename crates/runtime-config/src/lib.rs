//! Client configuration persisted as `dcinv.toml`.
//!
//! The CLI reads and writes these types; the API client itself only sees the
//! resolved values (URL, timeouts, retry policy) handed to it at startup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "dcinv.toml";

/// Environment variable that overrides `server.url`.
pub const SERVER_URL_ENV: &str = "DCINV_SERVER_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClientConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub timeouts: TimeoutSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub ui: UiSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_server_url")]
    pub url: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: default_server_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutSettings {
    /// Timeout for ordinary API calls.
    #[serde(default = "default_request_secs")]
    pub request_secs: u64,
    /// Timeout for spreadsheet uploads.
    #[serde(default = "default_import_secs")]
    pub import_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            request_secs: default_request_secs(),
            import_secs: default_import_secs(),
        }
    }
}

impl TimeoutSettings {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn import(&self) -> Duration {
        Duration::from_secs(self.import_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts for one logical call, the first one included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl RetrySettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSettings {
    /// How long a notification stays visible.
    #[serde(default = "default_notice_secs")]
    pub notice_secs: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            notice_secs: default_notice_secs(),
        }
    }
}

impl UiSettings {
    pub fn notice_duration(&self) -> Duration {
        Duration::from_secs(self.notice_secs)
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_server_url() -> String {
    "http://127.0.0.1:8000/api".to_string()
}
fn default_request_secs() -> u64 {
    10
}
fn default_import_secs() -> u64 {
    120
}
fn default_max_attempts() -> u32 {
    3
}
fn default_delay_ms() -> u64 {
    1000
}
fn default_notice_secs() -> u64 {
    5
}

/// Normalize values that would make the client unusable.
/// Returns true when any field was updated.
pub fn apply_compat_fallbacks(config: &mut ClientConfig) -> bool {
    let mut changed = false;

    let trimmed = config.server.url.trim().trim_end_matches('/').to_string();
    if trimmed.is_empty() {
        config.server.url = default_server_url();
        changed = true;
    } else if trimmed != config.server.url {
        config.server.url = trimmed;
        changed = true;
    }

    if config.timeouts.request_secs == 0 {
        config.timeouts.request_secs = default_request_secs();
        changed = true;
    }
    if config.timeouts.import_secs == 0 {
        config.timeouts.import_secs = default_import_secs();
        changed = true;
    }
    if config.retry.max_attempts == 0 {
        config.retry.max_attempts = default_max_attempts();
        changed = true;
    }
    if config.ui.notice_secs == 0 {
        config.ui.notice_secs = default_notice_secs();
        changed = true;
    }

    changed
}

/// Apply the `DCINV_SERVER_URL` override when it is set and non-blank.
pub fn apply_env_override(config: &mut ClientConfig, server_url: Option<String>) -> bool {
    match server_url {
        Some(url) if !url.trim().is_empty() => {
            config.server.url = url.trim().trim_end_matches('/').to_string();
            true
        }
        _ => false,
    }
}
