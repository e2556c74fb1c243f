use anyhow::{Context, Result};
use dcinv_api_client::{ClientOptions, RetryPolicy};
use dcinv_runtime_config::{
    CONFIG_FILE_NAME, ClientConfig, SERVER_URL_ENV, apply_compat_fallbacks, apply_env_override,
};
use std::path::{Path, PathBuf};

/// File holding the persisted access/refresh tokens.
pub const SESSION_FILE_NAME: &str = "session.json";

/// Get the config directory path (~/.config/dcinv/)
pub fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home).join(".config").join("dcinv"))
}

/// Canonical config file path.
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

pub fn session_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(SESSION_FILE_NAME))
}

fn read_config_file(path: &Path) -> Result<ClientConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    let mut config: ClientConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config at {}", path.display()))?;
    apply_compat_fallbacks(&mut config);
    Ok(config)
}

/// Config as written on disk, without environment overrides.
fn load_config_from_disk() -> Result<ClientConfig> {
    let path = config_path()?;
    if path.exists() {
        read_config_file(&path)
    } else {
        Ok(ClientConfig::default())
    }
}

/// Effective config: the file (or defaults) plus `DCINV_SERVER_URL`.
pub fn load_config() -> Result<ClientConfig> {
    let mut config = load_config_from_disk()?;
    apply_env_override(&mut config, std::env::var(SERVER_URL_ENV).ok());
    Ok(config)
}

pub fn save_config(config: &ClientConfig) -> Result<()> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config dir at {}", dir.display()))?;

    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    let path = config_path()?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write config at {}", path.display()))?;
    Ok(())
}

/// Client connection settings derived from the config.
pub fn client_options(config: &ClientConfig) -> ClientOptions {
    ClientOptions {
        base_url: config.server.url.clone(),
        request_timeout: config.timeouts.request(),
        import_timeout: config.timeouts.import(),
        retry: RetryPolicy::new(config.retry.max_attempts, config.retry.delay()),
    }
}

/// Values passed to `dcinv config`; `None` leaves the setting alone.
#[derive(Debug, Default)]
pub struct ConfigUpdate {
    pub server: Option<String>,
    pub request_secs: Option<u64>,
    pub import_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub notice_secs: Option<u64>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self.server.is_none()
            && self.request_secs.is_none()
            && self.import_secs.is_none()
            && self.max_attempts.is_none()
            && self.retry_delay_ms.is_none()
            && self.notice_secs.is_none()
    }

    fn apply(self, config: &mut ClientConfig) {
        if let Some(url) = self.server {
            config.server.url = url;
        }
        if let Some(secs) = self.request_secs {
            config.timeouts.request_secs = secs;
        }
        if let Some(secs) = self.import_secs {
            config.timeouts.import_secs = secs;
        }
        if let Some(attempts) = self.max_attempts {
            config.retry.max_attempts = attempts;
        }
        if let Some(ms) = self.retry_delay_ms {
            config.retry.delay_ms = ms;
        }
        if let Some(secs) = self.notice_secs {
            config.ui.notice_secs = secs;
        }
    }
}

/// Print current config.
pub fn show_config() -> Result<()> {
    let config = load_config()?;
    let path = config_path()?;
    println!("Config file: {}", path.display());
    println!();
    println!("[server]");
    println!("  url = {}", config.server.url);
    if std::env::var(SERVER_URL_ENV).is_ok_and(|v| !v.trim().is_empty()) {
        println!("  (overridden by {SERVER_URL_ENV})");
    }
    println!();
    println!("[timeouts]");
    println!("  request_secs = {}", config.timeouts.request_secs);
    println!("  import_secs  = {}", config.timeouts.import_secs);
    println!();
    println!("[retry]");
    println!("  max_attempts = {}", config.retry.max_attempts);
    println!("  delay_ms     = {}", config.retry.delay_ms);
    println!();
    println!("[ui]");
    println!("  notice_secs = {}", config.ui.notice_secs);
    println!();
    let session = session_path()?;
    println!(
        "Session: {}",
        if session.exists() {
            "logged in"
        } else {
            "(not logged in)"
        }
    );
    Ok(())
}

/// Update config with provided values.
pub fn set_config(update: ConfigUpdate) -> Result<()> {
    let mut config = load_config_from_disk()?;
    update.apply(&mut config);
    apply_compat_fallbacks(&mut config);

    save_config(&config)?;
    println!("Configuration updated.");
    show_config()?;
    Ok(())
}
