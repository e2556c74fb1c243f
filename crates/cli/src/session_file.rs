use anyhow::{Context, Result};
use dcinv_api_client::{Credentials, SessionStore};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Session store persisted as JSON next to the config file.
///
/// The file is removed on logout or when a refresh fails.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<Credentials>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        let credentials = serde_json::from_str(&raw)
            .with_context(|| format!("parse {}", self.path.display()))?;
        Ok(Some(credentials))
    }

    fn write(&self, credentials: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(credentials).context("serialize session")?;
        let mut file = open_private(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        file.write_all(raw.as_bytes())
            .with_context(|| format!("write {}", self.path.display()))
    }
}

/// Open for writing with owner-only permissions, tightening a file that
/// already exists before anything is written to it.
#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<Credentials> {
        match self.read() {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!("ignoring unreadable session file: {e:#}");
                None
            }
        }
    }

    fn set(&self, credentials: Credentials) {
        if let Err(e) = self.write(&credentials) {
            warn!("could not persist session: {e:#}");
        }
    }

    fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("could not remove {}: {e}", self.path.display()),
        }
    }
}
