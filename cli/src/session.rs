//! Session persistence under `~/.redink/session.toml`.
//!
//! The file holds the raw session cookie, so it is written with owner-only
//! permissions on unix. Corrupt or unreadable files surface as errors rather
//! than being silently discarded; the caller decides whether to degrade.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use redink_api::Session;

#[derive(Serialize, Deserialize)]
pub struct StoredSession {
    pub email: String,
    token: String,
    csrf_token: String,
}

impl StoredSession {
    pub fn new(email: impl Into<String>, session: &Session) -> Self {
        Self {
            email: email.into(),
            token: session.token.clone(),
            csrf_token: session.csrf_token.clone(),
        }
    }

    #[must_use]
    pub fn as_session(&self) -> Session {
        Session {
            token: self.token.clone(),
            csrf_token: self.csrf_token.clone(),
        }
    }
}

fn session_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".redink").join("session.toml"))
}

pub fn load() -> Result<Option<StoredSession>> {
    match session_path() {
        Some(path) => load_from(&path),
        None => Ok(None),
    }
}

pub fn save(session: &StoredSession) -> Result<()> {
    let path = session_path().context("could not determine the home directory")?;
    save_to(session, &path)
}

/// Remove the session file. Missing files are fine; a signed-out user has
/// nothing to delete.
pub fn delete() -> Result<()> {
    let Some(path) = session_path() else {
        return Ok(());
    };
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("failed to remove {}", path.display())),
    }
}

fn load_from(path: &Path) -> Result<Option<StoredSession>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let session = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(session))
}

fn save_to(session: &StoredSession, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_private_dir(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(session).context("failed to serialize session")?;
    write_private(path, &content).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new().recursive(true).mode(0o700).create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

#[cfg(unix)]
fn write_private(path: &Path, content: &str) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(content.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &str) -> io::Result<()> {
    fs::write(path, content)
}
