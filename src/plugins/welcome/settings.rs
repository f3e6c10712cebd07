//! File-backed welcome settings.
//!
//! The file looks like `{"welcome": {"<group id>": true}}`. A group that is
//! absent from the map is disabled. Every mutation is a full
//! load-modify-store round trip under one lock, written with an atomic
//! temp-file + rename.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::platform::GroupId;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("settings task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// What `load` does when the file cannot be read or parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadErrorPolicy {
    /// Start from empty settings and re-initialise the file.
    EmptyDefault,
    Propagate,
}

pub const ON_SETTINGS_READ_ERROR: ReadErrorPolicy = ReadErrorPolicy::EmptyDefault;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub welcome: BTreeMap<GroupId, bool>,
    // sections written by other tools are carried through untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Settings {
    pub fn is_enabled(&self, id: &str) -> bool {
        self.welcome.get(id).copied().unwrap_or(false)
    }

    pub fn enabled_groups(&self) -> Vec<GroupId> {
        self.welcome
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[derive(Debug)]
pub struct SettingsStore {
    file: SettingsFile,
    lock: Mutex<()>,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: SettingsFile {
                path: path.into(),
                read_policy: ON_SETTINGS_READ_ERROR,
            },
            lock: Mutex::new(()),
        }
    }

    pub fn with_read_policy(mut self, policy: ReadErrorPolicy) -> Self {
        self.file.read_policy = policy;
        self
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }

    pub async fn load(&self) -> Result<Settings, SettingsError> {
        let _guard = self.lock.lock().await;
        self.blocking(|file| file.load()).await
    }

    pub async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let _guard = self.lock.lock().await;
        let settings = settings.clone();
        self.blocking(move |file| file.save(&settings)).await
    }

    /// Unreadable settings count as disabled.
    pub async fn is_enabled(&self, id: &str) -> bool {
        match self.load().await {
            Ok(settings) => settings.is_enabled(id),
            Err(e) => {
                warn!("could not read settings for {id}: {e}");
                false
            }
        }
    }

    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), SettingsError> {
        let _guard = self.lock.lock().await;
        let id = id.to_string();
        self.blocking(move |file| {
            let mut settings = file.load()?;
            settings.welcome.insert(id.clone(), enabled);
            file.save(&settings)?;
            info!("welcome for {id} set to {enabled}");
            Ok(())
        })
        .await
    }

    /// Turns a group off only if it already has an entry.
    /// Returns `false` without writing when the group was never configured.
    pub async fn disable_if_configured(&self, id: &str) -> Result<bool, SettingsError> {
        let _guard = self.lock.lock().await;
        let id = id.to_string();
        self.blocking(move |file| {
            let mut settings = file.load()?;
            let Some(enabled) = settings.welcome.get_mut(&id) else {
                return Ok(false);
            };
            *enabled = false;
            file.save(&settings)?;
            info!("welcome for {id} set to false");
            Ok(true)
        })
        .await
    }

    // file io (fsync included) stays off the async workers; callers hold `lock`
    async fn blocking<T, F>(&self, job: F) -> Result<T, SettingsError>
    where
        F: FnOnce(&SettingsFile) -> Result<T, SettingsError> + Send + 'static,
        T: Send + 'static,
    {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || job(&file)).await?
    }
}

#[derive(Debug, Clone)]
struct SettingsFile {
    path: PathBuf,
    read_policy: ReadErrorPolicy,
}

impl SettingsFile {
    fn load(&self) -> Result<Settings, SettingsError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("creating settings file {}", self.path.display());
                let empty = Settings::default();
                if let Err(e) = self.save(&empty) {
                    return self.recover(e);
                }
                return Ok(empty);
            }
            Err(e) => return self.recover(SettingsError::Io(e)),
        };

        match serde_json::from_str::<Settings>(&raw) {
            Ok(settings) => Ok(settings),
            Err(e) => self.recover(SettingsError::Json(e)),
        }
    }

    fn recover(&self, error: SettingsError) -> Result<Settings, SettingsError> {
        match self.read_policy {
            ReadErrorPolicy::Propagate => Err(error),
            ReadErrorPolicy::EmptyDefault => {
                warn!(
                    "unreadable settings file {} ({error}), starting empty",
                    self.path.display()
                );
                let empty = Settings::default();
                if let Err(e) = self.save(&empty) {
                    warn!("could not re-initialise settings file: {e}");
                }
                Ok(empty)
            }
        }
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        settings.serialize(&mut serializer)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(&buffer)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}
