use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG: &str = "config/welcome.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

pub fn conf_from_file<T: serde::de::DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<T>(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BotConf {
    pub platform: PlatformConf,
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,
    #[serde(default)]
    pub poll: PollConf,
    #[serde(default)]
    pub moderation: ModerationConf,
    #[serde(default)]
    pub classifier: Option<ClassifierConf>,
    #[serde(default)]
    pub avatar: AvatarConf,
}

impl BotConf {
    /// Configured owners plus the bot itself.
    pub fn owner_list(&self) -> Vec<String> {
        let mut owners = vec![self.platform.bot_id.clone()];
        for owner in &self.owners {
            if !owners.contains(owner) {
                owners.push(owner.clone());
            }
        }
        owners
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PlatformConf {
    pub base_url: String,
    pub token: String,
    pub bot_id: String,
    #[serde(default = "default_event_wait")]
    pub event_wait_secs: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PollConf {
    pub interval_secs: u64,
}

impl Default for PollConf {
    fn default() -> Self {
        Self { interval_secs: 2 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ModerationConf {
    pub links: bool,
    pub keyword_classifier: bool,
    pub keywords: Vec<String>,
}

impl Default for ModerationConf {
    fn default() -> Self {
        Self {
            links: true,
            keyword_classifier: false,
            keywords: crate::plugins::moderation::DEFAULT_KEYWORDS
                .iter()
                .map(|kw| kw.to_string())
                .collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClassifierConf {
    pub endpoint: String,
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_classifier_timeout")]
    pub timeout_secs: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct AvatarConf {
    pub width: u32,
    pub height: u32,
}

impl Default for AvatarConf {
    fn default() -> Self {
        Self {
            width: 240,
            height: 240,
        }
    }
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("settings.json")
}

fn default_event_wait() -> u64 {
    30
}

fn default_model() -> String {
    String::from("gpt-4")
}

fn default_classifier_timeout() -> u64 {
    10
}
