use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE: &str = "footmeasure.toml";
pub const SERVER_URL_ENV: &str = "FOOTMEASURE_SERVER_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid server url {url:?}: {reason}")]
    InvalidServerUrl { url: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickerKind {
    /// Native file dialog.
    Dialog,
    /// In-app list of the images in `gallery_dir`.
    Gallery,
}

impl Default for PickerKind {
    fn default() -> Self {
        if cfg!(target_os = "android") {
            PickerKind::Gallery
        } else {
            PickerKind::Dialog
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base url of the analysis service; `/analyze-foot` is appended.
    pub server_url: String,
    pub request_timeout_secs: u64,
    /// How long a requested permission may stay ungranted before it counts as denied.
    pub permission_timeout_secs: u64,
    pub picker: PickerKind,
    pub gallery_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_secs: 30,
            permission_timeout_secs: 60,
            picker: PickerKind::default(),
            gallery_dir: default_gallery_dir(),
        }
    }
}

#[cfg(target_os = "android")]
fn default_gallery_dir() -> PathBuf {
    PathBuf::from("/sdcard/DCIM/Camera")
}

#[cfg(not(target_os = "android"))]
fn default_gallery_dir() -> PathBuf {
    dirs::picture_dir().unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(not(target_os = "android"))]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("footmeasure"))
}

impl AppConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `footmeasure.toml` from `dir`. A missing file yields the defaults.
    pub fn load(dir: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match dir.map(|d| d.join(CONFIG_FILE)) {
            Some(path) if path.exists() => {
                info!("loading config from {}", path.display());
                Self::from_toml(&std::fs::read_to_string(&path)?)?
            }
            _ => Self::default(),
        };
        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            config.server_url = url;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.server_url).map_err(|err| {
            ConfigError::InvalidServerUrl {
                url: self.server_url.clone(),
                reason: err.to_string(),
            }
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidServerUrl {
                url: self.server_url.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        Ok(())
    }

    pub fn analyze_url(&self) -> String {
        format!("{}/analyze-foot", self.server_url.trim_end_matches('/'))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn permission_timeout(&self) -> Duration {
        Duration::from_secs(self.permission_timeout_secs)
    }
}
