//! Configuration for the cropper.
//!
//! Sources, later wins:
//! 1. built-in defaults
//! 2. `~/.config/image-cropper/config.json`
//! 3. environment (`.env.local` / `.env` are loaded by the binary first)
//!
//! Environment keys: `CROPPER_ENDPOINT`, `CROPPER_UPLOAD_FIELD`,
//! `CROPPER_STORE_DIR`, `CROPPER_PANEL_COMMAND`.

use crate::relay::WindowSpec;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "image-cropper";
const CONFIG_FILE_NAME: &str = "config.json";

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/detect";
pub const DEFAULT_UPLOAD_FIELD: &str = "file";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CropperConfig {
    /// Analysis endpoint the consumer uploads to.
    pub endpoint: String,
    /// Multipart field name for the image.
    pub upload_field: String,
    /// Directory holding the delivery record.
    pub store_dir: PathBuf,
    /// Shell command that presents the consumer panel, if the host has one.
    pub panel_command: Option<String>,
    pub window: WindowSpec,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    upload_field: Option<String>,
    #[serde(default)]
    store_dir: Option<PathBuf>,
    #[serde(default)]
    panel_command: Option<String>,
    #[serde(default)]
    window_width: Option<u32>,
    #[serde(default)]
    window_height: Option<u32>,
}

fn default_store_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|c| c.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

impl Default for CropperConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            upload_field: DEFAULT_UPLOAD_FIELD.to_string(),
            store_dir: default_store_dir(),
            panel_command: None,
            window: WindowSpec::default(),
        }
    }
}

impl CropperConfig {
    /// Defaults, then the config file, then the process environment.
    /// A missing or broken config file falls back to defaults.
    pub fn load() -> Self {
        let mut config = match config_path() {
            Some(path) if path.exists() => Self::from_file(&path).unwrap_or_else(|e| {
                log::warn!("[CONFIG] Ignoring {}: {}", path.display(), e);
                Self::default()
            }),
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let raw: RawConfig = serde_json::from_str(&raw)?;
        let mut config = Self::default();
        config.merge(raw);
        Ok(config)
    }

    fn merge(&mut self, raw: RawConfig) {
        if let Some(endpoint) = raw.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(field) = raw.upload_field {
            self.upload_field = field;
        }
        if let Some(dir) = raw.store_dir {
            self.store_dir = dir;
        }
        if raw.panel_command.is_some() {
            self.panel_command = raw.panel_command;
        }
        if let Some(width) = raw.window_width {
            self.window.width = width;
        }
        if let Some(height) = raw.window_height {
            self.window.height = height;
        }
    }

    /// Override from environment-style lookups. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(endpoint) = get("CROPPER_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(field) = get("CROPPER_UPLOAD_FIELD") {
            self.upload_field = field;
        }
        if let Some(dir) = get("CROPPER_STORE_DIR") {
            self.store_dir = PathBuf::from(dir);
        }
        if let Some(command) = get("CROPPER_PANEL_COMMAND") {
            self.panel_command = Some(command);
        }
    }
}
