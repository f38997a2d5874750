use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::announcement::{announcements_from_value, Announcement};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read console config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid console config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Runtime configuration served to the console (deployment.config.json).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleConfig {
    /// e.g. `https://localhost:9443`
    #[serde(default)]
    pub client_origin: String,
    #[serde(default)]
    pub app_base: String,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub deployment: DeploymentConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiConfig {
    #[serde(default)]
    pub app_name: String,
    #[serde(default)]
    pub app_logo_path: Option<String>,
    /// Kept raw: a malformed list must degrade to "no announcements", not fail the whole file.
    #[serde(default)]
    pub announcements: Option<Value>,
    #[serde(default)]
    pub product_version_config: Option<ProductVersionConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVersionConfig {
    pub version_override: Option<String>,
    pub allow_snapshot: Option<bool>,
    pub label_color: Option<String>,
    /// "lowercase" | "uppercase"
    pub text_case: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfig {
    #[serde(default)]
    pub product_version: String,
    #[serde(default)]
    pub app_home_path: String,
}

impl ConsoleConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// The validated announcement list, `None` when nothing usable is configured.
    pub fn announcements(&self) -> Option<Vec<Announcement>> {
        announcements_from_value(self.ui.announcements.as_ref())
    }
}
